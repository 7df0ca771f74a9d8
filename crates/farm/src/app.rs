use crossbeam_channel::Receiver;
use engine::HudTable;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::PhysicalKey,
    window::{WindowAttributes, WindowId},
};

use crate::farm_window::FarmWindow;
use crate::loader::LoadEvent;
use crate::window::Window;

/// Données de démarrage, consommées à la création de la fenêtre.
struct Startup {
    events: Receiver<LoadEvent>,
    hud_table: HudTable,
    seed: Option<u64>,
}

pub struct App {
    startup: Option<Startup>,
    window: Option<FarmWindow>,
}

impl App {
    pub fn new(events: Receiver<LoadEvent>, hud_table: HudTable, seed: Option<u64>) -> Self {
        Self {
            startup: Some(Startup {
                events,
                hud_table,
                seed,
            }),
            window: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(startup) = self.startup.take() else {
            return;
        };

        let winit_window = match event_loop.create_window(WindowAttributes::default()) {
            Ok(window) => window,
            Err(err) => {
                log::error!("failed to create the window: {err}");
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(FarmWindow::new(
            winit_window,
            startup.events,
            startup.hud_table,
            startup.seed,
        )) {
            Ok(window) => {
                window.request_redraw();
                self.window = Some(window);
            }
            Err(err) => {
                log::error!("failed to initialise the renderer: {err:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_mut() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        let consumed = {
            let wnd = window.window().clone();
            window
                .state_mut()
                .egui_renderer
                .handle_input(&wnd, &event)
                .consumed
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("window closed");
                window.shutdown();
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => window.handle_redraw(),
            WindowEvent::Resized(new_size) => {
                window.handle_resized(new_size.width, new_size.height)
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    match event.state {
                        ElementState::Pressed if !consumed => {
                            window.state_mut().press_key(keycode)
                        }
                        ElementState::Released => window.state_mut().release_key(keycode),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
}
