use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, TryRecvError};
use egui_wgpu::wgpu;
use engine::{DeltaTimer, FarmScene, HudTable, MapCamera, MapMovement, ResourceManager, Vec2};
use winit::{dpi::PhysicalSize, keyboard::KeyCode};

use crate::hud::{draw_hud, draw_loading};
use crate::loader::LoadEvent;
use crate::loading::LoadingScreen;
use crate::map_view::{MapTextures, draw_farm};
use crate::window::{Window, WindowState};

pub struct FarmWindow {
    window: Arc<winit::window::Window>,
    state: WindowState,
    delta_timer: DeltaTimer,
    camera: MapCamera,
    loading: LoadingScreen,
    events: Receiver<LoadEvent>,
    /// Consommée à l'assemblage de la scène
    hud_table: Option<HudTable>,
    seed: Option<u64>,
    scene: Option<FarmScene>,
    textures: MapTextures,
}

impl FarmWindow {
    const INITIAL_WIDTH: u32 = 1280;
    const INITIAL_HEIGHT: u32 = 720;
    const FIT_MARGIN: f32 = 40.0;

    pub async fn new(
        window: winit::window::Window,
        events: Receiver<LoadEvent>,
        hud_table: HudTable,
        seed: Option<u64>,
    ) -> Result<Self> {
        let _ =
            window.request_inner_size(PhysicalSize::new(Self::INITIAL_WIDTH, Self::INITIAL_HEIGHT));
        window.set_title("Granary farm");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let window = Arc::new(window);
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create the window surface")?;

        let size = window.inner_size();
        let state = WindowState::new(&instance, surface, &window, size.width, size.height).await?;

        let scale = window.scale_factor() as f32;
        let camera = MapCamera::new(size.width as f32 / scale, size.height as f32 / scale);

        Ok(Self {
            window,
            state,
            delta_timer: DeltaTimer::new(),
            camera,
            loading: LoadingScreen::new(),
            events,
            hud_table: Some(hud_table),
            seed,
            scene: None,
            textures: MapTextures::default(),
        })
    }

    fn poll_loading(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(LoadEvent::Progress(percent)) => self.loading.on_progress(percent),
                Ok(LoadEvent::Ready(resources)) => self.on_resources_ready(&resources),
                Ok(LoadEvent::Failed(reason)) => {
                    log::error!("scene not assembled: {reason}");
                    self.loading.on_failed();
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.scene.is_none() && !self.loading.has_failed() {
                        log::error!("resource loader stopped without a result");
                        self.loading.on_failed();
                    }
                    break;
                }
            }
        }
    }

    fn on_resources_ready(&mut self, resources: &ResourceManager) {
        if let Some(sky) = resources.environment("sky") {
            self.state.set_clear_color(sky.average_color());
        }

        let egui = &mut self.state.egui_renderer;
        self.textures.flame = resources
            .texture("flame")
            .map(|t| egui.load_texture("flame", t));
        self.textures.info_bg = resources
            .texture("infoBg")
            .map(|t| egui.load_texture("info-bg", t));
        self.textures.temperature = resources
            .texture("temperature")
            .map(|t| egui.load_texture("temperature", t));
        for name in ["red", "green", "yellow", "black"] {
            if let Some(texture) = resources.texture_in("beans", name) {
                let handle = egui.load_texture(&format!("beans-{name}"), texture);
                self.textures.beans.insert(name.to_string(), handle);
            }
        }

        let hud = self.hud_table.take().unwrap_or_default();
        let scene = FarmScene::assemble(resources, hud, self.seed);
        if let Some(bounds) = scene.registry().bounds() {
            self.camera.fit(
                Vec2::new(bounds.min.x, bounds.min.z),
                Vec2::new(bounds.max.x, bounds.max.z),
                Self::FIT_MARGIN,
            );
        }
        self.scene = Some(scene);
    }

    /// Arrête les animations et les minuteries de la scène avant la fermeture.
    pub fn shutdown(&mut self) {
        if let Some(scene) = self.scene.as_mut() {
            scene.stop();
            log::info!("scene stopped");
        }
    }

    fn process_continuous_movement(&mut self, delta_time: f32) {
        for key in self.state.pressed_keys() {
            let direction = match key {
                KeyCode::KeyW | KeyCode::ArrowUp => Some(MapMovement::Up),
                KeyCode::KeyS | KeyCode::ArrowDown => Some(MapMovement::Down),
                KeyCode::KeyA | KeyCode::ArrowLeft => Some(MapMovement::Left),
                KeyCode::KeyD | KeyCode::ArrowRight => Some(MapMovement::Right),
                _ => None,
            };
            if let Some(dir) = direction {
                self.camera.process_movement(dir, delta_time);
            }
        }
    }

    fn draw_map(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                self.camera.set_viewport_size(rect.width(), rect.height());
                let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());

                if response.dragged() {
                    let delta = response.drag_delta();
                    self.camera.pan_pixels(delta.x, delta.y);
                }
                if response.hovered() {
                    let scroll = ui.input(|i| i.smooth_scroll_delta.y);
                    if scroll != 0.0 {
                        self.camera.zoom_by((scroll * 0.002).exp());
                    }
                }

                let Some(scene) = self.scene.as_mut() else {
                    return;
                };
                if response.clicked()
                    && let Some(pos) = response.interact_pointer_pos()
                {
                    let local = pos - rect.min;
                    let world = self.camera.screen_to_world(local.x, local.y);
                    scene.click(world.x, world.y);
                }

                let painter = ui.painter_at(rect);
                draw_farm(&painter, &self.camera, scene, &self.textures);
            });
    }

    fn draw_stats(&self, ctx: &egui::Context) {
        let Some(scene) = &self.scene else {
            return;
        };
        egui::Area::new(egui::Id::new("stats"))
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(8.0, 8.0))
            .show(ctx, |ui| {
                ui.label(format!("{:.0} fps", self.delta_timer.fps()));
                ui.label(format!("fires: {}", scene.fires.active_count()));
            });
    }
}

impl Window for FarmWindow {
    fn window(&self) -> &Arc<winit::window::Window> {
        &self.window
    }

    fn state(&self) -> &WindowState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut WindowState {
        &mut self.state
    }

    fn update(&mut self) {
        let delta_time = self.delta_timer.update();

        self.poll_loading();
        self.loading.advance(delta_time);
        self.process_continuous_movement(delta_time);

        if let Some(scene) = self.scene.as_mut() {
            scene.advance(delta_time);
        }
    }

    fn draw(&mut self, ctx: &egui::Context) {
        self.draw_map(ctx);
        self.draw_stats(ctx);

        if let Some(hud) = self.scene.as_ref().and_then(|s| s.inspector.hud()) {
            draw_hud(ctx, &self.camera, hud, &self.textures);
        }
        if self.loading.is_visible() {
            draw_loading(ctx, &self.loading);
        }
    }

    fn handle_resized(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.state.resize_surface(width, height);

            let scale = self.window.scale_factor() as f32;
            self.camera
                .set_viewport_size(width as f32 / scale, height as f32 / scale);
        }
    }
}
