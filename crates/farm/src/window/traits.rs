use std::sync::Arc;

use egui_wgpu::{ScreenDescriptor, wgpu};

use super::WindowState;

/// Fenêtre applicative : l'implémentation fournit la logique de frame et l'interface egui,
/// le trait fournit la boucle de rendu (overlay sur fond de ciel, présentation).
pub trait Window {
    fn window(&self) -> &Arc<winit::window::Window>;
    fn state(&self) -> &WindowState;
    fn state_mut(&mut self) -> &mut WindowState;

    /// Logique de la frame, avant tout dessin.
    fn update(&mut self);
    fn draw(&mut self, ctx: &egui::Context);

    fn id(&self) -> winit::window::WindowId {
        self.window().id()
    }

    fn request_redraw(&self) {
        self.window().request_redraw();
    }

    fn is_minimized(&self) -> bool {
        self.window().is_minimized().unwrap_or(false)
    }

    fn handle_resized(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.state_mut().resize_surface(width, height);
        }
    }

    fn handle_redraw(&mut self) {
        let window = Arc::clone(self.window());

        self.update();

        if self.is_minimized() {
            window.request_redraw();
            return;
        }

        let (width, height) = {
            let config = &self.state().config;
            (config.width, config.height)
        };

        let surface_texture = match self.state().surface.get_current_texture() {
            Ok(tex) => tex,
            Err(wgpu::SurfaceError::Outdated) => return,
            Err(wgpu::SurfaceError::Lost) => {
                self.state_mut().resize_surface(width, height);
                return;
            }
            Err(e) => {
                log::error!("surface error: {e:?}");
                return;
            }
        };

        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: window.scale_factor() as f32,
        };

        let mut encoder =
            self.state()
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Farm Frame Encoder"),
                });

        let ctx = {
            let state = self.state_mut();
            state.begin_frame(&window);
            state.egui_context()
        };

        self.draw(&ctx);

        let state = self.state_mut();
        state.end_frame_and_draw(&mut encoder, &window, &surface_view, screen_descriptor);
        state.queue.submit(Some(encoder.finish()));

        surface_texture.present();
        window.request_redraw();
    }
}
