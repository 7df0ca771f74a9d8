//! Overlay egui : toute l'interface de la ferme (carte, étiquettes, HUD, chargement) est
//! dessinée par egui, dans une passe unique qui commence par effacer avec la couleur du ciel.

use std::collections::HashMap;

use egui::epaint::{ClippedPrimitive, textures::TexturesDelta};
use egui::{ColorImage, Context, TextureHandle, TextureOptions};
use egui_wgpu::wgpu::{self, CommandEncoder, Device, Queue, TextureFormat, TextureView};
use egui_wgpu::{Renderer, ScreenDescriptor};
use egui_winit::{EventResponse, State};
use engine::TextureAsset;
use winit::event::WindowEvent;
use winit::window::Window;

/// Cible d'une frame : surface, device et couleur de fond.
pub struct FrameTarget<'a> {
    pub device: &'a Device,
    pub queue: &'a Queue,
    pub view: &'a TextureView,
    pub screen: ScreenDescriptor,
    pub sky: wgpu::Color,
}

pub struct EguiRenderer {
    state: State,
    renderer: Renderer,
    textures: HashMap<String, TextureHandle>,
    frame_started: bool,
}

impl EguiRenderer {
    /// Taille max des textures egui (côté), suffisante pour les images du HUD
    const MAX_TEXTURE_SIDE: usize = 2048;

    pub fn new(device: &Device, surface_format: TextureFormat, window: &Window) -> Self {
        let ctx = Context::default();
        ctx.set_visuals(egui::Visuals::dark());

        let state = State::new(
            ctx,
            egui::viewport::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(Self::MAX_TEXTURE_SIDE),
        );

        Self {
            state,
            renderer: Renderer::new(device, surface_format, None, 1, true),
            textures: HashMap::new(),
            frame_started: false,
        }
    }

    pub fn context(&self) -> &Context {
        self.state.egui_ctx()
    }

    pub fn handle_input(&mut self, window: &Window, event: &WindowEvent) -> EventResponse {
        self.state.on_window_event(window, event)
    }

    /// Envoie une texture décodée à egui (flammes, grains, fond du HUD).
    /// Un nom déjà envoyé réutilise la même texture.
    pub fn load_texture(&mut self, name: &str, texture: &TextureAsset) -> TextureHandle {
        if let Some(handle) = self.textures.get(name) {
            return handle.clone();
        }
        let (width, height) = texture.size();
        let image = ColorImage::from_rgba_unmultiplied(
            [width as usize, height as usize],
            texture.image.as_raw(),
        );
        let handle = self
            .state
            .egui_ctx()
            .load_texture(name, image, TextureOptions::LINEAR);
        self.textures.insert(name.to_string(), handle.clone());
        handle
    }

    pub fn begin_frame(&mut self, window: &Window) {
        let raw_input = self.state.take_egui_input(window);
        self.state.egui_ctx().begin_pass(raw_input);
        self.frame_started = true;
    }

    /// Termine la frame egui et l'enregistre dans `encoder`, fond compris.
    pub fn end_frame_and_draw(
        &mut self,
        window: &Window,
        encoder: &mut CommandEncoder,
        target: FrameTarget<'_>,
    ) {
        if !self.frame_started {
            log::warn!("egui: end_frame_and_draw without begin_frame, frame skipped");
            return;
        }
        self.frame_started = false;

        let ctx = self.state.egui_ctx().clone();
        ctx.set_pixels_per_point(target.screen.pixels_per_point);
        let output = ctx.end_pass();
        self.state
            .handle_platform_output(window, output.platform_output);
        let primitives = ctx.tessellate(output.shapes, target.screen.pixels_per_point);

        self.upload_textures(&target, &output.textures_delta);
        self.renderer.update_buffers(
            target.device,
            target.queue,
            encoder,
            &primitives,
            &target.screen,
        );
        self.paint(encoder, &target, &primitives);
        self.free_textures(&output.textures_delta);
    }

    fn upload_textures(&mut self, target: &FrameTarget<'_>, delta: &TexturesDelta) {
        for (id, image_delta) in &delta.set {
            self.renderer
                .update_texture(target.device, target.queue, *id, image_delta);
        }
    }

    fn free_textures(&mut self, delta: &TexturesDelta) {
        for id in &delta.free {
            self.renderer.free_texture(id);
        }
    }

    fn paint(
        &self,
        encoder: &mut CommandEncoder,
        target: &FrameTarget<'_>,
        primitives: &[ClippedPrimitive],
    ) {
        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("farm pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(target.sky),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.renderer
            .render(&mut pass.forget_lifetime(), primitives, &target.screen);
    }
}
