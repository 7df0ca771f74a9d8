//! État GPU de la fenêtre : device/queue/surface wgpu, configuration, overlay egui,
//! et touches maintenues pour le déplacement de la carte.

use std::collections::HashSet;

use anyhow::{Context, Result};
use egui_wgpu::{ScreenDescriptor, wgpu};
use winit::keyboard::KeyCode;
use winit::window::Window as WinitWindow;

use super::{EguiRenderer, FrameTarget};

pub struct WindowState {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    /// Couleur de fond (ciel), remplacée par la moyenne de la carte HDR une fois chargée
    pub clear_color: wgpu::Color,

    pressed_keys: HashSet<KeyCode>,

    pub egui_renderer: EguiRenderer,
}

impl WindowState {
    pub async fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        window: &WinitWindow,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .context("no suitable graphics adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .context("failed to create the graphics device")?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| *f == wgpu::TextureFormat::Bgra8UnormSrgb)
            .or_else(|| caps.formats.first().copied())
            .context("surface reports no texture format")?;

        let present_mode = if caps.present_modes.contains(&wgpu::PresentMode::Mailbox) {
            wgpu::PresentMode::Mailbox
        } else {
            wgpu::PresentMode::Fifo
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let egui_renderer = EguiRenderer::new(&device, config.format, window);

        Ok(Self {
            device,
            queue,
            surface,
            config,
            clear_color: wgpu::Color {
                r: 0.35,
                g: 0.45,
                b: 0.6,
                a: 1.0,
            },
            pressed_keys: HashSet::new(),
            egui_renderer,
        })
    }

    pub fn set_clear_color(&mut self, [r, g, b]: [f32; 3]) {
        self.clear_color = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        };
    }

    pub fn press_key(&mut self, key: KeyCode) {
        self.pressed_keys.insert(key);
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.pressed_keys.remove(&key);
    }

    pub fn pressed_keys(&self) -> impl Iterator<Item = &KeyCode> {
        self.pressed_keys.iter()
    }

    pub fn begin_frame(&mut self, window: &WinitWindow) {
        self.egui_renderer.begin_frame(window);
    }

    pub fn egui_context(&self) -> egui::Context {
        self.egui_renderer.context().clone()
    }

    pub fn end_frame_and_draw(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        window: &WinitWindow,
        window_surface_view: &wgpu::TextureView,
        screen_descriptor: ScreenDescriptor,
    ) {
        self.egui_renderer.end_frame_and_draw(
            window,
            encoder,
            FrameTarget {
                device: &self.device,
                queue: &self.queue,
                view: window_surface_view,
                screen: screen_descriptor,
                sky: self.clear_color,
            },
        );
    }

    pub fn resize_surface(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }
}
