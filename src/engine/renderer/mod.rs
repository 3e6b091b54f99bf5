// Rendering system using wgpu

mod camera;
mod particles;

pub use camera::Camera;
pub use particles::{ParticleRenderer, ParticleUniform};

use anyhow::Result;
use log::info;
use std::sync::Arc;
use winit::window::Window;

use crate::core::math::{PixelScale, Vector2D};
use crate::engine::physics::{DebugData, DebugRenderer as PhysicsDebugRenderer};

/// Background colour behind the particles
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 104.0 / 255.0,
    b: 5.0 / 255.0,
    a: 1.0,
};

/// Main renderer responsible for initializing wgpu and coordinating rendering
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    particle_renderer: ParticleRenderer,
    particle_radius: f32,
    camera: Camera,
    physics_debug_renderer: PhysicsDebugRenderer,
}

impl Renderer {
    /// Create a new renderer for the given window
    ///
    /// `particle_radius` is the on-screen sprite radius in pixels.
    pub async fn new(window: Arc<Window>, scale: PixelScale, particle_radius: f32) -> Result<Self> {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface
        let surface = instance.create_surface(window.clone())?;

        // Request adapter
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

        info!("Using GPU: {}", adapter.get_info().name);

        // Request device and queue
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("Surface reports no supported formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let camera = Camera::new(size.width as f32, size.height as f32, scale);

        let particle_renderer = ParticleRenderer::new(
            &device,
            surface_format,
            ParticleUniform::new(camera.screen_proj_matrix(), scale.ratio(), particle_radius),
        );

        // Create physics debug renderer
        let view_proj = camera.world_view_proj_matrix().to_cols_array_2d();
        let physics_debug_renderer = PhysicsDebugRenderer::new(&device, surface_format, view_proj);

        info!(
            "Renderer initialized with {}x{} resolution",
            size.width, size.height
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            particle_renderer,
            particle_radius,
            camera,
            physics_debug_renderer,
        })
    }

    /// Resize the renderer
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.camera
                .resize(new_size.width as f32, new_size.height as f32);

            self.particle_renderer.update_uniform(
                &self.queue,
                ParticleUniform::new(
                    self.camera.screen_proj_matrix(),
                    self.camera.scale().ratio(),
                    self.particle_radius,
                ),
            );
            self.physics_debug_renderer.update_view_proj(
                &self.queue,
                self.camera.world_view_proj_matrix().to_cols_array_2d(),
            );
            info!("Renderer resized to {}x{}", new_size.width, new_size.height);
        }
    }

    /// Render a frame
    pub fn render(&mut self, positions: &[Vector2D], debug: Option<DebugData<'_>>) -> Result<()> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.particle_renderer
            .prepare(&self.device, &self.queue, positions);
        if let Some(data) = debug {
            self.physics_debug_renderer
                .prepare(&self.device, &self.queue, &data);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.particle_renderer.render(&mut render_pass);

            // Render physics debug (if enabled)
            self.physics_debug_renderer.render(&mut render_pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Get a mutable reference to the physics debug renderer
    pub fn physics_debug_renderer_mut(&mut self) -> &mut PhysicsDebugRenderer {
        &mut self.physics_debug_renderer
    }

    /// Current surface size in pixels
    pub fn size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.size
    }
}
