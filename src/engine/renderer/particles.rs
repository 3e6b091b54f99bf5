// Particle rendering using instanced point sprites

use crate::core::math::Vector2D;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

/// Vertices per particle quad (two triangles, generated in the shader)
const QUAD_VERTICES: u32 = 6;

/// Instance buffer capacity allocated up front, in particles
const INITIAL_CAPACITY: usize = 2048;

/// Uniforms for the particle shader
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ParticleUniform {
    /// Pixel space to clip space
    pub ndc: [[f32; 4]; 4],
    /// Pixels per simulation meter
    pub ptm_ratio: f32,
    /// Sprite radius in pixels
    pub radius: f32,
    _pad: [f32; 2],
}

impl ParticleUniform {
    pub fn new(ndc: Mat4, ptm_ratio: f32, radius: f32) -> Self {
        Self {
            ndc: ndc.to_cols_array_2d(),
            ptm_ratio,
            radius,
            _pad: [0.0; 2],
        }
    }
}

/// Draws every particle position as a filled circle
pub struct ParticleRenderer {
    pipeline: wgpu::RenderPipeline,
    instance_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    instance_count: u32,
}

impl ParticleRenderer {
    /// Create a new particle renderer
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        uniform: ParticleUniform,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/particle.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vector2D>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x2,
                    }],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Instance Buffer"),
            size: instance_bytes(INITIAL_CAPACITY),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pipeline,
            instance_buffer,
            uniform_buffer,
            bind_group,
            instance_count: 0,
        }
    }

    /// Replace the uniforms, e.g. after a resize
    pub fn update_uniform(&self, queue: &wgpu::Queue, uniform: ParticleUniform) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Upload this frame's particle positions
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, positions: &[Vector2D]) {
        self.instance_count = positions.len() as u32;
        if positions.is_empty() {
            return;
        }

        if instance_bytes(positions.len()) > self.instance_buffer.size() {
            self.instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Particle Instance Buffer"),
                contents: bytemuck::cast_slice(positions),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        } else {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(positions));
        }
    }

    /// Render the particles
    pub fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        if self.instance_count == 0 {
            return;
        }

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        render_pass.draw(0..QUAD_VERTICES, 0..self.instance_count);
    }
}

fn instance_bytes(count: usize) -> wgpu::BufferAddress {
    (count * std::mem::size_of::<Vector2D>()) as wgpu::BufferAddress
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<ParticleUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<ParticleUniform>(), 80);
    }

    #[test]
    fn test_positions_cast_to_float_pairs() {
        let positions = [Vector2D::new(1.0, 2.0), Vector2D::new(3.0, 4.0)];
        let floats: &[f32] = bytemuck::cast_slice(&positions);
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(instance_bytes(positions.len()), 16);
    }
}
