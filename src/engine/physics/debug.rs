use rapier2d::prelude::*;
use wgpu::util::DeviceExt;

use super::DebugData;

/// Debug renderer for physics objects
/// Draws collider outlines (edge box walls, particle discs) as lines in world space
pub struct DebugRenderer {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    vertices: Vec<DebugVertex>,
    indices: Vec<u32>,
    enabled: bool,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct DebugVertex {
    position: [f32; 2],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct DebugUniforms {
    view_proj: [[f32; 4]; 4],
}

const WALL_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.9];
const PARTICLE_COLOR: [f32; 4] = [0.0, 0.5, 1.0, 0.6];
const OTHER_COLOR: [f32; 4] = [1.0, 0.3, 0.3, 0.8];

impl DebugRenderer {
    /// Create a new debug renderer
    ///
    /// `view_proj_matrix` maps simulation units straight to clip space.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        view_proj_matrix: [[f32; 4]; 4],
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Physics Debug Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/debug.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Physics Debug Uniform Buffer"),
            contents: bytemuck::cast_slice(&[DebugUniforms {
                view_proj: view_proj_matrix,
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Physics Debug Bind Group Layout"),
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
            label: Some("Physics Debug Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Physics Debug Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Physics Debug Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<DebugVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        // position
                        wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x2,
                        },
                        // color
                        wgpu::VertexAttribute {
                            offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                            shader_location: 1,
                            format: wgpu::VertexFormat::Float32x4,
                        },
                    ],
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
                topology: wgpu::PrimitiveTopology::LineList,
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

        // Grown on demand in `prepare`
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Physics Debug Vertex Buffer"),
            size: 1024,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Physics Debug Index Buffer"),
            size: 1024,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            uniform_buffer,
            bind_group,
            vertices: Vec::new(),
            indices: Vec::new(),
            enabled: false, // Disabled by default
        }
    }

    /// Enable or disable debug rendering
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Toggle debug rendering, returning the new state
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    /// Check if debug rendering is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Update the view-projection matrix
    pub fn update_view_proj(&self, queue: &wgpu::Queue, view_proj: [[f32; 4]; 4]) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[DebugUniforms { view_proj }]),
        );
    }

    /// Prepare debug geometry for rendering
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &DebugData<'_>) {
        self.vertices.clear();
        self.indices.clear();

        if !self.enabled {
            return;
        }

        for (_handle, collider) in data.colliders.iter() {
            // Collider positions are already absolute, parent body included
            self.draw_collider_shape(collider, collider.position());
        }

        if self.vertices.is_empty() {
            return;
        }

        let vertex_size = (self.vertices.len() * std::mem::size_of::<DebugVertex>()) as u64;
        let index_size = (self.indices.len() * std::mem::size_of::<u32>()) as u64;

        if vertex_size > self.vertex_buffer.size() {
            self.vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Physics Debug Vertex Buffer"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        } else {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));
        }

        if index_size > self.index_buffer.size() {
            self.index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Physics Debug Index Buffer"),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            });
        } else {
            queue.write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&self.indices));
        }
    }

    fn draw_collider_shape(&mut self, collider: &Collider, transform: &Isometry<Real>) {
        let shape = collider.shape();
        if let Some(segment) = shape.as_segment() {
            self.draw_segment(transform, segment.a, segment.b, WALL_COLOR);
        } else if let Some(ball) = shape.as_ball() {
            self.draw_circle(transform, ball.radius, PARTICLE_COLOR);
        } else {
            self.draw_cross(transform, 0.25, OTHER_COLOR);
        }
    }

    fn push_line(&mut self, a: Point<Real>, b: Point<Real>, color: [f32; 4]) {
        let start_idx = self.vertices.len() as u32;
        self.vertices.push(DebugVertex {
            position: [a.x, a.y],
            color,
        });
        self.vertices.push(DebugVertex {
            position: [b.x, b.y],
            color,
        });
        self.indices.push(start_idx);
        self.indices.push(start_idx + 1);
    }

    fn draw_segment(
        &mut self,
        transform: &Isometry<Real>,
        a: Point<Real>,
        b: Point<Real>,
        color: [f32; 4],
    ) {
        self.push_line(transform * a, transform * b, color);
    }

    /// Draw a circle
    fn draw_circle(&mut self, transform: &Isometry<Real>, radius: Real, color: [f32; 4]) {
        // Particles are small; a coarse outline keeps the buffer size reasonable
        const SEGMENTS: u32 = 8;
        let start_idx = self.vertices.len() as u32;

        for i in 0..SEGMENTS {
            let angle = (i as f32 / SEGMENTS as f32) * std::f32::consts::TAU;
            let point = transform * point![angle.cos() * radius, angle.sin() * radius];

            self.vertices.push(DebugVertex {
                position: [point.x, point.y],
                color,
            });

            self.indices.push(start_idx + i);
            self.indices.push(start_idx + (i + 1) % SEGMENTS);
        }
    }

    /// Draw a cross (for unsupported shapes)
    fn draw_cross(&mut self, transform: &Isometry<Real>, size: Real, color: [f32; 4]) {
        self.push_line(
            transform * point![-size, 0.0],
            transform * point![size, 0.0],
            color,
        );
        self.push_line(
            transform * point![0.0, -size],
            transform * point![0.0, size],
            color,
        );
    }

    /// Render the debug geometry
    pub fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        if !self.enabled || self.indices.is_empty() {
            return;
        }

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.indices.len() as u32, 0, 0..1);
    }
}
