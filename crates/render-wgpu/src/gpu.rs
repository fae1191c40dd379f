use std::collections::HashMap;
use std::num::NonZeroU64;

use arena_render::{
    BlendMode, LightKind, MeshHandle, ProgramId, ProgramTable, RenderDevice, TextureHandle,
    TextureUnit, Uniform, Viewport,
};
use glam::Vec4;
use wgpu::util::DeviceExt;

use crate::assets::{MeshData, TextureData, Vertex};
use crate::frame::{FrameCommand, FrameRecorder, Rect};
use crate::shaders;
use crate::uniforms::{DrawUniforms, aligned_stride};

/// Errors from creating GPU resources.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("shader module `{label}` failed to compile: {message}")]
    ShaderCompile { label: &'static str, message: String },
    #[error("{kind:?} light program failed to link: {message}")]
    ProgramLink { kind: LightKind, message: String },
    #[error("texture {width}x{height} has {len} bytes of data")]
    InvalidTexture { width: u32, height: u32, len: usize },
}

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Opaque and additive variants of one light kind's pipeline.
struct LightProgram {
    opaque: wgpu::RenderPipeline,
    additive: wgpu::RenderPipeline,
}

impl LightProgram {
    fn pipeline(&self, blend: BlendMode) -> &wgpu::RenderPipeline {
        match blend {
            BlendMode::Opaque => &self.opaque,
            BlendMode::Additive => &self.additive,
        }
    }
}

/// wgpu implementation of the render device.
///
/// Device calls are recorded during a frame and replayed in a single render
/// pass by `submit`. Resources live for the whole session.
pub struct WgpuDevice {
    recorder: FrameRecorder,
    lighting_shader: wgpu::ShaderModule,
    light_layout: wgpu::PipelineLayout,
    texture_layout: wgpu::BindGroupLayout,
    uniform_layout: wgpu::BindGroupLayout,
    clear_pipeline: wgpu::RenderPipeline,
    programs: Vec<LightProgram>,
    meshes: Vec<GpuMesh>,
    textures: Vec<wgpu::TextureView>,
    sampler: wgpu::Sampler,
    material_groups: HashMap<[TextureHandle; 5], wgpu::BindGroup>,
    uniform_buffer: wgpu::Buffer,
    uniform_group: wgpu::BindGroup,
    uniform_capacity: u64,
    uniform_stride: u64,
    depth_view: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuDevice {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, GpuError> {
        let lighting_shader = compile(device, "lighting_shader", shaders::LIGHTING_SHADER)?;
        let clear_shader = compile(device, "clear_shader", shaders::CLEAR_SHADER)?;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_uniform_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<DrawUniforms>() as u64),
                },
                count: None,
            }],
        });

        let mut texture_entries: Vec<wgpu::BindGroupLayoutEntry> = TextureUnit::ALL
            .iter()
            .map(|unit| wgpu::BindGroupLayoutEntry {
                binding: unit.index() as u32,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            })
            .collect();
        texture_entries.push(wgpu::BindGroupLayoutEntry {
            binding: TextureUnit::ALL.len() as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_texture_layout"),
            entries: &texture_entries,
        });

        let light_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("light_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let clear_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("clear_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let clear_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("clear_pipeline"),
            layout: Some(&clear_layout),
            vertex: wgpu::VertexState {
                module: &clear_shader,
                entry_point: Some("vs_clear"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &clear_shader,
                entry_point: Some("fs_clear"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride = aligned_stride(std::mem::size_of::<DrawUniforms>() as u64, alignment);
        let uniform_capacity = 256;
        let (uniform_buffer, uniform_group) =
            create_uniform_storage(device, &uniform_layout, uniform_stride, uniform_capacity);

        tracing::info!(?surface_format, width, height, uniform_stride, "wgpu device ready");

        Ok(Self {
            recorder: FrameRecorder::new(width, height),
            lighting_shader,
            light_layout,
            texture_layout,
            uniform_layout,
            clear_pipeline,
            programs: Vec::new(),
            meshes: Vec::new(),
            textures: Vec::new(),
            sampler,
            material_groups: HashMap::new(),
            uniform_buffer,
            uniform_group,
            uniform_capacity,
            uniform_stride,
            depth_view: create_depth_view(device, width, height),
            surface_format,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_view = create_depth_view(device, width, height);
        self.recorder.set_target(width, height);
    }

    /// Build the opaque and additive pipelines for one light kind.
    ///
    /// Validation runs inside an error scope so a bad program is reported as
    /// `GpuError::ProgramLink` instead of aborting the process.
    pub fn create_program(
        &mut self,
        device: &wgpu::Device,
        kind: LightKind,
    ) -> Result<ProgramId, GpuError> {
        let entry_point = shaders::LIGHT_ENTRY_POINTS[kind.index()];
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let opaque = self.light_pipeline(device, kind, entry_point, BlendMode::Opaque);
        let additive = self.light_pipeline(device, kind, entry_point, BlendMode::Additive);
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::ProgramLink {
                kind,
                message: error.to_string(),
            });
        }
        self.programs.push(LightProgram { opaque, additive });
        let id = ProgramId(self.programs.len() as u32 - 1);
        tracing::debug!(kind = kind.label(), program = id.0, "light program linked");
        Ok(id)
    }

    /// One program per light kind.
    pub fn create_programs(&mut self, device: &wgpu::Device) -> Result<ProgramTable, GpuError> {
        let mut table = ProgramTable::new();
        for kind in LightKind::ALL {
            let id = self.create_program(device, kind)?;
            table.insert(kind, id);
        }
        Ok(table)
    }

    fn light_pipeline(
        &self,
        device: &wgpu::Device,
        kind: LightKind,
        entry_point: &str,
        blend: BlendMode,
    ) -> wgpu::RenderPipeline {
        let (color_blend, depth_write) = match blend {
            BlendMode::Opaque => (wgpu::BlendState::REPLACE, true),
            BlendMode::Additive => {
                let add = wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                };
                (
                    wgpu::BlendState {
                        color: add,
                        alpha: add,
                    },
                    false,
                )
            }
        };
        let label = format!("{}_{:?}_pipeline", kind.label(), blend).to_lowercase();
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&self.light_layout),
            vertex: wgpu::VertexState {
                module: &self.lighting_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Float32x2,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.lighting_shader,
                entry_point: Some(entry_point),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.surface_format,
                    blend: Some(color_blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: depth_write,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    pub fn upload_mesh(&mut self, device: &wgpu::Device, mesh: &MeshData) -> MeshHandle {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertex_buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_index_buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.meshes.push(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        });
        MeshHandle(self.meshes.len() as u32 - 1)
    }

    pub fn upload_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &TextureData,
    ) -> Result<TextureHandle, GpuError> {
        if !data.is_valid() {
            return Err(GpuError::InvalidTexture {
                width: data.width,
                height: data.height,
                len: data.rgba.len(),
            });
        }
        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("material_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * data.width),
                rows_per_image: Some(data.height),
            },
            size,
        );
        self.textures.push(texture.create_view(&Default::default()));
        Ok(TextureHandle(self.textures.len() as u32 - 1))
    }

    /// Replay the recorded frame into `target` and clear the recording.
    /// Returns the number of draw calls issued.
    pub fn submit(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
    ) -> u32 {
        let commands = self.recorder.commands().to_vec();
        self.upload_blocks(device, queue);
        for command in &commands {
            if let FrameCommand::Draw { textures, .. } = command {
                self.ensure_material_group(device, *textures);
            }
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("arena_frame_encoder"),
        });
        let mut draws = 0;
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("arena_light_passes"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            for command in &commands {
                match *command {
                    FrameCommand::Clear { rect, block } => {
                        pass.set_pipeline(&self.clear_pipeline);
                        pass.set_bind_group(0, &self.uniform_group, &[self.block_offset(block)]);
                        set_rect(&mut pass, rect, rect);
                        pass.draw(0..3, 0..1);
                    }
                    FrameCommand::Draw {
                        program,
                        blend,
                        viewport,
                        scissor,
                        block,
                        textures,
                        mesh,
                    } => {
                        let Some(light_program) = self.programs.get(program.0 as usize) else {
                            tracing::warn!(program = program.0, "unknown program, draw skipped");
                            continue;
                        };
                        let Some(gpu_mesh) = self.meshes.get(mesh.0 as usize) else {
                            tracing::warn!(mesh = mesh.0, "unknown mesh, draw skipped");
                            continue;
                        };
                        let Some(material_group) = self.material_groups.get(&textures) else {
                            continue;
                        };
                        pass.set_pipeline(light_program.pipeline(blend));
                        pass.set_bind_group(0, &self.uniform_group, &[self.block_offset(block)]);
                        pass.set_bind_group(1, material_group, &[]);
                        set_rect(&mut pass, viewport, scissor);
                        pass.set_vertex_buffer(0, gpu_mesh.vertex_buffer.slice(..));
                        pass.set_index_buffer(
                            gpu_mesh.index_buffer.slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        pass.draw_indexed(0..gpu_mesh.index_count, 0, 0..1);
                        draws += 1;
                    }
                }
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
        self.recorder.reset();
        draws
    }

    fn block_offset(&self, block: usize) -> u32 {
        (block as u64 * self.uniform_stride) as u32
    }

    /// Write every recorded uniform block at its aligned offset, growing the
    /// buffer when the frame needs more slots.
    fn upload_blocks(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let needed = self.recorder.blocks().len() as u64;
        if needed == 0 {
            return;
        }
        if needed > self.uniform_capacity {
            let capacity = needed.next_power_of_two();
            let (buffer, group) =
                create_uniform_storage(device, &self.uniform_layout, self.uniform_stride, capacity);
            self.uniform_buffer = buffer;
            self.uniform_group = group;
            self.uniform_capacity = capacity;
            tracing::debug!(capacity, "uniform buffer grown");
        }

        let blocks = self.recorder.blocks();
        let stride = self.uniform_stride as usize;
        let block_size = std::mem::size_of::<DrawUniforms>();
        let mut bytes = vec![0u8; blocks.len() * stride];
        for (i, block) in blocks.iter().enumerate() {
            bytes[i * stride..i * stride + block_size].copy_from_slice(bytemuck::bytes_of(block));
        }
        queue.write_buffer(&self.uniform_buffer, 0, &bytes);
    }

    fn ensure_material_group(&mut self, device: &wgpu::Device, textures: [TextureHandle; 5]) {
        if self.material_groups.contains_key(&textures) {
            return;
        }
        let mut views = Vec::with_capacity(textures.len());
        for handle in textures {
            match self.textures.get(handle.0 as usize) {
                Some(view) => views.push(view),
                None => {
                    tracing::warn!(texture = handle.0, "unknown texture handle, draw skipped");
                    return;
                }
            }
        }
        let mut entries: Vec<wgpu::BindGroupEntry> = views
            .iter()
            .enumerate()
            .map(|(binding, view)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: TextureUnit::ALL.len() as u32,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        });
        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material_bind_group"),
            layout: &self.texture_layout,
            entries: &entries,
        });
        self.material_groups.insert(textures, group);
    }
}

impl RenderDevice for WgpuDevice {
    fn enable_scissor(&mut self, enabled: bool) {
        self.recorder.enable_scissor(enabled);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.recorder.set_viewport(viewport);
    }

    fn clear(&mut self, color: Vec4, depth: f32) {
        self.recorder.clear(color, depth);
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.recorder.set_blend(mode);
    }

    fn use_program(&mut self, program: ProgramId) {
        self.recorder.use_program(program);
    }

    fn set_uniform(&mut self, name: &str, value: Uniform) {
        self.recorder.set_uniform(name, value);
    }

    fn bind_texture(&mut self, unit: TextureUnit, texture: TextureHandle) {
        self.recorder.bind_texture(unit, texture);
    }

    fn draw(&mut self, mesh: MeshHandle) {
        self.recorder.draw(mesh);
    }
}

fn compile(
    device: &wgpu::Device,
    label: &'static str,
    source: &str,
) -> Result<wgpu::ShaderModule, GpuError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(GpuError::ShaderCompile {
            label,
            message: error.to_string(),
        }),
        None => Ok(module),
    }
}

fn set_rect(pass: &mut wgpu::RenderPass<'_>, viewport: Rect, scissor: Rect) {
    pass.set_viewport(
        viewport.x as f32,
        viewport.y as f32,
        viewport.width as f32,
        viewport.height as f32,
        0.0,
        1.0,
    );
    pass.set_scissor_rect(scissor.x, scissor.y, scissor.width, scissor.height);
}

fn create_uniform_storage(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: u64,
    capacity: u64,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("draw_uniform_buffer"),
        size: stride * capacity,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("draw_uniform_bind_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: NonZeroU64::new(std::mem::size_of::<DrawUniforms>() as u64),
            }),
        }],
    });
    (buffer, group)
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
