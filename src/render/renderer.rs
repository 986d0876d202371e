use std::{
    collections::HashMap,
    sync::mpsc::{self, Receiver, Sender},
    time::{Duration, Instant},
};

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use super::{
    atlas,
    camera::{Camera, Projection},
    context::RenderContext,
    util::{
        bind_group_builder::BindGroupBuilder,
        mesh::{Mesh, MeshData},
        pipeline_builder::RenderPipelineBuilder,
        texture::{DepthTexture, ImageTexture, TextureHolder, WithViewAndSampler},
    },
};
use crate::{
    chunk::{ChunkPos, HEIGHT, SIZE},
    config::EngineConfig,
    core::tasks::{TaskPriority, Tasks},
    error::EngineError,
    mesher::{self, ChunkMeshInput, ChunkVertex},
    util::DEGREE,
    world::World,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const DEPTH_COMPARE: wgpu::CompareFunction = wgpu::CompareFunction::Less;

/// Priority class used for mesh-build tasks, distinct from world generation's class so the two
/// never interleave within a worker's queue.
const MESH_BUILD_PRIORITY: i32 = 1;
/// New mesh enqueues allowed per `update` call.
const MAX_ENQUEUES_PER_FRAME: usize = 8;
/// Total in-flight (queued or building) meshes allowed before new enqueues stop.
const MAX_QUEUE_LEN: usize = 10;
/// A worker whose build exceeds this is treated as having timed out; the chunk is left
/// mesh-dirty so it gets re-queued on a later frame.
const MESH_BUILD_TIMEOUT: Duration = Duration::from_millis(500);
/// Per-frame wall-clock budget for draining completed mesh builds.
const UPLOAD_BUDGET: Duration = Duration::from_millis(1);
/// Uploads applied per frame, on top of the time budget above.
const MAX_UPLOADS_PER_FRAME: usize = 1;
/// Chunks farther than `render_distance * FRUSTUM_CULL_FACTOR` chunk units from the camera are
/// skipped entirely during draw.
const FRUSTUM_CULL_FACTOR: f32 = 1.2;
/// Fixed per-frame advance applied to the water animation clock, independent of real frame time.
const WATER_TIME_STEP: f32 = 1.0 / 60.0;

enum BuildOutcome {
    Built(MeshData<ChunkVertex, u32>),
    Failed,
}

struct MeshBuildResult {
    chunk_pos: ChunkPos,
    outcome: BuildOutcome,
}

struct ChunkGpuMesh {
    mesh: Mesh,
    model_bind_group: wgpu::BindGroup,
    _model_buffer: wgpu::Buffer,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct CommonUniforms {
    view: [f32; 16],
    projection: [f32; 16],
    time: f32,
    /// Water animation frames advanced per unit of `time`; `config.water_animation_fps`.
    water_frame_rate: f32,
    _padding: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct ChunkUniforms {
    model: [f32; 16],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct PassUniforms {
    render_pass: u32,
    _padding: [u32; 3],
}

/// Orchestrates background chunk meshing, budgeted GPU uploads, and the two-pass
/// opaque-then-transparent terrain draw.
pub struct Renderer {
    depth_texture: WithViewAndSampler<DepthTexture>,
    common_uniforms: CommonUniforms,
    common_uniforms_buffer: wgpu::Buffer,
    common_uniforms_bind_group: wgpu::BindGroup,
    atlas: WithViewAndSampler<ImageTexture>,
    atlas_bind_group: wgpu::BindGroup,
    chunk_uniform_layout: wgpu::BindGroupLayout,
    opaque_pass_bind_group: wgpu::BindGroup,
    transparent_pass_bind_group: wgpu::BindGroup,
    opaque_pipeline: wgpu::RenderPipeline,
    transparent_pipeline: wgpu::RenderPipeline,
    camera: Camera,
    water_time: f32,
    chunk_meshes: HashMap<ChunkPos, ChunkGpuMesh>,
    meshing_count: usize,
    pending_uploads: Vec<(ChunkPos, MeshData<ChunkVertex, u32>)>,
    build_tx: Sender<MeshBuildResult>,
    build_rx: Receiver<MeshBuildResult>,
}

impl Renderer {
    pub fn new(
        cx: &RenderContext,
        tiles_dir: impl AsRef<std::path::Path>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let window_size =
            winit::dpi::PhysicalSize::new(cx.surface_config.width, cx.surface_config.height);

        let depth_texture = DepthTexture::new(
            &cx.device,
            window_size,
            DEPTH_FORMAT,
            DEPTH_COMPARE,
            Some("Depth Texture"),
        )
        .with_view_and_sampler(
            &cx.device,
            wgpu::SamplerDescriptor {
                label: None,
                compare: Some(wgpu::CompareFunction::Less),
                ..Default::default()
            },
        );

        let common_uniforms = CommonUniforms {
            water_frame_rate: config.water_animation_fps,
            ..Default::default()
        };
        let common_uniforms_buffer = cx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Common Uniform Buffer"),
            size: std::mem::size_of::<CommonUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let (common_uniforms_bind_group, common_uniforms_layout) = BindGroupBuilder::new()
            .with_label("Common Uniforms")
            .with_uniform_buffer(&common_uniforms_buffer, wgpu::ShaderStages::all())
            .build(&cx.device);

        let atlas = atlas::build_atlas(&cx.device, &cx.queue, tiles_dir)?.with_view_and_sampler(
            &cx.device,
            wgpu::SamplerDescriptor {
                label: Some("Atlas Sampler"),
                mag_filter: wgpu::FilterMode::Nearest,
                min_filter: wgpu::FilterMode::Nearest,
                address_mode_u: wgpu::AddressMode::Repeat,
                address_mode_v: wgpu::AddressMode::Repeat,
                ..Default::default()
            },
        );
        let (atlas_bind_group, atlas_layout) = BindGroupBuilder::new()
            .with_label("Atlas")
            .with_texture_view(
                atlas.view(),
                wgpu::TextureViewDimension::D2,
                wgpu::TextureSampleType::Float { filterable: true },
                wgpu::ShaderStages::FRAGMENT,
            )
            .with_sampler(
                atlas.sampler(),
                wgpu::SamplerBindingType::Filtering,
                wgpu::ShaderStages::FRAGMENT,
            )
            .build(&cx.device);

        let chunk_uniform_layout =
            cx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Chunk Uniforms Layout"),
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

        let (opaque_pass_bind_group, pass_layout) =
            make_pass_bind_group(&cx.device, 0, "Opaque Pass Uniforms");
        let (transparent_pass_bind_group, _) =
            make_pass_bind_group(&cx.device, 1, "Transparent Pass Uniforms");

        let shader = cx
            .device
            .create_shader_module(wgpu::include_wgsl!("../../shaders/terrain.wgsl"));

        let opaque_pipeline = RenderPipelineBuilder::new()
            .with_label("Terrain Opaque Pipeline")
            .with_bind_group_layout(&common_uniforms_layout)
            .with_bind_group_layout(&chunk_uniform_layout)
            .with_bind_group_layout(&atlas_layout)
            .with_bind_group_layout(&pass_layout)
            .with_vertex::<ChunkVertex>()
            .with_vertex_shader(&shader, "vs_main")
            .with_fragment_shader(&shader, "fs_main")
            .with_color_target(cx.surface_config.format, None, wgpu::ColorWrites::all())
            .with_depth(DEPTH_FORMAT, DEPTH_COMPARE)
            .build(&cx.device)
            .0;

        let transparent_pipeline = RenderPipelineBuilder::new()
            .with_label("Terrain Transparent Pipeline")
            .with_bind_group_layout(&common_uniforms_layout)
            .with_bind_group_layout(&chunk_uniform_layout)
            .with_bind_group_layout(&atlas_layout)
            .with_bind_group_layout(&pass_layout)
            .with_vertex::<ChunkVertex>()
            .with_vertex_shader(&shader, "vs_main")
            .with_fragment_shader(&shader, "fs_main")
            .with_color_target(
                cx.surface_config.format,
                Some(wgpu::BlendState::ALPHA_BLENDING),
                wgpu::ColorWrites::all(),
            )
            .with_depth(DEPTH_FORMAT, wgpu::CompareFunction::Less)
            .build(&cx.device)
            .0;

        let camera = Camera::new(
            crate::util::transform::Transform::IDENTITY,
            Projection::Perspective {
                aspect_ratio: window_size.width as f32 / window_size.height as f32,
                fov_y_radians: 70.0 * DEGREE,
                z_near: 0.01,
                z_far: 1000.0,
            },
        );

        let (build_tx, build_rx) = mpsc::channel();

        Ok(Self {
            depth_texture,
            common_uniforms,
            common_uniforms_buffer,
            common_uniforms_bind_group,
            atlas,
            atlas_bind_group,
            chunk_uniform_layout,
            opaque_pass_bind_group,
            transparent_pass_bind_group,
            opaque_pipeline,
            transparent_pipeline,
            camera,
            water_time: 0.0,
            chunk_meshes: HashMap::new(),
            meshing_count: 0,
            pending_uploads: Vec::new(),
            build_tx,
            build_rx,
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn resized(&mut self, cx: &RenderContext) {
        let window_size =
            winit::dpi::PhysicalSize::new(cx.surface_config.width, cx.surface_config.height);

        let new_depth = self
            .depth_texture
            .recreate(&cx.device, window_size)
            .with_view_and_sampler(&cx.device, self.depth_texture.sampler_descriptor().clone());
        self.depth_texture = new_depth;
        self.camera.resized(window_size);
    }

    /// Advances the water clock, streams the world, enqueues newly-dirty chunks for meshing, and
    /// pulls a budgeted number of completed builds off the result channel. Uploads to the GPU are
    /// deferred to `render`, which is the only place a command encoder is available.
    pub fn update(&mut self, tasks: &mut Tasks, world: &mut World) {
        self.water_time += WATER_TIME_STEP;

        world.update(tasks, self.camera.pos());

        self.enqueue_dirty_chunks(tasks, world);
        self.drain_build_results(world);
    }

    fn enqueue_dirty_chunks(&mut self, tasks: &mut Tasks, world: &mut World) {
        if self.meshing_count >= MAX_QUEUE_LEN {
            return;
        }

        let camera_pos = self.camera.pos();
        let mut candidates: Vec<(ChunkPos, f32)> = world
            .chunks()
            .filter(|chunk| chunk.flags().is_mesh_dirty && !chunk.flags().is_meshing)
            .map(|chunk| {
                let distance = chunk_center(chunk.position()).distance(camera_pos);
                (chunk.position(), distance)
            })
            .collect();
        candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

        let room = MAX_QUEUE_LEN - self.meshing_count;
        let enqueue_count = candidates.len().min(MAX_ENQUEUES_PER_FRAME).min(room);

        for (chunk_pos, distance) in candidates.into_iter().take(enqueue_count) {
            let input = {
                let chunk = world.get_chunk(chunk_pos).expect("just scanned from world");
                ChunkMeshInput::capture(chunk, world)
            };
            world
                .get_chunk_mut(chunk_pos)
                .expect("chunk still loaded")
                .set_meshing(true);
            self.meshing_count += 1;

            let tx = self.build_tx.clone();
            tasks.submit(
                TaskPriority {
                    class_priority: MESH_BUILD_PRIORITY,
                    priority_within_class: distance as i32,
                },
                move || {
                    let start = Instant::now();
                    let built = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        mesher::build_mesh(&input)
                    }));
                    let elapsed = start.elapsed();

                    let outcome = match built {
                        Ok(mesh_data) if elapsed <= MESH_BUILD_TIMEOUT => {
                            BuildOutcome::Built(mesh_data)
                        }
                        Ok(_) => {
                            log::warn!(
                                "mesh build for {:?} timed out after {:?}",
                                chunk_pos,
                                elapsed
                            );
                            BuildOutcome::Failed
                        }
                        Err(_) => {
                            log::error!("mesh build for {:?} panicked", chunk_pos);
                            BuildOutcome::Failed
                        }
                    };

                    let _ = tx.send(MeshBuildResult { chunk_pos, outcome });
                },
            );
        }
    }

    fn drain_build_results(&mut self, world: &mut World) {
        let start = Instant::now();

        while self.pending_uploads.len() < MAX_UPLOADS_PER_FRAME && start.elapsed() < UPLOAD_BUDGET
        {
            let Ok(result) = self.build_rx.try_recv() else {
                break;
            };

            self.meshing_count = self.meshing_count.saturating_sub(1);

            let Some(chunk) = world.get_chunk_mut(result.chunk_pos) else {
                // chunk was unloaded while its mesh was building; drop the result
                continue;
            };
            chunk.set_meshing(false);

            match result.outcome {
                BuildOutcome::Built(mesh_data) => {
                    chunk.set_mesh_dirty(false);
                    self.pending_uploads.push((result.chunk_pos, mesh_data));
                }
                BuildOutcome::Failed => {
                    // left mesh-dirty; will be re-queued on a later frame
                }
            }
        }
    }

    /// Uploads any mesh pulled off the build-result channel since the last frame, then issues the
    /// opaque pass (front-to-back) followed by the transparent pass (back-to-front).
    pub fn render(&mut self, cx: &RenderContext, world: &World, output_view: &wgpu::TextureView) {
        for (chunk_pos, mesh_data) in std::mem::take(&mut self.pending_uploads) {
            self.upload_mesh(cx, chunk_pos, mesh_data);
        }

        self.common_uniforms.view = self.camera.view_matrix().to_cols_array();
        self.common_uniforms.projection = self.camera.projection_matrix().to_cols_array();
        self.common_uniforms.time = self.water_time;
        cx.queue.write_buffer(
            &self.common_uniforms_buffer,
            0,
            bytemuck::cast_slice(&[self.common_uniforms]),
        );

        let camera_pos = self.camera.pos();
        let cull_distance = world.render_distance() as f32 * FRUSTUM_CULL_FACTOR * SIZE as f32;

        let mut visible: Vec<(ChunkPos, f32)> = self
            .chunk_meshes
            .keys()
            .map(|&pos| (pos, chunk_center(pos).distance(camera_pos)))
            .filter(|(_, distance)| *distance <= cull_distance)
            .collect();

        let mut encoder = cx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        visible.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        self.draw_pass(
            &mut encoder,
            output_view,
            &self.opaque_pipeline,
            &self.opaque_pass_bind_group,
            visible.iter().map(|(pos, _)| *pos),
            wgpu::LoadOp::Clear(wgpu::Color {
                r: 0.5,
                g: 0.7,
                b: 0.9,
                a: 1.0,
            }),
        );

        visible.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        self.draw_pass(
            &mut encoder,
            output_view,
            &self.transparent_pipeline,
            &self.transparent_pass_bind_group,
            visible.iter().map(|(pos, _)| *pos),
            wgpu::LoadOp::Load,
        );

        cx.queue.submit(std::iter::once(encoder.finish()));
    }

    fn upload_mesh(
        &mut self,
        cx: &RenderContext,
        chunk_pos: ChunkPos,
        mesh_data: MeshData<ChunkVertex, u32>,
    ) {
        let mesh = mesh_data.create_mesh(&cx.device);

        let model = Mat4::from_translation(chunk_world_origin(chunk_pos));
        let model_buffer = cx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Chunk Model Uniform"),
                contents: bytemuck::cast_slice(&[ChunkUniforms {
                    model: model.to_cols_array(),
                }]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let model_bind_group = cx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Chunk Model Bind Group"),
            layout: &self.chunk_uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
        });

        self.chunk_meshes.insert(
            chunk_pos,
            ChunkGpuMesh {
                mesh,
                model_bind_group,
                _model_buffer: model_buffer,
            },
        );
    }

    fn draw_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output_view: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        pass_bind_group: &wgpu::BindGroup,
        order: impl Iterator<Item = ChunkPos>,
        load_op: wgpu::LoadOp<wgpu::Color>,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Terrain Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: load_op,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.depth_texture.view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &self.common_uniforms_bind_group, &[]);
        render_pass.set_bind_group(2, &self.atlas_bind_group, &[]);
        render_pass.set_bind_group(3, pass_bind_group, &[]);

        for chunk_pos in order {
            let Some(gpu_mesh) = self.chunk_meshes.get(&chunk_pos) else {
                continue;
            };
            if gpu_mesh.mesh.index_count() == 0 {
                continue;
            }

            render_pass.set_bind_group(1, &gpu_mesh.model_bind_group, &[]);
            render_pass.set_vertex_buffer(0, gpu_mesh.mesh.vertex_buffer().slice(..));
            render_pass.set_index_buffer(
                gpu_mesh.mesh.index_buffer().slice(..),
                gpu_mesh.mesh.index_format(),
            );
            render_pass.draw_indexed(0..gpu_mesh.mesh.index_count(), 0, 0..1);
        }
    }
}

fn chunk_world_origin(pos: ChunkPos) -> Vec3 {
    pos.as_vec3() * Vec3::new(SIZE as f32, HEIGHT as f32, SIZE as f32)
}

fn chunk_center(pos: ChunkPos) -> Vec3 {
    chunk_world_origin(pos) + Vec3::new(SIZE as f32, HEIGHT as f32, SIZE as f32) * 0.5
}

fn make_pass_bind_group(
    device: &wgpu::Device,
    render_pass: u32,
    label: &'static str,
) -> (wgpu::BindGroup, wgpu::BindGroupLayout) {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&[PassUniforms {
            render_pass,
            _padding: [0; 3],
        }]),
        usage: wgpu::BufferUsages::UNIFORM,
    });

    BindGroupBuilder::new()
        .with_label(label)
        .with_uniform_buffer(&buffer, wgpu::ShaderStages::FRAGMENT)
        .build(device)
}
