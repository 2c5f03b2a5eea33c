// engine renderer

use std::collections::HashMap;
use std::time::Instant;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use glyphon::{Attrs, Buffer, Family, FontSystem, Metrics, Resolution, Shaping, SwashCache, TextArea, TextAtlas, TextBounds, TextRenderer as GlyphRenderer};
use wgpu::util::DeviceExt;
use winit::window::Window;
use crate::backend::{DrawStyle, MeshHandle, RenderBackend};
use crate::common::*;
use crate::config::GraphicsConfig;
use crate::error::RenderError;
use crate::system_diagnostics::SystemDiagnostics;

const SKY: wgpu::Color = wgpu::Color { r: 0.53, g: 0.81, b: 0.92, a: 1.0 };
const MSAA_SAMPLES: u32 = 4;

// --- UNIFORMS ---

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [f32; 16],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LocalUniform {
    pub model: [f32; 16],
    pub tint: [f32; 4],
}

const LOCAL_SIZE: u64 = std::mem::size_of::<LocalUniform>() as u64;

struct GpuMesh {
    v_buf: wgpu::Buffer,
    i_buf: wgpu::Buffer,
    num_inds: u32,
}

struct DrawCall {
    handle: MeshHandle,
    local: LocalUniform,
    style: DrawStyle,
}

// --- RENDERER STRUCT ---

pub struct Renderer<'a> {
    pub window: &'a Window,
    surface: wgpu::Surface<'a>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    sample_count: u32,
    depth: wgpu::TextureView,
    msaa: Option<wgpu::TextureView>,

    pipeline_fill: wgpu::RenderPipeline,
    pipeline_wire: Option<wgpu::RenderPipeline>,
    global_buf: wgpu::Buffer,
    global_bind: wgpu::BindGroup,

    // per-draw model + tint, addressed with dynamic offsets
    local_layout: wgpu::BindGroupLayout,
    local_buf: wgpu::Buffer,
    local_bind: wgpu::BindGroup,
    local_slots: usize,
    uniform_stride: u64,

    meshes: HashMap<MeshHandle, GpuMesh>,
    next_handle: u32,
    draws: Vec<DrawCall>,

    // --- TEXT ENGINE ---
    font_system: FontSystem,
    swash_cache: SwashCache,
    text_atlas: TextAtlas,
    text_renderer: GlyphRenderer,

    last_fps_time: Instant,
    frame_count: u32,
    current_fps: u32,
}

impl<'a> Renderer<'a> {
    pub async fn new(window: &'a Window, graphics: &GraphicsConfig) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;

        let adapter = instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }).await.ok_or(RenderError::NoAdapter)?;

        SystemDiagnostics::log_gpu(&adapter.get_info());

        let mut features = wgpu::Features::empty();
        if adapter.features().contains(wgpu::Features::POLYGON_MODE_LINE) {
            features |= wgpu::Features::POLYGON_MODE_LINE;
        } else {
            log::warn!("POLYGON_MODE_LINE unsupported, wireframe overlays disabled");
        }

        let (device, queue) = adapter.request_device(&wgpu::DeviceDescriptor {
            label: None, required_features: features, required_limits: adapter.limits(),
        }, None).await?;

        let size = window.inner_size();
        let mut config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or(RenderError::UnsupportedSurface)?;
        config.present_mode = wgpu::PresentMode::AutoVsync;
        surface.configure(&device, &config);

        let msaa_ok = adapter.get_texture_format_features(config.format).flags.sample_count_supported(MSAA_SAMPLES);
        let sample_count = if graphics.antialiasing && msaa_ok { MSAA_SAMPLES } else { 1 };
        log::info!("Surface {:?} {}x{}, {}x MSAA", config.format, config.width, config.height, sample_count);

        let font_system = FontSystem::new();
        let swash_cache = SwashCache::new();
        let mut text_atlas = TextAtlas::new(&device, &queue, config.format);
        let text_renderer = GlyphRenderer::new(&mut text_atlas, &device, wgpu::MultisampleState::default(), None);

        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer { ty: wgpu::BufferBindingType::Uniform, has_dynamic_offset: false, min_binding_size: None },
                count: None,
            }],
            label: Some("global_layout"),
        });

        let local_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer { ty: wgpu::BufferBindingType::Uniform, has_dynamic_offset: true, min_binding_size: wgpu::BufferSize::new(LOCAL_SIZE) },
                count: None,
            }],
            label: Some("local_layout"),
        });

        // --- BUFFERS ---
        let global_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Global Uniform"),
            size: std::mem::size_of::<GlobalUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let global_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: global_buf.as_entire_binding() }],
            label: None,
        });

        let align = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride = LOCAL_SIZE.div_ceil(align) * align;
        let local_slots = 256;
        let (local_buf, local_bind) = Self::mk_local(&device, &local_layout, local_slots, uniform_stride);

        // --- PIPELINES ---
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[&global_layout, &local_layout],
            push_constant_ranges: &[],
        });

        let pipeline_fill = Self::create_pipeline(&device, &config, &layout, &shader, sample_count, false);
        let pipeline_wire = features
            .contains(wgpu::Features::POLYGON_MODE_LINE)
            .then(|| Self::create_pipeline(&device, &config, &layout, &shader, sample_count, true));

        let depth = Self::mk_depth(&device, &config, sample_count);
        let msaa = Self::mk_msaa(&device, &config, sample_count);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            sample_count,
            depth,
            msaa,
            pipeline_fill,
            pipeline_wire,
            global_buf,
            global_bind,
            local_layout,
            local_buf,
            local_bind,
            local_slots,
            uniform_stride,
            meshes: HashMap::new(),
            next_handle: 0,
            draws: Vec::new(),
            font_system,
            swash_cache,
            text_atlas,
            text_renderer,
            last_fps_time: Instant::now(),
            frame_count: 0,
            current_fps: 0,
        })
    }

    fn create_pipeline(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, layout: &wgpu::PipelineLayout, shader: &wgpu::ShaderModule, samples: u32, wireframe: bool) -> wgpu::RenderPipeline {
        let attributes = [
            wgpu::VertexAttribute { format: wgpu::VertexFormat::Float32x3, offset: 0, shader_location: 0 },
            wgpu::VertexAttribute { format: wgpu::VertexFormat::Float32x3, offset: 12, shader_location: 1 },
            wgpu::VertexAttribute { format: wgpu::VertexFormat::Float32x2, offset: 24, shader_location: 2 },
            wgpu::VertexAttribute { format: wgpu::VertexFormat::Float32x4, offset: 32, shader_location: 3 },
        ];
        // pull overlay lines towards the camera so they win against their own faces
        let bias = if wireframe {
            wgpu::DepthBiasState { constant: -2, slope_scale: -1.0, clamp: 0.0 }
        } else {
            wgpu::DepthBiasState::default()
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(if wireframe { "wire pipeline" } else { "fill pipeline" }),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as _,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState { module: shader, entry_point: "fs_main", targets: &[Some(config.format.into())] }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                polygon_mode: if wireframe { wgpu::PolygonMode::Line } else { wgpu::PolygonMode::Fill },
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: !wireframe,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias,
            }),
            multisample: wgpu::MultisampleState { count: samples, ..Default::default() },
            multiview: None,
        })
    }

    fn mk_depth(dev: &wgpu::Device, cfg: &wgpu::SurfaceConfiguration, samples: u32) -> wgpu::TextureView {
        dev.create_texture(&wgpu::TextureDescriptor { size: wgpu::Extent3d { width: cfg.width, height: cfg.height, depth_or_array_layers: 1 }, mip_level_count: 1, sample_count: samples, dimension: wgpu::TextureDimension::D2, format: wgpu::TextureFormat::Depth32Float, usage: wgpu::TextureUsages::RENDER_ATTACHMENT, label: Some("depth"), view_formats: &[] }).create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn mk_msaa(dev: &wgpu::Device, cfg: &wgpu::SurfaceConfiguration, samples: u32) -> Option<wgpu::TextureView> {
        if samples <= 1 {
            return None;
        }
        let tex = dev.create_texture(&wgpu::TextureDescriptor { size: wgpu::Extent3d { width: cfg.width, height: cfg.height, depth_or_array_layers: 1 }, mip_level_count: 1, sample_count: samples, dimension: wgpu::TextureDimension::D2, format: cfg.format, usage: wgpu::TextureUsages::RENDER_ATTACHMENT, label: Some("msaa color"), view_formats: &[] });
        Some(tex.create_view(&wgpu::TextureViewDescriptor::default()))
    }

    fn mk_local(dev: &wgpu::Device, layout: &wgpu::BindGroupLayout, slots: usize, stride: u64) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buf = dev.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Local Uniforms"),
            size: slots as u64 * stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind = dev.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding { buffer: &buf, offset: 0, size: wgpu::BufferSize::new(LOCAL_SIZE) }),
            }],
            label: None,
        });
        (buf, bind)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        // minimized
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth = Self::mk_depth(&self.device, &self.config, self.sample_count);
        self.msaa = Self::mk_msaa(&self.device, &self.config, self.sample_count);
    }

    fn ensure_local_slots(&mut self, needed: usize) {
        if needed <= self.local_slots {
            return;
        }
        self.local_slots = needed.next_power_of_two();
        let (buf, bind) = Self::mk_local(&self.device, &self.local_layout, self.local_slots, self.uniform_stride);
        self.local_buf = buf;
        self.local_bind = bind;
        log::debug!("Grew draw uniform buffer to {} slots", self.local_slots);
    }

    /// Draws everything queued through `draw_mesh` since the last frame, then the HUD.
    pub fn render(&mut self, camera: &Camera, hud: &[String]) {
        let draws = std::mem::take(&mut self.draws);

        let out = match self.surface.get_current_texture() {
            Ok(o) => o,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                log::warn!("Skipping frame: {e}");
                return;
            }
        };
        let view = out.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let aspect = self.config.width as f32 / self.config.height as f32;
        let global = GlobalUniform { view_proj: camera.view_proj(aspect).to_cols_array() };
        self.queue.write_buffer(&self.global_buf, 0, bytemuck::bytes_of(&global));

        self.ensure_local_slots(draws.len());
        let stride = self.uniform_stride as usize;
        let mut staging = vec![0u8; draws.len() * stride];
        for (slot, draw) in staging.chunks_exact_mut(stride).zip(&draws) {
            slot[..LOCAL_SIZE as usize].copy_from_slice(bytemuck::bytes_of(&draw.local));
        }
        if !staging.is_empty() {
            self.queue.write_buffer(&self.local_buf, 0, &staging);
        }

        let mut enc = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("frame") });

        // --- PASS 1: SCENE ---
        {
            let (target, resolve_target) = match &self.msaa {
                Some(msaa) => (msaa, Some(&view)),
                None => (&view, None),
            };
            let mut pass = enc.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Clear(SKY), store: wgpu::StoreOp::Store },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth,
                    depth_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Clear(1.0), store: wgpu::StoreOp::Store }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(0, &self.global_bind, &[]);
            for (i, draw) in draws.iter().enumerate() {
                let Some(mesh) = self.meshes.get(&draw.handle) else { continue };
                if mesh.num_inds == 0 {
                    continue;
                }
                let pipeline = match (draw.style, &self.pipeline_wire) {
                    (DrawStyle::Solid, _) => &self.pipeline_fill,
                    (DrawStyle::Wireframe, Some(wire)) => wire,
                    (DrawStyle::Wireframe, None) => continue,
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &self.local_bind, &[(i as u64 * self.uniform_stride) as u32]);
                pass.set_vertex_buffer(0, mesh.v_buf.slice(..));
                pass.set_index_buffer(mesh.i_buf.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.num_inds, 0, 0..1);
            }
        }

        // --- FPS CALCULATION ---
        self.frame_count += 1;
        let now = Instant::now();
        if now.duration_since(self.last_fps_time).as_secs_f32() >= 1.0 {
            self.current_fps = self.frame_count;
            self.frame_count = 0;
            self.last_fps_time = now;
        }

        // --- PASS 2: TEXT ---
        {
            let width = self.config.width as f32;
            let height = self.config.height as f32;

            let mut fps_buffer = Buffer::new(&mut self.font_system, Metrics::new(20.0, 24.0));
            fps_buffer.set_size(&mut self.font_system, width, height);
            fps_buffer.set_text(
                &mut self.font_system,
                &format!("FPS: {}", self.current_fps),
                Attrs::new().family(Family::Monospace).color(glyphon::Color::rgb(0, 255, 0)),
                Shaping::Advanced,
            );

            let mut hud_buffer = Buffer::new(&mut self.font_system, Metrics::new(16.0, 20.0));
            hud_buffer.set_size(&mut self.font_system, width, height);
            hud_buffer.set_text(
                &mut self.font_system,
                &hud.join("\n"),
                Attrs::new().family(Family::Monospace).color(glyphon::Color::rgb(255, 255, 255)),
                Shaping::Advanced,
            );

            let bounds = TextBounds { left: 0, top: 0, right: self.config.width as i32, bottom: self.config.height as i32 };
            let text_areas = [
                TextArea { buffer: &hud_buffer, left: 10.0, top: 10.0, scale: 1.0, bounds, default_color: glyphon::Color::rgb(255, 255, 255) },
                TextArea { buffer: &fps_buffer, left: width - 120.0, top: 10.0, scale: 1.0, bounds, default_color: glyphon::Color::rgb(255, 255, 255) },
            ];

            let prepared = self.text_renderer.prepare(
                &self.device,
                &self.queue,
                &mut self.font_system,
                &mut self.text_atlas,
                Resolution { width: self.config.width, height: self.config.height },
                text_areas,
                &mut self.swash_cache,
            );

            match prepared {
                Ok(()) => {
                    let mut pass = enc.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Text Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
                        })],
                        depth_stencil_attachment: None,
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    });
                    if let Err(e) = self.text_renderer.render(&self.text_atlas, &mut pass) {
                        log::warn!("HUD render failed: {e}");
                    }
                }
                Err(e) => log::warn!("HUD prepare failed: {e}"),
            }
        }

        self.queue.submit(std::iter::once(enc.finish()));
        out.present();
        self.text_atlas.trim();
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

impl RenderBackend for Renderer<'_> {
    fn upload_mesh(&mut self, mesh: MeshData) -> MeshHandle {
        let verts = mesh.interleave();
        let v_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh vertices"),
            contents: bytemuck::cast_slice(&verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let i_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let handle = MeshHandle(self.next_handle);
        self.next_handle += 1;
        self.meshes.insert(handle, GpuMesh { v_buf, i_buf, num_inds: mesh.indices.len() as u32 });
        handle
    }

    fn release_mesh(&mut self, handle: MeshHandle) {
        if self.meshes.remove(&handle).is_none() {
            log::warn!("Release of unknown mesh {handle:?}");
        }
    }

    fn draw_mesh(&mut self, handle: MeshHandle, transform: Mat4, tint: Color, style: DrawStyle) {
        self.draws.push(DrawCall {
            handle,
            local: LocalUniform { model: transform.to_cols_array(), tint: tint.to_f32() },
            style,
        });
    }
}
