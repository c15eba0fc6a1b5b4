//! wgpu surface, pipelines and per-frame encoding. Construction failures are
//! fatal; per-frame failures skip the frame and let the next one catch up.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::constants::COLOR_CANVAS_BG;
use crate::error::{GridError, Result};
use crate::render::frame::{FrameBuffers, OverlayBuffers};
use crate::render::instances::{
    FadeVertex, Globals, LineInstance, NoteInstance, RectInstance, WaveformParams,
};

/// GPU may be at most this many frames behind the CPU before we skip.
const FRAMES_IN_FLIGHT: u32 = 2;

const RECT_ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x2,
    1 => Float32x2,
    2 => Float32x4,
    3 => Float32,
];

const LINE_ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x2,
    1 => Float32x2,
    2 => Float32x4,
    3 => Float32,
];

const WAVE_ATTRS: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
    0 => Float32x2,
    1 => Float32x2,
    2 => Float32x4,
    3 => Uint32,
    4 => Uint32,
    5 => Float32,
];

const FADE_ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
    0 => Float32x2,
    1 => Float32x4,
];

/// Growable GPU buffer; contents rewritten each upload.
struct DynamicBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    usage: wgpu::BufferUsages,
    label: &'static str,
}

impl DynamicBuffer {
    fn new(device: &wgpu::Device, label: &'static str, usage: wgpu::BufferUsages) -> Self {
        let capacity = 4096;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            capacity,
            usage,
            label,
        }
    }

    /// Upload `bytes`, doubling capacity as needed. Returns true when the
    /// underlying buffer was recreated (bind groups must be rebuilt).
    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) -> bool {
        let mut recreated = false;
        if bytes.len() as u64 > self.capacity {
            while self.capacity < bytes.len() as u64 {
                self.capacity *= 2;
            }
            self.buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size: self.capacity,
                usage: self.usage | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            recreated = true;
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        recreated
    }
}

pub struct RenderEngine {
    _window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    rect_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    note_pipeline: wgpu::RenderPipeline,
    wave_pipeline: wgpu::RenderPipeline,
    fade_pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    peaks_layout: wgpu::BindGroupLayout,
    peaks_bind_group: wgpu::BindGroup,

    bg_lines: DynamicBuffer,
    rects: DynamicBuffer,
    waveforms: DynamicBuffer,
    peaks: DynamicBuffer,
    notes: DynamicBuffer,
    fades: DynamicBuffer,
    curve_lines: DynamicBuffer,
    handle_rects: DynamicBuffer,
    fg_lines: DynamicBuffer,
    overlay_rects: DynamicBuffer,
    overlay_notes: DynamicBuffer,
    overlay_lines: DynamicBuffer,

    frames_in_flight: Arc<AtomicU32>,
    skipped_frames: u64,
}

impl RenderEngine {
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| GridError::Gpu("no suitable graphics adapter".to_string()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("arrangegrid device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: FRAMES_IN_FLIGHT,
        };
        surface.configure(&device, &config);

        let rect_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("rect.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/rect.wgsl").into()),
        });
        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/line.wgsl").into()),
        });
        let wave_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("waveform.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/waveform.wgsl").into()),
        });
        let fade_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fade.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/fade.wgsl").into()),
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let peaks_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("peaks layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals {
                projection: crate::render::instances::ortho_projection(
                    size.width as f32,
                    size.height as f32,
                ),
                pixels_per_bar: 0.0,
                canvas_height: 0.0,
                view_min_x: 0.0,
                view_max_x: 0.0,
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grid layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });
        let wave_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("wave layout"),
                bind_group_layouts: &[&globals_layout, &peaks_layout],
                push_constant_ranges: &[],
            });

        let make_instanced = |label: &'static str,
                              shader: &wgpu::ShaderModule,
                              vs: &'static str,
                              fs: &'static str,
                              layout: &wgpu::PipelineLayout,
                              stride: u64,
                              attrs: &'static [wgpu::VertexAttribute]| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some(vs),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: stride,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: attrs,
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some(fs),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let rect_pipeline = make_instanced(
            "rect pipeline",
            &rect_shader,
            "vs_rect",
            "fs_rect",
            &pipeline_layout,
            std::mem::size_of::<RectInstance>() as u64,
            &RECT_ATTRS,
        );
        let note_pipeline = make_instanced(
            "note pipeline",
            &rect_shader,
            "vs_rect",
            "fs_rect",
            &pipeline_layout,
            std::mem::size_of::<NoteInstance>() as u64,
            &RECT_ATTRS,
        );
        let line_pipeline = make_instanced(
            "line pipeline",
            &line_shader,
            "vs_line",
            "fs_line",
            &pipeline_layout,
            std::mem::size_of::<LineInstance>() as u64,
            &LINE_ATTRS,
        );
        let wave_pipeline = make_instanced(
            "waveform pipeline",
            &wave_shader,
            "vs_wave",
            "fs_wave",
            &wave_pipeline_layout,
            std::mem::size_of::<WaveformParams>() as u64,
            &WAVE_ATTRS,
        );

        let fade_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("fade pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &fade_shader,
                entry_point: Some("vs_fade"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<FadeVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &FADE_ATTRS,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &fade_shader,
                entry_point: Some("fs_fade"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let vertex_usage = wgpu::BufferUsages::VERTEX;
        let peaks_buf = DynamicBuffer::new(&device, "peaks", wgpu::BufferUsages::STORAGE);
        let peaks_bind_group = Self::make_peaks_bind_group(&device, &peaks_layout, &peaks_buf);

        let bg_lines = DynamicBuffer::new(&device, "bg lines", vertex_usage);
        let rects = DynamicBuffer::new(&device, "rects", vertex_usage);
        let waveforms = DynamicBuffer::new(&device, "waveforms", vertex_usage);
        let notes = DynamicBuffer::new(&device, "notes", vertex_usage);
        let fades = DynamicBuffer::new(&device, "fades", vertex_usage);
        let curve_lines = DynamicBuffer::new(&device, "curve lines", vertex_usage);
        let handle_rects = DynamicBuffer::new(&device, "handle rects", vertex_usage);
        let fg_lines = DynamicBuffer::new(&device, "fg lines", vertex_usage);
        let overlay_rects = DynamicBuffer::new(&device, "overlay rects", vertex_usage);
        let overlay_notes = DynamicBuffer::new(&device, "overlay notes", vertex_usage);
        let overlay_lines = DynamicBuffer::new(&device, "overlay lines", vertex_usage);

        Ok(Self {
            _window: window,
            surface,
            device,
            queue,
            config,
            rect_pipeline,
            line_pipeline,
            note_pipeline,
            wave_pipeline,
            fade_pipeline,
            globals_buffer,
            globals_bind_group,
            peaks_layout,
            peaks_bind_group,
            bg_lines,
            rects,
            waveforms,
            peaks: peaks_buf,
            notes,
            fades,
            curve_lines,
            handle_rects,
            fg_lines,
            overlay_rects,
            overlay_notes,
            overlay_lines,
            frames_in_flight: Arc::new(AtomicU32::new(0)),
            skipped_frames: 0,
        })
    }

    fn make_peaks_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &DynamicBuffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("peaks"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.buffer.as_entire_binding(),
            }],
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    /// Upload geometry buffers. Called only when the host's dirty flag is
    /// set; the overlay is uploaded separately every frame.
    pub fn upload_frame(&mut self, frame: &FrameBuffers) {
        let d = &self.device;
        let q = &self.queue;
        self.bg_lines.upload(d, q, bytemuck::cast_slice(&frame.bg_lines));
        self.rects.upload(d, q, bytemuck::cast_slice(&frame.rects));
        self.waveforms
            .upload(d, q, bytemuck::cast_slice(&frame.waveforms));
        if self.peaks.upload(d, q, bytemuck::cast_slice(&frame.peaks)) {
            self.peaks_bind_group =
                Self::make_peaks_bind_group(&self.device, &self.peaks_layout, &self.peaks);
        }
        self.notes.upload(d, q, bytemuck::cast_slice(&frame.notes));
        self.fades
            .upload(d, q, bytemuck::cast_slice(&frame.fade_vertices));
        self.curve_lines
            .upload(d, q, bytemuck::cast_slice(&frame.curve_lines));
        self.handle_rects
            .upload(d, q, bytemuck::cast_slice(&frame.handle_rects));
        self.fg_lines
            .upload(d, q, bytemuck::cast_slice(&frame.fg_lines));
    }

    /// Encode and present one frame. Returns Ok(false) when the frame was
    /// skipped (no drawable, or the GPU is too far behind).
    pub fn render(
        &mut self,
        frame: &FrameBuffers,
        overlay: &OverlayBuffers,
        globals: Globals,
    ) -> Result<bool> {
        // Let completed submissions retire their callbacks first.
        let _ = self.device.poll(wgpu::Maintain::Poll);
        if self.frames_in_flight.load(Ordering::Acquire) >= FRAMES_IN_FLIGHT {
            self.skipped_frames += 1;
            return Ok(false);
        }

        let target = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                self.skipped_frames += 1;
                return Ok(false);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                self.skipped_frames += 1;
                return Ok(false);
            }
            Err(e) => return Err(GridError::Surface(e.to_string())),
        };

        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
        self.overlay_rects
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&overlay.rects));
        self.overlay_notes
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&overlay.notes));
        self.overlay_lines
            .upload(&self.device, &self.queue, bytemuck::cast_slice(&overlay.lines));

        let view = target
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("grid encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("grid pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: COLOR_CANVAS_BG.r as f64,
                            g: COLOR_CANVAS_BG.g as f64,
                            b: COLOR_CANVAS_BG.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.globals_bind_group, &[]);

            // Fixed back-to-front order: grid, fills, waveforms, notes,
            // fades, curves, handles, borders, live overlays.
            if !frame.bg_lines.is_empty() {
                pass.set_pipeline(&self.line_pipeline);
                pass.set_vertex_buffer(0, self.bg_lines.buffer.slice(..));
                pass.draw(0..4, 0..frame.bg_lines.len() as u32);
            }
            if !frame.rects.is_empty() {
                pass.set_pipeline(&self.rect_pipeline);
                pass.set_vertex_buffer(0, self.rects.buffer.slice(..));
                pass.draw(0..4, 0..frame.rects.len() as u32);
            }
            if !frame.waveforms.is_empty() {
                pass.set_pipeline(&self.wave_pipeline);
                pass.set_bind_group(1, &self.peaks_bind_group, &[]);
                pass.set_vertex_buffer(0, self.waveforms.buffer.slice(..));
                pass.draw(0..4, 0..frame.waveforms.len() as u32);
            }
            if !frame.notes.is_empty() {
                pass.set_pipeline(&self.note_pipeline);
                pass.set_vertex_buffer(0, self.notes.buffer.slice(..));
                pass.draw(0..4, 0..frame.notes.len() as u32);
            }
            if !frame.fade_vertices.is_empty() {
                pass.set_pipeline(&self.fade_pipeline);
                pass.set_vertex_buffer(0, self.fades.buffer.slice(..));
                pass.draw(0..frame.fade_vertices.len() as u32, 0..1);
            }
            if !frame.curve_lines.is_empty() {
                pass.set_pipeline(&self.line_pipeline);
                pass.set_vertex_buffer(0, self.curve_lines.buffer.slice(..));
                pass.draw(0..4, 0..frame.curve_lines.len() as u32);
            }
            if !frame.handle_rects.is_empty() {
                pass.set_pipeline(&self.rect_pipeline);
                pass.set_vertex_buffer(0, self.handle_rects.buffer.slice(..));
                pass.draw(0..4, 0..frame.handle_rects.len() as u32);
            }
            if !frame.fg_lines.is_empty() {
                pass.set_pipeline(&self.line_pipeline);
                pass.set_vertex_buffer(0, self.fg_lines.buffer.slice(..));
                pass.draw(0..4, 0..frame.fg_lines.len() as u32);
            }
            if !overlay.rects.is_empty() {
                pass.set_pipeline(&self.rect_pipeline);
                pass.set_vertex_buffer(0, self.overlay_rects.buffer.slice(..));
                pass.draw(0..4, 0..overlay.rects.len() as u32);
            }
            if !overlay.notes.is_empty() {
                pass.set_pipeline(&self.note_pipeline);
                pass.set_vertex_buffer(0, self.overlay_notes.buffer.slice(..));
                pass.draw(0..4, 0..overlay.notes.len() as u32);
            }
            if !overlay.lines.is_empty() {
                pass.set_pipeline(&self.line_pipeline);
                pass.set_vertex_buffer(0, self.overlay_lines.buffer.slice(..));
                pass.draw(0..4, 0..overlay.lines.len() as u32);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        self.frames_in_flight.fetch_add(1, Ordering::AcqRel);
        let counter = self.frames_in_flight.clone();
        self.queue.on_submitted_work_done(move || {
            counter.fetch_sub(1, Ordering::AcqRel);
        });
        target.present();
        Ok(true)
    }
}
