use std::time::{Duration, Instant};

use anyhow::Result;
use crtconfig::CrtSettings;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use winit::dpi::PhysicalSize;

use crate::binding::update_crt_uniforms;
use crate::runtime::TimeSample;
use crate::types::{AdapterProfile, CrossfadeCurve, RendererConfig};

use super::content::create_content;
use super::context::GpuContext;
use super::pipeline::{load_shader_source, CrtPipeline, PipelineLayouts};
use super::timeline::SettingsFade;
use super::uniforms::CrtUniforms;

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }

    fn for_context(context: &GpuContext) -> Option<Self> {
        (context.sample_count > 1).then(|| {
            Self::new(
                &context.device,
                context.surface_format,
                context.size,
                context.sample_count,
            )
        })
    }
}

/// Owns every GPU resource of the preview window and the settings currently
/// bound to the shader.
pub(crate) struct GpuState {
    context: GpuContext,
    _layouts: PipelineLayouts,
    pipeline: CrtPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    content_bind_group: wgpu::BindGroup,
    multisample_target: Option<MultisampleTarget>,
    uniforms: CrtUniforms,
    settings: CrtSettings,
    fade: Option<SettingsFade>,
    last_fps_update: Instant,
    frames_since_last_update: u32,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        config: &RendererConfig,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(
            target,
            initial_size,
            config.antialiasing,
            config.color_space,
        )?;
        let layouts = PipelineLayouts::new(&context.device);

        let shader_code = load_shader_source(config.shader_source.as_deref())?;
        let pipeline = CrtPipeline::new(
            &context.device,
            &layouts,
            context.surface_format,
            context.sample_count,
            &shader_code,
        )?;

        let content = create_content(
            &context.device,
            &context.queue,
            &config.content,
            context.color_space,
            context.adapter_profile.max_texture_dimension,
        );
        debug!(
            width = content.dimensions.0,
            height = content.dimensions.1,
            "content texture ready"
        );
        let content_bind_group = layouts.content_bind_group(&context.device, &content);

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("crt uniform buffer"),
            size: std::mem::size_of::<CrtUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("crt uniform bind group"),
                layout: &layouts.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let uniforms = CrtUniforms::new(context.size, &config.settings);
        context
            .queue
            .write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let multisample_target = MultisampleTarget::for_context(&context);

        Ok(Self {
            context,
            _layouts: layouts,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            content_bind_group,
            multisample_target,
            uniforms,
            settings: config.settings,
            fade: None,
            last_fps_update: Instant::now(),
            frames_since_last_update: 0,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    /// Bundle the fade is heading to, or the bound bundle when idle.
    pub(crate) fn settings(&self) -> CrtSettings {
        self.fade
            .as_ref()
            .map(|fade| *fade.target())
            .unwrap_or(self.settings)
    }

    pub(crate) fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
        self.uniforms.set_size(self.context.size);
        self.multisample_target = MultisampleTarget::for_context(&self.context);
    }

    /// Binds `settings` right away, cancelling any running fade.
    pub(crate) fn apply_settings(&mut self, settings: CrtSettings) {
        self.fade = None;
        self.bind_settings(settings);
    }

    /// Blends from the bound bundle to `settings`; zero duration applies at once.
    pub(crate) fn fade_to(
        &mut self,
        settings: CrtSettings,
        duration: Duration,
        curve: CrossfadeCurve,
        now: Instant,
    ) {
        match SettingsFade::new(self.settings, settings, duration, curve, now) {
            Some(fade) => self.fade = Some(fade),
            None => self.apply_settings(settings),
        }
    }

    fn bind_settings(&mut self, settings: CrtSettings) {
        self.settings = settings;
        update_crt_uniforms(&mut self.uniforms, &settings);
    }

    pub(crate) fn render(&mut self, time_sample: TimeSample) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let now = Instant::now();

        match self.fade.take() {
            Some(fade) => {
                let (settings, finished) = fade.sample(now);
                self.bind_settings(settings);
                if !finished {
                    self.fade = Some(fade);
                }
            }
            // Bound once per frame as well as on every change.
            None => update_crt_uniforms(&mut self.uniforms, &self.settings),
        }
        self.uniforms.set_time(time_sample);
        self.context.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.uniforms),
        );

        self.frames_since_last_update += 1;
        let elapsed = now.saturating_duration_since(self.last_fps_update);
        if elapsed >= Duration::from_secs(1) {
            debug!(
                fps = (self.frames_since_last_update as f32 / elapsed.as_secs_f32()).round(),
                frame = time_sample.frame_index,
                time = self.uniforms.time,
                fading = self.fade.is_some(),
                "render stats"
            );
            self.frames_since_last_update = 0;
            self.last_fps_update = now;
        }

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });

        let (attachment_view, resolve_target) = match self.multisample_target.as_ref() {
            Some(msaa) => (&msaa.view, Some(&view)),
            None => (&view, None),
        };
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("crt pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, &self.content_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        let acquired = now.elapsed();
        if acquired > Duration::from_millis(100) {
            warn!(ms = acquired.as_millis(), "frame submission took unusually long");
        }
        frame.present();
        Ok(())
    }
}
