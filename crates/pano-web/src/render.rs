pub mod helpers;

use crate::decode::DecodedImage;
use pano_core::sphere::SphereMesh;
use pano_core::{CameraFrame, ViewerConfig};
use glam::Vec3;
use web_sys as web;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SphereUniforms {
    view_proj: [[f32; 4]; 4],
    tint: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MarkerUniforms {
    view_proj: [[f32; 4]; 4],
    cam_right: [f32; 4],
    cam_up: [f32; 4],
}

/// One billboard. Layout matches the instance attributes of `markers.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MarkerInstance {
    pub position: [f32; 3],
    pub scale: f32,
    pub color: [f32; 4],
    /// 0 plain marker, 1 marker with a model, 2 link
    pub kind: f32,
}

const MAX_INSTANCES: usize = 256;

pub struct GpuState<'a> {
    surface: wgpu::Surface<'a>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    sphere_pipeline: wgpu::RenderPipeline,
    sphere_vb: wgpu::Buffer,
    sphere_ib: wgpu::Buffer,
    sphere_index_count: u32,
    sphere_uniforms: wgpu::Buffer,
    sphere_bg: wgpu::BindGroup,
    texture_bgl: wgpu::BindGroupLayout,
    pano_sampler: wgpu::Sampler,
    pano_bg: wgpu::BindGroup,
    has_photo: bool,

    marker_pipeline: wgpu::RenderPipeline,
    quad_vb: wgpu::Buffer,
    instance_vb: wgpu::Buffer,
    marker_uniforms: wgpu::Buffer,
    marker_bg: wgpu::BindGroup,

    width: u32,
    height: u32,
    clear_color: wgpu::Color,
}

impl<'a> GpuState<'a> {
    pub async fn new(
        canvas: &'a web::HtmlCanvasElement,
        viewer: &ViewerConfig,
    ) -> anyhow::Result<Self> {
        let width = canvas.width();
        let height = canvas.height();

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No WebGPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!(format!("request_device error: {:?}", e)))?;
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| {
                matches!(
                    f,
                    wgpu::TextureFormat::Bgra8UnormSrgb | wgpu::TextureFormat::Rgba8UnormSrgb
                )
            })
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Backdrop sphere
        let mesh = SphereMesh::build(
            viewer.backdrop_radius,
            viewer.backdrop_width_segments,
            viewer.backdrop_height_segments,
        );
        let sphere_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere_vb"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let sphere_ib = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere_ib"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let sphere_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sphere_shader"),
            source: wgpu::ShaderSource::Wgsl(pano_core::SPHERE_WGSL.into()),
        });
        let sphere_ubl = helpers::uniform_layout(&device, "sphere_ubl");
        let texture_bgl = helpers::texture_layout(&device, "pano_texture_bgl");
        let sphere_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sphere_uniforms"),
            size: std::mem::size_of::<SphereUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let sphere_bg = helpers::uniform_bind_group(&device, "sphere_bg", &sphere_ubl, &sphere_uniforms);
        let pano_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("pano_sampler"),
            // wrap horizontally so the seam at the back of the sphere is invisible
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let (placeholder, placeholder_view) = helpers::create_color_texture(
            &device,
            "pano_placeholder",
            1,
            1,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        helpers::write_rgba(&queue, &placeholder, 1, 1, &[255, 255, 255, 255]);
        let pano_bg =
            helpers::texture_bind_group(&device, &texture_bgl, &placeholder_view, &pano_sampler);
        let sphere_pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sphere_pl"),
            bind_group_layouts: &[&sphere_ubl, &texture_bgl],
            push_constant_ranges: &[],
        });
        let sphere_attrs = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];
        let sphere_pipeline = helpers::make_pipeline(
            &device,
            "sphere_pipeline",
            &sphere_pl,
            &sphere_shader,
            &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<pano_core::sphere::SphereVertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &sphere_attrs,
            }],
            wgpu::PrimitiveState {
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            format,
            None,
        );

        // Marker and link billboards, drawn after the sphere without depth:
        // they all sit on the marker shell, well inside the backdrop.
        let marker_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("markers_shader"),
            source: wgpu::ShaderSource::Wgsl(pano_core::MARKERS_WGSL.into()),
        });
        let marker_ubl = helpers::uniform_layout(&device, "markers_ubl");
        let marker_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("markers_uniforms"),
            size: std::mem::size_of::<MarkerUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let marker_bg =
            helpers::uniform_bind_group(&device, "markers_bg", &marker_ubl, &marker_uniforms);
        let marker_pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("markers_pl"),
            bind_group_layouts: &[&marker_ubl],
            push_constant_ranges: &[],
        });
        let quad: [f32; 12] = [
            -0.5, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, -0.5, 0.5, 0.5, -0.5, 0.5,
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vb"),
            contents: bytemuck::cast_slice(&quad),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let instance_vb = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("marker_instances"),
            size: (MAX_INSTANCES * std::mem::size_of::<MarkerInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let quad_attrs = wgpu::vertex_attr_array![0 => Float32x2];
        let instance_attrs =
            wgpu::vertex_attr_array![1 => Float32x3, 2 => Float32, 3 => Float32x4, 4 => Float32];
        let marker_pipeline = helpers::make_pipeline(
            &device,
            "markers_pipeline",
            &marker_pl,
            &marker_shader,
            &[
                wgpu::VertexBufferLayout {
                    array_stride: (2 * std::mem::size_of::<f32>()) as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &quad_attrs,
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<MarkerInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &instance_attrs,
                },
            ],
            wgpu::PrimitiveState::default(),
            format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );

        log::info!(
            "[scene] WebGPU ready: {}x{} {:?}, backdrop {} triangles",
            width,
            height,
            format,
            mesh.triangle_count()
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            sphere_pipeline,
            sphere_vb,
            sphere_ib,
            sphere_index_count: mesh.indices.len() as u32,
            sphere_uniforms,
            sphere_bg,
            texture_bgl,
            pano_sampler,
            pano_bg,
            has_photo: false,
            marker_pipeline,
            quad_vb,
            instance_vb,
            marker_uniforms,
            marker_bg,
            width,
            height,
            clear_color: wgpu::Color {
                r: 0.03,
                g: 0.04,
                b: 0.08,
                a: 1.0,
            },
        })
    }

    /// Largest texture side the device accepts; panoramas are scaled to fit.
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    pub fn set_panorama(&mut self, image: &DecodedImage) {
        let (texture, view) = helpers::create_color_texture(
            &self.device,
            "pano_texture",
            image.width,
            image.height,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        helpers::write_rgba(&self.queue, &texture, image.width, image.height, &image.rgba);
        self.pano_bg =
            helpers::texture_bind_group(&self.device, &self.texture_bgl, &view, &self.pano_sampler);
        self.has_photo = true;
    }

    /// Back to the placeholder backdrop while the next scene loads.
    pub fn clear_panorama(&mut self) {
        self.has_photo = false;
    }

    pub fn resize_if_needed(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// After `SurfaceError::Lost` or `Outdated`.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn render(
        &mut self,
        frame: &CameraFrame,
        instances: &[MarkerInstance],
    ) -> Result<(), wgpu::SurfaceError> {
        let view_proj = frame.view_proj.to_cols_array_2d();
        let tint = if self.has_photo {
            [1.0, 1.0, 1.0, 1.0]
        } else {
            [1.0, 1.0, 1.0, 0.0]
        };
        self.queue.write_buffer(
            &self.sphere_uniforms,
            0,
            bytemuck::bytes_of(&SphereUniforms { view_proj, tint }),
        );
        let right = frame.rotation * Vec3::X;
        let up = frame.rotation * Vec3::Y;
        self.queue.write_buffer(
            &self.marker_uniforms,
            0,
            bytemuck::bytes_of(&MarkerUniforms {
                view_proj,
                cam_right: right.extend(0.0).to_array(),
                cam_up: up.extend(0.0).to_array(),
            }),
        );
        let count = instances.len().min(MAX_INSTANCES);
        if instances.len() > MAX_INSTANCES {
            log::warn!("[marker] {} indicators, drawing {}", instances.len(), MAX_INSTANCES);
        }
        if count > 0 {
            self.queue.write_buffer(
                &self.instance_vb,
                0,
                bytemuck::cast_slice(&instances[..count]),
            );
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&self.sphere_pipeline);
            rpass.set_bind_group(0, &self.sphere_bg, &[]);
            rpass.set_bind_group(1, &self.pano_bg, &[]);
            rpass.set_vertex_buffer(0, self.sphere_vb.slice(..));
            rpass.set_index_buffer(self.sphere_ib.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..self.sphere_index_count, 0, 0..1);

            if count > 0 {
                rpass.set_pipeline(&self.marker_pipeline);
                rpass.set_bind_group(0, &self.marker_bg, &[]);
                rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
                rpass.set_vertex_buffer(1, self.instance_vb.slice(..));
                rpass.draw(0..6, 0..count as u32);
            }
        }
        self.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }
}
