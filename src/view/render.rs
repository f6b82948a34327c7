use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use wgpu::*;

use crate::error::Result;
use crate::model::scene::{Geometry, MeshInstance, Scene};
use crate::model::Camera;
use crate::utils::{create_box_mesh, create_plane_mesh, Mesh, MeshBuffer, Vertex};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct LightingUniform {
    pub ambient: [f32; 4],
    pub point_position: [f32; 4],
    pub point_color: [f32; 4],
    pub point_params: [f32; 4],
}

impl LightingUniform {
    pub fn from_scene(scene: &Scene) -> Self {
        let light = &scene.point_light;
        let [r, g, b, _] = light.color;
        Self {
            ambient: scene.ambient.color,
            point_position: [light.position.x, light.position.y, light.position.z, light.range],
            point_color: [r, g, b, light.intensity],
            point_params: [light.decay, 0.0, 0.0, 0.0],
        }
    }
}

/// Per-instance model matrix and colour.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl InstanceRaw {
    const ATTRIBUTES: [VertexAttribute; 5] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
    ];

    pub fn layout() -> VertexBufferLayout<'static> {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as BufferAddress,
            step_mode: VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl From<&MeshInstance> for InstanceRaw {
    fn from(mesh: &MeshInstance) -> Self {
        Self {
            model: mesh.transform.to_matrix().to_cols_array_2d(),
            color: mesh.color,
        }
    }
}

// Shared graphics setup used by native and web
pub struct CameraResources {
    pub camera_buffer: Buffer,
    pub lighting_buffer: Buffer,
    pub bind_group_layout: BindGroupLayout,
    pub camera_bind_group: BindGroup,
}

pub fn create_depth_texture(device: &Device, width: u32, height: u32) -> (Texture, TextureView) {
    let depth_texture = device.create_texture(&TextureDescriptor {
        label: Some("depth_texture"),
        size: Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

pub fn create_camera_resources(device: &Device, lighting: &LightingUniform) -> CameraResources {
    let camera_buffer = device.create_buffer(&BufferDescriptor {
        label: Some("camera_buffer"),
        size: std::mem::size_of::<CameraUniform>() as BufferAddress,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let lighting_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
        label: Some("lighting_buffer"),
        contents: bytemuck::bytes_of(lighting),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    });

    let uniform_entry = |binding: u32, visibility: ShaderStages| BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };

    let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("camera_bind_group_layout"),
        entries: &[
            uniform_entry(0, ShaderStages::VERTEX),
            uniform_entry(1, ShaderStages::FRAGMENT),
        ],
    });

    let camera_bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("camera_bind_group"),
        layout: &bind_group_layout,
        entries: &[
            BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
            BindGroupEntry { binding: 1, resource: lighting_buffer.as_entire_binding() },
        ],
    });

    CameraResources { camera_buffer, lighting_buffer, bind_group_layout, camera_bind_group }
}

pub fn create_scene_pipeline(
    device: &Device,
    format: TextureFormat,
    bind_group_layout: &BindGroupLayout,
) -> RenderPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("scene_pipeline_layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("scene_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout(), InstanceRaw::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState { format, blend: Some(BlendState::REPLACE), write_mask: ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: Some(Face::Back),
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

fn mesh_for(geometry: Geometry) -> Mesh {
    match geometry {
        Geometry::Box { side } => create_box_mesh(side),
        Geometry::Plane { size } => create_plane_mesh(size),
    }
}

/// Tessellated egui output for one frame.
pub struct UiFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

///////////////////////////////////////////////////////////////////////////////

/// Consolidated render state to avoid parameter explosion
pub struct RenderState {
    pub surface_config: SurfaceConfiguration,

    pipeline: RenderPipeline,
    camera: CameraResources,
    depth_view: TextureView,

    // All boxes share one mesh and are drawn instanced; the ground is a single instance.
    box_mesh: MeshBuffer,
    box_instances: Buffer,
    box_count: u32,
    ground_mesh: MeshBuffer,
    ground_instance: Buffer,
    instance_scratch: Vec<InstanceRaw>,

    egui_renderer: egui_wgpu::Renderer,
}

impl RenderState {
    pub fn new(device: &Device, surface_config: &SurfaceConfiguration, scene: &Scene) -> Self {
        let camera = create_camera_resources(device, &LightingUniform::from_scene(scene));
        let pipeline = create_scene_pipeline(device, surface_config.format, &camera.bind_group_layout);
        let (_, depth_view) = create_depth_texture(device, surface_config.width, surface_config.height);

        let box_geometry = scene
            .boxes
            .first()
            .map(|b| b.geometry)
            .unwrap_or(Geometry::Box { side: 2.0 });
        let box_mesh = mesh_for(box_geometry).upload(device, "box");
        let box_count = scene.boxes.len() as u32;
        let box_instances = device.create_buffer(&BufferDescriptor {
            label: Some("box_instances"),
            size: (scene.boxes.len().max(1) * std::mem::size_of::<InstanceRaw>()) as BufferAddress,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let ground_mesh = mesh_for(scene.ground.geometry).upload(device, "ground");
        let ground_instance = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some("ground_instance"),
            contents: bytemuck::bytes_of(&InstanceRaw::from(&scene.ground)),
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
        });

        let egui_renderer = egui_wgpu::Renderer::new(device, surface_config.format, egui_wgpu::RendererOptions::default());

        tracing::info!(boxes = box_count, format = ?surface_config.format, "renderer ready");

        Self {
            surface_config: surface_config.clone(),
            pipeline,
            camera,
            depth_view,
            box_mesh,
            box_instances,
            box_count,
            ground_mesh,
            ground_instance,
            instance_scratch: Vec::with_capacity(scene.boxes.len()),
            egui_renderer,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Reconfigure the surface and recreate the depth buffer. Zero sizes (minimised) are ignored.
    pub fn resize(&mut self, device: &Device, surface: &Surface, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        surface.configure(device, &self.surface_config);
        let (_, depth_view) = create_depth_texture(device, width, height);
        self.depth_view = depth_view;
        tracing::debug!(width, height, "surface resized");
    }

    /// Upload camera and mesh transforms for the coming frame.
    pub fn prepare(&mut self, queue: &Queue, scene: &Scene, camera: &Camera) {
        let eye = camera.eye;
        let camera_uniform = CameraUniform {
            view_proj: camera.view_proj().to_cols_array_2d(),
            eye: [eye.x, eye.y, eye.z, 1.0],
        };
        queue.write_buffer(&self.camera.camera_buffer, 0, bytemuck::bytes_of(&camera_uniform));
        queue.write_buffer(&self.ground_instance, 0, bytemuck::bytes_of(&InstanceRaw::from(&scene.ground)));

        self.instance_scratch.clear();
        self.instance_scratch
            .extend(scene.boxes.iter().take(self.box_count as usize).map(InstanceRaw::from));
        if !self.instance_scratch.is_empty() {
            queue.write_buffer(&self.box_instances, 0, bytemuck::cast_slice(&self.instance_scratch));
        }
    }

    pub fn draw_frame(&mut self, device: &Device, queue: &Queue, surface: &Surface, ui: UiFrame) -> Result<()> {
        // egui textures must be uploaded even when the frame is skipped
        for (id, image_delta) in &ui.textures_delta.set {
            self.egui_renderer.update_texture(device, queue, *id, image_delta);
        }

        let frame = match surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                tracing::warn!("surface lost, reconfiguring");
                surface.configure(device, &self.surface_config);
                surface.get_current_texture()?
            }
            Err(SurfaceError::Timeout) => {
                tracing::debug!("surface timeout, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor { label: Some("encoder") });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color::BLACK),
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_pipeline(&self.pipeline);
            rp.set_bind_group(0, &self.camera.camera_bind_group, &[]);

            // GROUND
            rp.set_vertex_buffer(0, self.ground_mesh.vertex_buffer.slice(..));
            rp.set_vertex_buffer(1, self.ground_instance.slice(..));
            rp.set_index_buffer(self.ground_mesh.index_buffer.slice(..), IndexFormat::Uint32);
            rp.draw_indexed(0..self.ground_mesh.index_count, 0, 0..1);

            // BOXES
            if self.box_count > 0 {
                rp.set_vertex_buffer(0, self.box_mesh.vertex_buffer.slice(..));
                rp.set_vertex_buffer(1, self.box_instances.slice(..));
                rp.set_index_buffer(self.box_mesh.index_buffer.slice(..), IndexFormat::Uint32);
                rp.draw_indexed(0..self.box_mesh.index_count, 0, 0..self.box_count);
            }
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.surface_config.width, self.surface_config.height],
            pixels_per_point: ui.pixels_per_point,
        };
        let egui_commands = self
            .egui_renderer
            .update_buffers(device, queue, &mut encoder, &ui.primitives, &screen_descriptor);

        {
            let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("egui_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer
                .render(&mut egui_pass.forget_lifetime(), &ui.primitives, &screen_descriptor);
        }

        for id in &ui.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        queue.submit(egui_commands.into_iter().chain(std::iter::once(encoder.finish())));
        frame.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use glam::{Mat4, Quat, Vec3, Vec4};

    #[test]
    fn uniform_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 64);
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 80);
    }

    #[test]
    fn instance_matrix_places_mesh_at_its_transform() {
        let scene = Scene::new(&SceneConfig { body_count: 1, color_seed: Some(3), ..SceneConfig::default() });
        let mut mesh = scene.boxes[0].clone();
        mesh.transform.position = Vec3::new(1.0, 2.0, 3.0);
        mesh.transform.rotation = Quat::from_rotation_y(0.5);

        let raw = InstanceRaw::from(&mesh);
        let model = Mat4::from_cols_array_2d(&raw.model);
        let origin = model * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(origin.truncate().abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
        assert_eq!(raw.color, mesh.color);
    }

    #[test]
    fn lighting_packs_point_light_parameters() {
        let scene = Scene::new(&SceneConfig { body_count: 0, ..SceneConfig::default() });
        let lighting = LightingUniform::from_scene(&scene);
        assert_eq!(lighting.point_position, [20.0, 20.0, 0.0, 100.0]);
        assert_eq!(lighting.point_color[3], 4.0);
        assert_eq!(lighting.point_params[0], 0.2);
    }
}
