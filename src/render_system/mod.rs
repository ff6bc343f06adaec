pub mod lighting;
pub mod model;
pub mod vp;

use std::{collections::HashMap, sync::Arc};

use log::{debug, error, info, warn};
use nalgebra_glm::{identity, vec3};
use vulkano_win::VkSurfaceBuild;

use winit::{
    dpi::LogicalSize,
    event_loop::EventLoop,
    window::{Fullscreen, Window, WindowBuilder},
};

use vulkano::{
    buffer::{
        allocator::{SubbufferAllocator, SubbufferAllocatorCreateInfo},
        Buffer, BufferCreateInfo, BufferUsage, Subbuffer,
    },
    command_buffer::{
        allocator::{StandardCommandBufferAllocator, StandardCommandBufferAllocatorCreateInfo},
        AutoCommandBufferBuilder, CommandBufferUsage, PrimaryAutoCommandBuffer,
        PrimaryCommandBufferAbstract, RenderPassBeginInfo, SubpassContents,
    },
    descriptor_set::{
        allocator::StandardDescriptorSetAllocator, DescriptorSetsCollection,
        PersistentDescriptorSet, WriteDescriptorSet,
    },
    device::{
        physical::PhysicalDeviceType, Device, DeviceCreateInfo, DeviceExtensions, Queue,
        QueueCreateInfo, QueueFlags,
    },
    format::{ClearValue, Format},
    image::{
        view::ImageView, AttachmentImage, ImageAccess, ImageDimensions, ImageUsage,
        ImmutableImage, MipmapsCount, SwapchainImage,
    },
    instance::{Instance, InstanceCreateInfo},
    memory::allocator::{AllocationCreateInfo, MemoryUsage, StandardMemoryAllocator},
    pipeline::{
        graphics::{
            color_blend::ColorBlendState,
            depth_stencil::DepthStencilState,
            input_assembly::{InputAssemblyState, PrimitiveTopology},
            rasterization::{CullMode, RasterizationState},
            vertex_input::Vertex,
            viewport::{Viewport, ViewportState},
        },
        GraphicsPipeline, Pipeline, PipelineBindPoint,
    },
    render_pass::{Framebuffer, FramebufferCreateInfo, RenderPass, Subpass},
    sampler::{Filter, Sampler, SamplerAddressMode, SamplerCreateInfo},
    swapchain::{
        self, AcquireError, PresentMode, Surface, Swapchain, SwapchainAcquireFuture,
        SwapchainCreateInfo, SwapchainCreationError, SwapchainPresentInfo,
    },
    sync::{self, FlushError, GpuFuture},
    VulkanLibrary,
};

use crate::{
    config::ViewerConfig,
    gui::GuiTexture,
    obj_loader::{GuiVertex, TexturedVertex},
    renderer::{FrameSink, FrameUniforms, GuiInstance, InstanceData, PipelineKind},
    render_system::{
        lighting::light::Light,
        model::{ModelId, ModelRegistry, TexturedModel},
        vp::{perspective_projection, VP},
    },
    shaders::{entity_frag, entity_vert, ground_frag, ground_vert, gui_frag, gui_vert},
};

pub fn get_render_pass(device: &Arc<Device>, swapchain: &Arc<Swapchain>) -> Arc<RenderPass> {
    vulkano::single_pass_renderpass!(
        device.clone(),
        attachments: {
            color: {
                load: Clear,
                store: Store,
                format: swapchain.image_format(),
                samples: 1,
            },
            depth: {
                load: Clear,
                store: DontCare,
                format: Format::D16_UNORM,
                samples: 1,
            }
        },
        pass: {
            color: [color],
            depth_stencil: {depth}
        }
    )
    .expect("Failed to create render pass")
}

pub fn gen_framebuffers(
    images: &[Arc<SwapchainImage>],
    render_pass: &Arc<RenderPass>,
    depth_buffer: &Arc<ImageView<AttachmentImage>>,
) -> Vec<Arc<Framebuffer>> {
    images
        .iter()
        .map(|image| {
            let view = ImageView::new_default(image.clone()).expect("Failed to create image view");
            Framebuffer::new(
                render_pass.clone(),
                FramebufferCreateInfo {
                    attachments: vec![view, depth_buffer.clone()],
                    ..Default::default()
                },
            )
            .expect("Failed to create framebuffer")
        })
        .collect::<Vec<_>>()
}

pub fn build_entity_pipeline(
    device: Arc<Device>,
    subpass: Subpass,
    viewport: Viewport,
) -> Arc<GraphicsPipeline> {
    debug!("Building entity pipeline");
    let vert = entity_vert::load(device.clone()).expect("Failed to load entity vertex shader");
    let frag = entity_frag::load(device.clone()).expect("Failed to load entity fragment shader");
    GraphicsPipeline::start()
        .vertex_input_state(TexturedVertex::per_vertex())
        .vertex_shader(vert.entry_point("main").expect("missing main"), ())
        .input_assembly_state(InputAssemblyState::new())
        .viewport_state(ViewportState::viewport_fixed_scissor_irrelevant([viewport]))
        .fragment_shader(frag.entry_point("main").expect("missing main"), ())
        .depth_stencil_state(DepthStencilState::simple_depth_test())
        // the demo models mix winding orders
        .rasterization_state(RasterizationState::new().cull_mode(CullMode::None))
        .render_pass(subpass)
        .build(device.clone())
        .expect("Failed to build entity pipeline")
}

pub fn build_ground_pipeline(
    device: Arc<Device>,
    subpass: Subpass,
    viewport: Viewport,
) -> Arc<GraphicsPipeline> {
    debug!("Building ground pipeline");
    let vert = ground_vert::load(device.clone()).expect("Failed to load ground vertex shader");
    let frag = ground_frag::load(device.clone()).expect("Failed to load ground fragment shader");
    GraphicsPipeline::start()
        .vertex_input_state(TexturedVertex::per_vertex())
        .vertex_shader(vert.entry_point("main").expect("missing main"), ())
        .input_assembly_state(InputAssemblyState::new())
        .viewport_state(ViewportState::viewport_fixed_scissor_irrelevant([viewport]))
        .fragment_shader(frag.entry_point("main").expect("missing main"), ())
        .depth_stencil_state(DepthStencilState::simple_depth_test())
        .rasterization_state(RasterizationState::new().cull_mode(CullMode::None))
        .render_pass(subpass)
        .build(device.clone())
        .expect("Failed to build ground pipeline")
}

pub fn build_gui_pipeline(
    device: Arc<Device>,
    subpass: Subpass,
    viewport: Viewport,
) -> Arc<GraphicsPipeline> {
    debug!("Building gui pipeline");
    let vert = gui_vert::load(device.clone()).expect("Failed to load gui vertex shader");
    let frag = gui_frag::load(device.clone()).expect("Failed to load gui fragment shader");
    GraphicsPipeline::start()
        .vertex_input_state(GuiVertex::per_vertex())
        .vertex_shader(vert.entry_point("main").expect("missing main"), ())
        .input_assembly_state(InputAssemblyState::new().topology(PrimitiveTopology::TriangleStrip))
        .viewport_state(ViewportState::viewport_fixed_scissor_irrelevant([viewport]))
        .fragment_shader(frag.entry_point("main").expect("missing main"), ())
        .color_blend_state(ColorBlendState::new(subpass.num_color_attachments()).blend_alpha())
        .rasterization_state(RasterizationState::new().cull_mode(CullMode::None))
        .render_pass(subpass)
        .build(device.clone())
        .expect("Failed to build gui pipeline")
}

/// A model's geometry and texture on the GPU.
struct GpuModel {
    vertex_buffer: Subbuffer<[TexturedVertex]>,
    index_buffer: Subbuffer<[u32]>,
    index_count: u32,
    texture: Arc<ImageView<ImmutableImage>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderStage {
    Stopped,
    Scene,
    Gui,
    NeedsRedraw,
}

pub struct RenderSystem {
    pub render_stage: RenderStage,

    window: Arc<Window>,
    viewport: Viewport,
    device: Arc<Device>,
    queue: Arc<Queue>,
    swapchain: Arc<Swapchain>,
    images: Vec<Arc<SwapchainImage>>,
    framebuffers: Vec<Arc<Framebuffer>>,
    render_pass: Arc<RenderPass>,

    entity_pipeline: Arc<GraphicsPipeline>,
    ground_pipeline: Arc<GraphicsPipeline>,
    gui_pipeline: Arc<GraphicsPipeline>,

    memory_allocator: Arc<StandardMemoryAllocator>,
    descriptor_set_allocator: StandardDescriptorSetAllocator,
    command_buffer_allocator: StandardCommandBufferAllocator,
    uniform_buffer_allocator: SubbufferAllocator,

    sampler: Arc<Sampler>,
    gui_vertex_buffer: Subbuffer<[GuiVertex]>,
    depth_buffer: Arc<ImageView<AttachmentImage>>,
    models: HashMap<ModelId, GpuModel>,

    vp: VP,
    settings: ProjectionSettings,
    clear_values: Vec<Option<ClearValue>>,

    commands: Option<AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>>,
    frame_data: Option<Subbuffer<entity_vert::FrameData>>,
    bound: Option<(PipelineKind, ModelId)>,
    current_image_index: u32,
    acquire_future: Option<SwapchainAcquireFuture>,
    previous_frame_end: Option<Box<dyn GpuFuture>>,
    suboptimal: bool,
}

#[derive(Debug, Clone, Copy)]
struct ProjectionSettings {
    fov_degrees: f32,
    near_clip: f32,
    far_clip: f32,
}

impl RenderSystem {
    /// Grey, matching the loading screen backdrop.
    const CLEAR_COLOUR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

    ///
    /// Create the window, a Vulkan device for it and every pipeline the scene uses.
    ///
    pub fn new(event_loop: &EventLoop<()>, config: &ViewerConfig) -> Self {
        let library = VulkanLibrary::new().expect("Failed to load vulkan library");
        let required_extensions = vulkano_win::required_extensions(&library);

        let instance = Instance::new(
            library,
            InstanceCreateInfo {
                enabled_extensions: required_extensions,
                ..Default::default()
            },
        )
        .expect("Unable to fetch Vulkan Instance.");

        let device_extensions = DeviceExtensions {
            khr_swapchain: true,
            ..DeviceExtensions::empty()
        };

        let mut window_builder = WindowBuilder::new()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width, config.height));
        if config.fullscreen {
            window_builder = window_builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let surface: Arc<Surface> = window_builder
            .build_vk_surface(event_loop, instance.clone())
            .expect("Failed to create window surface");

        let window = surface
            .object()
            .expect("Surface has no window")
            .clone()
            .downcast::<Window>()
            .expect("Surface object is not a winit window");

        let (physical_device, queue_index) = instance
            .enumerate_physical_devices()
            .expect("Failed to enumerate physical devices")
            .filter(|device| device.supported_extensions().contains(&device_extensions))
            .filter_map(|device| {
                device
                    .queue_family_properties()
                    .iter()
                    .enumerate()
                    .position(|(index, queue_props)| {
                        queue_props.queue_flags.contains(QueueFlags::GRAPHICS)
                            && device
                                .surface_support(index as u32, &surface)
                                .unwrap_or(false)
                    })
                    .map(|queue_index| (device, queue_index as u32))
            })
            .min_by_key(|(device, _)| match device.properties().device_type {
                PhysicalDeviceType::DiscreteGpu => 0,
                PhysicalDeviceType::IntegratedGpu => 1,
                PhysicalDeviceType::VirtualGpu => 2,
                PhysicalDeviceType::Cpu => 3,
                _ => 4,
            })
            .expect("No device found");

        info!(
            "Using device: {} (type: {:?})",
            physical_device.properties().device_name,
            physical_device.properties().device_type,
        );

        let (device, mut queues) = Device::new(
            physical_device.clone(),
            DeviceCreateInfo {
                queue_create_infos: vec![QueueCreateInfo {
                    queue_family_index: queue_index,
                    ..Default::default()
                }],
                enabled_extensions: device_extensions,
                ..Default::default()
            },
        )
        .expect("Failed to create device");

        let queue = queues.next().expect("Device has no queue");

        let (swapchain, images) = {
            let image_format = Some(
                physical_device
                    .surface_formats(&surface, Default::default())
                    .expect("Failed to get surface formats")[0]
                    .0,
            );

            let device_capabilities = physical_device
                .surface_capabilities(&surface, Default::default())
                .expect("Failed to get surface capabilities.");

            let alpha = device_capabilities
                .supported_composite_alpha
                .into_iter()
                .next()
                .expect("No composite alpha mode supported");

            // only Fifo is guaranteed to exist
            let immediate_supported = physical_device
                .surface_present_modes(&surface)
                .map(|mut modes| modes.any(|mode| mode == PresentMode::Immediate))
                .unwrap_or(false);
            let present_mode = if config.uncapped_fps && immediate_supported {
                PresentMode::Immediate
            } else {
                PresentMode::Fifo
            };
            debug!("Presenting with {:?}", present_mode);

            Swapchain::new(
                device.clone(),
                surface.clone(),
                SwapchainCreateInfo {
                    min_image_count: device_capabilities.min_image_count + 1,
                    image_format,
                    image_extent: window.inner_size().into(),
                    image_usage: ImageUsage::COLOR_ATTACHMENT,
                    composite_alpha: alpha,
                    present_mode,
                    ..Default::default()
                },
            )
            .expect("Failed to create swapchain")
        };

        let viewport = Viewport {
            origin: [0.0, 0.0],
            dimensions: window.inner_size().into(),
            depth_range: 0.0..1.0,
        };

        let settings = ProjectionSettings {
            fov_degrees: config.fov_degrees,
            near_clip: config.near_clip,
            far_clip: config.far_clip,
        };

        // Allocators
        let memory_allocator = Arc::new(StandardMemoryAllocator::new_default(device.clone()));
        let descriptor_set_allocator = StandardDescriptorSetAllocator::new(device.clone());
        let command_buffer_allocator = StandardCommandBufferAllocator::new(
            device.clone(),
            StandardCommandBufferAllocatorCreateInfo::default(),
        );

        let uniform_buffer_allocator = SubbufferAllocator::new(
            memory_allocator.clone(),
            SubbufferAllocatorCreateInfo {
                buffer_usage: BufferUsage::UNIFORM_BUFFER,
                memory_usage: MemoryUsage::Upload,
                ..Default::default()
            },
        );

        let sampler = Sampler::new(
            device.clone(),
            SamplerCreateInfo {
                mag_filter: Filter::Linear,
                min_filter: Filter::Linear,
                address_mode: [SamplerAddressMode::Repeat; 3],
                ..Default::default()
            },
        )
        .expect("Failed to create sampler");

        let gui_vertex_buffer = Buffer::from_iter(
            &memory_allocator,
            BufferCreateInfo {
                usage: BufferUsage::VERTEX_BUFFER,
                ..Default::default()
            },
            AllocationCreateInfo {
                usage: MemoryUsage::Upload,
                ..Default::default()
            },
            GuiVertex::list().iter().cloned(),
        )
        .expect("Failed to create gui vertex buffer");

        let render_pass = get_render_pass(&device, &swapchain);
        let subpass = Subpass::from(render_pass.clone(), 0).expect("Render pass has no subpass");

        let depth_buffer = ImageView::new_default(
            AttachmentImage::transient(
                &memory_allocator,
                images[0].dimensions().width_height(),
                Format::D16_UNORM,
            )
            .expect("Failed to create depth buffer"),
        )
        .expect("Failed to create depth buffer view");

        let framebuffers = gen_framebuffers(&images, &render_pass, &depth_buffer);

        let entity_pipeline =
            build_entity_pipeline(device.clone(), subpass.clone(), viewport.clone());
        let ground_pipeline =
            build_ground_pipeline(device.clone(), subpass.clone(), viewport.clone());
        let gui_pipeline = build_gui_pipeline(device.clone(), subpass, viewport.clone());

        let mut vp = VP::new();
        let extent: [u32; 2] = window.inner_size().into();
        vp.projection = perspective_projection(
            extent[0] as f32 / extent[1].max(1) as f32,
            settings.fov_degrees,
            settings.near_clip,
            settings.far_clip,
        );

        let previous_frame_end = Some(sync::now(device.clone()).boxed());

        RenderSystem {
            render_stage: RenderStage::Stopped,

            window,
            viewport,
            device,
            queue,
            swapchain,
            images,
            framebuffers,
            render_pass,

            entity_pipeline,
            ground_pipeline,
            gui_pipeline,

            memory_allocator,
            descriptor_set_allocator,
            command_buffer_allocator,
            uniform_buffer_allocator,

            sampler,
            gui_vertex_buffer,
            depth_buffer,
            models: HashMap::new(),

            vp,
            settings,
            clear_values: vec![Some(Self::CLEAR_COLOUR.into()), Some(1.0.into())],

            commands: None,
            frame_data: None,
            bound: None,
            current_image_index: 0,
            acquire_future: None,
            previous_frame_end,
            suboptimal: false,
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Projection for the current window size.
    pub fn projection(&self) -> nalgebra_glm::TMat4<f32> {
        self.vp.projection
    }

    ///
    /// Copy every model of `registry` that is not on the GPU yet.
    ///
    pub fn upload_models(&mut self, registry: &ModelRegistry) {
        let mut uploads = self.create_command_builder();
        let mut uploaded = 0;

        for (id, asset) in registry.iter() {
            if self.models.contains_key(&id) {
                continue;
            }

            let vertex_buffer = Buffer::from_iter(
                &self.memory_allocator,
                BufferCreateInfo {
                    usage: BufferUsage::VERTEX_BUFFER,
                    ..Default::default()
                },
                AllocationCreateInfo {
                    usage: MemoryUsage::Upload,
                    ..Default::default()
                },
                asset.mesh.vertices.iter().cloned(),
            )
            .expect("Failed to create vertex buffer");

            let index_buffer = Buffer::from_iter(
                &self.memory_allocator,
                BufferCreateInfo {
                    usage: BufferUsage::INDEX_BUFFER,
                    ..Default::default()
                },
                AllocationCreateInfo {
                    usage: MemoryUsage::Upload,
                    ..Default::default()
                },
                asset.mesh.indices.iter().cloned(),
            )
            .expect("Failed to create index buffer");

            let image = ImmutableImage::from_iter(
                &self.memory_allocator,
                asset.texture.pixels.iter().cloned(),
                ImageDimensions::Dim2d {
                    width: asset.texture.width,
                    height: asset.texture.height,
                    array_layers: 1,
                },
                MipmapsCount::One,
                Format::R8G8B8A8_SRGB,
                &mut uploads,
            )
            .expect("Failed to upload texture");

            let texture = ImageView::new_default(image).expect("Failed to create texture view");

            self.models.insert(
                id,
                GpuModel {
                    vertex_buffer,
                    index_buffer,
                    index_count: asset.mesh.indices.len() as u32,
                    texture,
                },
            );
            uploaded += 1;
        }

        if uploaded == 0 {
            return;
        }

        let upload_future = uploads
            .build()
            .expect("Failed to build upload commands")
            .execute(self.queue.clone())
            .expect("Failed to submit uploads");

        let previous = self
            .previous_frame_end
            .take()
            .unwrap_or_else(|| sync::now(self.device.clone()).boxed());
        self.previous_frame_end = Some(previous.join(upload_future).boxed());

        info!("Uploaded {} models to the GPU", uploaded);
    }

    ///
    /// Clear to grey and cover the window with `model`'s texture.
    ///
    pub fn draw_loading_screen(&mut self, model: TexturedModel) {
        let frame = FrameUniforms {
            projection: identity(),
            view: identity(),
            light: Light::white(vec3(0.0, 0.0, 0.0)),
        };
        let screen = GuiTexture::full_screen(model);

        // the first acquire can report an out of date swapchain
        for _ in 0..3 {
            if self.begin_frame(&frame) {
                self.draw_gui(&GuiInstance {
                    texture: screen.texture.id,
                    position: [screen.position.x, screen.position.y],
                    scale: [screen.scale.x, screen.scale.y],
                });
                self.end_frame();
                return;
            }
        }
        warn!("Could not present the loading screen");
    }

    fn create_command_builder(&self) -> AutoCommandBufferBuilder<PrimaryAutoCommandBuffer> {
        AutoCommandBufferBuilder::primary(
            &self.command_buffer_allocator,
            self.queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )
        .expect("Unable to create Command Buffer Builder!")
    }

    fn bind_pipeline_to_command_builder<S>(
        builder: &mut AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>,
        pipeline: &Arc<GraphicsPipeline>,
        first_set: u32,
        descriptor_sets: S,
    ) where
        S: DescriptorSetsCollection,
    {
        builder.bind_pipeline_graphics(pipeline.clone()).bind_descriptor_sets(
            PipelineBindPoint::Graphics,
            pipeline.layout().clone(),
            first_set,
            descriptor_sets,
        );
    }

    fn pipeline(&self, kind: PipelineKind) -> &Arc<GraphicsPipeline> {
        match kind {
            PipelineKind::Entity => &self.entity_pipeline,
            PipelineKind::Ground => &self.ground_pipeline,
        }
    }

    fn descriptor_set(
        &self,
        pipeline: &Arc<GraphicsPipeline>,
        set: usize,
        writes: impl IntoIterator<Item = WriteDescriptorSet>,
    ) -> Arc<PersistentDescriptorSet> {
        let layout = pipeline
            .layout()
            .set_layouts()
            .get(set)
            .expect("Pipeline is missing a descriptor set layout");

        PersistentDescriptorSet::new(&self.descriptor_set_allocator, layout.clone(), writes)
            .expect("Failed to create descriptor set")
    }

    fn upload_uniform<T: vulkano::buffer::BufferContents>(&self, data: T) -> Subbuffer<T> {
        let buffer: Subbuffer<T> = self
            .uniform_buffer_allocator
            .allocate_sized()
            .expect("Failed to allocate uniform buffer");
        *buffer.write().expect("Uniform buffer is in use") = data;
        buffer
    }

    fn abandon_frame(&mut self) {
        self.commands = None;
        self.frame_data = None;
        self.bound = None;
        self.acquire_future = None;
        self.render_stage = RenderStage::Stopped;
    }

    pub fn recreate_swapchain(&mut self) {
        let new_dimensions = self.window.inner_size();
        if new_dimensions.width == 0 || new_dimensions.height == 0 {
            // minimised; try again once the window has an area
            self.render_stage = RenderStage::NeedsRedraw;
            return;
        }

        let (new_swapchain, new_images) = match self.swapchain.recreate(SwapchainCreateInfo {
            image_extent: new_dimensions.into(),
            ..self.swapchain.create_info()
        }) {
            Ok(r) => r,
            Err(SwapchainCreationError::ImageExtentNotSupported { .. }) => return,
            Err(e) => panic!("Failed to recreate swapchain: {e}"),
        };
        info!(
            "Recreated swapchain at {}x{}",
            new_dimensions.width, new_dimensions.height
        );

        self.swapchain = new_swapchain;
        self.images = new_images;
        self.render_pass = get_render_pass(&self.device, &self.swapchain);
        let subpass = Subpass::from(self.render_pass.clone(), 0).expect("Render pass has no subpass");

        self.depth_buffer = ImageView::new_default(
            AttachmentImage::transient(
                &self.memory_allocator,
                self.images[0].dimensions().width_height(),
                Format::D16_UNORM,
            )
            .expect("Failed to create depth buffer"),
        )
        .expect("Failed to create depth buffer view");

        self.framebuffers = gen_framebuffers(&self.images, &self.render_pass, &self.depth_buffer);

        self.viewport.dimensions = new_dimensions.into();
        let image_extent: [u32; 2] = new_dimensions.into();
        let aspect_ratio = image_extent[0] as f32 / image_extent[1] as f32;
        self.vp.projection = perspective_projection(
            aspect_ratio,
            self.settings.fov_degrees,
            self.settings.near_clip,
            self.settings.far_clip,
        );

        self.entity_pipeline =
            build_entity_pipeline(self.device.clone(), subpass.clone(), self.viewport.clone());
        self.ground_pipeline =
            build_ground_pipeline(self.device.clone(), subpass.clone(), self.viewport.clone());
        self.gui_pipeline = build_gui_pipeline(self.device.clone(), subpass, self.viewport.clone());

        self.render_stage = RenderStage::Stopped;
    }
}

impl FrameSink for RenderSystem {
    fn begin_frame(&mut self, frame: &FrameUniforms) -> bool {
        match self.render_stage {
            RenderStage::Stopped => {}
            RenderStage::NeedsRedraw => {
                self.recreate_swapchain();
                if self.render_stage == RenderStage::NeedsRedraw {
                    return false;
                }
            }
            _ => {
                warn!("Frame started while another was in progress; dropping it");
                self.abandon_frame();
                return false;
            }
        }

        if let Some(previous) = self.previous_frame_end.as_mut() {
            previous.cleanup_finished();
        }

        let (image_index, suboptimal, acquire_future) =
            match swapchain::acquire_next_image(self.swapchain.clone(), None) {
                Ok(r) => r,
                Err(AcquireError::OutOfDate) => {
                    self.recreate_swapchain();
                    return false;
                }
                Err(e) => panic!("Failed to acquire next image: {e}"),
            };

        if suboptimal {
            debug!("Suboptimal swapchain, recreating after this frame");
            self.suboptimal = true;
        }

        let mut commands = self.create_command_builder();
        commands
            .begin_render_pass(
                RenderPassBeginInfo {
                    clear_values: self.clear_values.clone(),
                    ..RenderPassBeginInfo::framebuffer(
                        self.framebuffers[image_index as usize].clone(),
                    )
                },
                SubpassContents::Inline,
            )
            .expect("Failed to begin render pass");

        self.frame_data = Some(self.upload_uniform(entity_vert::FrameData {
            view: frame.view.into(),
            projection: frame.projection.into(),
            light_position: frame.light.position_array(),
            light_colour: frame.light.colour_array(),
        }));

        self.commands = Some(commands);
        self.current_image_index = image_index;
        self.acquire_future = Some(acquire_future);
        self.bound = None;
        self.render_stage = RenderStage::Scene;
        true
    }

    fn bind_model(&mut self, pipeline_kind: PipelineKind, model: ModelId) {
        if self.render_stage != RenderStage::Scene {
            warn!("bind_model outside the scene stage ignored");
            return;
        }

        let Some(gpu_model) = self.models.get(&model) else {
            warn!("{:?} was never uploaded; skipping its batch", model);
            self.bound = None;
            return;
        };

        let pipeline = self.pipeline(pipeline_kind).clone();
        let frame_data = self
            .frame_data
            .clone()
            .expect("frame data is written in begin_frame");

        let frame_set = self.descriptor_set(&pipeline, 0, [WriteDescriptorSet::buffer(0, frame_data)]);
        let texture_set = self.descriptor_set(
            &pipeline,
            1,
            [WriteDescriptorSet::image_view_sampler(
                0,
                gpu_model.texture.clone(),
                self.sampler.clone(),
            )],
        );

        let vertex_buffer = gpu_model.vertex_buffer.clone();
        let index_buffer = gpu_model.index_buffer.clone();

        let mut commands = self.commands.take().expect("commands exist in the scene stage");
        Self::bind_pipeline_to_command_builder(
            &mut commands,
            &pipeline,
            0,
            (frame_set, texture_set),
        );
        commands
            .bind_vertex_buffers(0, vertex_buffer)
            .bind_index_buffer(index_buffer);
        self.commands = Some(commands);

        self.bound = Some((pipeline_kind, model));
    }

    fn draw_instance(&mut self, instance: &InstanceData) {
        let Some((pipeline_kind, model)) = self.bound else {
            return;
        };
        let index_count = match self.models.get(&model) {
            Some(gpu_model) => gpu_model.index_count,
            None => return,
        };

        let pipeline = self.pipeline(pipeline_kind).clone();
        let instance_write = match pipeline_kind {
            PipelineKind::Entity => WriteDescriptorSet::buffer(
                0,
                self.upload_uniform(entity_vert::InstanceData {
                    transform: instance.transform.into(),
                    reflectivity: instance.material.reflectivity,
                    shine_damper: instance.material.shine_damper,
                }),
            ),
            PipelineKind::Ground => WriteDescriptorSet::buffer(
                0,
                self.upload_uniform(ground_vert::GroundInstance {
                    transform: instance.transform.into(),
                }),
            ),
        };
        let instance_set = self.descriptor_set(&pipeline, 2, [instance_write]);

        let mut commands = self.commands.take().expect("commands exist in the scene stage");
        commands.bind_descriptor_sets(
            PipelineBindPoint::Graphics,
            pipeline.layout().clone(),
            2,
            instance_set,
        );
        if let Err(e) = commands.draw_indexed(index_count, 1, 0, 0, 0) {
            error!("Failed to draw {:?}: {e}", model);
        }
        self.commands = Some(commands);
    }

    fn draw_gui(&mut self, gui: &GuiInstance) {
        match self.render_stage {
            RenderStage::Scene => {
                // no more 3D after the first gui quad
                self.render_stage = RenderStage::Gui;
                self.bound = None;
            }
            RenderStage::Gui => {}
            _ => {
                warn!("draw_gui outside a frame ignored");
                return;
            }
        }

        let Some(gpu_model) = self.models.get(&gui.texture) else {
            warn!("gui texture {:?} was never uploaded", gui.texture);
            return;
        };

        let pipeline = self.gui_pipeline.clone();
        let texture_set = self.descriptor_set(
            &pipeline,
            0,
            [WriteDescriptorSet::image_view_sampler(
                0,
                gpu_model.texture.clone(),
                self.sampler.clone(),
            )],
        );
        let placement = self.upload_uniform(gui_vert::GuiData {
            translation: gui.position,
            scale: gui.scale,
        });
        let placement_set =
            self.descriptor_set(&pipeline, 1, [WriteDescriptorSet::buffer(0, placement)]);

        let mut commands = self.commands.take().expect("commands exist in the gui stage");
        Self::bind_pipeline_to_command_builder(
            &mut commands,
            &pipeline,
            0,
            (texture_set, placement_set),
        );
        commands.bind_vertex_buffers(0, self.gui_vertex_buffer.clone());
        if let Err(e) = commands.draw(self.gui_vertex_buffer.len() as u32, 1, 0, 0) {
            error!("Failed to draw gui quad: {e}");
        }
        self.commands = Some(commands);
    }

    fn end_frame(&mut self) {
        match self.render_stage {
            RenderStage::Scene | RenderStage::Gui => {}
            _ => {
                self.abandon_frame();
                return;
            }
        }

        let (Some(mut commands), Some(acquire_future)) =
            (self.commands.take(), self.acquire_future.take())
        else {
            self.abandon_frame();
            return;
        };

        commands.end_render_pass().expect("Failed to end render pass");
        let command_buffer = commands.build().expect("Failed to build command buffer");

        let previous = self
            .previous_frame_end
            .take()
            .unwrap_or_else(|| sync::now(self.device.clone()).boxed());

        let future = previous
            .join(acquire_future)
            .then_execute(self.queue.clone(), command_buffer)
            .expect("Failed to execute frame commands")
            .then_swapchain_present(
                self.queue.clone(),
                SwapchainPresentInfo::swapchain_image_index(
                    self.swapchain.clone(),
                    self.current_image_index,
                ),
            )
            .then_signal_fence_and_flush();

        let mut needs_redraw = std::mem::take(&mut self.suboptimal);
        match future {
            Ok(future) => {
                self.previous_frame_end = Some(future.boxed());
            }
            Err(FlushError::OutOfDate) => {
                needs_redraw = true;
                self.previous_frame_end = Some(sync::now(self.device.clone()).boxed());
            }
            Err(e) => {
                error!("Failed to flush future: {:?}", e);
                self.previous_frame_end = Some(sync::now(self.device.clone()).boxed());
            }
        }

        self.abandon_frame();
        if needs_redraw {
            self.render_stage = RenderStage::NeedsRedraw;
        }
    }
}
