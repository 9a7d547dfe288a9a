//! An in-process backend with simulated adapters.
//!
//! Handles are sequential ids. Every live resource is tracked with its
//! parents, every destroy is recorded in order, and misuse (destroying an
//! unknown handle, or a parent before its children) is logged as a
//! violation instead of crashing.
//!
//! A device is a child of the instance its physical device was enumerated
//! from. A swapchain is a child of both its device and its surface.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use mu_array::Array;
use mu_ranges::{count, move_construct, range, range_mut, transform};
use serde::{Deserialize, Serialize};

use crate::backend::{
    Backend, BackendError, DeviceInfo, InstanceInfo, PipelineInfo, RenderPassInfo, Slots,
    SwapchainInfo,
};
use crate::raw::{
    Allocator, ColorSpace, Device, DeviceType, Extent2D, ExtensionProperties, Format, Image,
    ImageView, Instance, LayerProperties, PhysicalDevice, PhysicalDeviceProperties, Pipeline,
    PipelineLayout, PresentMode, QueueFamilyProperties, QueueFlags, RenderPass, ShaderModule,
    Surface, SurfaceCapabilities, SurfaceFormat, Swapchain,
};

/// Simulated environment: available layers and adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessConfig {
    pub layers: Array<String>,
    pub adapters: Array<AdapterConfig>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            layers: mu_array::array!["VK_LAYER_LUNARG_standard_validation".to_owned()],
            adapters: mu_array::array![AdapterConfig::default()],
        }
    }
}

/// One simulated physical device and what it reports for any surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub name: String,
    pub device_type: DeviceType,
    pub api_version: u32,
    pub extensions: Array<String>,
    pub queue_families: Array<QueueFamilyProperties>,
    /// Queue family indices that can present to a surface.
    pub present_families: Array<u32>,
    pub surface_formats: Array<SurfaceFormat>,
    pub present_modes: Array<PresentMode>,
    pub capabilities: SurfaceCapabilities,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            name: "Headless Adapter".to_owned(),
            device_type: DeviceType::DiscreteGpu,
            api_version: 1 << 22,
            extensions: mu_array::array!["VK_KHR_swapchain".to_owned()],
            queue_families: mu_array::array![
                QueueFamilyProperties {
                    queue_flags: QueueFlags::GRAPHICS
                        | QueueFlags::COMPUTE
                        | QueueFlags::TRANSFER,
                    queue_count: 16,
                },
                QueueFamilyProperties {
                    queue_flags: QueueFlags::TRANSFER,
                    queue_count: 2,
                },
            ],
            present_families: mu_array::array![0],
            surface_formats: mu_array::array![
                SurfaceFormat::new(Format::B8G8R8A8_UNORM, ColorSpace::SRGB_NONLINEAR),
                SurfaceFormat::new(Format::B8G8R8A8_SRGB, ColorSpace::SRGB_NONLINEAR),
            ],
            present_modes: mu_array::array![PresentMode::FIFO, PresentMode::MAILBOX],
            capabilities: SurfaceCapabilities {
                min_image_count: 2,
                max_image_count: 8,
                current_extent: Extent2D::new(1280, 720),
                min_image_extent: Extent2D::new(1, 1),
                max_image_extent: Extent2D::new(4096, 4096),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Instance,
    Surface,
    Device,
    Swapchain,
    Image,
    ImageView,
    ShaderModule,
    PipelineLayout,
    RenderPass,
    Pipeline,
}

impl ResourceKind {
    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Instance => "instance",
            ResourceKind::Surface => "surface",
            ResourceKind::Device => "device",
            ResourceKind::Swapchain => "swapchain",
            ResourceKind::Image => "image",
            ResourceKind::ImageView => "image view",
            ResourceKind::ShaderModule => "shader module",
            ResourceKind::PipelineLayout => "pipeline layout",
            ResourceKind::RenderPass => "render pass",
            ResourceKind::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A destroy call the backend accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestroyRecord {
    pub kind: ResourceKind,
    pub id: u64,
}

/// First word of every SPIR-V module.
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

#[derive(Debug, Clone)]
struct Live {
    kind: ResourceKind,
    parents: Array<u64>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    live: HashMap<u64, Live>,
    swapchain_images: HashMap<u64, Array<Image>>,
    /// Physical device id to the instance that last enumerated it.
    enumerated_by: HashMap<u64, u64>,
    destroyed: Array<DestroyRecord>,
    violations: Array<String>,
    fail_next: Option<&'static str>,
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    config: HeadlessConfig,
    state: RefCell<State>,
}

/// Two-call fill from a slice of plain values.
fn fill<T: Copy>(items: &[T], out: Slots<'_, T>) -> usize {
    match out {
        None => items.len(),
        Some(slots) => {
            let capacity = slots.len();
            let source = transform(range(items), |item: &T| *item);
            let rest = move_construct(range_mut(slots), source);
            capacity - count(rest)
        }
    }
}

fn names_to_properties(names: &[String]) -> Array<ExtensionProperties> {
    names
        .iter()
        .map(|name| ExtensionProperties::new(name, 1))
        .collect()
}

impl HeadlessBackend {
    pub fn new(config: HeadlessConfig) -> Self {
        Self {
            config,
            state: RefCell::default(),
        }
    }

    pub fn config(&self) -> &HeadlessConfig {
        &self.config
    }

    /// Make the next call named `call` fail.
    pub fn fail_next(&self, call: &'static str) {
        self.state.borrow_mut().fail_next = Some(call);
    }

    pub fn live_count(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn destroyed(&self) -> Array<DestroyRecord> {
        self.state.borrow().destroyed.clone()
    }

    pub fn violations(&self) -> Array<String> {
        self.state.borrow().violations.clone()
    }

    fn check_failure(&self, call: &'static str) -> Result<(), BackendError> {
        let mut state = self.state.borrow_mut();
        if state.fail_next == Some(call) {
            state.fail_next = None;
            tracing::debug!(call, "injected failure");
            return Err(BackendError::call_failed(call, "injected failure"));
        }
        Ok(())
    }

    fn allocate(&self, kind: ResourceKind, parents: &[u64]) -> u64 {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        let parents: Array<u64> = parents.iter().copied().collect();
        tracing::trace!(%kind, id, ?parents, "allocated");
        state.live.insert(id, Live { kind, parents });
        id
    }

    fn expect_live(&self, kind: ResourceKind, id: u64) -> Result<(), BackendError> {
        match self.state.borrow().live.get(&id) {
            Some(live) if live.kind == kind => Ok(()),
            _ => Err(BackendError::UnknownHandle {
                kind: kind.name(),
                id,
            }),
        }
    }

    fn release(&self, kind: ResourceKind, id: u64) {
        let mut state = self.state.borrow_mut();
        let known = matches!(state.live.get(&id), Some(live) if live.kind == kind);
        if !known {
            let message = format!("destroy of unknown {kind} {id}");
            tracing::error!("{message}");
            state.violations.add(message);
            return;
        }

        let children = state
            .live
            .values()
            .filter(|live| live.parents.contains(&id) && live.kind != ResourceKind::Image)
            .count();
        if children > 0 {
            let message = format!("{kind} {id} destroyed with {children} live children");
            tracing::error!("{message}");
            state.violations.add(message);
        }

        if kind == ResourceKind::Swapchain {
            if let Some(images) = state.swapchain_images.remove(&id) {
                for image in &images {
                    state.live.remove(&image.0);
                }
            }
        }
        state.live.remove(&id);
        state.destroyed.add(DestroyRecord { kind, id });
        tracing::trace!(%kind, id, "destroyed");
    }

    fn adapter(&self, device: PhysicalDevice) -> Result<&AdapterConfig, BackendError> {
        let index = device.0.checked_sub(1).map(|i| i as usize);
        match index.and_then(|i| self.config.adapters.get(i)) {
            Some(adapter) => Ok(adapter),
            None => Err(BackendError::UnknownHandle {
                kind: "physical device",
                id: device.0,
            }),
        }
    }
}

// SAFETY: every two-call query goes through `fill`, which reports exactly the
// number of slots it wrote.
unsafe impl Backend for HeadlessBackend {
    fn instance_layers(&self, out: Slots<'_, LayerProperties>) -> Result<usize, BackendError> {
        self.check_failure("instance_layers")?;
        Ok(fill(&names_to_properties(&self.config.layers), out))
    }

    fn create_instance(
        &self,
        info: &InstanceInfo,
        _allocator: Allocator,
        slot: &mut Instance,
    ) -> Result<(), BackendError> {
        self.check_failure("create_instance")?;
        for layer in &info.layers {
            if !self.config.layers.contains(layer) {
                return Err(BackendError::call_failed(
                    "create_instance",
                    format!("layer {layer} not present"),
                ));
            }
        }
        *slot = Instance(self.allocate(ResourceKind::Instance, &[]));
        Ok(())
    }

    fn destroy_instance(&self, instance: Instance, _allocator: Allocator) {
        self.release(ResourceKind::Instance, instance.0);
    }

    fn create_surface(
        &self,
        instance: Instance,
        _allocator: Allocator,
        slot: &mut Surface,
    ) -> Result<(), BackendError> {
        self.check_failure("create_surface")?;
        self.expect_live(ResourceKind::Instance, instance.0)?;
        *slot = Surface(self.allocate(ResourceKind::Surface, &[instance.0]));
        Ok(())
    }

    fn destroy_surface(&self, _instance: Instance, surface: Surface, _allocator: Allocator) {
        self.release(ResourceKind::Surface, surface.0);
    }

    fn physical_devices(
        &self,
        instance: Instance,
        out: Slots<'_, PhysicalDevice>,
    ) -> Result<usize, BackendError> {
        self.check_failure("physical_devices")?;
        self.expect_live(ResourceKind::Instance, instance.0)?;
        let devices: Array<PhysicalDevice> = (1..=self.config.adapters.num() as u64)
            .map(PhysicalDevice)
            .collect();
        let mut state = self.state.borrow_mut();
        for device in &devices {
            state.enumerated_by.insert(device.0, instance.0);
        }
        Ok(fill(&devices, out))
    }

    fn device_properties(
        &self,
        device: PhysicalDevice,
    ) -> Result<PhysicalDeviceProperties, BackendError> {
        let adapter = self.adapter(device)?;
        Ok(PhysicalDeviceProperties {
            name: adapter.name.clone(),
            device_type: adapter.device_type,
            api_version: adapter.api_version,
        })
    }

    fn device_extensions(
        &self,
        device: PhysicalDevice,
        out: Slots<'_, ExtensionProperties>,
    ) -> Result<usize, BackendError> {
        let adapter = self.adapter(device)?;
        Ok(fill(&names_to_properties(&adapter.extensions), out))
    }

    fn queue_families(
        &self,
        device: PhysicalDevice,
        out: Slots<'_, QueueFamilyProperties>,
    ) -> Result<usize, BackendError> {
        Ok(fill(&self.adapter(device)?.queue_families, out))
    }

    fn surface_support(
        &self,
        device: PhysicalDevice,
        queue_family: u32,
        surface: Surface,
    ) -> Result<bool, BackendError> {
        self.expect_live(ResourceKind::Surface, surface.0)?;
        Ok(self.adapter(device)?.present_families.contains(&queue_family))
    }

    fn surface_capabilities(
        &self,
        device: PhysicalDevice,
        surface: Surface,
    ) -> Result<SurfaceCapabilities, BackendError> {
        self.expect_live(ResourceKind::Surface, surface.0)?;
        Ok(self.adapter(device)?.capabilities)
    }

    fn surface_formats(
        &self,
        device: PhysicalDevice,
        surface: Surface,
        out: Slots<'_, SurfaceFormat>,
    ) -> Result<usize, BackendError> {
        self.check_failure("surface_formats")?;
        self.expect_live(ResourceKind::Surface, surface.0)?;
        Ok(fill(&self.adapter(device)?.surface_formats, out))
    }

    fn present_modes(
        &self,
        device: PhysicalDevice,
        surface: Surface,
        out: Slots<'_, PresentMode>,
    ) -> Result<usize, BackendError> {
        self.check_failure("present_modes")?;
        self.expect_live(ResourceKind::Surface, surface.0)?;
        Ok(fill(&self.adapter(device)?.present_modes, out))
    }

    fn create_device(
        &self,
        physical: PhysicalDevice,
        info: &DeviceInfo,
        _allocator: Allocator,
        slot: &mut Device,
    ) -> Result<(), BackendError> {
        self.check_failure("create_device")?;
        let adapter = self.adapter(physical)?;
        let enumerated_by = self.state.borrow().enumerated_by.get(&physical.0).copied();
        let Some(instance) = enumerated_by else {
            return Err(BackendError::call_failed(
                "create_device",
                format!("physical device {} was never enumerated", physical.0),
            ));
        };
        self.expect_live(ResourceKind::Instance, instance)?;
        for family in &info.queue_families {
            if *family as usize >= adapter.queue_families.num() {
                return Err(BackendError::call_failed(
                    "create_device",
                    format!("queue family {family} out of range"),
                ));
            }
        }
        for extension in &info.extensions {
            if !adapter.extensions.contains(extension) {
                return Err(BackendError::call_failed(
                    "create_device",
                    format!("extension {extension} not supported"),
                ));
            }
        }
        *slot = Device(self.allocate(ResourceKind::Device, &[instance]));
        Ok(())
    }

    fn destroy_device(&self, device: Device, _allocator: Allocator) {
        self.release(ResourceKind::Device, device.0);
    }

    fn create_swapchain(
        &self,
        device: Device,
        info: &SwapchainInfo,
        _allocator: Allocator,
        slot: &mut Swapchain,
    ) -> Result<(), BackendError> {
        self.check_failure("create_swapchain")?;
        self.expect_live(ResourceKind::Device, device.0)?;
        self.expect_live(ResourceKind::Surface, info.surface.0)?;

        let swapchain = self.allocate(ResourceKind::Swapchain, &[device.0, info.surface.0]);
        let images: Array<Image> = (0..info.min_image_count)
            .map(|_| Image(self.allocate(ResourceKind::Image, &[swapchain])))
            .collect();
        self.state
            .borrow_mut()
            .swapchain_images
            .insert(swapchain, images);
        *slot = Swapchain(swapchain);
        Ok(())
    }

    fn destroy_swapchain(&self, _device: Device, swapchain: Swapchain, _allocator: Allocator) {
        self.release(ResourceKind::Swapchain, swapchain.0);
    }

    fn swapchain_images(
        &self,
        device: Device,
        swapchain: Swapchain,
        out: Slots<'_, Image>,
    ) -> Result<usize, BackendError> {
        self.expect_live(ResourceKind::Device, device.0)?;
        let state = self.state.borrow();
        match state.swapchain_images.get(&swapchain.0) {
            Some(images) => Ok(fill(images, out)),
            None => Err(BackendError::UnknownHandle {
                kind: "swapchain",
                id: swapchain.0,
            }),
        }
    }

    fn create_image_view(
        &self,
        device: Device,
        image: Image,
        format: Format,
        _allocator: Allocator,
        slot: &mut ImageView,
    ) -> Result<(), BackendError> {
        self.check_failure("create_image_view")?;
        self.expect_live(ResourceKind::Device, device.0)?;
        self.expect_live(ResourceKind::Image, image.0)?;
        if format == Format::UNDEFINED {
            return Err(BackendError::call_failed(
                "create_image_view",
                "undefined format",
            ));
        }
        *slot = ImageView(self.allocate(ResourceKind::ImageView, &[device.0]));
        Ok(())
    }

    fn destroy_image_view(&self, _device: Device, view: ImageView, _allocator: Allocator) {
        self.release(ResourceKind::ImageView, view.0);
    }

    fn create_shader_module(
        &self,
        device: Device,
        code: &[u32],
        _allocator: Allocator,
        slot: &mut ShaderModule,
    ) -> Result<(), BackendError> {
        self.check_failure("create_shader_module")?;
        self.expect_live(ResourceKind::Device, device.0)?;
        if code.first() != Some(&SPIRV_MAGIC) {
            return Err(BackendError::call_failed(
                "create_shader_module",
                "code is not SPIR-V",
            ));
        }
        *slot = ShaderModule(self.allocate(ResourceKind::ShaderModule, &[device.0]));
        Ok(())
    }

    fn destroy_shader_module(&self, _device: Device, module: ShaderModule, _allocator: Allocator) {
        self.release(ResourceKind::ShaderModule, module.0);
    }

    fn create_pipeline_layout(
        &self,
        device: Device,
        _allocator: Allocator,
        slot: &mut PipelineLayout,
    ) -> Result<(), BackendError> {
        self.check_failure("create_pipeline_layout")?;
        self.expect_live(ResourceKind::Device, device.0)?;
        *slot = PipelineLayout(self.allocate(ResourceKind::PipelineLayout, &[device.0]));
        Ok(())
    }

    fn destroy_pipeline_layout(
        &self,
        _device: Device,
        layout: PipelineLayout,
        _allocator: Allocator,
    ) {
        self.release(ResourceKind::PipelineLayout, layout.0);
    }

    fn create_render_pass(
        &self,
        device: Device,
        info: &RenderPassInfo,
        _allocator: Allocator,
        slot: &mut RenderPass,
    ) -> Result<(), BackendError> {
        self.check_failure("create_render_pass")?;
        self.expect_live(ResourceKind::Device, device.0)?;
        if info.color_format == Format::UNDEFINED {
            return Err(BackendError::call_failed(
                "create_render_pass",
                "undefined color format",
            ));
        }
        *slot = RenderPass(self.allocate(ResourceKind::RenderPass, &[device.0]));
        Ok(())
    }

    fn destroy_render_pass(&self, _device: Device, pass: RenderPass, _allocator: Allocator) {
        self.release(ResourceKind::RenderPass, pass.0);
    }

    fn create_pipeline(
        &self,
        device: Device,
        info: &PipelineInfo,
        _allocator: Allocator,
        slot: &mut Pipeline,
    ) -> Result<(), BackendError> {
        self.check_failure("create_pipeline")?;
        self.expect_live(ResourceKind::Device, device.0)?;
        self.expect_live(ResourceKind::PipelineLayout, info.layout.0)?;
        self.expect_live(ResourceKind::RenderPass, info.render_pass.0)?;
        self.expect_live(ResourceKind::ShaderModule, info.vertex.0)?;
        self.expect_live(ResourceKind::ShaderModule, info.fragment.0)?;
        if info.extent.width == 0 || info.extent.height == 0 {
            return Err(BackendError::call_failed("create_pipeline", "empty viewport"));
        }
        *slot = Pipeline(self.allocate(ResourceKind::Pipeline, &[device.0]));
        Ok(())
    }

    fn destroy_pipeline(&self, _device: Device, pipeline: Pipeline, _allocator: Allocator) {
        self.release(ResourceKind::Pipeline, pipeline.0);
    }
}
