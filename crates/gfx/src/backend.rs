//! The native backend contract.
//!
//! Queries that return lists follow the two-call convention: called with
//! `None` they report how many items exist; called with slots they write
//! up to `slots.len()` items from the front and report how many they wrote.
//! Use [`enumerate`](crate::enumerate) rather than calling them directly.
//! The reported count is trusted, which is why the trait is `unsafe`.
//!
//! Create calls fill a caller-provided slot and leave it untouched on
//! failure. Destroy calls must only ever see handles their create call
//! produced.

use std::mem::MaybeUninit;

use mu_array::Array;
use mu_handle::HandleError;

use crate::raw::{
    Allocator, Device, Extent2D, ExtensionProperties, Format, Image, ImageView, Instance,
    LayerProperties, PhysicalDevice, PhysicalDeviceProperties, Pipeline, PipelineLayout,
    PresentMode, QueueFamilyProperties, RenderPass, ShaderModule, SharingMode, Surface,
    SurfaceCapabilities, SurfaceFormat, Swapchain,
};

/// Errors reported by a backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("{call} failed: {reason}")]
    CallFailed { call: &'static str, reason: String },
    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u64 },
    #[error("handle error: {0}")]
    Handle(#[from] HandleError),
}

impl BackendError {
    pub fn call_failed(call: &'static str, reason: impl Into<String>) -> Self {
        Self::CallFailed {
            call,
            reason: reason.into(),
        }
    }
}

/// Parameters for instance creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceInfo {
    pub application_name: String,
    pub layers: Array<String>,
    pub extensions: Array<String>,
}

/// Parameters for logical device creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// One queue is requested from each family; no duplicates.
    pub queue_families: Array<u32>,
    pub extensions: Array<String>,
}

/// Parameters for swapchain creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapchainInfo {
    pub surface: Surface,
    pub min_image_count: u32,
    pub surface_format: SurfaceFormat,
    pub extent: Extent2D,
    pub present_mode: PresentMode,
    pub sharing_mode: SharingMode,
    pub queue_families: Array<u32>,
}

/// Parameters for render pass creation: one color attachment, cleared on
/// load and left ready to present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPassInfo {
    pub color_format: Format,
}

/// Parameters for graphics pipeline creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineInfo {
    pub layout: PipelineLayout,
    pub render_pass: RenderPass,
    pub vertex: ShaderModule,
    pub fragment: ShaderModule,
    pub extent: Extent2D,
}

pub type Slots<'a, T> = Option<&'a mut [MaybeUninit<T>]>;

/// # Safety
/// A two-call query handed `Some(slots)` that returns `Ok(n)` must have
/// initialized `slots[..n]`. Callers read those slots as live values.
pub unsafe trait Backend {
    fn instance_layers(&self, out: Slots<'_, LayerProperties>) -> Result<usize, BackendError>;

    fn create_instance(
        &self,
        info: &InstanceInfo,
        allocator: Allocator,
        slot: &mut Instance,
    ) -> Result<(), BackendError>;

    fn destroy_instance(&self, instance: Instance, allocator: Allocator);

    fn create_surface(
        &self,
        instance: Instance,
        allocator: Allocator,
        slot: &mut Surface,
    ) -> Result<(), BackendError>;

    fn destroy_surface(&self, instance: Instance, surface: Surface, allocator: Allocator);

    fn physical_devices(
        &self,
        instance: Instance,
        out: Slots<'_, PhysicalDevice>,
    ) -> Result<usize, BackendError>;

    fn device_properties(
        &self,
        device: PhysicalDevice,
    ) -> Result<PhysicalDeviceProperties, BackendError>;

    fn device_extensions(
        &self,
        device: PhysicalDevice,
        out: Slots<'_, ExtensionProperties>,
    ) -> Result<usize, BackendError>;

    fn queue_families(
        &self,
        device: PhysicalDevice,
        out: Slots<'_, QueueFamilyProperties>,
    ) -> Result<usize, BackendError>;

    fn surface_support(
        &self,
        device: PhysicalDevice,
        queue_family: u32,
        surface: Surface,
    ) -> Result<bool, BackendError>;

    fn surface_capabilities(
        &self,
        device: PhysicalDevice,
        surface: Surface,
    ) -> Result<SurfaceCapabilities, BackendError>;

    fn surface_formats(
        &self,
        device: PhysicalDevice,
        surface: Surface,
        out: Slots<'_, SurfaceFormat>,
    ) -> Result<usize, BackendError>;

    fn present_modes(
        &self,
        device: PhysicalDevice,
        surface: Surface,
        out: Slots<'_, PresentMode>,
    ) -> Result<usize, BackendError>;

    fn create_device(
        &self,
        physical: PhysicalDevice,
        info: &DeviceInfo,
        allocator: Allocator,
        slot: &mut Device,
    ) -> Result<(), BackendError>;

    fn destroy_device(&self, device: Device, allocator: Allocator);

    fn create_swapchain(
        &self,
        device: Device,
        info: &SwapchainInfo,
        allocator: Allocator,
        slot: &mut Swapchain,
    ) -> Result<(), BackendError>;

    fn destroy_swapchain(&self, device: Device, swapchain: Swapchain, allocator: Allocator);

    fn swapchain_images(
        &self,
        device: Device,
        swapchain: Swapchain,
        out: Slots<'_, Image>,
    ) -> Result<usize, BackendError>;

    fn create_image_view(
        &self,
        device: Device,
        image: Image,
        format: Format,
        allocator: Allocator,
        slot: &mut ImageView,
    ) -> Result<(), BackendError>;

    fn destroy_image_view(&self, device: Device, view: ImageView, allocator: Allocator);

    /// `code` is SPIR-V, one word per element.
    fn create_shader_module(
        &self,
        device: Device,
        code: &[u32],
        allocator: Allocator,
        slot: &mut ShaderModule,
    ) -> Result<(), BackendError>;

    fn destroy_shader_module(&self, device: Device, module: ShaderModule, allocator: Allocator);

    /// An empty layout: no descriptor sets, no push constants.
    fn create_pipeline_layout(
        &self,
        device: Device,
        allocator: Allocator,
        slot: &mut PipelineLayout,
    ) -> Result<(), BackendError>;

    fn destroy_pipeline_layout(
        &self,
        device: Device,
        layout: PipelineLayout,
        allocator: Allocator,
    );

    fn create_render_pass(
        &self,
        device: Device,
        info: &RenderPassInfo,
        allocator: Allocator,
        slot: &mut RenderPass,
    ) -> Result<(), BackendError>;

    fn destroy_render_pass(&self, device: Device, pass: RenderPass, allocator: Allocator);

    fn create_pipeline(
        &self,
        device: Device,
        info: &PipelineInfo,
        allocator: Allocator,
        slot: &mut Pipeline,
    ) -> Result<(), BackendError>;

    fn destroy_pipeline(&self, device: Device, pipeline: Pipeline, allocator: Allocator);
}
