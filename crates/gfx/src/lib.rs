//! Gfx: the seam between the core libraries and a native graphics backend.
//!
//! The backend itself is an opaque collaborator behind the [`Backend`]
//! trait: it creates and destroys resources and answers queries. This crate
//! supplies what sits on top of it:
//! - owned handle aliases whose deleters call back into the backend,
//! - the two-call enumeration pattern returning an [`Array`](mu_array::Array),
//! - physical device, surface format, present mode and extent selection,
//! - a headless in-process backend for tests and tooling.
//!
//! # Invariants
//! - Every owned handle borrows the backend that made it, so handles are
//!   always destroyed before their backend.
//! - Children name their parent in their deleter context and cannot be
//!   created while that parent is null.
//! - Enumeration never exposes a slot the backend did not write, given a
//!   backend that honors the `unsafe trait Backend` contract.

pub mod backend;
pub mod config;
pub mod device;
pub mod enumerate;
pub mod error;
pub mod headless;
pub mod raw;
pub mod resources;
pub mod swapchain;

pub use backend::{
    Backend, BackendError, DeviceInfo, InstanceInfo, PipelineInfo, RenderPassInfo, SwapchainInfo,
};
pub use config::{ConfigError, SetupConfig};
pub use device::{QueueFamilyIndices, SelectedDevice, select_physical_device, supports_extensions};
pub use enumerate::enumerate;
pub use error::SetupError;
pub use headless::{
    AdapterConfig, DestroyRecord, HeadlessBackend, HeadlessConfig, ResourceKind, SPIRV_MAGIC,
};
pub use resources::{
    BackendContext, OwnedDevice, OwnedImageView, OwnedInstance, OwnedPipeline,
    OwnedPipelineLayout, OwnedRenderPass, OwnedShaderModule, OwnedSurface, OwnedSwapchain,
    check_layers, create_device, create_image_view, create_instance, create_pipeline,
    create_pipeline_layout, create_render_pass, create_shader_module, create_surface,
    create_swapchain, swapchain_images,
};
pub use swapchain::{
    SwapchainPlan, SwapchainSupport, choose_present_mode, choose_surface_format,
    choose_swap_extent, create_image_views, extent_within, swapchain_image_count,
};

pub fn crate_info() -> &'static str {
    "mu-gfx v0.1.0"
}
