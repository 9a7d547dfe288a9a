//! Owned handle aliases for backend resources, and the calls that make them.
//!
//! Every deleter context starts with the borrowed backend and the allocator,
//! so a handle is destroyed by the same backend and allocator that made it.

use mu_array::Array;
use mu_handle::{ChildHandle, Deleter, OwnedHandle};
use mu_ranges::{Range, find, range};

use crate::backend::{
    Backend, BackendError, DeviceInfo, InstanceInfo, PipelineInfo, RenderPassInfo, SwapchainInfo,
};
use crate::enumerate::enumerate;
use crate::error::SetupError;
use crate::raw::{
    Allocator, Device, Format, Image, ImageView, Instance, LayerProperties, PhysicalDevice,
    Pipeline, PipelineLayout, RenderPass, ShaderModule, Surface, Swapchain,
};

pub type BackendContext<'b> = (&'b dyn Backend, Allocator);

pub struct DestroyInstance;

impl<'b> Deleter<Instance, BackendContext<'b>> for DestroyInstance {
    fn delete(instance: Instance, (backend, allocator): &BackendContext<'b>) {
        backend.destroy_instance(instance, *allocator);
    }
}

pub struct DestroyDevice;

impl<'b> Deleter<Device, BackendContext<'b>> for DestroyDevice {
    fn delete(device: Device, (backend, allocator): &BackendContext<'b>) {
        backend.destroy_device(device, *allocator);
    }
}

pub struct DestroySurface;

impl<'b> Deleter<Surface, (Instance, BackendContext<'b>)> for DestroySurface {
    fn delete(
        surface: Surface,
        (instance, (backend, allocator)): &(Instance, BackendContext<'b>),
    ) {
        backend.destroy_surface(*instance, surface, *allocator);
    }
}

pub type OwnedInstance<'b> = OwnedHandle<Instance, DestroyInstance, BackendContext<'b>>;
pub type OwnedDevice<'b> = OwnedHandle<Device, DestroyDevice, BackendContext<'b>>;
pub type OwnedSurface<'b> = ChildHandle<Surface, DestroySurface, Instance, BackendContext<'b>>;

macro_rules! device_children {
    ($($owned:ident($raw:ident) via $deleter:ident => $destroy:ident;)+) => {
        $(
            pub struct $deleter;

            impl<'b> Deleter<$raw, (Device, BackendContext<'b>)> for $deleter {
                fn delete(
                    handle: $raw,
                    (device, (backend, allocator)): &(Device, BackendContext<'b>),
                ) {
                    backend.$destroy(*device, handle, *allocator);
                }
            }

            pub type $owned<'b> = ChildHandle<$raw, $deleter, Device, BackendContext<'b>>;
        )+
    };
}

device_children! {
    OwnedSwapchain(Swapchain) via DestroySwapchain => destroy_swapchain;
    OwnedImageView(ImageView) via DestroyImageView => destroy_image_view;
    OwnedShaderModule(ShaderModule) via DestroyShaderModule => destroy_shader_module;
    OwnedPipelineLayout(PipelineLayout) via DestroyPipelineLayout => destroy_pipeline_layout;
    OwnedRenderPass(RenderPass) via DestroyRenderPass => destroy_render_pass;
    OwnedPipeline(Pipeline) via DestroyPipeline => destroy_pipeline;
}

/// Fail unless every requested layer is offered by the backend.
pub fn check_layers(backend: &dyn Backend, requested: &[String]) -> Result<(), SetupError> {
    // SAFETY: `Backend` queries initialize every slot they report.
    let available: Array<LayerProperties> =
        unsafe { enumerate(|out| backend.instance_layers(out)) }?;
    for name in requested {
        let found = find(range(&available), |layer: &LayerProperties| {
            layer.name() == name.as_str()
        });
        if found.is_empty() {
            return Err(SetupError::MissingLayer(name.clone()));
        }
    }
    Ok(())
}

pub fn create_instance<'b>(
    backend: &'b dyn Backend,
    info: &InstanceInfo,
    allocator: Allocator,
) -> Result<OwnedInstance<'b>, BackendError> {
    let mut instance = OwnedInstance::with_context((backend, allocator));
    instance.create_with(|slot| backend.create_instance(info, allocator, slot))?;
    tracing::debug!(instance = ?instance.raw(), app = %info.application_name, "created instance");
    Ok(instance)
}

pub fn create_surface<'b>(
    backend: &'b dyn Backend,
    instance: Instance,
    allocator: Allocator,
) -> Result<OwnedSurface<'b>, BackendError> {
    let mut surface = OwnedSurface::new(instance, (backend, allocator));
    surface.try_create_with(|slot| backend.create_surface(instance, allocator, slot))?;
    tracing::debug!(surface = ?surface.raw(), "created surface");
    Ok(surface)
}

pub fn create_device<'b>(
    backend: &'b dyn Backend,
    physical: PhysicalDevice,
    info: &DeviceInfo,
    allocator: Allocator,
) -> Result<OwnedDevice<'b>, BackendError> {
    let mut device = OwnedDevice::with_context((backend, allocator));
    device.create_with(|slot| backend.create_device(physical, info, allocator, slot))?;
    tracing::debug!(
        device = ?device.raw(),
        queue_families = ?info.queue_families,
        "created logical device"
    );
    Ok(device)
}

pub fn create_swapchain<'b>(
    backend: &'b dyn Backend,
    device: Device,
    info: &SwapchainInfo,
    allocator: Allocator,
) -> Result<OwnedSwapchain<'b>, BackendError> {
    let mut swapchain = OwnedSwapchain::new(device, (backend, allocator));
    swapchain.try_create_with(|slot| backend.create_swapchain(device, info, allocator, slot))?;
    tracing::debug!(
        swapchain = ?swapchain.raw(),
        extent = %info.extent,
        images = info.min_image_count,
        "created swapchain"
    );
    Ok(swapchain)
}

pub fn create_image_view<'b>(
    backend: &'b dyn Backend,
    device: Device,
    image: Image,
    format: Format,
    allocator: Allocator,
) -> Result<OwnedImageView<'b>, BackendError> {
    let mut view = OwnedImageView::new(device, (backend, allocator));
    view.try_create_with(|slot| backend.create_image_view(device, image, format, allocator, slot))?;
    Ok(view)
}

pub fn create_shader_module<'b>(
    backend: &'b dyn Backend,
    device: Device,
    code: &[u32],
    allocator: Allocator,
) -> Result<OwnedShaderModule<'b>, BackendError> {
    let mut module = OwnedShaderModule::new(device, (backend, allocator));
    module.try_create_with(|slot| backend.create_shader_module(device, code, allocator, slot))?;
    tracing::debug!(module = ?module.raw(), words = code.len(), "created shader module");
    Ok(module)
}

pub fn create_pipeline_layout<'b>(
    backend: &'b dyn Backend,
    device: Device,
    allocator: Allocator,
) -> Result<OwnedPipelineLayout<'b>, BackendError> {
    let mut layout = OwnedPipelineLayout::new(device, (backend, allocator));
    layout.try_create_with(|slot| backend.create_pipeline_layout(device, allocator, slot))?;
    Ok(layout)
}

pub fn create_render_pass<'b>(
    backend: &'b dyn Backend,
    device: Device,
    info: &RenderPassInfo,
    allocator: Allocator,
) -> Result<OwnedRenderPass<'b>, BackendError> {
    let mut pass = OwnedRenderPass::new(device, (backend, allocator));
    pass.try_create_with(|slot| backend.create_render_pass(device, info, allocator, slot))?;
    tracing::debug!(pass = ?pass.raw(), format = %info.color_format, "created render pass");
    Ok(pass)
}

/// Shader modules, layout and render pass in `info` may be dropped once
/// this returns.
pub fn create_pipeline<'b>(
    backend: &'b dyn Backend,
    device: Device,
    info: &PipelineInfo,
    allocator: Allocator,
) -> Result<OwnedPipeline<'b>, BackendError> {
    let mut pipeline = OwnedPipeline::new(device, (backend, allocator));
    pipeline.try_create_with(|slot| backend.create_pipeline(device, info, allocator, slot))?;
    tracing::debug!(pipeline = ?pipeline.raw(), extent = %info.extent, "created pipeline");
    Ok(pipeline)
}

/// All images currently owned by `swapchain`.
pub fn swapchain_images(
    backend: &dyn Backend,
    device: Device,
    swapchain: Swapchain,
) -> Result<Array<Image>, BackendError> {
    // SAFETY: `Backend` queries initialize every slot they report.
    unsafe { enumerate(|out| backend.swapchain_images(device, swapchain, out)) }
}
