//! Swapchain parameter selection and per-image resources.

use mu_array::Array;
use mu_ranges::{iota, iter, range, zip};

use crate::backend::{Backend, BackendError, SwapchainInfo};
use crate::device::QueueFamilyIndices;
use crate::enumerate::enumerate;
use crate::error::SetupError;
use crate::raw::{
    Allocator, ColorSpace, Device, Extent2D, Format, Image, PhysicalDevice, PresentMode,
    SharingMode, Surface, SurfaceCapabilities, SurfaceFormat,
};
use crate::resources::{OwnedImageView, create_image_view};

const PREFERRED_FORMAT: SurfaceFormat =
    SurfaceFormat::new(Format::B8G8R8A8_UNORM, ColorSpace::SRGB_NONLINEAR);

/// What a physical device offers for presenting to one surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapchainSupport {
    pub capabilities: SurfaceCapabilities,
    pub formats: Array<SurfaceFormat>,
    pub present_modes: Array<PresentMode>,
}

impl SwapchainSupport {
    pub fn query(
        backend: &dyn Backend,
        device: PhysicalDevice,
        surface: Surface,
    ) -> Result<Self, BackendError> {
        let capabilities = backend.surface_capabilities(device, surface)?;
        // SAFETY: `Backend` queries initialize every slot they report.
        let (formats, present_modes) = unsafe {
            (
                enumerate(|out| backend.surface_formats(device, surface, out))?,
                enumerate(|out| backend.present_modes(device, surface, out))?,
            )
        };
        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// At least one format and one present mode.
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// True if `extent` lies within `[min, max]` on both axes.
pub fn extent_within(extent: Extent2D, min: Extent2D, max: Extent2D) -> bool {
    extent.width >= min.width
        && extent.width <= max.width
        && extent.height >= min.height
        && extent.height <= max.height
}

/// Pick BGRA8 unorm with sRGB nonlinear if offered, else the first format.
///
/// A lone undefined format means the surface accepts anything, which also
/// selects the preferred pair.
pub fn choose_surface_format(formats: &[SurfaceFormat]) -> Result<SurfaceFormat, SetupError> {
    match formats {
        [] => Err(SetupError::NoSurfaceFormats),
        [only] if only.format == Format::UNDEFINED => Ok(PREFERRED_FORMAT),
        _ => Ok(formats
            .iter()
            .copied()
            .find(|f| *f == PREFERRED_FORMAT)
            .unwrap_or(formats[0])),
    }
}

/// Mailbox if offered; FIFO is always available.
pub fn choose_present_mode(modes: &[PresentMode]) -> PresentMode {
    if modes.contains(&PresentMode::MAILBOX) {
        PresentMode::MAILBOX
    } else {
        PresentMode::FIFO
    }
}

/// The surface's current extent when it is within bounds, else the
/// framebuffer size clamped to the allowed range.
pub fn choose_swap_extent(capabilities: &SurfaceCapabilities, framebuffer: Extent2D) -> Extent2D {
    let min = capabilities.min_image_extent;
    let max = capabilities.max_image_extent;
    if extent_within(capabilities.current_extent, min, max) {
        return capabilities.current_extent;
    }
    Extent2D {
        width: framebuffer.width.max(min.width).min(max.width),
        height: framebuffer.height.max(min.height).min(max.height),
    }
}

/// One more than the minimum, capped by the maximum when there is one.
pub fn swapchain_image_count(capabilities: &SurfaceCapabilities) -> u32 {
    let count = capabilities.min_image_count.saturating_add(1);
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

/// Every swapchain parameter, chosen from what the device supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapchainPlan {
    pub surface_format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub extent: Extent2D,
    pub image_count: u32,
    pub sharing_mode: SharingMode,
    pub queue_families: Array<u32>,
}

impl SwapchainPlan {
    pub fn new(
        support: &SwapchainSupport,
        queues: &QueueFamilyIndices,
        framebuffer: Extent2D,
    ) -> Result<Self, SetupError> {
        Ok(Self {
            surface_format: choose_surface_format(&support.formats)?,
            present_mode: choose_present_mode(&support.present_modes),
            extent: choose_swap_extent(&support.capabilities, framebuffer),
            image_count: swapchain_image_count(&support.capabilities),
            sharing_mode: queues.sharing_mode(),
            queue_families: queues.unique(),
        })
    }

    pub fn info(&self, surface: Surface) -> SwapchainInfo {
        SwapchainInfo {
            surface,
            min_image_count: self.image_count,
            surface_format: self.surface_format,
            extent: self.extent,
            present_mode: self.present_mode,
            sharing_mode: self.sharing_mode,
            queue_families: self.queue_families.clone(),
        }
    }
}

/// Create one view per swapchain image, in image order.
///
/// If any creation fails, the views made so far are destroyed on return.
pub fn create_image_views<'b>(
    backend: &'b dyn Backend,
    device: Device,
    images: &[Image],
    format: Format,
    allocator: Allocator,
) -> Result<Array<OwnedImageView<'b>>, BackendError> {
    let mut views = Array::with_capacity(images.len());
    for (index, image) in iter(zip!(iota(0usize), range(images))) {
        let view = create_image_view(backend, device, *image, format, allocator)?;
        tracing::debug!(index, image = ?image, view = ?view.raw(), "created image view");
        views.add(view);
    }
    Ok(views)
}
