//! Plain handle and data types exchanged with the native backend.

use std::fmt;

use mu_handle::native_handle;
use serde::{Deserialize, Serialize};

native_handle! {
    pub struct Instance(u64);
    pub struct PhysicalDevice(u64);
    pub struct Device(u64);
    pub struct Surface(u64);
    pub struct Swapchain(u64);
    pub struct Image(u64);
    pub struct ImageView(u64);
    pub struct ShaderModule(u64);
    pub struct PipelineLayout(u64);
    pub struct RenderPass(u64);
    pub struct Pipeline(u64);
}

/// Host allocation callbacks as the native API declares them. Never
/// constructed here; only pointed to.
#[repr(C)]
pub struct AllocationCallbacks {
    _opaque: [u8; 0],
}

/// Allocation callbacks passed through to every create and destroy call.
///
/// Null selects the backend's own allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocator(pub *const AllocationCallbacks);

impl Allocator {
    pub const DEFAULT: Allocator = Allocator(std::ptr::null());

    pub fn is_default(self) -> bool {
        self.0.is_null()
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Extent2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Declares an `i32` newtype with named values, serialized as the number.
macro_rules! native_enum {
    ($(#[$meta:meta])* $name:ident { $($value:ident = $n:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(pub i32);

        impl $name {
            $(pub const $value: $name = $name($n);)+

            /// Name of a known value.
            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($n => Some(stringify!($value)),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.name() {
                    Some(name) => f.write_str(name),
                    None => write!(f, "{}({})", stringify!($name), self.0),
                }
            }
        }
    };
}

native_enum!(
    /// Pixel format of an image.
    Format {
        UNDEFINED = 0,
        R8G8B8A8_UNORM = 37,
        R8G8B8A8_SRGB = 43,
        B8G8R8A8_UNORM = 44,
        B8G8R8A8_SRGB = 50,
    }
);

native_enum!(
    ColorSpace {
        SRGB_NONLINEAR = 0,
    }
);

native_enum!(
    /// How a swapchain hands finished images to the display.
    PresentMode {
        IMMEDIATE = 0,
        MAILBOX = 1,
        FIFO = 2,
        FIFO_RELAXED = 3,
    }
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceFormat {
    pub format: Format,
    pub color_space: ColorSpace,
}

impl SurfaceFormat {
    pub const fn new(format: Format, color_space: ColorSpace) -> Self {
        Self {
            format,
            color_space,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// Zero means no upper bound.
    pub max_image_count: u32,
    pub current_extent: Extent2D,
    pub min_image_extent: Extent2D,
    pub max_image_extent: Extent2D,
}

/// Bitmask of queue capabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueFlags(pub u32);

impl QueueFlags {
    pub const GRAPHICS: QueueFlags = QueueFlags(0x1);
    pub const COMPUTE: QueueFlags = QueueFlags(0x2);
    pub const TRANSFER: QueueFlags = QueueFlags(0x4);

    pub fn contains(self, other: QueueFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for QueueFlags {
    type Output = QueueFlags;

    fn bitor(self, rhs: QueueFlags) -> QueueFlags {
        QueueFlags(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueFamilyProperties {
    pub queue_flags: QueueFlags,
    pub queue_count: u32,
}

pub const MAX_EXTENSION_NAME_SIZE: usize = 256;

/// An extension or layer name in the fixed-size, NUL-terminated layout the
/// native API fills in.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ExtensionProperties {
    name: [u8; MAX_EXTENSION_NAME_SIZE],
    pub spec_version: u32,
}

impl ExtensionProperties {
    /// Names longer than the fixed buffer are truncated.
    pub fn new(name: &str, spec_version: u32) -> Self {
        let mut buf = [0u8; MAX_EXTENSION_NAME_SIZE];
        let len = name.len().min(MAX_EXTENSION_NAME_SIZE - 1);
        buf[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self {
            name: buf,
            spec_version,
        }
    }

    /// The name up to its terminator. Invalid UTF-8 reads as empty.
    pub fn name(&self) -> &str {
        let len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_EXTENSION_NAME_SIZE);
        std::str::from_utf8(&self.name[..len]).unwrap_or("")
    }
}

impl fmt::Debug for ExtensionProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionProperties")
            .field("name", &self.name())
            .field("spec_version", &self.spec_version)
            .finish()
    }
}

/// Layers are reported in the same shape as extensions.
pub type LayerProperties = ExtensionProperties;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    #[default]
    Other,
    IntegratedGpu,
    DiscreteGpu,
    VirtualGpu,
    Cpu,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalDeviceProperties {
    pub name: String,
    pub device_type: DeviceType,
    pub api_version: u32,
}

/// How swapchain images are shared between queue families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharingMode {
    /// One family owns each image at a time.
    Exclusive,
    Concurrent,
}
