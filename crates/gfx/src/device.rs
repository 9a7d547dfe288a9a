//! Physical device selection.

use mu_array::Array;
use mu_ranges::{Range, find, iota, iter, range, zip};

use crate::backend::{Backend, BackendError, DeviceInfo};
use crate::enumerate::enumerate;
use crate::error::SetupError;
use crate::raw::{
    ExtensionProperties, Instance, PhysicalDevice, PhysicalDeviceProperties,
    QueueFamilyProperties, QueueFlags, SharingMode, Surface,
};
use crate::swapchain::SwapchainSupport;

/// True if every name in `required` appears in `available`.
pub fn supports_extensions(available: &[ExtensionProperties], required: &[String]) -> bool {
    required.iter().all(|name| {
        let found = find(range(available), |ext: &ExtensionProperties| {
            ext.name() == name.as_str()
        });
        !found.is_empty()
    })
}

/// Queue families for rendering and presenting. They may be the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilyIndices {
    /// First family with queues and graphics support, and first family with
    /// queues that can present to `surface`. `None` unless both exist.
    pub fn find(
        backend: &dyn Backend,
        device: PhysicalDevice,
        surface: Surface,
    ) -> Result<Option<Self>, BackendError> {
        // SAFETY: `Backend` queries initialize every slot they report.
        let families: Array<QueueFamilyProperties> =
            unsafe { enumerate(|out| backend.queue_families(device, out)) }?;

        let mut graphics = None;
        let mut present = None;
        for (index, family) in iter(zip!(iota(0u32), range(&families))) {
            if family.queue_count == 0 {
                continue;
            }
            if graphics.is_none() && family.queue_flags.contains(QueueFlags::GRAPHICS) {
                graphics = Some(index);
            }
            if present.is_none() && backend.surface_support(device, index, surface)? {
                present = Some(index);
            }
            if graphics.is_some() && present.is_some() {
                break;
            }
        }

        Ok(graphics
            .zip(present)
            .map(|(graphics, present)| Self { graphics, present }))
    }

    /// Distinct family indices, graphics first.
    pub fn unique(&self) -> Array<u32> {
        Array::from_unique([self.graphics, self.present])
    }

    pub fn sharing_mode(&self) -> SharingMode {
        if self.graphics == self.present {
            SharingMode::Exclusive
        } else {
            SharingMode::Concurrent
        }
    }

    pub fn device_info(&self, extensions: &[String]) -> DeviceInfo {
        DeviceInfo {
            queue_families: self.unique(),
            extensions: extensions.iter().cloned().collect(),
        }
    }
}

/// A physical device that passed every check, with what was learned about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedDevice {
    pub physical: PhysicalDevice,
    pub properties: PhysicalDeviceProperties,
    pub queue_families: QueueFamilyIndices,
    pub support: SwapchainSupport,
}

/// Pick the first physical device that has every `required` extension, can
/// present to `surface` with at least one format and mode, and has graphics
/// and present queue families.
pub fn select_physical_device(
    backend: &dyn Backend,
    instance: Instance,
    surface: Surface,
    required: &[String],
) -> Result<SelectedDevice, SetupError> {
    let span = tracing::info_span!("select_physical_device", required = required.len());
    let _enter = span.enter();

    // SAFETY: `Backend` queries initialize every slot they report.
    let devices: Array<PhysicalDevice> =
        unsafe { enumerate(|out| backend.physical_devices(instance, out)) }?;
    if devices.is_empty() {
        return Err(SetupError::NoDevices);
    }

    for &physical in &devices {
        let properties = backend.device_properties(physical)?;

        // SAFETY: as above.
        let extensions = unsafe { enumerate(|out| backend.device_extensions(physical, out)) }?;
        if !supports_extensions(&extensions, required) {
            tracing::warn!(device = %properties.name, "skipping device: missing extensions");
            continue;
        }

        let support = SwapchainSupport::query(backend, physical, surface)?;
        if !support.is_adequate() {
            tracing::warn!(
                device = %properties.name,
                formats = support.formats.num(),
                present_modes = support.present_modes.num(),
                "skipping device: inadequate swapchain support"
            );
            continue;
        }

        let Some(queue_families) = QueueFamilyIndices::find(backend, physical, surface)? else {
            tracing::warn!(device = %properties.name, "skipping device: missing queue families");
            continue;
        };

        tracing::info!(
            device = %properties.name,
            kind = ?properties.device_type,
            graphics = queue_families.graphics,
            present = queue_families.present,
            "selected physical device"
        );
        return Ok(SelectedDevice {
            physical,
            properties,
            queue_families,
            support,
        });
    }

    Err(SetupError::NoSuitableDevice {
        checked: devices.num(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{AdapterConfig, HeadlessBackend, HeadlessConfig};
    use crate::raw::Allocator;
    use crate::resources::{create_instance, create_surface};

    fn required() -> Array<String> {
        mu_array::array!["VK_KHR_swapchain".to_owned()]
    }

    fn backend_with(adapters: Array<AdapterConfig>) -> HeadlessBackend {
        HeadlessBackend::new(HeadlessConfig {
            adapters,
            ..HeadlessConfig::default()
        })
    }

    fn select(backend: &HeadlessBackend) -> Result<SelectedDevice, SetupError> {
        let instance = create_instance(backend, &Default::default(), Allocator::DEFAULT)?;
        let surface = create_surface(backend, *instance, Allocator::DEFAULT)?;
        select_physical_device(backend, *instance, *surface, &required())
    }

    #[test]
    fn extension_check_uses_names() {
        let available = [
            ExtensionProperties::new("VK_KHR_swapchain", 70),
            ExtensionProperties::new("VK_KHR_maintenance1", 2),
        ];
        assert!(supports_extensions(&available, &required()));
        assert!(supports_extensions(&available, &[]));
        assert!(!supports_extensions(
            &available,
            &["VK_KHR_ray_query".to_owned()]
        ));
        assert!(!supports_extensions(&[], &required()));
    }

    #[test]
    fn default_adapter_is_selected() {
        let backend = HeadlessBackend::default();
        let selected = select(&backend).unwrap();
        assert_eq!(selected.physical, PhysicalDevice(1));
        assert_eq!(selected.properties.name, "Headless Adapter");
        assert_eq!(
            selected.queue_families,
            QueueFamilyIndices {
                graphics: 0,
                present: 0
            }
        );
        assert!(selected.support.is_adequate());
        assert!(backend.violations().is_empty());
    }

    #[test]
    fn unsuitable_adapters_are_skipped() {
        let no_extension = AdapterConfig {
            name: "no swapchain".into(),
            extensions: Array::new(),
            ..AdapterConfig::default()
        };
        let no_formats = AdapterConfig {
            name: "no formats".into(),
            surface_formats: Array::new(),
            ..AdapterConfig::default()
        };
        let no_present = AdapterConfig {
            name: "no present".into(),
            present_families: Array::new(),
            ..AdapterConfig::default()
        };
        let good = AdapterConfig {
            name: "good".into(),
            ..AdapterConfig::default()
        };
        let backend = backend_with(mu_array::array![no_extension, no_formats, no_present, good]);
        let selected = select(&backend).unwrap();
        assert_eq!(selected.physical, PhysicalDevice(4));
        assert_eq!(selected.properties.name, "good");
    }

    #[test]
    fn no_adapters_and_no_suitable_adapters_differ() {
        let empty = backend_with(Array::new());
        assert!(matches!(select(&empty), Err(SetupError::NoDevices)));

        let bad = backend_with(mu_array::array![AdapterConfig {
            present_modes: Array::new(),
            ..AdapterConfig::default()
        }]);
        assert!(matches!(
            select(&bad),
            Err(SetupError::NoSuitableDevice { checked: 1 })
        ));
    }

    #[test]
    fn split_queue_families_share_concurrently() {
        let adapter = AdapterConfig {
            queue_families: mu_array::array![
                QueueFamilyProperties {
                    queue_flags: QueueFlags::TRANSFER,
                    queue_count: 1,
                },
                QueueFamilyProperties {
                    queue_flags: QueueFlags::GRAPHICS,
                    queue_count: 0,
                },
                QueueFamilyProperties {
                    queue_flags: QueueFlags::GRAPHICS | QueueFlags::COMPUTE,
                    queue_count: 4,
                },
            ],
            present_families: mu_array::array![0, 2],
            ..AdapterConfig::default()
        };
        let backend = backend_with(mu_array::array![adapter]);
        let queues = select(&backend).unwrap().queue_families;
        assert_eq!(queues.graphics, 2);
        assert_eq!(queues.present, 0);
        assert_eq!(queues.unique(), [2, 0]);
        assert_eq!(queues.sharing_mode(), SharingMode::Concurrent);

        let info = queues.device_info(&required());
        assert_eq!(info.queue_families, [2, 0]);
        assert_eq!(info.extensions, required());
    }

    #[test]
    fn shared_family_is_listed_once() {
        let queues = QueueFamilyIndices {
            graphics: 1,
            present: 1,
        };
        assert_eq!(queues.unique(), [1]);
        assert_eq!(queues.sharing_mode(), SharingMode::Exclusive);
    }

    #[test]
    fn query_errors_propagate() {
        let backend = HeadlessBackend::default();
        let instance = create_instance(&backend, &Default::default(), Allocator::DEFAULT).unwrap();
        let surface = create_surface(&backend, *instance, Allocator::DEFAULT).unwrap();
        backend.fail_next("surface_formats");
        let err = select_physical_device(&backend, *instance, *surface, &required()).unwrap_err();
        assert!(matches!(err, SetupError::Backend(BackendError::CallFailed { .. })));
    }
}
