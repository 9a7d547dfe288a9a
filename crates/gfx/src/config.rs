use std::path::Path;

use mu_array::Array;
use serde::{Deserialize, Serialize};

use crate::backend::InstanceInfo;
use crate::headless::HeadlessConfig;
use crate::raw::Extent2D;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything needed to bring up a device and swapchain.
///
/// Missing fields in a config file take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    pub application_name: String,
    /// Used for the swapchain extent when the surface leaves it open.
    pub framebuffer: Extent2D,
    pub validation: bool,
    pub validation_layers: Array<String>,
    pub instance_extensions: Array<String>,
    pub device_extensions: Array<String>,
    pub headless: HeadlessConfig,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            application_name: "mu".to_owned(),
            framebuffer: Extent2D::new(1280, 720),
            validation: true,
            validation_layers: mu_array::array!["VK_LAYER_LUNARG_standard_validation".to_owned()],
            instance_extensions: mu_array::array![
                "VK_KHR_surface".to_owned(),
                "VK_EXT_debug_report".to_owned(),
            ],
            device_extensions: mu_array::array!["VK_KHR_swapchain".to_owned()],
            headless: HeadlessConfig::default(),
        }
    }
}

impl SetupConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Layers are requested only with validation on.
    pub fn instance_info(&self) -> InstanceInfo {
        InstanceInfo {
            application_name: self.application_name.clone(),
            layers: if self.validation {
                self.validation_layers.clone()
            } else {
                Array::new()
            },
            extensions: self.instance_extensions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_describe_a_720p_window() {
        let config = SetupConfig::default();
        assert_eq!(config.application_name, "mu");
        assert_eq!(config.framebuffer, Extent2D::new(1280, 720));
        assert_eq!(config.device_extensions, ["VK_KHR_swapchain".to_owned()]);
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut config = SetupConfig::default();
        config.framebuffer = Extent2D::new(640, 480);
        config.validation = false;
        config.save(tmp.path()).unwrap();

        let loaded = SetupConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        let json = r#"{"application_name": "demo", "framebuffer": {"width": 800, "height": 600}}"#;
        tmp.write_all(json.as_bytes()).unwrap();
        let loaded = SetupConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded.application_name, "demo");
        assert_eq!(loaded.framebuffer, Extent2D::new(800, 600));
        assert!(loaded.validation);
        assert_eq!(loaded.headless.adapters.num(), 1);
    }

    #[test]
    fn load_reports_io_and_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = SetupConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"not json").unwrap();
        let bad = SetupConfig::load(tmp.path()).unwrap_err();
        assert!(matches!(bad, ConfigError::Json(_)));
    }

    #[test]
    fn validation_controls_layers() {
        let mut config = SetupConfig::default();
        assert_eq!(config.instance_info().layers.num(), 1);
        config.validation = false;
        let info = config.instance_info();
        assert!(info.layers.is_empty());
        assert_eq!(info.extensions.num(), 2);
        assert_eq!(info.application_name, "mu");
    }
}
