use mu_handle::HandleError;

use crate::backend::BackendError;

/// Errors from bringing up devices and swapchains.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("handle error: {0}")]
    Handle(#[from] HandleError),
    #[error("no physical devices available")]
    NoDevices,
    #[error("none of the {checked} physical devices is suitable")]
    NoSuitableDevice { checked: usize },
    #[error("surface reports no formats")]
    NoSurfaceFormats,
    #[error("required layer {0} is not available")]
    MissingLayer(String),
}
