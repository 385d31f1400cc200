use vision_capture::CaptureError;
use vision_ops::RegistryError;

/// Errors returned to the control surface
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("capture device {index} unavailable: {reason}")]
    DeviceUnavailable { index: u32, reason: String },

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("worker is stopped")]
    Stopped,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("operation registry error: {0}")]
    Registry(RegistryError),
}

impl From<CaptureError> for WorkerError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::DeviceUnavailable { index, reason } => {
                WorkerError::DeviceUnavailable { index, reason }
            }
            CaptureError::ReaderSpawn(e) => WorkerError::Spawn(e),
        }
    }
}

impl From<RegistryError> for WorkerError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownOperation(name) => WorkerError::UnknownOperation(name),
            other => WorkerError::Registry(other),
        }
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, WorkerError>;
