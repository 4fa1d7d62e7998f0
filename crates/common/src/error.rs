use std::thread::ThreadId;

/// Errors from resampler construction and operation.
///
/// None of these are transient. Once one is returned the operation that
/// produced it has not touched partially initialized state, and retrying with
/// the same inputs fails the same way.
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),
    #[error("rendering context unavailable: {0}")]
    ContextUnavailable(String),
    #[error("shader compilation failed: {0}")]
    CompileFailed(String),
    #[error("pipeline link failed: {0}")]
    LinkFailed(String),
    #[error("render target incomplete: {0}")]
    FramebufferIncomplete(String),
    #[error("called from thread {caller:?}, but the resampler is bound to {owner:?}")]
    ThreadMismatch { owner: ThreadId, caller: ThreadId },
    #[error("{what} has {actual} bytes, expected {expected}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("no volume loaded")]
    NoVolumeLoaded,
    #[error("invalid pose: {0}")]
    InvalidPose(String),
    #[error("device rejected command: {0}")]
    DeviceRejected(String),
    #[error("readback failed: {0}")]
    ReadbackFailed(String),
    #[error("sampler executor is not running")]
    ExecutorClosed,
}

pub type SamplerResult<T> = std::result::Result<T, SamplerError>;
