/// Fatal errors that can occur while bringing up the engine. These are reported to the caller and
/// the engine does not start; the process exits rather than running in a half-initialized state.
///
/// Steady-state failures (mesh build timeouts, GPU upload failures) are not represented here —
/// those are logged and the affected chunk is retried, per the engine's error handling policy.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to acquire graphics resource: {0}")]
    ResourceAcquisition(String),
    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),
    #[error("failed to create window: {0}")]
    WindowCreation(#[from] winit::error::OsError),
    #[error(transparent)]
    EventLoop(#[from] winit::error::EventLoopError),
}

impl From<crate::render::atlas::AtlasError> for EngineError {
    fn from(source: crate::render::atlas::AtlasError) -> Self {
        EngineError::ResourceAcquisition(source.to_string())
    }
}
