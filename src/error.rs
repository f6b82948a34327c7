use thiserror::Error;

/// Failures that abort startup or a frame. Physics has no error path.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to request GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported texture formats")]
    NoSurfaceFormat,

    #[error("frame could not be presented: {0}")]
    Frame(#[from] wgpu::SurfaceError),

    #[cfg(not(target_arch = "wasm32"))]
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[cfg(not(target_arch = "wasm32"))]
    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("page setup failed: {0}")]
    Page(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for AppError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        AppError::Page(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}
