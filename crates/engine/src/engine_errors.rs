use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    // Window errors
    #[error("Failed to create the event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("Failed to create the window: {0}")]
    CreateWindow(#[from] winit::error::OsError),

    #[error("The event loop exited before the window was created")]
    WindowNeverCreated,

    // Surface errors
    #[error("Failed to create a surface for the window: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("The window's surface supports no texture formats")]
    NoSurfaceFormat,

    #[error("Failed to acquire swap chain texture: {0}")]
    SwapChainAcquireFailed(wgpu::SurfaceError),

    #[error("Failed to request GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("Failed to request GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    // Upload errors
    #[error("Upload failed: texture is {expected} but the picture is {actual}")]
    TextureSizeMismatch {
        expected: media::frame::Dimensions,
        actual: media::frame::Dimensions,
    },
}
