//! Error types for morphogen.
//!
//! Registry lookups, GPU setup, configuration loading and snapshot export
//! each get their own error enum so callers can tell fatal startup failures
//! apart from per-frame hiccups.

use thiserror::Error;

/// Errors from catalog lookups (models, fractal kinds, presets, color maps).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// No model or fractal kind is registered under this id.
    #[error("unknown model '{0}'")]
    UnknownModel(String),
    /// The model has no preset with this name.
    #[error("model '{model}' has no preset named '{preset}'")]
    UnknownPreset { model: String, preset: String },
    /// The model has no journey with this name.
    #[error("model '{model}' has no journey named '{journey}'")]
    UnknownJourney { model: String, journey: String },
    /// The model does not declare this parameter.
    #[error("model '{model}' has no parameter '{param}'")]
    UnknownParameter { model: String, param: String },
    /// No built-in color map has this name.
    #[error("unknown color map '{0}'")]
    UnknownColorMap(String),
}

/// Errors that can occur during GPU initialization and readback.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a Vulkan, Metal, DX12 or WebGPU capable device is required")]
    NoAdapter,
    /// The surface reports no usable texture format for this adapter.
    #[error("surface is not supported by the selected adapter")]
    UnsupportedSurface,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// Failed to map buffer for reading.
    #[error("failed to map GPU buffer: {0}")]
    BufferMapping(String),
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file from disk.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON for [`Config`](crate::config::Config).
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    /// A name in the file does not resolve against the catalog.
    #[error(transparent)]
    Catalog(#[from] ModelError),
}

/// Errors raised while writing a rendered frame to disk.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No frame has been rendered yet.
    #[error("no frame has been rendered yet")]
    NoFrame,
    /// Image encoding or file writing failed.
    #[error("failed to save snapshot: {0}")]
    Image(#[from] image::ImageError),
}

/// Fatal errors from the interactive viewer.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
}
