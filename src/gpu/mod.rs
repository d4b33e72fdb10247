//! GPU device setup, compute stepping and window presentation.
//!
//! [`GpuContext`] owns the device and queue. The headless variant backs
//! [`GpuStepper`] for compute-only use. The windowed variant also carries a
//! configured surface for [`Presenter`].

mod compute;
mod present;

use std::sync::Arc;

use winit::window::Window;

use crate::error::GpuError;

pub use compute::{GpuStepper, SimUniforms};
pub use present::{Presenter, PRESENT_WGSL};

/// Device and queue shared by the compute and present paths.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_info: wgpu::AdapterInfo,
}

/// Cheap-to-clone handle to an open device.
#[derive(Clone)]
pub struct SharedDevice {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

fn instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    })
}

async fn open_device(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue), GpuError> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(GpuError::NoAdapter)?;

    let info = adapter.get_info();
    log::info!("Using GPU adapter '{}' ({:?})", info.name, info.backend);

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Morphogen Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        )
        .await?;

    Ok((adapter, device, queue))
}

impl GpuContext {
    /// Open a device with no surface, for compute-only work.
    pub async fn headless() -> Result<Self, GpuError> {
        let instance = instance();
        let (adapter, device, queue) = open_device(&instance, None).await?;
        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info: adapter.get_info(),
        })
    }

    /// Open a device able to present to `window`, and configure its surface.
    pub async fn with_window(
        window: Arc<Window>,
    ) -> Result<(Self, wgpu::Surface<'static>, wgpu::SurfaceConfiguration), GpuError> {
        let size = window.inner_size();
        let instance = instance();
        let surface = instance.create_surface(window)?;
        let (adapter, device, queue) = open_device(&instance, Some(&surface)).await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let context = Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info: adapter.get_info(),
        };
        Ok((context, surface, config))
    }

    pub fn shared(&self) -> SharedDevice {
        SharedDevice {
            device: Arc::clone(&self.device),
            queue: Arc::clone(&self.queue),
        }
    }

    pub fn into_shared(self) -> SharedDevice {
        SharedDevice {
            device: self.device,
            queue: self.queue,
        }
    }
}
