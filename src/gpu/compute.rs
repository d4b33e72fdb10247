//! Compute-shader stepper.
//!
//! The two grids live in storage buffers on the device. Each step is one
//! compute pass that reads one buffer and writes the other. After a batch the
//! latest buffer is copied to a staging buffer and published back into the
//! host [`PingPong`] so rendering stays on the CPU path.

use std::sync::mpsc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::SharedDevice;
use crate::brush::BrushUniform;
use crate::buffer::{Cell, PingPong};
use crate::error::GpuError;
use crate::kernel::{Kernel, WORKGROUP_SIZE};
use crate::model::ModelId;
use crate::stepper::Stepper;

/// Uniform block shared with the generated shader (`SimUniforms` in WGSL).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SimUniforms {
    pub size: [u32; 2],
    pub brush_pos: [f32; 2],
    pub brush_radius: f32,
    pub brush_intensity: f32,
    pub _pad: [f32; 2],
    pub params: [[f32; 4]; 2],
}

impl SimUniforms {
    pub fn new(size: (u32, u32), kernel: &Kernel, brush: &BrushUniform) -> Self {
        let words = kernel.gpu_words();
        Self {
            size: [size.0, size.1],
            brush_pos: brush.position.to_array(),
            brush_radius: brush.radius,
            brush_intensity: brush.intensity,
            _pad: [0.0; 2],
            params: [
                [words[0], words[1], words[2], words[3]],
                [words[4], words[5], words[6], words[7]],
            ],
        }
    }
}

/// Device buffers for one grid size.
struct Resources {
    size: (u32, u32),
    uniform_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,
    byte_len: u64,
    storage: [wgpu::Buffer; 2],
    /// `bind_groups[i]` reads `storage[i]` and writes the other.
    bind_groups: [wgpu::BindGroup; 2],
}

/// Steps a [`PingPong`] on the GPU.
pub struct GpuStepper {
    shared: SharedDevice,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline: Option<(ModelId, wgpu::ComputePipeline)>,
    resources: Option<Resources>,
    uploaded_generation: Option<u64>,
    /// Device buffer holding the latest state.
    device_current: usize,
}

impl GpuStepper {
    pub fn new(shared: SharedDevice) -> Self {
        let bind_group_layout =
            shared
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Sim Bind Group Layout"),
                    entries: &[
                        storage_entry(0, true),
                        storage_entry(1, false),
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                    ],
                });

        Self {
            shared,
            bind_group_layout,
            pipeline: None,
            resources: None,
            uploaded_generation: None,
            device_current: 0,
        }
    }

    fn ensure_pipeline(&mut self, kernel: &Kernel) {
        let model = kernel.model();
        if matches!(&self.pipeline, Some((m, _)) if *m == model) {
            return;
        }
        log::debug!("Building compute pipeline for {}", model);

        let device = &self.shared.device;
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sim Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(kernel.wgsl().into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sim Pipeline Layout"),
            bind_group_layouts: &[&self.bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Sim Compute Pipeline"),
            layout: Some(&layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });
        self.pipeline = Some((model, pipeline));
    }

    fn ensure_resources(&mut self, size: (u32, u32)) {
        if matches!(&self.resources, Some(r) if r.size == size) {
            return;
        }
        let device = &self.shared.device;
        let byte_len = size.0 as u64 * size.1 as u64 * std::mem::size_of::<Cell>() as u64;

        let make_storage = |label| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: byte_len,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        };
        let storage = [make_storage("Sim Buffer 0"), make_storage("Sim Buffer 1")];

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sim Uniform Buffer"),
            contents: bytemuck::bytes_of(&SimUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sim Staging Buffer"),
            size: byte_len,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind = |src: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Sim Bind Group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: storage[src].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: storage[src ^ 1].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                ],
            })
        };
        let bind_groups = [bind(0), bind(1)];

        log::debug!("Allocated GPU sim buffers for {}x{}", size.0, size.1);
        self.resources = Some(Resources {
            size,
            uniform_buffer,
            staging_buffer,
            byte_len,
            storage,
            bind_groups,
        });
        self.uploaded_generation = None;
    }

    fn read_back(&self, pair: &mut PingPong) -> Result<(), GpuError> {
        let Some(res) = &self.resources else {
            return Ok(());
        };
        let device = &self.shared.device;

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Sim Readback Encoder"),
        });
        encoder.copy_buffer_to_buffer(
            &res.storage[self.device_current],
            0,
            &res.staging_buffer,
            0,
            res.byte_len,
        );
        self.shared.queue.submit(std::iter::once(encoder.finish()));

        let slice = res.staging_buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;

        let published = {
            let data = slice.get_mapped_range();
            bytemuck::try_cast_slice::<u8, Cell>(&data)
                .map(|cells| pair.publish(cells))
                .map_err(|e| GpuError::BufferMapping(e.to_string()))
        };
        res.staging_buffer.unmap();
        published
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl Stepper for GpuStepper {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn advance(
        &mut self,
        pair: &mut PingPong,
        kernel: &Kernel,
        brush: &BrushUniform,
        steps: u32,
    ) -> Result<(), GpuError> {
        if steps == 0 {
            return Ok(());
        }
        let size = (pair.width(), pair.height());
        self.ensure_pipeline(kernel);
        self.ensure_resources(size);

        let (Some((_, pipeline)), Some(res)) = (&self.pipeline, &self.resources) else {
            return Ok(());
        };
        let queue = &self.shared.queue;

        if self.uploaded_generation != Some(pair.generation()) {
            queue.write_buffer(&res.storage[0], 0, pair.current().as_bytes());
            self.device_current = 0;
            self.uploaded_generation = Some(pair.generation());
        }

        let uniforms = SimUniforms::new(size, kernel, brush);
        queue.write_buffer(&res.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let groups_x = size.0.div_ceil(WORKGROUP_SIZE);
        let groups_y = size.1.div_ceil(WORKGROUP_SIZE);

        let mut encoder = self
            .shared
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Sim Step Encoder"),
            });
        let mut current = self.device_current;
        for _ in 0..steps {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Sim Step Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &res.bind_groups[current], &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
            drop(pass);
            current ^= 1;
        }
        queue.submit(std::iter::once(encoder.finish()));
        self.device_current = current;

        self.read_back(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_uniform_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<SimUniforms>(), 64);
        assert_eq!(std::mem::offset_of!(SimUniforms, brush_radius), 16);
        assert_eq!(std::mem::offset_of!(SimUniforms, params), 32);
    }

    #[test]
    fn test_uniform_packs_brush_and_params() {
        let kernel = Kernel::with_defaults(ModelId::GrayScott);
        let brush = BrushUniform::at(Vec2::new(0.25, 0.75), 0.1, 0.5);
        let u = SimUniforms::new((64, 32), &kernel, &brush);
        assert_eq!(u.size, [64, 32]);
        assert_eq!(u.brush_pos, [0.25, 0.75]);
        let words = kernel.gpu_words();
        assert_eq!(u.params[0][0], words[0]);
        assert_eq!(u.params[1][3], words[7]);
    }

    #[test]
    fn test_inactive_brush_uses_sentinel() {
        let kernel = Kernel::with_defaults(ModelId::Brusselator);
        let u = SimUniforms::new((8, 8), &kernel, &BrushUniform::inactive());
        assert_eq!(u.brush_pos, [-1.0, -1.0]);
        assert_eq!(u.brush_radius, 0.0);
    }
}
