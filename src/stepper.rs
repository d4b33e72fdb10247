//! Batched stepping over a [`PingPong`] pair.
//!
//! A [`Stepper`] runs `n` strictly sequential steps of a [`Kernel`]. The CPU
//! stepper parallelizes each step across rows with rayon; the GPU stepper
//! (see [`crate::gpu::GpuStepper`]) dispatches one compute pass per step.
//! Both leave the latest state in `pair.current()`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::brush::BrushUniform;
use crate::buffer::PingPong;
use crate::error::GpuError;
use crate::kernel::Kernel;

/// Runs simulation steps for one pair of buffers.
pub trait Stepper {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Run `steps` sequential steps. The brush applies to every step.
    fn advance(
        &mut self,
        pair: &mut PingPong,
        kernel: &Kernel,
        brush: &BrushUniform,
        steps: u32,
    ) -> Result<(), GpuError>;
}

/// Host-side stepper.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuStepper;

impl Stepper for CpuStepper {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn advance(
        &mut self,
        pair: &mut PingPong,
        kernel: &Kernel,
        brush: &BrushUniform,
        steps: u32,
    ) -> Result<(), GpuError> {
        for _ in 0..steps {
            let (src, dst) = pair.split();
            kernel.step(src, dst, brush);
            pair.flip();
        }
        Ok(())
    }
}

/// Where simulation steps run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Cpu,
    Gpu,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Cpu => "cpu",
            Backend::Gpu => "gpu",
        })
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Backend::Cpu),
            "gpu" => Ok(Backend::Gpu),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// Makes steppers for one backend. A GPU factory opens its device once and
/// shares it between every stepper it creates.
#[derive(Clone)]
pub enum StepperFactory {
    Cpu,
    Gpu(crate::gpu::SharedDevice),
}

impl StepperFactory {
    /// Prepare `backend`. Fails when the GPU backend finds no usable device.
    pub fn new(backend: Backend) -> Result<Self, GpuError> {
        match backend {
            Backend::Cpu => Ok(StepperFactory::Cpu),
            Backend::Gpu => {
                let context = pollster::block_on(crate::gpu::GpuContext::headless())?;
                Ok(StepperFactory::Gpu(context.into_shared()))
            }
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            StepperFactory::Cpu => Backend::Cpu,
            StepperFactory::Gpu(_) => Backend::Gpu,
        }
    }

    pub fn create(&self) -> Box<dyn Stepper> {
        match self {
            StepperFactory::Cpu => Box::new(CpuStepper),
            StepperFactory::Gpu(shared) => Box::new(crate::gpu::GpuStepper::new(shared.clone())),
        }
    }
}

impl fmt::Debug for StepperFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StepperFactory({})", self.backend())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelId;
    use glam::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded(kernel: &Kernel, size: u32, seed: u64) -> PingPong {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pair = PingPong::allocate(size, size);
        pair.seed_with(kernel.seed(size, size, &mut rng));
        pair
    }

    #[test]
    fn test_advance_is_sequential() {
        let kernel = Kernel::with_defaults(ModelId::GrayScott);
        let mut batched = seeded(&kernel, 32, 7);
        let mut single = batched.clone();

        CpuStepper.advance(&mut batched, &kernel, &BrushUniform::inactive(), 6).unwrap();
        for _ in 0..6 {
            CpuStepper.advance(&mut single, &kernel, &BrushUniform::inactive(), 1).unwrap();
        }
        assert_eq!(batched.current(), single.current());
        assert_eq!(batched.current_index(), 0);
    }

    #[test]
    fn test_zero_steps_is_noop() {
        let kernel = Kernel::with_defaults(ModelId::Schnakenberg);
        let mut pair = seeded(&kernel, 16, 1);
        let before = pair.clone();
        CpuStepper.advance(&mut pair, &kernel, &BrushUniform::inactive(), 0).unwrap();
        assert_eq!(pair.current(), before.current());
        assert_eq!(pair.current_index(), before.current_index());
    }

    #[test]
    fn test_brush_reaches_every_step() {
        let kernel = Kernel::with_defaults(ModelId::GrayScott);
        let mut plain = seeded(&kernel, 32, 3);
        let mut brushed = plain.clone();
        let brush = BrushUniform::at(Vec2::new(0.5, 0.5), 0.2, 0.5);

        CpuStepper.advance(&mut plain, &kernel, &BrushUniform::inactive(), 3).unwrap();
        CpuStepper.advance(&mut brushed, &kernel, &brush, 3).unwrap();

        let ch = kernel.brush_channel();
        assert!(brushed.current().get(16, 16)[ch] > plain.current().get(16, 16)[ch]);
        assert_eq!(brushed.current().get(0, 0), plain.current().get(0, 0));
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("GPU".parse::<Backend>(), Ok(Backend::Gpu));
        assert_eq!(Backend::default().to_string(), "cpu");
        assert!("vulkan".parse::<Backend>().is_err());
    }

    #[test]
    fn test_cpu_factory() {
        let factory = StepperFactory::new(Backend::Cpu).unwrap();
        assert_eq!(factory.backend(), Backend::Cpu);
        assert_eq!(factory.create().name(), "cpu");
    }
}
