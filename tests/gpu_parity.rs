//! CPU and GPU steppers must agree. Skipped on machines without an adapter.

use morphogen::brush::BrushUniform;
use morphogen::buffer::PingPong;
use morphogen::kernel::Kernel;
use morphogen::model::ModelId;
use morphogen::params::ParameterSet;
use morphogen::stepper::{Backend, CpuStepper, Stepper, StepperFactory};
use morphogen::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

const TOLERANCE: f32 = 1e-3;

fn gpu() -> Option<StepperFactory> {
    match StepperFactory::new(Backend::Gpu) {
        Ok(factory) => Some(factory),
        Err(e) => {
            eprintln!("skipping GPU test: {}", e);
            None
        }
    }
}

fn seeded(kernel: &Kernel, size: u32) -> PingPong {
    let mut pair = PingPong::allocate(size, size);
    pair.seed_with(kernel.seed(size, size, &mut StdRng::seed_from_u64(11)));
    pair
}

fn max_difference(a: &PingPong, b: &PingPong) -> f32 {
    a.current()
        .cells()
        .iter()
        .zip(b.current().cells())
        .flat_map(|(x, y)| [(x[0] - y[0]).abs(), (x[1] - y[1]).abs()])
        .fold(0.0, f32::max)
}

// ============================================================================
// Parity
// ============================================================================

#[test]
fn test_gpu_matches_cpu_for_every_model() {
    let Some(factory) = gpu() else {
        return;
    };
    for &id in &ModelId::ALL {
        let kernel = Kernel::with_defaults(id);
        let mut cpu = seeded(&kernel, 32);
        let mut gpu = cpu.clone();

        CpuStepper.advance(&mut cpu, &kernel, &BrushUniform::inactive(), 20).unwrap();
        factory
            .create()
            .advance(&mut gpu, &kernel, &BrushUniform::inactive(), 20)
            .unwrap();

        let diff = max_difference(&cpu, &gpu);
        assert!(diff < TOLERANCE, "{} diverged by {}", id, diff);
    }
}

#[test]
fn test_gpu_brush_matches_cpu() {
    let Some(factory) = gpu() else {
        return;
    };
    let kernel = Kernel::with_defaults(ModelId::GrayScott);
    let brush = BrushUniform::at(Vec2::new(0.25, 0.75), 0.1, 0.5);
    let mut cpu = seeded(&kernel, 48);
    let mut gpu = cpu.clone();

    CpuStepper.advance(&mut cpu, &kernel, &brush, 5).unwrap();
    factory.create().advance(&mut gpu, &kernel, &brush, 5).unwrap();

    assert!(max_difference(&cpu, &gpu) < TOLERANCE);
}

#[test]
fn test_gpu_blow_up_stays_finite() {
    let Some(factory) = gpu() else {
        return;
    };
    let params = ParameterSet::from_pairs(&[("dt", 1.0e6), ("Du", 0.0), ("Dv", 0.0)]);
    for id in [ModelId::Brusselator, ModelId::Schnakenberg] {
        let kernel = Kernel::new(id, &params);
        let mut cpu = seeded(&kernel, 16);
        let mut gpu = cpu.clone();

        CpuStepper.advance(&mut cpu, &kernel, &BrushUniform::inactive(), 20).unwrap();
        factory
            .create()
            .advance(&mut gpu, &kernel, &BrushUniform::inactive(), 20)
            .unwrap();

        for pair in [&cpu, &gpu] {
            assert!(
                pair.current()
                    .cells()
                    .iter()
                    .all(|c| c[0].is_finite() && c[1].is_finite()),
                "{} produced non-finite values",
                id
            );
        }
    }
}

#[test]
fn test_gpu_stepper_follows_size_changes() {
    let Some(factory) = gpu() else {
        return;
    };
    let kernel = Kernel::with_defaults(ModelId::Schnakenberg);
    let mut stepper = factory.create();
    for size in [16, 40, 16] {
        let mut cpu = seeded(&kernel, size);
        let mut gpu = cpu.clone();
        CpuStepper.advance(&mut cpu, &kernel, &BrushUniform::inactive(), 3).unwrap();
        stepper.advance(&mut gpu, &kernel, &BrushUniform::inactive(), 3).unwrap();
        assert!(max_difference(&cpu, &gpu) < TOLERANCE, "size {}", size);
    }
}
