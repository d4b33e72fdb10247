//! Validates every generated compute shader and the present shader with naga.

use morphogen::gpu::PRESENT_WGSL;
use morphogen::kernel::{Kernel, WORKGROUP_SIZE};
use morphogen::model::ModelId;

/// Validates WGSL code using naga.
fn validate_wgsl(code: &str) -> Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(code)
        .map_err(|e| format!("WGSL parse error: {}", e.emit_to_string(code)))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(module)
}

// ============================================================================
// Compute kernels
// ============================================================================

#[test]
fn test_every_model_kernel_validates() {
    for &id in &ModelId::ALL {
        let source = Kernel::with_defaults(id).wgsl();
        if let Err(e) = validate_wgsl(&source) {
            panic!("{} kernel failed:\n{}\n---\n{}", id, e, source);
        }
    }
}

#[test]
fn test_kernel_entry_point_and_workgroup() {
    for &id in &ModelId::ALL {
        let module = validate_wgsl(&Kernel::with_defaults(id).wgsl()).unwrap();
        let entry = module
            .entry_points
            .iter()
            .find(|e| e.name == "main")
            .unwrap_or_else(|| panic!("{} kernel has no `main` entry point", id));
        assert_eq!(entry.stage, naga::ShaderStage::Compute);
        assert_eq!(entry.workgroup_size, [WORKGROUP_SIZE, WORKGROUP_SIZE, 1]);
    }
}

#[test]
fn test_kernel_binds_three_resources() {
    let source = Kernel::with_defaults(ModelId::GrayScott).wgsl();
    for binding in ["@binding(0)", "@binding(1)", "@binding(2)"] {
        assert!(source.contains(binding), "missing {}", binding);
    }
    assert!(!source.contains("@binding(3)"));
}

// ============================================================================
// Presentation
// ============================================================================

#[test]
fn test_present_shader_validates() {
    let module = validate_wgsl(PRESENT_WGSL).unwrap();
    let stages: Vec<_> = module.entry_points.iter().map(|e| e.stage).collect();
    assert!(stages.contains(&naga::ShaderStage::Vertex));
    assert!(stages.contains(&naga::ShaderStage::Fragment));
}
