//! End-to-end scenarios through the public API.

use morphogen::error::ModelError;
use morphogen::journey::{Journey, Waypoint};
use morphogen::model::{self, ModelId};
use morphogen::params::ParameterSet;
use morphogen::prelude::*;

fn lab(model: ModelId, size: u32) -> PatternLab {
    PatternLab::new(LabConfig::new().with_model(model).with_size(size).with_seed(2024))
        .expect("cpu backend always opens")
}

// ============================================================================
// Pattern formation
// ============================================================================

#[test]
fn test_gray_scott_forms_pattern() {
    let mut lab = lab(ModelId::GrayScott, 64);
    lab.set_param("feed", 0.055).unwrap();
    lab.set_param("kill", 0.062).unwrap();
    lab.set_steps_per_frame(100);

    for _ in 0..10 {
        assert!(lab.tick(1.0 / 60.0).stepped);
    }

    let grid = lab.sim_a().pair().current();
    for channel in 0..2 {
        let mean = grid.channel_mean(channel);
        assert!((0.0..=1.0).contains(&mean), "channel {} mean {}", channel, mean);
    }
    assert!(grid.channel_variance(0) > 0.0);
    assert!(grid.channel_variance(1) > 0.0);
    assert!(grid.cells().iter().all(|c| c[0].is_finite() && c[1].is_finite()));
}

#[test]
fn test_seeding_fills_both_buffers() {
    for &id in &ModelId::ALL {
        let mut lab = lab(id, 24);
        let pair = lab.sim_a().pair();
        assert_eq!(pair.grid(0).cells(), pair.grid(1).cells(), "{} after new", id);

        lab.set_steps_per_frame(3);
        lab.tick(1.0 / 60.0);
        lab.reset();
        let pair = lab.sim_a().pair();
        assert_eq!(pair.grid(0).cells(), pair.grid(1).cells(), "{} after reset", id);
    }
}

#[test]
fn test_every_model_stays_finite() {
    for &id in &ModelId::ALL {
        let mut lab = lab(id, 32);
        lab.set_steps_per_frame(50);
        lab.tick(1.0 / 60.0);
        let grid = lab.sim_a().pair().current();
        assert!(
            grid.cells().iter().all(|c| c[0].is_finite() && c[1].is_finite()),
            "{} produced non-finite values",
            id
        );
    }
}

// ============================================================================
// Journeys
// ============================================================================

#[test]
fn test_journey_half_way() {
    let mut lab = lab(ModelId::GrayScott, 16);
    lab.set_steps_per_frame(0);
    let journey = Journey::new(
        "ramp",
        vec![
            Waypoint::new(ParameterSet::from_pairs(&[("feed", 0.02)])),
            Waypoint::new(ParameterSet::from_pairs(&[("feed", 0.06)])),
        ],
    );
    assert!(lab.play(journey));

    lab.tick(1.5);
    let feed = lab.param("feed").unwrap();
    assert!((feed - 0.04).abs() < 1e-5, "feed = {}", feed);
    assert_eq!(lab.player().state(), PlaybackState::Playing);

    lab.tick(2.0);
    assert_eq!(lab.param("feed"), Some(0.06));
    assert_eq!(lab.player().state(), PlaybackState::Stopped);
}

#[test]
fn test_single_waypoint_journey_does_not_play() {
    let mut lab = lab(ModelId::Brusselator, 16);
    let journey = Journey::new("stub", vec![Waypoint::new(ParameterSet::new())]);
    assert!(!lab.play(journey));
    assert_eq!(lab.player().state(), PlaybackState::Stopped);
}

#[test]
fn test_fractal_journey_moves_view() {
    let mut explorer = FractalExplorer::new(
        ExplorerConfig::new()
            .with_kind(FractalKind::Mandelbrot)
            .with_dimensions(32, 24)
            .with_max_iter(32),
    );
    let start = explorer.view();
    let journey = Journey::new(
        "dive",
        vec![
            Waypoint::new(ParameterSet::new()).with_view(View::new(0.0, 0.0, 1.0)),
            Waypoint::new(ParameterSet::new()).with_view(View::new(0.0, 0.0, 0.01)),
        ],
    );
    assert!(explorer.play(journey));
    explorer.tick(1.5);
    let zoom = explorer.view().zoom;
    // Log-space interpolation: half way is the geometric mean
    assert!((zoom - 0.1).abs() < 1e-6, "zoom = {}", zoom);
    assert_ne!(explorer.view(), start);
}

// ============================================================================
// Comparison mode
// ============================================================================

#[test]
fn test_comparison_reset_independence() {
    let mut lab = lab(ModelId::GrayScott, 32);
    lab.set_comparison(true);
    lab.reset();

    let a_before = lab.sim_a().pair().current().clone();
    assert_eq!(&a_before, lab.sim_b().unwrap().pair().current());

    lab.reset_b();
    assert_eq!(lab.sim_a().pair().current(), &a_before);

    let b_before = lab.sim_b().unwrap().pair().current().clone();
    lab.reset_a();
    assert_eq!(lab.sim_b().unwrap().pair().current(), &b_before);
}

#[test]
fn test_comparison_edits_target_selection() {
    let mut lab = lab(ModelId::Schnakenberg, 16);
    lab.set_comparison(true);
    lab.select(SimSlot::B);
    lab.set_param("a", 0.3).unwrap();
    assert_eq!(lab.state().params_b.get("a"), Some(0.3));
    assert_ne!(lab.state().params_a.get("a"), Some(0.3));
}

// ============================================================================
// Catalog errors
// ============================================================================

#[test]
fn test_unknown_model() {
    assert_eq!(
        "bogus".parse::<ModelId>(),
        Err(ModelError::UnknownModel("bogus".into()))
    );
    assert!(matches!(
        model::get_definition("bogus"),
        Err(ModelError::UnknownModel(_))
    ));
    assert!(matches!(
        "bogus".parse::<FractalKind>(),
        Err(ModelError::UnknownModel(_))
    ));
}

#[test]
fn test_unknown_preset() {
    let mut lab = lab(ModelId::GrayScott, 16);
    assert!(matches!(
        lab.apply_preset("Nonexistent"),
        Err(ModelError::UnknownPreset { .. })
    ));
}
