use powdersim::core::experiment::ExperimentType;
use powdersim::core::io::cif::{CifDocument, pattern_from_block};
use powdersim::core::models::atom::AtomSite;
use powdersim::core::models::background::Background;
use powdersim::core::models::pattern::Pattern;
use powdersim::core::models::phase::{Cell, Phase, SpaceGroupSetting};
use powdersim::core::uncertainty::Measured;
use powdersim::engine::capability::EngineId;
use powdersim::engine::config::CalculatorConfig;
use powdersim::engine::error::CalcError;
use powdersim::engine::fortran::job_info;
use powdersim::workflows::dispatcher::Dispatcher;

fn copper() -> Phase {
    Phase::new("Cu", Cell::cubic(3.615), SpaceGroupSetting::new("F m -3 m"))
        .with_atom(AtomSite::new("Cu1", "Cu", [0.0, 0.0, 0.0]))
}

fn iron() -> Phase {
    Phase::new("Fe", Cell::cubic(2.8665), SpaceGroupSetting::new("I m -3 m"))
        .with_atom(AtomSite::new("Fe1", "Fe", [0.0, 0.0, 0.0]))
}

fn flat_background() -> Background {
    Background::new([(0.0, 1.0), (180.0, 1.0)]).unwrap()
}

fn grid(start: f64, stop: f64, points: usize) -> Vec<f64> {
    let step = (stop - start) / (points - 1) as f64;
    (0..points).map(|i| start + i as f64 * step).collect()
}

fn dispatcher() -> Dispatcher {
    Dispatcher::new(CalculatorConfig::default()).unwrap()
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!(
            (a - e).abs() <= 1e-9 * e.abs().max(1.0),
            "expected {e}, got {a}"
        );
    }
}

#[test]
fn tof_token_selects_neutron_time_of_flight() {
    let mut job = dispatcher();
    job.set_experiment_type_str("tof").unwrap();
    assert_eq!(job.experiment_type().to_string(), "pd-tof-unp-1d-neut");
    assert!(job.is_tof());
    assert_eq!(job.engine_id(), EngineId::Rietveld);
}

#[test]
fn single_crystal_has_no_capable_engine() {
    let mut ty = ExperimentType::default();
    ty.set_single_crystal(true);
    assert_eq!(ty.to_string(), "sc-cwl-unp-1d-neut");

    let mut job = dispatcher();
    job.add_phase(&copper()).unwrap();
    let err = job.set_experiment_type(ty).unwrap_err();
    assert!(matches!(err, CalcError::NoCapableEngine(t) if t == ty));
    assert_eq!(job.experiment_type(), ExperimentType::default());
    assert_eq!(job.phase_labels(), vec!["Cu".to_string()]);
}

#[test]
fn background_alone_without_phases() {
    let mut job = dispatcher();
    job.set_pattern(&Pattern::default().with_wavelength(1.54)).unwrap();
    job.set_background(&flat_background()).unwrap();
    let result = job.calculate(&[10.0, 20.0, 30.0]).unwrap();
    assert_eq!(result.total, vec![1.0, 1.0, 1.0]);
}

#[test]
fn empty_phase_leaves_the_background_and_has_no_reflections() {
    let mut job = dispatcher();
    job.set_pattern(&Pattern::default().with_wavelength(1.54)).unwrap();
    job.set_background(&flat_background()).unwrap();
    job.add_phase(&Phase::new(
        "Empty",
        Cell::cubic(4.0),
        SpaceGroupSetting::new("P m -3 m"),
    ))
    .unwrap();

    let total = job.calculate(&[10.0, 20.0, 30.0]).unwrap().total.clone();
    assert_eq!(total, vec![1.0, 1.0, 1.0]);
    let reflections = job.reflections(Some("Empty"), None).unwrap();
    assert!(reflections[0].1.is_empty());
}

#[test]
fn resolution_is_read_from_cif_with_its_uncertainty() {
    let doc = CifDocument::parse("data_p\n_pd_instr.resolution_u 0.0123(4)\n").unwrap();
    let pattern = pattern_from_block(doc.first_block().unwrap()).unwrap();
    let u = pattern.cw.resolution.u;
    assert!((u.value - 0.0123).abs() < 1e-12);
    assert!((u.error.unwrap() - 0.0004).abs() < 1e-12);

    let mut job = dispatcher();
    job.set_pattern(&pattern).unwrap();
    assert_eq!(job.pattern().cw.resolution.u, u);
}

#[test]
fn simulator_job_describes_the_grid() {
    let info = job_info(
        &grid(10.0, 20.0, 11),
        &Pattern::default(),
        ExperimentType::default().radiation(),
    )
    .unwrap();
    assert!((info.theta_step - 1.0).abs() < 1e-12);
    assert_eq!(info.range_2theta, (10.0, 20.0));
    assert_eq!(info.points, 11);
}

#[test]
fn output_matches_the_grid_length_on_every_engine() {
    let x = grid(30.0, 60.0, 301);
    let mut job = dispatcher();
    job.set_experiment_type_str("xray").unwrap();
    job.set_background(&flat_background()).unwrap();
    job.add_phase(&copper()).unwrap();

    for preference in [
        vec![EngineId::Rietveld],
        vec![EngineId::Simulator],
        vec![EngineId::Pdf],
    ] {
        let engine = preference[0];
        job.set_preference(preference).unwrap();
        assert_eq!(job.engine_id(), engine);
        let result = job.calculate(&x).unwrap();
        assert_eq!(result.total.len(), x.len(), "{engine}");
        assert_eq!(result.phases[0].profile.len(), x.len(), "{engine}");
    }
}

#[test]
fn total_is_global_scale_times_scaled_phases_plus_background() {
    let mut job = dispatcher();
    job.set_experiment_type_str("xray").unwrap();
    let mut pattern = Pattern::default();
    pattern.scale = Some(Measured::new(1000.0));
    job.set_pattern(&pattern).unwrap();
    job.set_background(&flat_background()).unwrap();
    job.add_phase(&copper()).unwrap();
    job.add_phase(&iron()).unwrap();
    job.set_phase_scale("Fe", 0.5).unwrap();

    let x = grid(40.0, 80.0, 401);
    let result = job.calculate(&x).unwrap();
    assert_eq!(result.global_scale, 2.0);
    let expected: Vec<f64> = (0..x.len())
        .map(|j| {
            let phases: f64 = result.phases.iter().map(|p| p.profile[j]).sum();
            2.0 * phases + result.background[j]
        })
        .collect();
    assert_close(&result.total, &expected);
    assert!(result.total.iter().any(|v| *v > 1.0));
}

#[test]
fn common_space_groups_are_accepted() {
    let orthorhombic = Cell::new(5.0, 6.0, 7.0, 90.0, 90.0, 90.0);
    let tetragonal = Cell::new(5.0, 5.0, 7.0, 90.0, 90.0, 90.0);
    let hexagonal = Cell::new(5.0, 5.0, 7.0, 90.0, 90.0, 120.0);
    let settings = [
        ("P 21 21 21", orthorhombic),
        ("P m m m", orthorhombic),
        ("C m c m", orthorhombic),
        ("P 63/m", hexagonal),
        ("I 4/m", tetragonal),
        ("R 3 m", hexagonal),
        ("P 4/n m m", tetragonal),
        ("P -4 2 1 m", tetragonal),
    ];

    let mut job = dispatcher();
    job.set_background(&flat_background()).unwrap();
    for (index, (symbol, cell)) in settings.into_iter().enumerate() {
        let phase = Phase::new(format!("phase{index}"), cell, SpaceGroupSetting::new(symbol))
            .with_atom(AtomSite::new("Si1", "Si", [0.1, 0.2, 0.3]));
        job.add_phase(&phase)
            .unwrap_or_else(|e| panic!("{symbol} rejected: {e}"));
    }

    let x = grid(10.0, 60.0, 1001);
    let total = job.calculate(&x).unwrap().total.clone();
    assert_eq!(total.len(), x.len());
    assert!(total.iter().all(|v| v.is_finite()));
    assert!(total.iter().any(|v| *v > 1.0));
}

#[test]
fn adding_then_removing_a_phase_restores_the_output() {
    let x = grid(30.0, 90.0, 601);
    let mut job = dispatcher();
    job.set_background(&flat_background()).unwrap();
    job.add_phase(&copper()).unwrap();
    let before = job.calculate(&x).unwrap().clone();

    job.add_phase(&iron()).unwrap();
    let with_iron = job.calculate(&x).unwrap().total.clone();
    assert_ne!(with_iron, before.total);

    job.remove_phase("Fe").unwrap();
    let after = job.calculate(&x).unwrap();
    assert_eq!(after, &before);
}

#[test]
fn registration_order_does_not_change_the_total() {
    let x = grid(30.0, 90.0, 601);

    let mut forward = dispatcher();
    forward.add_phase(&copper()).unwrap();
    forward.add_phase(&iron()).unwrap();
    let a = forward.calculate(&x).unwrap().total.clone();

    let mut backward = dispatcher();
    backward.add_phase(&iron()).unwrap();
    backward.add_phase(&copper()).unwrap();
    let b = backward.calculate(&x).unwrap().total.clone();

    assert_close(&a, &b);
}

#[test]
fn model_survives_a_round_trip_through_another_engine() {
    let x = grid(30.0, 90.0, 301);
    let mut job = dispatcher();
    job.set_experiment_type_str("xray").unwrap();
    job.add_phase(&copper()).unwrap();
    job.set_phase_scale("Cu", 2.0).unwrap();
    let before = job.calculate(&x).unwrap().total.clone();

    job.set_experiment_type_str("pd-tof-unp-1d-neut").unwrap();
    assert!(job.is_tof());
    job.set_experiment_type_str("pd-cwl-unp-1d-xray").unwrap();
    assert_eq!(job.phase_scale("Cu"), 2.0);
    let after = job.calculate(&x).unwrap().total.clone();
    assert_close(&after, &before);
}

#[test]
fn every_experiment_type_prints_and_parses_back_to_itself() {
    let all = ExperimentType::all();
    assert_eq!(all.len(), 64);
    for ty in all {
        let text = ty.to_string();
        let parsed = ExperimentType::parse(&text).unwrap();
        assert_eq!(parsed, ty);
        assert_eq!(parsed.to_string(), text);
    }
}
