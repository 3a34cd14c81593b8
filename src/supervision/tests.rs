use super::{
    AlertCode, AlertGate, AlertPolicy, AlertSeverity, ConfigError, ConsoleSink, Diagnostic, DiagnosticsSink,
    DivergenceEstimator, EmbeddingParams, GuidanceError, GuidanceGains, GuidanceGenerator, MonitorConfig, NumericFault,
    RecordingSink, RegimeClassifier, RegimeState, RegimeThresholds, RegimeTracker, RunMetrics, SetupError, SilentSink,
    SlidingWindow, StabilityBand, Supervisor, TickResult,
};
use crate::dynamics::{ModelError, ModelParameters, ReferenceTrajectoryModel};
use crate::util::Vec3D;
use itertools::Itertools;
use rand::{Rng, rng};
use std::sync::{Arc, LazyLock};

const RATE: f64 = 8.0;

static MODEL: LazyLock<Arc<ReferenceTrajectoryModel>> = LazyLock::new(|| {
    let mut model = ReferenceTrajectoryModel::new(ModelParameters::default());
    model.compute_default().unwrap();
    Arc::new(model)
});

fn reference() -> &'static [Vec3D<f64>] { MODEL.trajectory().unwrap().points() }

fn tick_time(k: usize) -> f64 { k as f64 / RATE }

fn supervisor(sink: RecordingSink) -> Supervisor {
    Supervisor::new("TEST-1", Arc::clone(&MODEL), MonitorConfig::default(), Box::new(sink)).unwrap()
}

fn feed(sv: &mut Supervisor, start_tick: usize, points: &[Vec3D<f64>]) -> Vec<TickResult> {
    points.iter().enumerate().map(|(i, p)| sv.process(tick_time(start_tick + i), p.x(), p.y(), p.z())).collect()
}

/// Points whose consecutive distances are `exp(rate * i)`.
fn diverging_points(n: usize, rate: f64) -> Vec<Vec3D<f64>> {
    let mut x = 0.0;
    (0..n)
        .map(|i| {
            let p = Vec3D::new(x, 0.0, 0.0);
            x += (rate * i as f64).exp();
            p
        })
        .collect()
}

#[test]
fn test_estimator_short_windows_are_neutral() {
    let mut rng = rng();
    for len in 0..=11 {
        let window = (0..len)
            .map(|_| Vec3D::new(rng.random_range(-5.0..5.0), rng.random_range(-5.0..5.0), rng.random_range(0.0..1.0)))
            .collect_vec();
        assert_eq!(DivergenceEstimator::estimate(&window), Ok(0.0), "window of {len}");
    }
}

#[test]
fn test_estimator_recovers_growth_rate() {
    let window = diverging_points(60, 0.05);
    let exponent = DivergenceEstimator::estimate(&window).unwrap();
    assert!((exponent - 0.05).abs() < 1e-9, "{exponent}");

    let contracting = diverging_points(60, -0.2);
    let exponent = DivergenceEstimator::estimate(&contracting).unwrap();
    assert!((exponent + 0.2).abs() < 1e-9, "{exponent}");
}

#[test]
fn test_estimator_is_clamped() {
    assert_eq!(DivergenceEstimator::estimate(&diverging_points(20, 3.0)), Ok(2.0));
    assert_eq!(DivergenceEstimator::estimate(&diverging_points(12, -3.0)), Ok(-2.0));

    let mut rng = rng();
    for _ in 0..200 {
        let len = rng.random_range(12..150);
        let scale = 10f64.powi(rng.random_range(-12..12));
        let window = (0..len)
            .map(|_| {
                Vec3D::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0))
                    * scale
            })
            .collect_vec();
        let exponent = DivergenceEstimator::estimate(&window).unwrap();
        assert!((-2.0..=2.0).contains(&exponent), "{exponent}");
    }
}

#[test]
fn test_estimator_degenerate_windows() {
    let constant = vec![Vec3D::new(1.0, 2.0, 0.5); 100];
    assert!(DivergenceEstimator::estimate(&constant).unwrap().abs() < 1e-12);

    let mut poisoned = diverging_points(40, 0.01);
    poisoned[20] = Vec3D::new(f64::NAN, 0.0, 0.0);
    assert!(matches!(DivergenceEstimator::estimate(&poisoned), Err(NumericFault::NonFiniteExponent { .. })));
}

#[test]
fn test_variance_growth() {
    assert_eq!(
        DivergenceEstimator::variance_growth(&diverging_points(50, 0.0)),
        Err(NumericFault::InsufficientSamples { got: 50, needed: 100 })
    );
    let flat = vec![Vec3D::new(0.3, 0.3, 0.3); 200];
    assert!(DivergenceEstimator::variance_growth(&flat).unwrap().abs() < 1e-12);

    let growing = (0..500)
        .map(|i| {
            let amp = (0.01 * f64::from(i)).exp();
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            Vec3D::new(sign * amp, 0.0, 0.0)
        })
        .collect_vec();
    assert!(DivergenceEstimator::variance_growth(&growing).unwrap() > 0.5);
    assert!(DivergenceEstimator::variance_growth(reference()).unwrap().abs() < 0.1);
}

fn logistic_points(n: usize) -> Vec<Vec3D<f64>> {
    let mut x = 0.3;
    (0..n)
        .map(|_| {
            let p = Vec3D::new(x, 0.0, 0.0);
            x = 4.0 * x * (1.0 - x);
            p
        })
        .collect()
}

#[test]
fn test_embedded_exponent() {
    let params = EmbeddingParams::default();
    // the fully chaotic logistic map separates neighbours at ln 2 per step
    let chaotic = DivergenceEstimator::embedded(&logistic_points(500), &params).unwrap();
    assert!((chaotic - std::f64::consts::LN_2).abs() < 0.05, "{chaotic}");

    let periodic = (0..500).map(|i| Vec3D::new((0.3 * f64::from(i)).sin(), 0.0, 0.0)).collect_vec();
    let exponent = DivergenceEstimator::embedded(&periodic, &params).unwrap();
    assert!(exponent.abs() < 0.05, "{exponent}");
}

#[test]
fn test_embedded_exponent_falls_back_to_variance_growth() {
    let params = EmbeddingParams::default();
    let series = logistic_points(500);
    let no_neighbours = EmbeddingParams { max_separation: Some(5), ..params };
    assert_eq!(
        DivergenceEstimator::embedded(&series, &no_neighbours),
        DivergenceEstimator::variance_growth(&series)
    );
    let constant = vec![Vec3D::new(0.4, 0.0, 0.0); 200];
    assert_eq!(DivergenceEstimator::embedded(&constant, &params), DivergenceEstimator::variance_growth(&constant));
    let degenerate = EmbeddingParams { horizon: 0, ..params };
    assert_eq!(DivergenceEstimator::embedded(&series, &degenerate), DivergenceEstimator::variance_growth(&series));
    assert_eq!(
        DivergenceEstimator::embedded(&series[..80], &params),
        Err(NumericFault::InsufficientSamples { got: 80, needed: 100 })
    );
}

#[test]
fn test_classifier_rule_order_and_boundaries() {
    let c = RegimeClassifier::default();
    assert_eq!(c.classify(0.1, 0.5), RegimeState::CreativeChaosZone);
    assert_eq!(c.classify(0.0, 0.0), RegimeState::StableCycle);
    assert_eq!(c.classify(-1.5, 0.19), RegimeState::StableCycle);
    assert_eq!(c.classify(0.6, 0.0), RegimeState::Chaos);
    assert_eq!(c.classify(0.6, 0.5), RegimeState::Chaos);
    assert_eq!(c.classify(0.1, 2.0), RegimeState::Converging);
    assert_eq!(c.classify(-0.5, 1.0), RegimeState::Converging);
    // ties fall through to the next rule
    assert_eq!(c.classify(0.01, 0.1), RegimeState::Converging);
    assert_eq!(c.classify(0.005, 0.2), RegimeState::Converging);
    assert_eq!(c.classify(0.5, 0.5), RegimeState::Converging);
    assert_eq!(c.classify(0.1, 0.8), RegimeState::Converging);
    assert_eq!(c.classify(f64::NAN, 0.1), RegimeState::Converging);
    assert_eq!(c.classify(0.1, f64::NAN), RegimeState::Converging);
}

#[test]
fn test_classifier_is_total() {
    let c = RegimeClassifier::default();
    let th = RegimeThresholds::default();
    let mut rng = rng();
    for _ in 0..10_000 {
        let e = rng.random_range(-3.0..3.0);
        let d = rng.random_range(0.0..3.0);
        let state = c.classify(e, d);
        assert!(state.is_classified());
        let expected = if th.in_creative_chaos(e, d) {
            RegimeState::CreativeChaosZone
        } else if e < th.lambda_min && d < th.deviation_min {
            RegimeState::StableCycle
        } else if e > th.lambda_max {
            RegimeState::Chaos
        } else {
            RegimeState::Converging
        };
        assert_eq!(state, expected);
    }
}

#[test]
fn test_regime_names_and_bands() {
    assert_eq!(RegimeState::CreativeChaosZone.to_string(), "CreativeChaosZone");
    assert_eq!("stablecycle".parse::<RegimeState>(), Ok(RegimeState::StableCycle));
    assert_eq!("CCZ".parse::<RegimeState>(), Ok(RegimeState::CreativeChaosZone));
    assert_eq!("Converging_to_LC".parse::<RegimeState>(), Ok(RegimeState::Converging));
    assert_eq!(RegimeState::StableCycle.to_string(), "StableCycle");
    assert_eq!(RegimeState::Converging.to_string(), "Converging");
    assert_eq!(StabilityBand::from_exponent(-0.3), StabilityBand::OverDamped);
    assert_eq!(StabilityBand::from_exponent(0.05), StabilityBand::StableCycle);
    assert_eq!(StabilityBand::from_exponent(0.2), StabilityBand::CreativeChaos);
    assert_eq!(StabilityBand::from_exponent(0.5), StabilityBand::Chaotic);
    assert_eq!(StabilityBand::OverDamped.to_string(), "Over-damped");
}

#[test]
fn test_ccz_round_trip_bookkeeping() {
    let mut tracker = RegimeTracker::default();
    let mut metrics = RunMetrics::new(1000, 16);

    assert!(tracker.update(RegimeState::StableCycle, 12.0).is_some());
    assert!(tracker.update(RegimeState::StableCycle, 12.5).is_none());
    let entry = tracker.update(RegimeState::CreativeChaosZone, 13.0).unwrap();
    assert_eq!(metrics.record_transition(&entry), None);
    let exit = tracker.update(RegimeState::StableCycle, 13.125).unwrap();
    let episode = metrics.record_transition(&exit).unwrap();

    assert_eq!(metrics.ccz_entries(), 1);
    assert_eq!(metrics.recovery_count(), 1);
    assert_eq!(metrics.episodes().len(), 1);
    assert_eq!(episode.start, 13.0);
    assert_eq!(episode.end, 13.125);
    assert_eq!(episode.duration, 0.125);
    assert_eq!(episode.exit_state, RegimeState::StableCycle);
    assert_eq!(metrics.recovery_times(), vec![0.125]);
    assert_eq!(tracker.time_in_state(14.125), 1.0);
}

#[test]
fn test_ccz_exit_into_chaos_is_no_recovery() {
    let mut tracker = RegimeTracker::default();
    let mut metrics = RunMetrics::new(1000, 16);
    for (state, t) in [(RegimeState::CreativeChaosZone, 1.0), (RegimeState::Chaos, 4.0), (RegimeState::Converging, 5.0)] {
        if let Some(tr) = tracker.update(state, t) {
            metrics.record_transition(&tr);
        }
    }
    assert_eq!(metrics.ccz_entries(), 1);
    assert_eq!(metrics.chaos_entries(), 1);
    assert_eq!(metrics.recovery_count(), 0);
    assert_eq!(metrics.snapshot().ccz_total_time, 3.0);
    assert_eq!(metrics.episodes()[0].exit_state, RegimeState::Chaos);
}

#[test]
fn test_episode_log_is_capped() {
    let mut tracker = RegimeTracker::default();
    let mut metrics = RunMetrics::new(1000, 4);
    for i in 0..10 {
        let t = f64::from(i) * 2.0;
        for (state, at) in [(RegimeState::CreativeChaosZone, t), (RegimeState::StableCycle, t + 1.0)] {
            if let Some(tr) = tracker.update(state, at) {
                metrics.record_transition(&tr);
            }
        }
    }
    assert_eq!(metrics.episodes().len(), 4);
    assert_eq!(metrics.episode_count(), 10);
    assert_eq!(metrics.average_episode_duration(), 1.0);
    assert_eq!(metrics.average_recovery_time(), 1.0);
    assert_eq!(metrics.episodes()[0].start, 12.0);
}

#[test]
fn test_guidance_on_cycle_holds() {
    let g = GuidanceGenerator::default();
    let p = Vec3D::new(1.0, -0.4, 8.2);
    for state in [RegimeState::Chaos, RegimeState::CreativeChaosZone, RegimeState::Converging] {
        let guidance = g.guide(&p, &p, state, 0.7);
        assert_eq!(guidance.magnitude, 0.0);
        assert_eq!(guidance.components, Vec3D::zero());
        assert_eq!(guidance.recommendation, "Maintain current trajectory");
    }
}

#[test]
fn test_guidance_direction_and_recommendation() {
    let g = GuidanceGenerator::default();
    let origin = Vec3D::zero();

    let urgent = g.guide(&origin, &Vec3D::new(2.0, 0.0, 0.0), RegimeState::Chaos, 0.5);
    assert_eq!(urgent.direction, Vec3D::new(1.0, 0.0, 0.0));
    assert_eq!(urgent.magnitude, 0.5);
    assert_eq!(urgent.components, Vec3D::new(0.5, 0.0, 0.0));
    assert_eq!(urgent.recommendation, "URGENT: increase pitch");

    let advisory = g.guide(&origin, &Vec3D::new(-1.0, -1.0, 0.0), RegimeState::CreativeChaosZone, 0.4);
    assert_eq!(advisory.recommendation, "Consider: decrease pitch, decrease bank");

    let suggested = g.guide(&origin, &Vec3D::new(0.0, 0.0, 3.0), RegimeState::Converging, 1.0);
    assert!((suggested.components.z() - 0.7).abs() < 1e-12);
    assert_eq!(suggested.recommendation, "Suggested: increase power");

    let small = g.guide(&origin, &Vec3D::new(0.0, 0.0, 3.0), RegimeState::Converging, 0.1);
    assert_eq!(small.recommendation, "Maintain current trajectory");
    assert!(small.magnitude > 0.0);

    let stable = g.guide(&origin, &Vec3D::new(0.0, 1.0, 0.0), RegimeState::StableCycle, 0.15);
    assert_eq!(stable.magnitude, 0.0);
    assert_eq!(stable.recommendation, "Maintain current trajectory");

    assert_eq!(g.gain(RegimeState::Initializing), GuidanceGenerator::DEFAULT_GAIN);
}

#[test]
fn test_guidance_gain_setter() {
    let mut g = GuidanceGenerator::default();
    g.set_gain("Chaos", 1.7).unwrap();
    assert_eq!(g.gain(RegimeState::Chaos), 1.0);
    g.set_gain("converging", -3.0).unwrap();
    assert_eq!(g.gain(RegimeState::Converging), 0.0);
    g.set_gain("CCZ", 0.25).unwrap();
    assert_eq!(g.gain(RegimeState::CreativeChaosZone), 0.25);
    g.set_gain("StableCycle", f64::NAN).unwrap();
    assert_eq!(g.gain(RegimeState::StableCycle), 0.0);

    g.set_gain("Stable_LC", 0.1).unwrap();
    assert_eq!(g.gain(RegimeState::StableCycle), 0.1);
    g.set_gain("Creative_Chaos_Zone", 0.6).unwrap();
    assert_eq!(g.gain(RegimeState::CreativeChaosZone), 0.6);
    g.set_gain("converging_to_lc", 0.8).unwrap();
    assert_eq!(g.gain(RegimeState::Converging), 0.8);

    assert_eq!(g.set_gain("Warp", 0.3), Err(GuidanceError::UnknownState { name: "Warp".into() }));
    assert_eq!(g.set_gain("Initializing", 0.3), Err(GuidanceError::UnknownState { name: "Initializing".into() }));
}

#[test]
fn test_alert_cooldown_suppresses_second_alert() {
    let mut gate = AlertGate::new(AlertPolicy::default());
    let first = gate.offer(RegimeState::Chaos, 0.0, 0.8, 0.1, 10.0).unwrap();
    assert_eq!(first.severity, AlertSeverity::Warning);
    assert_eq!(first.code, AlertCode::ChaosDetected);
    assert_eq!(first.code.to_string(), "CHAOS_DETECTED");
    assert!(first.message.contains("λ=0.80"));
    assert!(gate.offer(RegimeState::Chaos, 2.0, 0.9, 0.1, 12.0).is_none());
    assert_eq!(gate.last_alert(), Some(10.0));
    assert!(gate.offer(RegimeState::Chaos, 5.0, 0.9, 0.1, 15.0).is_some());
}

#[test]
fn test_alert_policy_levels() {
    let policy = AlertPolicy::default();
    let eval = |state, dwell, dev| policy.evaluate(state, dwell, 0.1, dev, 100.0).map(|a| (a.severity, a.code));

    assert_eq!(eval(RegimeState::StableCycle, 0.0, 0.0), None);
    assert_eq!(eval(RegimeState::CreativeChaosZone, 3.0, 0.5), Some((AlertSeverity::Info, AlertCode::CczEntry)));
    assert_eq!(eval(RegimeState::CreativeChaosZone, 60.0, 0.5), None);
    assert_eq!(
        eval(RegimeState::CreativeChaosZone, 121.0, 0.5),
        Some((AlertSeverity::Caution, AlertCode::CczExtended))
    );
    assert_eq!(eval(RegimeState::Converging, 0.0, 1.6), Some((AlertSeverity::Caution, AlertCode::LargeDeviation)));
    assert_eq!(eval(RegimeState::Converging, 0.0, 1.5), Some((AlertSeverity::Info, AlertCode::Converging)));
    assert_eq!(eval(RegimeState::Converging, 0.0, 0.5), None);
    assert_eq!(AlertSeverity::Caution.to_string(), "CAUTION");
}

#[test]
fn test_sliding_window_evicts_oldest() {
    let mut window = SlidingWindow::new(3);
    for k in 0..5 {
        window.push(tick_time(k), Vec3D::new(k as f64, 0.0, 0.0));
    }
    assert!(window.is_full());
    assert_eq!(window.len(), 3);
    assert_eq!(window.states().map(Vec3D::x).collect_vec(), vec![2.0, 3.0, 4.0]);
    assert_eq!(window.times().collect_vec(), vec![0.25, 0.375, 0.5]);
    assert_eq!(window.latest(), Some((0.5, Vec3D::new(4.0, 0.0, 0.0))));
}

#[test]
fn test_supervisor_setup_errors() {
    let uncomputed = Arc::new(ReferenceTrajectoryModel::new(ModelParameters::default()));
    let err = Supervisor::new("X", uncomputed, MonitorConfig::default(), Box::new(SilentSink)).err();
    assert_eq!(err, Some(SetupError::Model { source: ModelError::NotComputed }));

    let config = MonitorConfig { window_size: 1, ..MonitorConfig::default() };
    let err = Supervisor::new("X", Arc::clone(&MODEL), config, Box::new(SilentSink)).err();
    assert_eq!(err, Some(SetupError::Config { source: ConfigError::WindowTooSmall { size: 1 } }));

    let mut config = MonitorConfig::default();
    config.thresholds.lambda_min = 0.9;
    assert_eq!(config.validate(), Err(ConfigError::InvalidThresholds));
}

#[test]
fn test_warmup_reports_initializing() {
    let mut sv = supervisor(RecordingSink::new());
    let results = feed(&mut sv, 0, &reference()[..99]);
    for (k, r) in results.iter().enumerate() {
        assert_eq!(r.state, RegimeState::Initializing);
        assert!(r.exponent.is_none() && r.deviation.is_none() && r.guidance.is_none() && r.alert.is_none());
        assert!((r.buffer_fill - (k + 1) as f64 / 100.0).abs() < 1e-12);
        assert_eq!(r.metrics.samples_processed, (k + 1) as u64);
    }
    assert_eq!(sv.metrics().latency_samples(), 0);
}

#[test]
fn test_tracing_reference_stays_stable() {
    let sink = RecordingSink::new();
    let mut sv = supervisor(sink.clone());
    let results = feed(&mut sv, 0, &reference()[..100]);
    let last = results.last().unwrap();

    assert_eq!(last.state, RegimeState::StableCycle);
    assert_eq!(last.deviation, Some(0.0));
    assert_eq!(last.nearest, Some(reference()[99]));
    assert!(last.exponent.unwrap().abs() < 0.01);
    assert_eq!(last.guidance.as_ref().unwrap().recommendation, "Maintain current trajectory");
    assert!(last.alert.is_none());
    assert_eq!(last.metrics.ccz_entries, 0);
    assert!(sink.entries().iter().all(|d| !matches!(d, Diagnostic::Fault { .. })));
}

#[test]
fn test_disturbance_enters_ccz_and_settles() {
    let mut sv = supervisor(RecordingSink::new());
    let traj = reference();
    let mut samples = traj[..100].to_vec();
    samples.extend((0..50).map(|j| {
        let sign = if j % 2 == 1 { 1.0 } else { -1.0 };
        let jitter = sign * 0.05 * (0.06 * f64::from(j)).exp();
        traj[100 + j as usize] + Vec3D::new(jitter, jitter, 1.0)
    }));
    samples.extend_from_slice(&traj[150..300]);
    let results = feed(&mut sv, 0, &samples);

    assert!(results.iter().any(|r| r.state == RegimeState::CreativeChaosZone));
    assert!(sv.metrics().ccz_entries() >= 1);
    assert!(!sv.export_episodes().is_empty());
    assert!(sv.export_episodes().iter().all(|ep| ep.duration > 0.0));
    assert_eq!(sv.state(), RegimeState::StableCycle);

    let report = sv.summary_report();
    assert_eq!(report.summary.total_samples, 300);
    assert_eq!(report.summary.monitored_time, 300.0 / RATE);
    assert_eq!(report.summary.current_state, RegimeState::StableCycle);
    assert!(report.stability.max_exponent > 0.01);
    assert!(report.stability.max_deviation > 0.2);
    assert_eq!(report.ccz.entries, sv.metrics().ccz_entries());
    assert!(report.ccz.total_time > 0.0);
    assert!(report.performance.max_latency_ms >= report.performance.average_latency_ms);
    assert!(report.performance.p99_latency_ms <= report.performance.max_latency_ms);
    assert_eq!(report.model.params, ModelParameters::default());
}

#[test]
fn test_direct_recovery_records_recovery_time() {
    let sink = RecordingSink::new();
    let mut sv = supervisor(sink.clone());
    let anchor = reference()[0];
    let mut samples = vec![anchor; 100];
    samples.extend((0..97).map(|j| {
        let sign = if j % 2 == 0 { 1.0 } else { -1.0 };
        anchor + Vec3D::new(sign * 20.0, 0.0, 0.0)
    }));
    samples.push(anchor + Vec3D::new(0.0, 0.0, 1.0));
    samples.extend(vec![anchor; 3]);
    let results = feed(&mut sv, 0, &samples);

    assert_eq!(results[99].state, RegimeState::StableCycle);
    assert_eq!(results[150].state, RegimeState::Converging);
    assert_eq!(results[197].state, RegimeState::CreativeChaosZone);
    assert_eq!(results[198].state, RegimeState::StableCycle);

    assert_eq!(sv.metrics().ccz_entries(), 1);
    assert_eq!(sv.metrics().recovery_count(), 1);
    let episodes = sv.export_episodes();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].exit_state, RegimeState::StableCycle);
    assert_eq!(episodes[0].duration, tick_time(198) - tick_time(197));
    let report = sv.summary_report();
    assert_eq!(report.ccz.recoveries, 1);
    assert_eq!(report.ccz.average_recovery_time, 0.125);

    let transitions = sink
        .entries()
        .into_iter()
        .filter_map(|d| if let Diagnostic::Transition(tr) = d { Some((tr.from, tr.to)) } else { None })
        .collect_vec();
    assert_eq!(transitions.last(), Some(&(RegimeState::CreativeChaosZone, RegimeState::StableCycle)));
}

#[test]
fn test_max_metrics_are_monotonic() {
    let mut sv = supervisor(RecordingSink::new());
    let mut rng = rng();
    let mut prev = (0.0, 0.0);
    for (k, p) in reference().iter().take(400).enumerate() {
        let noise = if k > 150 { rng.random_range(0.0..1.5) } else { 0.0 };
        let r = sv.process(tick_time(k), p.x() + noise, p.y() - noise, p.z());
        let m = r.metrics;
        assert!(m.max_exponent >= prev.0 && m.max_deviation >= prev.1);
        prev = (m.max_exponent, m.max_deviation);
        if let Some(e) = r.exponent {
            assert!(m.max_exponent >= e.abs());
        }
    }
}

#[test]
fn test_non_finite_sample_is_dropped_once() {
    let sink = RecordingSink::new();
    let mut sv = supervisor(sink.clone());
    let before = feed(&mut sv, 0, &reference()[..100]).pop().unwrap();
    let r = sv.process(tick_time(100), f64::NAN, 0.0, 8.2);

    assert_eq!(r.state, before.state);
    assert_eq!(r.exponent, before.exponent);
    assert_eq!(r.deviation, before.deviation);
    assert!(r.guidance.is_none() && r.nearest.is_none() && r.alert.is_none());
    assert!(sv.window().states().all(Vec3D::is_finite));
    assert_eq!(sv.metrics().faults(), 1);
    assert_eq!(sv.metrics().samples_processed(), 101);

    let after = feed(&mut sv, 101, &reference()[100..200]);
    assert!(after.iter().all(|r| r.exponent.is_some_and(f64::is_finite)));
    assert_eq!(after.last().unwrap().state, RegimeState::StableCycle);
    assert_eq!(sv.metrics().faults(), 1);
    let faults = sink
        .entries()
        .into_iter()
        .filter_map(|d| if let Diagnostic::Fault { fault, .. } = d { Some(fault) } else { None })
        .collect_vec();
    assert_eq!(faults.len(), 1);
    assert!(matches!(faults[0], NumericFault::NonFiniteSample { .. }));
}

#[test]
fn test_sinks_follow_configuration() {
    let console = ConsoleSink::new(MonitorConfig::default().target_latency_ms);
    assert_eq!(console.latency_tag(2.5), "OK");
    assert_eq!(console.latency_tag(12.0), "DELAY");

    let sink = RecordingSink::with_capacity(2);
    let mut handle = sink.clone();
    for t in [1.0, 2.0, 3.0] {
        handle.fault("CAP", t, &NumericFault::NonFiniteExponent { value: f64::INFINITY });
    }
    let entries = sink.entries();
    assert_eq!(entries.len(), 2);
    assert!(matches!(entries[0], Diagnostic::Fault { t, .. } if t == 2.0));
    assert!(matches!(entries[1], Diagnostic::Fault { t, .. } if t == 3.0));
}

#[test]
fn test_partial_config_fills_defaults() {
    let config: MonitorConfig = serde_json::from_str(
        r#"{"window_size": 50, "thresholds": {"lambda_max": 0.4}, "alerts": {"cooldown": 2.0}}"#,
    )
    .unwrap();
    assert_eq!(config.window_size, 50);
    assert_eq!(config.thresholds.lambda_max, 0.4);
    assert_eq!(config.thresholds.lambda_min, RegimeThresholds::default().lambda_min);
    assert_eq!(config.alerts.cooldown, 2.0);
    assert_eq!(config.alerts.ccz_extended_after, 120.0);
    assert_eq!(config.gains, GuidanceGains::default());
    assert_eq!(config.sampling_rate, 8.0);
    assert!(config.validate().is_ok());

    let inverted: MonitorConfig = serde_json::from_str(r#"{"thresholds": {"lambda_min": 0.6}}"#).unwrap();
    assert_eq!(inverted.validate(), Err(ConfigError::InvalidThresholds));
}

#[test]
fn test_summary_report_serializes() {
    let mut sv = supervisor(RecordingSink::new());
    feed(&mut sv, 0, &reference()[..120]);
    let value = serde_json::to_value(sv.summary_report()).unwrap();

    assert_eq!(value["summary"]["total_samples"], 120);
    assert_eq!(value["summary"]["current_state"], "StableCycle");
    assert_eq!(value["model"]["reference_points"], reference().len());
    assert!(value["model"]["centroid"]["x"].is_f64());
    assert!(value["generated_at"].is_string());
    assert!(value["performance"]["meets_realtime_target"].is_boolean());
}

#[test]
fn test_reset_metrics_keeps_window_and_model() {
    let mut sv = supervisor(RecordingSink::new());
    let anchor = reference()[0];
    let mut samples = vec![anchor; 100];
    samples.extend((0..97).map(|j| anchor + Vec3D::new(if j % 2 == 0 { 20.0 } else { -20.0 }, 0.0, 0.0)));
    samples.push(anchor + Vec3D::new(0.0, 0.0, 1.0));
    samples.push(anchor);
    feed(&mut sv, 0, &samples);
    let state = sv.state();
    let window_before = sv.window().states().copied().collect_vec();

    sv.reset_metrics();

    let snap = sv.metrics().snapshot();
    assert_eq!(snap.samples_processed, 0);
    assert_eq!(snap.ccz_entries, 0);
    assert_eq!(snap.alerts, 0);
    assert_eq!(snap.max_exponent, 0.0);
    assert_eq!(snap.max_deviation, 0.0);
    assert!(sv.export_episodes().is_empty());
    assert_eq!(sv.metrics().recovery_count(), 0);
    assert_eq!(sv.metrics().latency_samples(), 0);
    assert_eq!(sv.window().states().copied().collect_vec(), window_before);
    assert_eq!(sv.state(), state);
    assert!(sv.model().is_computed());
    assert_eq!(sv.summary_report().performance.average_latency_ms, 0.0);
}

#[test]
fn test_guidance_can_be_disabled() {
    let config = MonitorConfig { enable_guidance: false, ..MonitorConfig::default() };
    let mut sv = Supervisor::new("NO-GUIDE", Arc::clone(&MODEL), config, Box::new(SilentSink)).unwrap();
    let results = feed(&mut sv, 0, &reference()[..120]);
    assert!(results.iter().all(|r| r.guidance.is_none()));
    assert!(sv.set_guidance_gain("Chaos", 0.9).is_ok());
    assert_eq!(sv.guidance().gain(RegimeState::Chaos), 0.9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fleet_shares_reference_model() {
    let model = Arc::clone(&MODEL);
    let handles = (0..4)
        .map(|flight| {
            let model = Arc::clone(&model);
            tokio::task::spawn_blocking(move || {
                let mut sv = Supervisor::new(format!("FL-{flight}"), model, MonitorConfig::default(), Box::new(SilentSink))
                    .unwrap();
                let offset = flight * 100;
                let points = &reference()[offset..offset + 150];
                for (k, p) in points.iter().enumerate() {
                    sv.process(tick_time(k), p.x(), p.y(), p.z());
                }
                (sv.state(), sv.metrics().samples_processed())
            })
        })
        .collect_vec();
    for handle in handles {
        let (state, samples) = handle.await.unwrap();
        assert_eq!(state, RegimeState::StableCycle);
        assert_eq!(samples, 150);
    }
}
