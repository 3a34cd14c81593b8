use flight_envelope::{
    ModelParameters, ReferenceTrajectoryModel, Supervisor, fatal, info, regime,
    supervision::{ConsoleSink, MonitorConfig, SummaryReport},
    util::Vec3D,
    warn,
};
use rand::{Rng, rng};
use std::{env, str::FromStr, sync::Arc};

const DEFAULT_FLEET_SIZE: usize = 4;
const DEFAULT_FLIGHT_SAMPLES: usize = 600;
const DISTURBANCE_TICKS: usize = 50;
const DISTURBANCE_POWER: f64 = 0.6;
const JITTER: f64 = 0.005;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let fleet_size = env_or("FLEET_SIZE", DEFAULT_FLEET_SIZE);
    let samples = env_or("FLIGHT_SAMPLES", DEFAULT_FLIGHT_SAMPLES);
    let disturbance_at = env::var("DISTURBANCE_AT").ok().and_then(|v| v.parse::<usize>().ok());

    let model = {
        let mut m = ReferenceTrajectoryModel::new(ModelParameters::default());
        if let Err(e) = m.compute_default() {
            fatal!("Reference cycle could not be computed: {e}");
        }
        Arc::new(m)
    };
    let summary = model.summary();
    info!(
        "Reference cycle ready: {} points, period {:.3}s, spread {}",
        summary.reference_points,
        summary.period.unwrap_or(f64::NAN),
        summary.spread.unwrap_or_default()
    );

    let handles = (0..fleet_size)
        .map(|flight| {
            let flight_model = Arc::clone(&model);
            tokio::task::spawn_blocking(move || fly(flight, flight_model, samples, disturbance_at))
        })
        .collect::<Vec<_>>();

    for handle in handles {
        match handle.await {
            Ok(Some(report)) => print_report(&report),
            Ok(None) => (),
            Err(e) => warn!("Flight task aborted: {e}"),
        }
    }
}

/// Reads `key` from the environment, falling back to `default` if unset or unparsable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Replays the reference cycle from a per-flight phase offset with small jitter, optionally
/// lifting the power axis for a while to push the flight off the cycle.
fn fly(
    flight: usize,
    model: Arc<ReferenceTrajectoryModel>,
    samples: usize,
    disturbance_at: Option<usize>,
) -> Option<SummaryReport> {
    let id = format!("FL-{flight:03}");
    let config = MonitorConfig::default();
    let points = match model.trajectory() {
        Ok(traj) => traj.points().to_vec(),
        Err(e) => {
            warn!("[{id}] no reference available: {e}");
            return None;
        }
    };
    let mut supervisor = match Supervisor::new(id.as_str(), model, config, Box::new(ConsoleSink::new(config.target_latency_ms))) {
        Ok(sv) => sv,
        Err(e) => {
            warn!("[{id}] supervisor setup failed: {e}");
            return None;
        }
    };

    let mut rng = rng();
    let offset = flight * 137 % points.len();
    let dt = config.sample_period();
    for k in 0..samples {
        let mut p = points[(offset + k) % points.len()]
            + Vec3D::new(rng.random_range(-JITTER..JITTER), rng.random_range(-JITTER..JITTER), 0.0);
        if disturbance_at.is_some_and(|at| (at..at + DISTURBANCE_TICKS).contains(&k)) {
            p += Vec3D::new(0.0, 0.0, DISTURBANCE_POWER);
        }
        #[allow(clippy::cast_precision_loss)]
        let t = k as f64 * dt;
        supervisor.process(t, p.x(), p.y(), p.z());
    }
    regime!("[{id}] finished in {}", supervisor.state());
    Some(supervisor.summary_report())
}

fn print_report(report: &SummaryReport) {
    let s = &report.summary;
    info!(
        "{} samples over {:.1}s, final regime {}",
        s.total_samples, s.monitored_time, s.current_state
    );
    info!(
        "  CCZ: {} entries, {:.2}s total, {} recoveries (avg {:.2}s)",
        report.ccz.entries, report.ccz.total_time, report.ccz.recoveries, report.ccz.average_recovery_time
    );
    info!(
        "  max |λ| {:.4}, max deviation {:.3}, chaos entries {}, alerts {}, faults {}",
        report.stability.max_exponent,
        report.stability.max_deviation,
        report.stability.chaos_entries,
        report.total_alerts,
        report.numeric_faults
    );
    info!(
        "  latency avg {:.3}ms p99 {:.3}ms max {:.3}ms, realtime target met: {}",
        report.performance.average_latency_ms,
        report.performance.p99_latency_ms,
        report.performance.max_latency_ms,
        report.performance.meets_realtime_target
    );
}
