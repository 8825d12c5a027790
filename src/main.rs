use beamsweep::hardware::sim::SimulatedArray;
use beamsweep::*;

use crossbeam_channel::RecvTimeoutError;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn report(analyzer: &BeamAnalyzer, lap: u64, curve: &SweepCurve) {
    match analyzer.analyze(curve) {
        Ok(m) => {
            println!("lap {}: peak {:.1}° ({:.1}° off broadside), \
                      power {:.3e}, hpbw {:.1}° phase / {:.1}° angle{}",
                     lap, m.peak_phase_deg, m.peak_angle_deg, m.peak_power,
                     m.hpbw_phase_deg, m.hpbw_angle_deg,
                     if m.boundary_limited { " (limited by sweep range)" } else { "" });
        }
        Err(e) => println!("lap {}: no metrics: {}", lap, e),
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let app = clap::App::new("beamsweep")
        .about("sweep the phase of a two-element array and measure its beam");
    let matches = cli::setup(app).get_matches();
    let (cfg, demo) = cli::config_from(&matches)?;

    let level = match demo.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env()
                         .unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let array = SimulatedArray::new(cfg.sample_rate, cfg.tone_freq)
        .spacing(cfg.spacing_wavelengths)
        .target_angle(demo.target_angle_deg);
    tracing::info!(target_angle = demo.target_angle_deg,
                   steer_phase = array.steer_phase(),
                   "simulated receiver placed");
    let (tx, rx) = array.split();

    let analyzer = cfg.analyzer();
    let (mut ctl, events) = SweepController::with_capacity(
        tx, rx, cfg.capture(), cfg.event_capacity);
    let cancel = ctl.cancel_handle();
    ctl.start(cfg.plan()?, cfg.mode)?;

    let done_after = |lap: u64| match demo.laps {
        Some(laps) => cfg.mode == SweepMode::Continuous && lap >= laps,
        None => false,
    };

    loop {
        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(SweepEvent::Progress { lap, curve }) => {
                tracing::trace!(lap, points = curve.len(), "progress");
                if done_after(lap) {
                    cancel.cancel();
                }
            }
            Ok(SweepEvent::LapComplete { lap, curve }) => {
                report(&analyzer, lap, &curve);
                if done_after(lap + 1) {
                    cancel.cancel();
                }
            }
            Ok(SweepEvent::Cancelled { lap, discarded }) => {
                tracing::info!(lap, discarded, "sweep stopped");
                break;
            }
            Ok(SweepEvent::Failed(e)) => {
                tracing::error!(error = %e, "sweep failed");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                match cancel.state() {
                    SweepState::Running | SweepState::Cancelling => (),
                    _ => break,
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    ctl.wait()?;
    if ctl.dropped_events() > 0 {
        tracing::warn!(dropped = ctl.dropped_events(), "listener fell behind");
    }
    Ok(())
}
