//! Phase sweep controller.
//!
//! A [`SweepController`] owns one transmitter/receiver pair. `start` moves
//! the pair into a worker thread that steps through a [`SweepPlan`]: set
//! the phase, capture, measure tone power, append to the curve, and push a
//! [`SweepEvent`] to whoever listens. Events go through a bounded channel
//! with `try_send`, so a slow consumer loses snapshots instead of stalling
//! the radios.
//!
//! Cancellation is cooperative. The worker checks for it between steps and
//! while waiting out the step delay, never during a hardware call.
//!
//! ```text
//!   Idle/Complete --start--> Running --last step (one-shot)--> Complete
//!                               |  \
//!                            cancel  hardware failure
//!                               v      \
//!                          Cancelling --+--> Idle
//! ```

use crate::curve::{CurveBuilder, PhaseSample, SweepCurve};
use crate::error::{Error, HardwareError, Result};
use crate::hardware::{Receiver, Transmitter};
use crate::plan::SweepPlan;
use crate::power::{PowerExtractor, MIN_SAMPLES};

use crossbeam_channel::{Sender, TrySendError};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Undelivered events a controller buffers unless told otherwise.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Longest sleep between cancellation checks during a step delay.
const CANCEL_POLL: Duration = Duration::from_millis(5);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SweepMode {
    /// One pass over the plan.
    OneShot,
    /// Repeat the plan until cancelled.
    Continuous,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SweepState {
    Idle,
    Running,
    Cancelling,
    Complete,
}

impl SweepState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => SweepState::Running,
            2 => SweepState::Cancelling,
            3 => SweepState::Complete,
            _ => SweepState::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            SweepState::Idle => 0,
            SweepState::Running => 1,
            SweepState::Cancelling => 2,
            SweepState::Complete => 3,
        }
    }
}

#[derive(Clone, Debug)]
pub enum SweepEvent {
    /// A step finished. `curve` is the lap so far and is never complete.
    Progress { lap: u64, curve: SweepCurve },
    /// A lap ran to the end; `curve` is frozen.
    LapComplete { lap: u64, curve: SweepCurve },
    /// The sweep stopped on request and `discarded` samples were dropped.
    Cancelled { lap: u64, discarded: usize },
    Failed(Error),
}

/// Per-step capture and measurement settings. These stay fixed for the
/// life of a controller; only the plan and mode change between sweeps.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConfig {
    /// Samples per capture.
    pub n_samples: usize,
    /// Receiver sample rate, in Hz.
    pub sample_rate: f64,
    /// Baseband frequency of the test tone, in Hz.
    pub tone_freq: f64,
    /// Captures thrown away after each phase write, to flush buffers
    /// recorded before the write took effect.
    pub settle_captures: usize,
    /// Pause after each step.
    pub step_delay: Duration,
    /// How tone power is measured from each capture.
    pub extractor: PowerExtractor,
}

impl CaptureConfig {
    pub fn new(n_samples: usize, sample_rate: f64, tone_freq: f64) -> Self {
        CaptureConfig {
            n_samples,
            sample_rate,
            tone_freq,
            settle_captures: 0,
            step_delay: Duration::from_millis(0),
            extractor: PowerExtractor::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_samples < MIN_SAMPLES {
            return Err(Error::invalid(format!(
                "n_samples {} below minimum {}", self.n_samples, MIN_SAMPLES)));
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(Error::invalid(format!(
                "sample rate {} must be positive", self.sample_rate)));
        }
        if !(self.tone_freq >= 0.0 && self.tone_freq <= self.sample_rate / 2.0) {
            return Err(Error::invalid(format!(
                "tone {} Hz outside [0, {}]",
                self.tone_freq, self.sample_rate / 2.0)));
        }
        self.extractor.check_len(self.n_samples)
    }
}

#[derive(Debug)]
struct Shared {
    state: AtomicU8,
    cancel: AtomicBool,
    dropped: AtomicUsize,
}

impl Shared {
    fn state(&self) -> SweepState {
        SweepState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set(&self, state: SweepState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn request_cancel(&self) -> bool {
        let swapped = self.state.compare_exchange(
            SweepState::Running.as_u8(),
            SweepState::Cancelling.as_u8(),
            Ordering::SeqCst,
            Ordering::SeqCst,
        ).is_ok();
        if swapped {
            self.cancel.store(true, Ordering::SeqCst);
        }
        swapped
    }
}

/// Cancels a controller's sweep from another thread.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    shared: Arc<Shared>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        if self.shared.request_cancel() {
            info!("sweep cancel requested");
        }
    }

    pub fn state(&self) -> SweepState {
        self.shared.state()
    }
}

struct Finished<T, R> {
    hardware: (T, R),
    result: Result<Option<SweepCurve>>,
}

pub struct SweepController<T, R> {
    capture: Arc<CaptureConfig>,
    hardware: Option<(T, R)>,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<Finished<T, R>>>,
    events: Sender<SweepEvent>,
}

impl<T, R> SweepController<T, R>
where
    T: Transmitter + 'static,
    R: Receiver + 'static,
{
    /// A controller and the receiving end of its event channel.
    pub fn new(tx: T, rx: R, capture: CaptureConfig)
               -> (Self, crossbeam_channel::Receiver<SweepEvent>)
    {
        Self::with_capacity(tx, rx, capture, DEFAULT_EVENT_CAPACITY)
    }

    /// As `new`, buffering at most `capacity` undelivered events.
    pub fn with_capacity(tx: T, rx: R, capture: CaptureConfig, capacity: usize)
                         -> (Self, crossbeam_channel::Receiver<SweepEvent>)
    {
        let (events, listener) = crossbeam_channel::bounded(capacity.max(1));
        let controller = SweepController {
            capture: Arc::new(capture),
            hardware: Some((tx, rx)),
            shared: Arc::new(Shared {
                state: AtomicU8::new(SweepState::Idle.as_u8()),
                cancel: AtomicBool::new(false),
                dropped: AtomicUsize::new(0),
            }),
            worker: None,
            events,
        };
        (controller, listener)
    }

    pub fn state(&self) -> SweepState {
        self.shared.state()
    }

    pub fn is_running(&self) -> bool {
        match self.state() {
            SweepState::Running | SweepState::Cancelling => true,
            _ => false,
        }
    }

    pub fn capture_config(&self) -> &CaptureConfig {
        &self.capture
    }

    /// Events discarded because the consumer fell behind.
    pub fn dropped_events(&self) -> usize {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle { shared: self.shared.clone() }
    }

    /// Begin a sweep. Fails with `AlreadyRunning` unless the controller is
    /// idle or has completed its last sweep.
    pub fn start(&mut self, plan: SweepPlan, mode: SweepMode) -> Result<()> {
        if self.is_running() {
            return Err(Error::AlreadyRunning);
        }
        self.reap();
        self.capture.validate()?;
        let (tx, rx) = match self.hardware.take() {
            Some(hw) => hw,
            None => return Err(Error::hardware(
                None, HardwareError::new("hardware lost to a crashed sweep"))),
        };

        info!(start = plan.start_deg(), stop = plan.stop_deg(),
              step = plan.step_deg(), points = plan.len(), ?mode,
              "starting sweep");
        self.shared.cancel.store(false, Ordering::SeqCst);
        self.shared.set(SweepState::Running);
        let run = Run {
            tx,
            rx,
            plan,
            mode,
            capture: self.capture.clone(),
            shared: self.shared.clone(),
            events: self.events.clone(),
        };
        self.worker = Some(thread::spawn(move || run.execute()));
        Ok(())
    }

    /// Ask the running sweep to stop at the next step boundary. Does
    /// nothing when no sweep is running.
    pub fn cancel(&self) {
        self.cancel_handle().cancel();
    }

    /// Block until the current sweep ends and take back the hardware.
    ///
    /// Returns the frozen curve of a completed one-shot sweep, `None` after
    /// cancellation or when nothing was running, or the error that aborted
    /// the sweep.
    pub fn wait(&mut self) -> Result<Option<SweepCurve>> {
        match self.worker.take() {
            Some(handle) => self.join(handle),
            None => Ok(None),
        }
    }

    fn reap(&mut self) {
        if let Some(handle) = self.worker.take() {
            if let Err(e) = self.join(handle) {
                debug!(error = %e, "previous sweep ended with an error");
            }
        }
    }

    fn join(&mut self, handle: JoinHandle<Finished<T, R>>)
            -> Result<Option<SweepCurve>>
    {
        match handle.join() {
            Ok(finished) => {
                self.hardware = Some(finished.hardware);
                finished.result
            }
            Err(_) => {
                self.shared.set(SweepState::Idle);
                Err(Error::hardware(
                    None, HardwareError::new("sweep worker panicked")))
            }
        }
    }
}

impl<T, R> Drop for SweepController<T, R> {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.shared.cancel.store(true, Ordering::SeqCst);
            let _ = handle.join();
        }
    }
}

/// How a lap, and with it a sweep, ended without error.
enum Outcome {
    Complete { lap: u64, curve: SweepCurve },
    Cancelled { lap: u64, discarded: usize },
}

/// Everything a worker thread needs for one sweep.
struct Run<T, R> {
    tx: T,
    rx: R,
    plan: SweepPlan,
    mode: SweepMode,
    capture: Arc<CaptureConfig>,
    shared: Arc<Shared>,
    events: Sender<SweepEvent>,
}

impl<T, R> Run<T, R>
where
    T: Transmitter,
    R: Receiver,
{
    fn execute(mut self) -> Finished<T, R> {
        let (state, last, result) = match self.sweep() {
            Ok(Outcome::Complete { lap, curve }) => {
                info!(lap, points = curve.len(), "sweep complete");
                let event = SweepEvent::LapComplete { lap, curve: curve.clone() };
                (SweepState::Complete, event, Ok(Some(curve)))
            }
            Ok(Outcome::Cancelled { lap, discarded }) => {
                warn!(lap, points = discarded, "sweep cancelled, partial curve discarded");
                (SweepState::Idle, SweepEvent::Cancelled { lap, discarded }, Ok(None))
            }
            Err(e) => {
                warn!(error = %e, "sweep aborted");
                (SweepState::Idle, SweepEvent::Failed(e.clone()), Err(e))
            }
        };
        // a listener reacting to the last event must already see the end state
        self.shared.set(state);
        self.emit(last);
        Finished {
            hardware: (self.tx, self.rx),
            result,
        }
    }

    fn sweep(&mut self) -> Result<Outcome> {
        self.tx.enable().map_err(|e| Error::hardware(None, e))?;
        let mut lap = 0;
        loop {
            match self.lap(lap)? {
                Outcome::Complete { curve, .. } if self.mode == SweepMode::Continuous => {
                    info!(lap, points = curve.len(), "lap complete");
                    self.emit(SweepEvent::LapComplete { lap, curve });
                    lap += 1;
                }
                end => return Ok(end),
            }
        }
    }

    /// One pass over the plan, stopping early if cancelled.
    fn lap(&mut self, lap: u64) -> Result<Outcome> {
        let mut curve = CurveBuilder::with_capacity(self.plan.len());
        for phase in self.plan.generate() {
            if self.shared.cancelled() {
                return Ok(Outcome::Cancelled { lap, discarded: curve.len() });
            }
            let power = self.step(phase)?;
            curve.push(PhaseSample::new(phase, power)?)?;
            debug!(lap, phase, power, "step");
            self.emit(SweepEvent::Progress { lap, curve: curve.snapshot() });
            if !self.pause() {
                return Ok(Outcome::Cancelled { lap, discarded: curve.len() });
            }
        }
        if self.shared.cancelled() {
            return Ok(Outcome::Cancelled { lap, discarded: curve.len() });
        }
        Ok(Outcome::Complete { lap, curve: curve.freeze() })
    }

    fn step(&mut self, phase: f64) -> Result<f64> {
        let fail = move |e: HardwareError| Error::hardware(Some(phase), e);
        let c = &*self.capture;

        self.tx.set_phase(phase).map_err(fail)?;
        for _ in 0..c.settle_captures {
            self.rx.capture(c.n_samples).map_err(fail)?;
        }
        let samples = self.rx.capture(c.n_samples).map_err(fail)?;
        if samples.len() != c.n_samples {
            return Err(fail(HardwareError::new(format!(
                "short capture: {} of {} samples", samples.len(), c.n_samples))));
        }
        c.extractor.extract(&samples, c.sample_rate, c.tone_freq)
            .map_err(|e| fail(HardwareError::new(format!("unusable capture: {}", e))))
    }

    /// Wait out the step delay. False if cancelled meanwhile.
    fn pause(&self) -> bool {
        let deadline = Instant::now() + self.capture.step_delay;
        loop {
            if self.shared.cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(CANCEL_POLL));
        }
    }

    fn emit(&self, event: SweepEvent) {
        match self.events.try_send(event) {
            Ok(()) => (),
            Err(TrySendError::Full(_)) => {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("event consumer lagging, event dropped");
            }
            Err(TrySendError::Disconnected(_)) => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::sim::{SimReceiver, SimTransmitter, SimulatedArray};
    use crate::hardware::HardwareResult;
    use num::Complex;

    const RATE: f64 = 2e6;
    const TONE: f64 = 500e3;

    fn capture() -> CaptureConfig {
        CaptureConfig::new(256, RATE, TONE)
    }

    fn sim() -> (SimTransmitter, SimReceiver) {
        SimulatedArray::new(RATE, TONE).split()
    }

    fn ten_steps() -> SweepPlan {
        SweepPlan::new(0.0, 90.0, 10.0).unwrap()
    }

    /// Wraps the simulated receiver and fails on one capture.
    struct FlakyReceiver {
        inner: SimReceiver,
        fail_on: usize,
        calls: usize,
    }

    impl Receiver for FlakyReceiver {
        fn capture(&mut self, n: usize) -> HardwareResult<Vec<Complex<f64>>> {
            self.calls += 1;
            if self.calls == self.fail_on {
                return Err(HardwareError::new("rx buffer timeout"));
            }
            self.inner.capture(n)
        }
    }

    struct DeadTransmitter;

    impl Transmitter for DeadTransmitter {
        fn set_phase(&mut self, _degrees: f64) -> HardwareResult<()> {
            Ok(())
        }
        fn enable(&mut self) -> HardwareResult<()> {
            Err(HardwareError::new("tx not responding"))
        }
    }

    struct ShortReceiver;

    impl Receiver for ShortReceiver {
        fn capture(&mut self, _n: usize) -> HardwareResult<Vec<Complex<f64>>> {
            Ok(vec![Complex::new(0.0, 0.0); 10])
        }
    }

    fn drain(events: &crossbeam_channel::Receiver<SweepEvent>) -> Vec<SweepEvent> {
        events.try_iter().collect()
    }

    #[test]
    fn one_shot_runs_plan_once() {
        let (tx, rx) = sim();
        let probe = tx.clone();
        let (mut ctl, events) = SweepController::new(tx, rx, capture());
        assert_eq!(ctl.state(), SweepState::Idle);

        ctl.start(ten_steps(), SweepMode::OneShot).unwrap();
        let curve = ctl.wait().unwrap().unwrap();
        assert_eq!(ctl.state(), SweepState::Complete);
        assert!(curve.is_complete());
        assert_eq!(curve.len(), 10);
        assert_eq!(probe.phase_writes(), 10);

        let events = drain(&events);
        let progress: Vec<usize> = events.iter().filter_map(|e| match e {
            SweepEvent::Progress { curve, .. } => {
                assert!(!curve.is_complete());
                Some(curve.len())
            }
            _ => None,
        }).collect();
        assert_eq!(progress, (1..=10).collect::<Vec<_>>());
        match events.last() {
            Some(SweepEvent::LapComplete { lap: 0, curve: c }) => assert_eq!(*c, curve),
            other => panic!("unexpected {:?}", other),
        }

        // power follows 2 + 2 cos(phase) for a broadside receiver
        for s in curve.samples() {
            let expected = 2.0 + 2.0 * s.phase_deg().to_radians().cos();
            assert!((s.power() - expected).abs() < 1e-9);
        }

        // a completed controller can start again
        ctl.start(ten_steps(), SweepMode::OneShot).unwrap();
        assert_eq!(ctl.wait().unwrap().unwrap().len(), 10);
    }

    #[test]
    fn start_while_running_is_rejected() {
        let (tx, rx) = sim();
        let mut cap = capture();
        cap.step_delay = Duration::from_millis(20);
        let (mut ctl, _events) = SweepController::new(tx, rx, cap);
        ctl.start(ten_steps(), SweepMode::Continuous).unwrap();
        assert!(ctl.is_running());
        assert_eq!(ctl.start(ten_steps(), SweepMode::OneShot),
                   Err(Error::AlreadyRunning));
        ctl.cancel();
        assert_eq!(ctl.wait(), Ok(None));
        assert_eq!(ctl.state(), SweepState::Idle);
    }

    #[test]
    fn cancel_continuous_mid_lap() {
        let (tx, rx) = sim();
        let mut cap = capture();
        cap.step_delay = Duration::from_millis(10);
        let (mut ctl, events) = SweepController::new(tx, rx, cap);
        let plan = SweepPlan::full_circle(10.0).unwrap();
        ctl.start(plan, SweepMode::Continuous).unwrap();

        // let a few steps through, then stop
        let mut seen = 0;
        while seen < 3 {
            match events.recv_timeout(Duration::from_secs(5)).unwrap() {
                SweepEvent::Progress { .. } => seen += 1,
                other => panic!("unexpected {:?}", other),
            }
        }
        let asked = Instant::now();
        ctl.cancel();
        assert_eq!(ctl.wait(), Ok(None));
        assert!(asked.elapsed() < Duration::from_millis(500));
        assert_eq!(ctl.state(), SweepState::Idle);

        let rest = drain(&events);
        assert!(rest.iter().all(|e| match e {
            SweepEvent::LapComplete { .. } => false,
            _ => true,
        }));
        match rest.last() {
            Some(SweepEvent::Cancelled { lap: 0, discarded }) => {
                assert!(*discarded >= 3 && *discarded < 37)
            }
            other => panic!("unexpected {:?}", other),
        }

        ctl.start(ten_steps(), SweepMode::OneShot).unwrap();
        assert!(ctl.wait().unwrap().is_some());
    }

    #[test]
    fn continuous_laps_start_fresh() {
        let (tx, rx) = sim();
        let mut cap = capture();
        cap.step_delay = Duration::from_millis(1);
        let (mut ctl, events) = SweepController::with_capacity(tx, rx, cap, 1024);
        let handle = ctl.cancel_handle();
        ctl.start(ten_steps(), SweepMode::Continuous).unwrap();

        let mut laps = vec![];
        while laps.len() < 3 {
            match events.recv_timeout(Duration::from_secs(5)).unwrap() {
                SweepEvent::LapComplete { lap, curve } => {
                    assert!(curve.is_complete());
                    assert_eq!(curve.len(), 10);
                    laps.push(lap);
                }
                SweepEvent::Progress { curve, .. } => assert!(curve.len() <= 10),
                other => panic!("unexpected {:?}", other),
            }
        }
        handle.cancel();
        assert_eq!(ctl.wait(), Ok(None));
        assert_eq!(laps, vec![0, 1, 2]);
    }

    #[test]
    fn receiver_failure_aborts_and_discards() {
        let (tx, rx) = sim();
        let probe = tx.clone();
        let flaky = FlakyReceiver { inner: rx, fail_on: 5, calls: 0 };
        let (mut ctl, events) = SweepController::new(tx, flaky, capture());
        ctl.start(ten_steps(), SweepMode::OneShot).unwrap();

        let err = ctl.wait().unwrap_err();
        assert_eq!(err.failing_phase(), Some(40.0));
        assert!(matches!(err, Error::HardwareFailure { .. }));
        assert_eq!(ctl.state(), SweepState::Idle);
        assert_eq!(probe.phase_writes(), 5);

        let events = drain(&events);
        let progress = events.iter().filter(|e| match e {
            SweepEvent::Progress { .. } => true,
            _ => false,
        }).count();
        assert_eq!(progress, 4);
        assert!(!events.iter().any(|e| match e {
            SweepEvent::LapComplete { .. } => true,
            _ => false,
        }));
        match events.last() {
            Some(SweepEvent::Failed(e)) => assert_eq!(*e, err),
            other => panic!("unexpected {:?}", other),
        }

        // the sixth capture onward works again, so a retry succeeds
        ctl.start(ten_steps(), SweepMode::OneShot).unwrap();
        assert_eq!(ctl.wait().unwrap().unwrap().len(), 10);
    }

    #[test]
    fn enable_failure_has_no_phase() {
        let (_, rx) = sim();
        let (mut ctl, _events) = SweepController::new(DeadTransmitter, rx, capture());
        ctl.start(ten_steps(), SweepMode::OneShot).unwrap();
        let err = ctl.wait().unwrap_err();
        assert!(matches!(err, Error::HardwareFailure { phase_deg: None, .. }));
        assert_eq!(ctl.state(), SweepState::Idle);
    }

    #[test]
    fn short_capture_is_a_hardware_failure() {
        let (tx, _) = sim();
        let (mut ctl, _events) = SweepController::new(tx, ShortReceiver, capture());
        ctl.start(ten_steps(), SweepMode::OneShot).unwrap();
        let err = ctl.wait().unwrap_err();
        assert_eq!(err.failing_phase(), Some(0.0));
    }

    #[test]
    fn bad_capture_config_fails_before_hardware() {
        let (tx, rx) = sim();
        let probe = tx.clone();
        let (mut ctl, _events) = SweepController::new(
            tx, rx, CaptureConfig::new(256, RATE, 1.5e6));
        assert!(matches!(ctl.start(ten_steps(), SweepMode::OneShot),
                         Err(Error::InvalidInput(_))));
        assert_eq!(ctl.state(), SweepState::Idle);
        assert_eq!(probe.phase_writes(), 0);
    }

    #[test]
    fn oversized_bin_window_fails_before_hardware() {
        let (tx, rx) = sim();
        let probe = tx.clone();
        let mut cap = capture();
        cap.extractor = PowerExtractor::new().integration_bins(128);
        let (mut ctl, _events) = SweepController::new(tx, rx, cap);
        assert!(matches!(ctl.start(ten_steps(), SweepMode::OneShot),
                         Err(Error::InvalidInput(_))));
        assert_eq!(probe.phase_writes(), 0);
    }

    #[test]
    fn final_event_follows_end_state() {
        let (tx, rx) = sim();
        let (mut ctl, events) = SweepController::new(tx, rx, capture());
        for _ in 0..20 {
            ctl.start(ten_steps(), SweepMode::OneShot).unwrap();
            loop {
                match events.recv_timeout(Duration::from_secs(5)).unwrap() {
                    SweepEvent::LapComplete { .. } => break,
                    SweepEvent::Progress { .. } => (),
                    other => panic!("unexpected {:?}", other),
                }
            }
            // restarting straight from the event must not race the worker
            assert_eq!(ctl.state(), SweepState::Complete);
        }

        let mut cap = capture();
        cap.step_delay = Duration::from_millis(5);
        let (tx, rx) = sim();
        let (mut ctl, events) = SweepController::new(tx, rx, cap);
        ctl.start(ten_steps(), SweepMode::Continuous).unwrap();
        ctl.cancel();
        loop {
            match events.recv_timeout(Duration::from_secs(5)).unwrap() {
                SweepEvent::Cancelled { .. } => break,
                SweepEvent::Progress { .. } => (),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(ctl.state(), SweepState::Idle);
        ctl.start(ten_steps(), SweepMode::OneShot).unwrap();
        assert!(ctl.wait().unwrap().is_some());
    }

    #[test]
    fn settle_captures_flush_stale_buffers() {
        let array = SimulatedArray::new(RATE, TONE).latency(1);
        let (tx, rx) = array.split();
        let probe = rx.clone();

        let (mut ctl, _events) = SweepController::new(tx.clone(), rx.clone(), capture());
        ctl.start(ten_steps(), SweepMode::OneShot).unwrap();
        let stale = ctl.wait().unwrap().unwrap();
        // without flushing, each step measures the previous phase
        let second = stale.samples()[1];
        assert!((second.power() - 4.0).abs() < 1e-9);

        let mut cap = capture();
        cap.settle_captures = 1;
        let before = probe.captures();
        let (mut ctl, _events) = SweepController::new(tx, rx, cap);
        ctl.start(ten_steps(), SweepMode::OneShot).unwrap();
        let fresh = ctl.wait().unwrap().unwrap();
        for s in fresh.samples() {
            let expected = 2.0 + 2.0 * s.phase_deg().to_radians().cos();
            assert!((s.power() - expected).abs() < 1e-9);
        }
        assert_eq!(probe.captures() - before, 20);
    }

    #[test]
    fn slow_consumer_never_blocks() {
        let (tx, rx) = sim();
        let (mut ctl, _events) = SweepController::with_capacity(tx, rx, capture(), 1);
        ctl.start(ten_steps(), SweepMode::OneShot).unwrap();
        assert_eq!(ctl.wait().unwrap().unwrap().len(), 10);
        // one progress event fits, the remaining nine and the lap are lost
        assert_eq!(ctl.dropped_events(), 10);
    }

    #[test]
    fn cancel_when_idle_is_noop() {
        let (tx, rx) = sim();
        let (mut ctl, _events) = SweepController::new(tx, rx, capture());
        ctl.cancel();
        assert_eq!(ctl.state(), SweepState::Idle);
        ctl.start(ten_steps(), SweepMode::OneShot).unwrap();
        assert!(ctl.wait().unwrap().is_some());
    }

    #[test]
    fn dropped_listener_does_not_stop_sweep() {
        let (tx, rx) = sim();
        let (mut ctl, events) = SweepController::new(tx, rx, capture());
        drop(events);
        ctl.start(ten_steps(), SweepMode::OneShot).unwrap();
        assert_eq!(ctl.wait().unwrap().unwrap().len(), 10);
    }
}
