//! Inspection worker thread
//!
//! One dedicated thread runs acquire → detect → merge in frame order. The
//! [`InspectionControl`] handle is cheap to clone and drives the session and
//! the parameters from any other thread. Results leave the worker as
//! [`WorkerEvent`]s over a channel.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::acquisition::{CameraDevice, FrameSource};
use crate::config::{FAST_MODE_FRAME_SKIP, WorkerConfig};
use crate::error::{AcquisitionError, InvalidParameter};
use crate::models::{DetectedCode, PdiParameters};
use crate::params_store::ParameterStore;
use crate::pipeline::FramePipeline;
use crate::session::{AutoRestart, InspectionSession, SessionSnapshot};

/// Session command from the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Begin a cycle expecting `expected` codes within `timeout`
    Start {
        /// Expected number of distinct codes
        expected: u32,
        /// Time allowed for the cycle
        timeout: Duration,
    },
    /// Abort the running cycle
    Stop,
    /// Back to Idle with an empty set
    Reset,
}

/// What the worker saw on one processed frame
#[derive(Debug, Clone)]
pub struct FrameReport {
    /// Frame sequence number
    pub sequence: u64,
    /// Codes detected in this frame
    pub codes: Vec<DetectedCode>,
    /// Candidate regions located
    pub regions: usize,
    /// Whether the whole-frame pass ran
    pub fallback_used: bool,
    /// Session state after merging this frame
    pub session: SessionSnapshot,
}

/// Message from the worker to the presentation side
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// A frame was processed
    Frame(FrameReport),
    /// Acquisition failed; the worker has stopped
    Fatal(AcquisitionError),
}

fn lock_session(session: &Mutex<InspectionSession>) -> MutexGuard<'_, InspectionSession> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Thread-safe handle driving a running worker
#[derive(Debug, Clone)]
pub struct InspectionControl {
    session: Arc<Mutex<InspectionSession>>,
    params: Arc<ParameterStore>,
    frame_skip: Arc<AtomicUsize>,
    exit: Arc<AtomicBool>,
}

impl InspectionControl {
    /// Idle control over `params`, ready to be armed before the worker starts
    pub fn new(params: Arc<ParameterStore>, config: &WorkerConfig) -> Self {
        Self {
            session: Arc::new(Mutex::new(InspectionSession::new(config.auto_restart))),
            params,
            frame_skip: Arc::new(AtomicUsize::new(config.frame_skip.max(1))),
            exit: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Apply a session command
    pub fn command(&self, command: Command) -> Result<(), InvalidParameter> {
        match command {
            Command::Start { expected, timeout } => self.start(expected, timeout).map(|_| ()),
            Command::Stop => {
                self.stop();
                Ok(())
            }
            Command::Reset => {
                self.reset();
                Ok(())
            }
        }
    }

    /// Start a cycle, returning its epoch
    pub fn start(&self, expected: u32, timeout: Duration) -> Result<u64, InvalidParameter> {
        lock_session(&self.session).start(expected, timeout, Instant::now())
    }

    /// Abort the running cycle
    pub fn stop(&self) {
        lock_session(&self.session).stop();
    }

    /// Clear the session
    pub fn reset(&self) {
        lock_session(&self.session).reset();
    }

    /// Change the re-arm policy
    pub fn set_auto_restart(&self, policy: AutoRestart) {
        lock_session(&self.session).set_auto_restart(policy);
    }

    /// Current session state
    pub fn snapshot(&self) -> SessionSnapshot {
        lock_session(&self.session).snapshot(Instant::now())
    }

    /// Current parameter snapshot
    pub fn params(&self) -> Arc<PdiParameters> {
        self.params.snapshot()
    }

    /// Replace every parameter
    pub fn set_params(&self, params: PdiParameters) -> Result<Arc<PdiParameters>, InvalidParameter> {
        self.params.replace(params)
    }

    /// Edit the parameters in place
    pub fn update_params<F>(&self, edit: F) -> Result<Arc<PdiParameters>, InvalidParameter>
    where
        F: FnOnce(&mut PdiParameters),
    {
        self.params.update(edit)
    }

    /// Process every `skip`th frame; 0 is treated as 1
    pub fn set_frame_skip(&self, skip: usize) {
        self.frame_skip.store(skip.max(1), Ordering::Relaxed);
        debug!(skip = skip.max(1), "frame skip changed");
    }

    /// Current frame skip
    pub fn frame_skip(&self) -> usize {
        self.frame_skip.load(Ordering::Relaxed)
    }

    /// Toggle fast mode (every third frame) against every frame
    pub fn set_fast_mode(&self, enabled: bool) {
        self.set_frame_skip(if enabled { FAST_MODE_FRAME_SKIP } else { 1 });
    }

    /// Ask the worker to stop after the current frame
    pub fn shutdown(&self) {
        self.exit.store(true, Ordering::SeqCst);
    }

    /// Whether the worker loop is still running
    pub fn is_running(&self) -> bool {
        !self.exit.load(Ordering::SeqCst)
    }
}

/// Owns the worker thread; dropping it stops and joins the thread
#[derive(Debug)]
pub struct InspectionWorker {
    control: InspectionControl,
    handle: Option<JoinHandle<()>>,
}

impl InspectionWorker {
    /// Spawn the worker on `device` with an idle session
    pub fn spawn<D>(
        device: D,
        pipeline: FramePipeline,
        params: Arc<ParameterStore>,
        config: WorkerConfig,
    ) -> io::Result<(Self, Receiver<WorkerEvent>)>
    where
        D: CameraDevice + 'static,
    {
        let control = InspectionControl::new(params, &config);
        Self::spawn_with(control, device, pipeline, &config)
    }

    /// Spawn the worker around an existing control
    ///
    /// Commands issued on `control` beforehand already apply to the first
    /// frame read.
    pub fn spawn_with<D>(
        control: InspectionControl,
        device: D,
        pipeline: FramePipeline,
        config: &WorkerConfig,
    ) -> io::Result<(Self, Receiver<WorkerEvent>)>
    where
        D: CameraDevice + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let source = FrameSource::new(device, Arc::clone(&control.params), config.hardware_apply_interval);
        let worker_control = control.clone();

        let handle = thread::Builder::new()
            .name("inspection-worker".into())
            .spawn(move || run(source, pipeline, worker_control, tx))?;

        info!(frame_skip = control.frame_skip(), "inspection worker started");
        Ok((
            Self {
                control,
                handle: Some(handle),
            },
            rx,
        ))
    }

    /// Handle for commands and parameter updates
    pub fn control(&self) -> &InspectionControl {
        &self.control
    }

    /// Stop the loop and wait for the thread
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.control.shutdown();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("inspection worker panicked");
            }
        }
    }
}

impl Drop for InspectionWorker {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn run<D: CameraDevice>(
    mut source: FrameSource<D>,
    pipeline: FramePipeline,
    control: InspectionControl,
    tx: Sender<WorkerEvent>,
) {
    let mut frames: u64 = 0;

    while control.is_running() {
        let frame = match source.next_frame() {
            Ok((frame, _params)) => frame,
            Err(err) => {
                error!(%err, "acquisition failed, worker stopping");
                let _ = tx.send(WorkerEvent::Fatal(err));
                break;
            }
        };

        let skip = control.frame_skip().max(1) as u64;
        let due = frames % skip == 0;
        frames += 1;
        if !due {
            lock_session(&control.session).tick(Instant::now());
            continue;
        }

        // Results of this frame belong to the cycle running now
        let epoch = lock_session(&control.session).epoch();
        let result = pipeline.process(&frame);

        let now = Instant::now();
        let session = {
            let mut session = lock_session(&control.session);
            session.merge(epoch, &result.codes, now);
            session.tick(now);
            session.snapshot(now)
        };

        let report = FrameReport {
            sequence: frame.sequence(),
            codes: result.codes,
            regions: result.regions,
            fallback_used: result.fallback_used,
            session,
        };
        if tx.send(WorkerEvent::Frame(report)).is_err() {
            debug!("report receiver dropped");
            break;
        }
    }

    control.shutdown();
    info!(frames, "inspection worker stopped");
}
