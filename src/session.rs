//! Inspection session state machine
//!
//! ```text
//! Idle ──start──▶ Running ──▶ Ok | NgMissing | NgExcess | TimedOut
//!   ▲                │                       │
//!   └──stop/reset────┴───────────reset───────┘
//! ```
//!
//! Count verdicts (`Ok`, `NgExcess`) are reached when a frame batch is
//! merged; time verdicts (`NgMissing`, `TimedOut`) when the session is
//! ticked past its deadline. Every start, stop and reset bumps the epoch so
//! batches produced for an earlier cycle can be recognised and dropped.
//!
//! All methods take the current time explicitly; the session never reads
//! the clock itself.

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::InvalidParameter;
use crate::models::{CodeKey, DetectedCode};

/// Accepted expected-count range
pub const EXPECTED_RANGE: (u32, u32) = (1, 8);
/// Accepted timeout range in seconds
pub const TIMEOUT_RANGE_SECS: (u64, u64) = (1, 300);

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionStatus {
    /// Not inspecting
    #[default]
    Idle,
    /// Accumulating codes
    Running,
    /// Exactly the expected count was found
    Ok,
    /// Deadline passed with some, but not all, codes
    NgMissing,
    /// More distinct codes than expected
    NgExcess,
    /// Deadline passed with nothing found
    TimedOut,
}

impl SessionStatus {
    /// True for the four terminal states
    pub fn is_verdict(&self) -> bool {
        matches!(
            self,
            SessionStatus::Ok | SessionStatus::NgMissing | SessionStatus::NgExcess | SessionStatus::TimedOut
        )
    }

    /// Uppercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "IDLE",
            SessionStatus::Running => "RUNNING",
            SessionStatus::Ok => "OK",
            SessionStatus::NgMissing => "NG-MISSING",
            SessionStatus::NgExcess => "NG-EXCESS",
            SessionStatus::TimedOut => "TIMEOUT",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do once a verdict is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoRestart {
    /// Stay on the verdict until reset or started again
    #[default]
    Never,
    /// Re-arm with the same target this long after the verdict
    After(Duration),
}

/// Expected count and time budget of one inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectionTarget {
    /// Number of distinct codes that makes the part OK
    pub expected: u32,
    /// Time budget
    pub timeout: Duration,
}

impl InspectionTarget {
    /// Validated target
    pub fn new(expected: u32, timeout: Duration) -> Result<Self, InvalidParameter> {
        InvalidParameter::check("expected", expected, EXPECTED_RANGE.0, EXPECTED_RANGE.1)?;
        InvalidParameter::check(
            "timeout",
            timeout.as_secs_f64(),
            TIMEOUT_RANGE_SECS.0 as f64,
            TIMEOUT_RANGE_SECS.1 as f64,
        )?;
        Ok(Self { expected, timeout })
    }
}

/// Result of merging a frame batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The batch belongs to an earlier cycle and was dropped
    Stale,
    /// No session is running; nothing merged
    NotRunning,
    /// Batch merged
    Merged {
        /// Codes that were new to the set
        added: usize,
        /// Status after the merge
        status: SessionStatus,
    },
}

/// Point-in-time copy of a session, for presentation
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Current state
    pub status: SessionStatus,
    /// Active or last target
    pub target: Option<InspectionTarget>,
    /// Time since start (frozen at the verdict)
    pub elapsed: Duration,
    /// Accumulated codes in discovery order
    pub codes: Vec<DetectedCode>,
    /// Cycle generation
    pub epoch: u64,
}

impl SessionSnapshot {
    /// Number of distinct codes found
    pub fn count(&self) -> usize {
        self.codes.len()
    }
}

/// One timed inspection cycle expecting a fixed count of distinct codes
#[derive(Debug, Clone, Default)]
pub struct InspectionSession {
    status: SessionStatus,
    target: Option<InspectionTarget>,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    codes: Vec<DetectedCode>,
    keys: HashSet<CodeKey>,
    epoch: u64,
    auto_restart: AutoRestart,
}

impl InspectionSession {
    /// Idle session with the given re-arm policy
    pub fn new(auto_restart: AutoRestart) -> Self {
        Self {
            auto_restart,
            ..Self::default()
        }
    }

    /// Current state
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Current generation
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Active or last target
    pub fn target(&self) -> Option<InspectionTarget> {
        self.target
    }

    /// Accumulated codes
    pub fn codes(&self) -> &[DetectedCode] {
        &self.codes
    }

    /// Number of distinct codes
    pub fn count(&self) -> usize {
        self.codes.len()
    }

    /// Re-arm policy
    pub fn auto_restart(&self) -> AutoRestart {
        self.auto_restart
    }

    /// Change the re-arm policy
    pub fn set_auto_restart(&mut self, policy: AutoRestart) {
        self.auto_restart = policy;
    }

    /// Begin a new cycle, clearing the set
    ///
    /// Out-of-range values are rejected and leave the session untouched.
    pub fn start(&mut self, expected: u32, timeout: Duration, now: Instant) -> Result<u64, InvalidParameter> {
        let target = InspectionTarget::new(expected, timeout)?;
        self.begin(target, now);
        Ok(self.epoch)
    }

    fn begin(&mut self, target: InspectionTarget, now: Instant) {
        self.target = Some(target);
        self.started_at = Some(now);
        self.finished_at = None;
        self.codes.clear();
        self.keys.clear();
        self.status = SessionStatus::Running;
        self.epoch += 1;
        info!(
            expected = target.expected,
            timeout_s = target.timeout.as_secs_f64(),
            epoch = self.epoch,
            "inspection started"
        );
    }

    /// Start again with the last target, `false` if there is none
    pub fn restart(&mut self, now: Instant) -> bool {
        match self.target {
            Some(target) => {
                self.begin(target, now);
                true
            }
            None => false,
        }
    }

    /// Abort to Idle without a verdict, keeping the set for display
    pub fn stop(&mut self) {
        if self.status == SessionStatus::Running {
            info!(count = self.codes.len(), "inspection stopped");
        }
        self.status = SessionStatus::Idle;
        self.epoch += 1;
    }

    /// Back to Idle with an empty set
    pub fn reset(&mut self) {
        self.status = SessionStatus::Idle;
        self.codes.clear();
        self.keys.clear();
        self.started_at = None;
        self.finished_at = None;
        self.epoch += 1;
        debug!(epoch = self.epoch, "inspection reset");
    }

    /// Merge one frame's codes produced for cycle `epoch`
    ///
    /// The deadline is checked first, so a batch arriving after it cannot
    /// change a time verdict. Duplicates of already held codes are ignored.
    pub fn merge(&mut self, epoch: u64, codes: &[DetectedCode], now: Instant) -> MergeOutcome {
        if epoch != self.epoch {
            debug!(batch_epoch = epoch, epoch = self.epoch, "stale batch dropped");
            return MergeOutcome::Stale;
        }
        self.check_deadline(now);
        if self.status != SessionStatus::Running {
            return MergeOutcome::NotRunning;
        }

        let mut added = 0;
        for code in codes {
            if self.keys.insert(code.key()) {
                info!(symbology = %code.symbology, content = %code.content, variant = %code.variant, "code detected");
                self.codes.push(code.clone());
                added += 1;
            }
        }

        if let Some(target) = self.target {
            let count = self.codes.len();
            let expected = target.expected as usize;
            if count == expected {
                self.finish(SessionStatus::Ok, now);
            } else if count > expected {
                self.finish(SessionStatus::NgExcess, now);
            }
        }

        MergeOutcome::Merged {
            added,
            status: self.status,
        }
    }

    /// Advance time: apply the deadline and the re-arm policy
    ///
    /// Returns the new status when it changed.
    pub fn tick(&mut self, now: Instant) -> Option<SessionStatus> {
        if self.check_deadline(now) {
            return Some(self.status);
        }
        if let (AutoRestart::After(delay), Some(finished)) = (self.auto_restart, self.finished_at) {
            if self.status.is_verdict() && now.saturating_duration_since(finished) >= delay && self.restart(now) {
                return Some(self.status);
            }
        }
        None
    }

    /// Apply a time verdict if the deadline passed, `true` when it did
    fn check_deadline(&mut self, now: Instant) -> bool {
        let (SessionStatus::Running, Some(target), Some(started)) = (self.status, self.target, self.started_at) else {
            return false;
        };
        if now.saturating_duration_since(started) < target.timeout {
            return false;
        }
        let verdict = if self.codes.is_empty() {
            SessionStatus::TimedOut
        } else {
            SessionStatus::NgMissing
        };
        self.finish(verdict, now);
        true
    }

    fn finish(&mut self, verdict: SessionStatus, now: Instant) {
        self.status = verdict;
        self.finished_at = Some(now);
        let expected = self.target.map(|t| t.expected).unwrap_or_default();
        info!(verdict = %verdict, count = self.codes.len(), expected, "inspection finished");
    }

    /// Copy of the current state
    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        let elapsed = match (self.started_at, self.finished_at, self.status) {
            (Some(started), Some(finished), _) => finished.saturating_duration_since(started),
            (Some(started), None, SessionStatus::Running) => now.saturating_duration_since(started),
            _ => Duration::ZERO,
        };
        SessionSnapshot {
            status: self.status,
            target: self.target,
            elapsed,
            codes: self.codes.clone(),
            epoch: self.epoch,
        }
    }
}
