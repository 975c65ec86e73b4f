//! Inspection cycles driven by real pipeline output

mod common;

use code_inspect::session::{AutoRestart, MergeOutcome};
use code_inspect::{FramePipeline, InspectionSession, SessionStatus};
use common::{Scene, SceneDecoder, qr};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Bench {
    scene: Arc<Scene>,
    pipeline: FramePipeline,
    sequence: u64,
}

impl Bench {
    fn new() -> Self {
        let scene = Scene::new();
        let pipeline = FramePipeline::new(SceneDecoder::new(Arc::clone(&scene)));
        Self {
            scene,
            pipeline,
            sequence: 0,
        }
    }

    /// Show `symbols` to the pipeline and merge the result at `now`
    fn feed(
        &mut self,
        session: &mut InspectionSession,
        symbols: Vec<code_inspect::Symbol>,
        now: Instant,
    ) -> MergeOutcome {
        let epoch = session.epoch();
        self.scene.set(symbols);
        self.sequence += 1;
        let result = self.pipeline.process(&self.scene.frame(self.sequence));
        session.merge(epoch, &result.codes, now)
    }
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn codes_accumulate_over_frames_until_ok() {
    let mut bench = Bench::new();
    let mut session = InspectionSession::default();
    let t0 = Instant::now();
    session.start(2, Duration::from_secs(10), t0).unwrap();

    bench.feed(&mut session, vec![qr("PART-A", 40.0, 40.0)], t0 + ms(100));
    assert_eq!(session.status(), SessionStatus::Running);
    bench.feed(&mut session, vec![qr("PART-A", 42.0, 41.0)], t0 + ms(200));
    assert_eq!(session.count(), 1);

    let out = bench.feed(
        &mut session,
        vec![qr("PART-A", 40.0, 40.0), qr("PART-B", 200.0, 120.0)],
        t0 + ms(300),
    );
    assert_eq!(
        out,
        MergeOutcome::Merged {
            added: 1,
            status: SessionStatus::Ok
        }
    );
    let snapshot = session.snapshot(t0 + ms(900));
    assert_eq!(snapshot.elapsed, ms(300));
    let contents: Vec<&str> = snapshot.codes.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec!["PART-A", "PART-B"]);
}

#[test]
fn too_many_codes_is_excess() {
    let mut bench = Bench::new();
    let mut session = InspectionSession::default();
    let t0 = Instant::now();
    session.start(1, Duration::from_secs(10), t0).unwrap();
    bench.feed(
        &mut session,
        vec![qr("ONE-111", 30.0, 30.0), qr("TWO-222", 200.0, 140.0)],
        t0 + ms(50),
    );
    assert_eq!(session.status(), SessionStatus::NgExcess);
}

#[test]
fn partial_set_at_deadline_is_missing() {
    let mut bench = Bench::new();
    let mut session = InspectionSession::default();
    let t0 = Instant::now();
    session.start(3, Duration::from_secs(2), t0).unwrap();
    bench.feed(&mut session, vec![qr("ONLY-ONE", 30.0, 30.0)], t0 + ms(500));
    assert_eq!(session.tick(t0 + ms(1999)), None);
    assert_eq!(session.tick(t0 + ms(2000)), Some(SessionStatus::NgMissing));

    // A batch after the verdict changes nothing
    let out = bench.feed(&mut session, vec![qr("LATE-ONE", 30.0, 30.0)], t0 + ms(2100));
    assert_eq!(out, MergeOutcome::NotRunning);
    assert_eq!(session.count(), 1);
}

#[test]
fn empty_frames_time_out() {
    let mut bench = Bench::new();
    let mut session = InspectionSession::default();
    let t0 = Instant::now();
    session.start(1, Duration::from_secs(1), t0).unwrap();
    bench.feed(&mut session, vec![], t0 + ms(300));
    assert_eq!(session.status(), SessionStatus::Running);
    assert_eq!(session.tick(t0 + ms(1000)), Some(SessionStatus::TimedOut));
}

#[test]
fn auto_restart_starts_a_fresh_cycle() {
    let mut bench = Bench::new();
    let mut session = InspectionSession::new(AutoRestart::After(Duration::from_secs(1)));
    let t0 = Instant::now();
    let first = session.start(1, Duration::from_secs(5), t0).unwrap();
    bench.feed(&mut session, vec![qr("CYCLE-1", 50.0, 50.0)], t0 + ms(100));
    assert_eq!(session.status(), SessionStatus::Ok);

    assert_eq!(session.tick(t0 + ms(1100)), Some(SessionStatus::Running));
    assert!(session.epoch() > first);
    assert_eq!(session.count(), 0);

    // The same code counts again in the new cycle
    bench.feed(&mut session, vec![qr("CYCLE-1", 50.0, 50.0)], t0 + ms(1200));
    assert_eq!(session.status(), SessionStatus::Ok);
}
