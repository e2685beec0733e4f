#![forbid(unsafe_code)]

//! Property-based tests for seeded resize/visibility storms.
//!
//! 1. Every frame slot is either rendered or skipped
//! 2. Nothing renders after teardown
//! 3. Rendered frame counts match scheduler passes
//! 4. Storms replay identically

use flickergrid_core::FlickerConfig;
use flickergrid_harness::{HeadlessHost, RunLogger, Scenario, Step};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn run(seed: u64, events: usize) -> (Scenario, HeadlessHost, RunLogger) {
    let scenario = Scenario::storm(seed, events, 320.0, 240.0);
    let mut host = HeadlessHost::new(FlickerConfig::default().with_seed(seed)).unwrap();
    let mut log = RunLogger::noop().with_run_id("storm");
    host.run(&scenario, &mut log);
    (scenario, host, log)
}

// ═══ 1. Frame accounting ════════════════════════════════════════════════

proptest! {
    #[test]
    fn frame_slots_are_accounted(seed in any::<u64>(), events in 0usize..80) {
        let (scenario, _, log) = run(seed, events);
        let complete = log.events("run_complete").next().unwrap();
        let frames = complete["frames"].as_u64().unwrap();
        let skipped = complete["skipped"].as_u64().unwrap();
        prop_assert_eq!(frames + skipped, scenario.requested_frames());
    }
}

// ═══ 2. Teardown is final ═══════════════════════════════════════════════

proptest! {
    #[test]
    fn nothing_renders_after_teardown(seed in any::<u64>(), events in 0usize..60) {
        let (_, mut host, _) = run(seed, events);
        let passes = host.grid().scheduler().passes();
        let tail = Scenario::new("tail", vec![
            Step::Visible(true),
            Step::Resize { width: 100.0, height: 100.0, dpr: 1.0 },
            Step::Frames { count: 10, frame_ms: 16.0 },
        ]);
        let summary = host.run(&tail, &mut RunLogger::noop());
        prop_assert_eq!(summary.frames, 0);
        prop_assert_eq!(host.grid().scheduler().passes(), passes);
        prop_assert!(host.frames().pending().is_none());
    }
}

// ═══ 3. Passes ══════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn rendered_frames_match_passes(seed in any::<u64>(), events in 0usize..80) {
        let (_, host, log) = run(seed, events);
        prop_assert_eq!(
            log.events("frame").count() as u64,
            host.grid().scheduler().passes()
        );
    }
}

// ═══ 4. Replay ══════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn storms_replay_identically(seed in any::<u64>()) {
        let (_, _, a) = run(seed, 40);
        let (_, _, b) = run(seed, 40);
        prop_assert_eq!(a.records(), b.records());
    }
}
