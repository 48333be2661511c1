//! Property-based tests for the stability detector
//!
//! Tests the following properties over arbitrary text streams sampled once a
//! second:
//! 1. Termination: a decision is terminal no later than the ceiling
//! 2. Quiescence: `Done` only after a full window without change
//! 3. Length: `Done` text is never shorter than the minimum
//! 4. Retention: `AbortPartial` returns the last non-empty text seen

use dayloop::application::{Decision, StabilityDetector, StreamSample};
use dayloop::domain::models::DetectorConfig;
use proptest::prelude::*;
use std::time::Duration;
use tokio::time::Instant;

/// Texts drawn from a tiny alphabet so repeats (quiet stretches) are common.
fn stream_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            3 => Just(String::new()),
            2 => prop::string::string_regex("[ab]{1,3}").expect("Valid regex"),
            1 => prop::string::string_regex("[ab ]{8,30}").expect("Valid regex"),
        ],
        1..80,
    )
}

fn config_strategy() -> impl Strategy<Value = DetectorConfig> {
    (1u64..10, 10u64..60, 0usize..20).prop_map(|(window, max_wait, min_len)| DetectorConfig {
        stability_window_secs: window,
        max_wait_secs: max_wait,
        min_answer_length: min_len,
    })
}

struct Run {
    decision: Decision,
    tick: u64,
    last_change_tick: u64,
    last_non_empty: String,
}

/// Feed one sample per second, holding the last text once the stream runs
/// out, until the detector reaches a terminal decision.
fn drive(config: &DetectorConfig, stream: &[String]) -> Run {
    let start = Instant::now();
    let mut detector = StabilityDetector::start(config.clone(), start);
    let mut last_non_empty = String::new();
    let mut last_change_tick = 0;

    for tick in 0.. {
        let text = stream
            .get(tick as usize)
            .or_else(|| stream.last())
            .cloned()
            .unwrap_or_default();
        if !text.is_empty() && text != last_non_empty {
            last_non_empty.clone_from(&text);
            last_change_tick = tick;
        }

        let sample = StreamSample::new(text, start + Duration::from_secs(tick));
        let decision = detector.observe(&sample);
        if decision.is_terminal() || tick > config.max_wait_secs + 1 {
            return Run {
                decision,
                tick,
                last_change_tick,
                last_non_empty,
            };
        }
    }
    unreachable!()
}

proptest! {
    #[test]
    fn proptest_terminates_by_ceiling(config in config_strategy(), stream in stream_strategy()) {
        let run = drive(&config, &stream);
        prop_assert!(run.decision.is_terminal());
        prop_assert!(run.tick <= config.max_wait_secs);
    }

    #[test]
    fn proptest_done_only_after_quiet_window(config in config_strategy(), stream in stream_strategy()) {
        let run = drive(&config, &stream);
        if let Decision::Done(_) = run.decision {
            prop_assert!(run.tick - run.last_change_tick >= config.stability_window_secs);
        }
    }

    #[test]
    fn proptest_done_respects_minimum_length(config in config_strategy(), stream in stream_strategy()) {
        let run = drive(&config, &stream);
        if let Decision::Done(text) = run.decision {
            prop_assert!(!text.is_empty());
            prop_assert!(text.chars().count() >= config.min_answer_length);
            prop_assert_eq!(text, run.last_non_empty);
        }
    }

    #[test]
    fn proptest_abort_keeps_last_text(config in config_strategy(), stream in stream_strategy()) {
        let run = drive(&config, &stream);
        if let Decision::AbortPartial(text) = run.decision {
            prop_assert_eq!(run.tick, config.max_wait_secs);
            prop_assert_eq!(text, run.last_non_empty);
        }
    }
}
