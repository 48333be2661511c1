//! Stability Detector
//!
//! Decides, from repeated snapshots of a streaming answer, whether generation
//! has finished, is still going, or has run past the wait ceiling.
//!
//! The chat page gives no explicit "done" signal. An answer counts as finished
//! once its text has stayed identical for the stability window *and* is at
//! least the minimum length; a pause in a short answer is not trusted. The
//! ceiling bounds the wait when the stream never settles (re-render flicker,
//! or an answer that stays short), in which case the accumulated text is kept.
//!
//! [`evaluate`] is pure: it takes the previous [`CompletionState`] and returns
//! the next one, so the logic is testable against synthetic text sequences
//! without a browser.

use tokio::time::Instant;

use crate::domain::models::DetectorConfig;

/// Separator between response units when they are joined into one sample.
pub const SEGMENT_SEPARATOR: &str = "\n\n";

/// Snapshot of the full visible answer text at one poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSample {
    /// Visible answer text, possibly empty
    pub text: String,
    /// When the page was read
    pub observed_at: Instant,
}

impl StreamSample {
    /// Sample of `text` taken at `observed_at`
    pub fn new(text: impl Into<String>, observed_at: Instant) -> Self {
        Self {
            text: text.into(),
            observed_at,
        }
    }

    /// Join every visible response unit, each trimmed, into one sample.
    ///
    /// Units can be added or rewritten mid-stream, so comparison is always
    /// over the whole concatenation rather than per unit.
    pub fn from_segments<I, S>(segments: I, observed_at: Instant) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = segments
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .collect::<Vec<_>>()
            .join(SEGMENT_SEPARATOR);
        Self { text, observed_at }
    }

    /// A tick where nothing could be read.
    pub fn empty(observed_at: Instant) -> Self {
        Self {
            text: String::new(),
            observed_at,
        }
    }
}

/// Detector state carried from one tick to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionState {
    last_text: String,
    last_change: Instant,
    poll_start: Instant,
}

impl CompletionState {
    /// Fresh state for a poll loop starting at `poll_start`.
    pub fn new(poll_start: Instant) -> Self {
        Self {
            last_text: String::new(),
            last_change: poll_start,
            poll_start,
        }
    }

    /// Most recent non-empty text seen
    pub fn last_text(&self) -> &str {
        &self.last_text
    }

    /// When `last_text` last changed
    pub const fn last_change(&self) -> Instant {
        self.last_change
    }

    /// When polling began; the ceiling counts from here
    pub const fn poll_start(&self) -> Instant {
        self.poll_start
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Keep polling
    Continue,
    /// Text settled; this is the answer
    Done(String),
    /// Ceiling reached; keep whatever accumulated
    AbortPartial(String),
}

impl Decision {
    /// True for `Done` and `AbortPartial`
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Decision::Continue)
    }
}

/// Advance the detector by one sample.
///
/// Empty text is never "done", whatever the minimum length. An empty sample
/// never replaces text already seen: an empty page or a failed read counts
/// as "unchanged" so a later abort still returns what had accumulated. The
/// ceiling is checked on every tick, including ticks where the text changed,
/// so a stream that never settles still terminates.
pub fn evaluate(
    sample: &StreamSample,
    mut state: CompletionState,
    config: &DetectorConfig,
) -> (CompletionState, Decision) {
    let now = sample.observed_at;
    let changed = !sample.text.is_empty() && sample.text != state.last_text;

    if changed {
        state.last_text.clone_from(&sample.text);
        state.last_change = now;
    } else {
        let quiet_for = now.saturating_duration_since(state.last_change);
        let long_enough = !state.last_text.is_empty()
            && state.last_text.chars().count() >= config.min_answer_length;
        if quiet_for >= config.stability_window() && long_enough {
            let answer = state.last_text.clone();
            return (state, Decision::Done(answer));
        }
    }

    if now.saturating_duration_since(state.poll_start) >= config.max_wait() {
        let partial = state.last_text.clone();
        return (state, Decision::AbortPartial(partial));
    }

    (state, Decision::Continue)
}

/// Stateful wrapper around [`evaluate`] for a driving loop.
#[derive(Debug, Clone)]
pub struct StabilityDetector {
    config: DetectorConfig,
    state: CompletionState,
}

impl StabilityDetector {
    /// Start detecting with the poll clock starting at `poll_start`.
    pub fn start(config: DetectorConfig, poll_start: Instant) -> Self {
        Self {
            config,
            state: CompletionState::new(poll_start),
        }
    }

    /// Feed the newest sample.
    pub fn observe(&mut self, sample: &StreamSample) -> Decision {
        let (next, decision) = evaluate(sample, self.state.clone(), &self.config);
        self.state = next;
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(window: u64, max_wait: u64, min_len: usize) -> DetectorConfig {
        DetectorConfig {
            stability_window_secs: window,
            max_wait_secs: max_wait,
            min_answer_length: min_len,
        }
    }

    /// Feed `text_at(t)` once per second from t=0 and return the first
    /// terminal decision with the tick it happened on.
    fn run_ticks(
        config: &DetectorConfig,
        ticks: u64,
        text_at: impl Fn(u64) -> String,
    ) -> Option<(u64, Decision)> {
        let t0 = Instant::now();
        let mut detector = StabilityDetector::start(config.clone(), t0);
        for t in 0..=ticks {
            let sample = StreamSample::new(text_at(t), t0 + Duration::from_secs(t));
            let decision = detector.observe(&sample);
            if decision.is_terminal() {
                return Some((t, decision));
            }
        }
        None
    }

    #[test]
    fn test_done_exactly_when_window_elapses() {
        let long = "x".repeat(150);
        let cfg = config(20, 240, 120);
        // Text last changes at t=5.
        let result = run_ticks(&cfg, 100, |t| {
            if t < 5 {
                format!("partial {t}")
            } else {
                long.clone()
            }
        });
        assert_eq!(result, Some((25, Decision::Done(long.clone()))));
    }

    #[test]
    fn test_short_stable_text_aborts_at_ceiling() {
        let cfg = config(20, 240, 120);
        let short = "y".repeat(80);
        let result = run_ticks(&cfg, 400, |_| short.clone());
        assert_eq!(result, Some((240, Decision::AbortPartial(short))));
    }

    #[test]
    fn test_hello_world_scenario() {
        let cfg = DetectorConfig::default();
        let result = run_ticks(&cfg, 300, |t| match t {
            0 => String::new(),
            1 | 2 => "Hello".to_string(),
            _ => "Hello world".to_string(),
        });
        assert_eq!(
            result,
            Some((240, Decision::AbortPartial("Hello world".to_string())))
        );
    }

    #[test]
    fn test_never_settling_stream_hits_ceiling() {
        let cfg = config(20, 60, 10);
        let result = run_ticks(&cfg, 100, |t| format!("flicker {}", t % 2));
        assert_eq!(
            result,
            Some((60, Decision::AbortPartial("flicker 0".to_string())))
        );
    }

    #[test]
    fn test_empty_sample_keeps_accumulated_text() {
        let cfg = config(20, 240, 5);
        let t0 = Instant::now();
        let state = CompletionState::new(t0);

        let (state, d) = evaluate(&StreamSample::new("answer", t0), state, &cfg);
        assert_eq!(d, Decision::Continue);

        let later = t0 + Duration::from_secs(1);
        let (state, d) = evaluate(&StreamSample::empty(later), state, &cfg);
        assert_eq!(d, Decision::Continue);
        assert_eq!(state.last_text(), "answer");
        assert_eq!(state.last_change(), t0);

        // Empty ticks count toward stability of what was already seen.
        let settled = t0 + Duration::from_secs(20);
        let (_, d) = evaluate(&StreamSample::empty(settled), state, &cfg);
        assert_eq!(d, Decision::Done("answer".to_string()));
    }

    #[test]
    fn test_empty_page_continues_until_ceiling() {
        let cfg = config(20, 30, 0);
        let result = run_ticks(&cfg, 100, |_| String::new());
        assert_eq!(result, Some((30, Decision::AbortPartial(String::new()))));
    }

    #[test]
    fn test_change_resets_window() {
        let cfg = config(10, 240, 3);
        let t0 = Instant::now();
        let at = |s| t0 + Duration::from_secs(s);
        let state = CompletionState::new(t0);

        let (state, _) = evaluate(&StreamSample::new("abc", at(0)), state, &cfg);
        let (state, d) = evaluate(&StreamSample::new("abc", at(9)), state, &cfg);
        assert_eq!(d, Decision::Continue);
        let (state, d) = evaluate(&StreamSample::new("abcd", at(10)), state, &cfg);
        assert_eq!(d, Decision::Continue);
        assert_eq!(state.last_change(), at(10));
        let (_, d) = evaluate(&StreamSample::new("abcd", at(20)), state, &cfg);
        assert_eq!(d, Decision::Done("abcd".to_string()));
    }

    #[test]
    fn test_from_segments_trims_and_joins() {
        let now = Instant::now();
        let sample = StreamSample::from_segments(["  first \n", "\nsecond  "], now);
        assert_eq!(sample.text, "first\n\nsecond");

        let none: [&str; 0] = [];
        assert!(StreamSample::from_segments(none, now).text.is_empty());
    }

    #[test]
    fn test_min_length_counts_characters_not_bytes() {
        let cfg = config(1, 240, 5);
        let t0 = Instant::now();
        let state = CompletionState::new(t0);
        // Five Hangul syllables: 15 bytes, 5 characters.
        let (state, _) = evaluate(&StreamSample::new("가나다라마", t0), state, &cfg);
        let (_, d) = evaluate(
            &StreamSample::new("가나다라마", t0 + Duration::from_secs(1)),
            state,
            &cfg,
        );
        assert_eq!(d, Decision::Done("가나다라마".to_string()));
    }
}
