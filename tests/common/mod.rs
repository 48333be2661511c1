//! Common test utilities for integration tests
//!
//! Provides a scripted in-process browser and an in-memory store so the
//! session and orchestrator can be driven without Chrome or a database.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};

use dayloop::application::{InteractionSession, SessionSettings};
use dayloop::domain::errors::{AutomationError, StoreError};
use dayloop::domain::models::{
    DateKey, DateRange, DetectorConfig, InteractionRecord, StoredId, StoredRecord, TimeoutsConfig,
};
use dayloop::domain::ports::{BrowserAutomation, ElementHandle, InteractionStore, Key};
use dayloop::services::PromptBuilder;

pub const CHAT_URL: &str = "https://chat.test/";
pub const INPUT_SELECTOR: &str = "#prompt";
pub const ASSISTANT_SELECTOR: &str = ".assistant";

const INPUT_ID: &str = "input";
const LOOKUP_POLL: Duration = Duration::from_millis(250);

pub fn date(y: i32, m: u32, d: u32) -> DateKey {
    DateKey::from_ymd(y, m, d).unwrap()
}

/// Session settings pointing at the fake page, with default timeouts and
/// detector tunables.
pub fn settings() -> SessionSettings {
    SessionSettings {
        chat_url: CHAT_URL.to_string(),
        prompt_input_selector: INPUT_SELECTOR.to_string(),
        assistant_selector: ASSISTANT_SELECTOR.to_string(),
        timeouts: TimeoutsConfig::default(),
        detector: DetectorConfig::default(),
    }
}

pub fn session(browser: Arc<FakeBrowser>, template: &str) -> InteractionSession {
    InteractionSession::new(browser, PromptBuilder::from_template(template), settings())
}

/// Session that settles within about a second, for tests on real time.
pub fn quick_session(browser: Arc<FakeBrowser>, template: &str) -> InteractionSession {
    let mut settings = settings();
    settings.timeouts.poll_interval_ms = 100;
    settings.timeouts.ui_settle_ms = 0;
    settings.detector.stability_window_secs = 1;
    settings.detector.max_wait_secs = 10;
    InteractionSession::new(browser, PromptBuilder::from_template(template), settings)
}

/// What the chat page does for one fresh conversation.
#[derive(Debug, Clone)]
pub struct DayScript {
    /// Whether the prompt input ever appears
    pub input_ready: bool,
    /// `(seconds after submit, visible response units)`, ascending
    pub timeline: Vec<(u64, Vec<String>)>,
    /// Reads fail as stale while `start <= elapsed secs < end`
    pub stale_window: Option<(u64, u64)>,
    /// Clicking the input panics
    pub panic_on_click: bool,
    /// Typing into the input fails as stale
    pub stale_input: bool,
}

impl DayScript {
    /// One unit whose text is `text` from the first second on.
    pub fn answer(text: impl Into<String>) -> Self {
        Self::timeline(vec![(0, vec![text.into()])])
    }

    pub fn timeline(timeline: Vec<(u64, Vec<String>)>) -> Self {
        Self {
            input_ready: true,
            timeline,
            stale_window: None,
            panic_on_click: false,
            stale_input: false,
        }
    }

    /// The input never shows up.
    pub fn no_input() -> Self {
        Self {
            input_ready: false,
            ..Self::timeline(vec![])
        }
    }

    /// The prompt is accepted but nothing is ever rendered.
    pub fn silent() -> Self {
        Self::timeline(vec![])
    }

    pub fn panicking() -> Self {
        Self {
            panic_on_click: true,
            ..Self::answer("never read")
        }
    }

    pub fn with_stale_window(mut self, start: u64, end: u64) -> Self {
        self.stale_window = Some((start, end));
        self
    }

    pub fn with_stale_input(mut self) -> Self {
        self.stale_input = true;
        self
    }

    fn units_at(&self, elapsed: Duration) -> Vec<String> {
        self.timeline
            .iter()
            .rev()
            .find(|(secs, _)| Duration::from_secs(*secs) <= elapsed)
            .map(|(_, units)| units.clone())
            .unwrap_or_default()
    }
}

/// Everything typed into the input, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Typed {
    Text(String),
    Key(Key),
}

#[derive(Default)]
struct PageState {
    scripts: VecDeque<DayScript>,
    current: Option<DayScript>,
    submitted_at: Option<Instant>,
    typed: Vec<Typed>,
    navigations: Vec<String>,
}

/// Scripted browser. Each `navigate` opens the next [`DayScript`].
#[derive(Default)]
pub struct FakeBrowser {
    state: Mutex<PageState>,
    closes: AtomicUsize,
    scrolls: AtomicUsize,
    close_error: Mutex<Option<AutomationError>>,
}

impl FakeBrowser {
    pub fn new(scripts: impl IntoIterator<Item = DayScript>) -> Arc<Self> {
        let browser = Self::default();
        browser.state.lock().unwrap().scripts = scripts.into_iter().collect();
        Arc::new(browser)
    }

    pub fn fail_close_with(&self, err: AutomationError) {
        *self.close_error.lock().unwrap() = Some(err);
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn scroll_count(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn typed(&self) -> Vec<Typed> {
        self.state.lock().unwrap().typed.clone()
    }

    /// Typed text lines of the most recent submission, soft breaks removed.
    pub fn typed_text(&self) -> Vec<String> {
        self.typed()
            .into_iter()
            .filter_map(|t| match t {
                Typed::Text(s) => Some(s),
                Typed::Key(_) => None,
            })
            .collect()
    }

    fn elapsed_since_submit(state: &PageState) -> Option<Duration> {
        state.submitted_at.map(|t| Instant::now().saturating_duration_since(t))
    }

    fn visible_units(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        match (&state.current, Self::elapsed_since_submit(&state)) {
            (Some(script), Some(elapsed)) => script.units_at(elapsed),
            _ => Vec::new(),
        }
    }

    fn check_input(&self, element: &ElementHandle) -> Result<(), AutomationError> {
        let state = self.state.lock().unwrap();
        let stale = state.current.as_ref().is_some_and(|s| s.stale_input);
        if element.id() != INPUT_ID || stale {
            return Err(AutomationError::StaleElement(element.id().to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserAutomation for FakeBrowser {
    async fn navigate(&self, url: &str) -> Result<(), AutomationError> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        state.current = state.scripts.pop_front();
        state.submitted_at = None;
        state.typed.clear();
        if state.current.is_none() {
            return Err(AutomationError::Transport("no scripted conversation left".into()));
        }
        Ok(())
    }

    async fn find_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, AutomationError> {
        let ready = {
            let state = self.state.lock().unwrap();
            selector == INPUT_SELECTOR && state.current.as_ref().is_some_and(|s| s.input_ready)
        };
        if ready {
            Ok(Some(ElementHandle::new(INPUT_ID)))
        } else {
            sleep(timeout).await;
            Ok(None)
        }
    }

    async fn find_elements(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<ElementHandle>, AutomationError> {
        if selector != ASSISTANT_SELECTOR {
            sleep(timeout).await;
            return Ok(Vec::new());
        }
        let deadline = Instant::now() + timeout;
        loop {
            let units = self.visible_units();
            let now = Instant::now();
            if !units.is_empty() || now >= deadline {
                return Ok((0..units.len())
                    .map(|i| ElementHandle::new(format!("unit-{i}")))
                    .collect());
            }
            sleep(LOOKUP_POLL.min(deadline - now)).await;
        }
    }

    async fn element_text(&self, element: &ElementHandle) -> Result<String, AutomationError> {
        {
            let state = self.state.lock().unwrap();
            if let (Some(script), Some(elapsed)) =
                (&state.current, Self::elapsed_since_submit(&state))
            {
                if let Some((start, end)) = script.stale_window {
                    let secs = elapsed.as_secs();
                    if secs >= start && secs < end {
                        return Err(AutomationError::StaleElement(element.id().to_string()));
                    }
                }
            }
        }

        let index: usize = element
            .id()
            .strip_prefix("unit-")
            .and_then(|i| i.parse().ok())
            .ok_or_else(|| AutomationError::NoSuchElement(element.id().to_string()))?;
        self.visible_units()
            .get(index)
            .cloned()
            .ok_or_else(|| AutomationError::NoSuchElement(element.id().to_string()))
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), AutomationError> {
        let panic_on_click = {
            let state = self.state.lock().unwrap();
            state.current.as_ref().is_some_and(|s| s.panic_on_click)
        };
        if panic_on_click {
            panic!("click handler exploded");
        }
        self.check_input(element)
    }

    async fn send_text(&self, element: &ElementHandle, text: &str) -> Result<(), AutomationError> {
        self.check_input(element)?;
        self.state
            .lock()
            .unwrap()
            .typed
            .push(Typed::Text(text.to_string()));
        Ok(())
    }

    async fn send_key(&self, element: &ElementHandle, key: Key) -> Result<(), AutomationError> {
        self.check_input(element)?;
        let mut state = self.state.lock().unwrap();
        state.typed.push(Typed::Key(key));
        if key == Key::Enter {
            state.submitted_at = Some(Instant::now());
        }
        Ok(())
    }

    async fn scroll_into_view(&self, _element: &ElementHandle) -> Result<(), AutomationError> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        Err(AutomationError::Protocol {
            error: "javascript error".into(),
            message: "scrolling is flaky on this page".into(),
        })
    }

    async fn close(&self) -> Result<(), AutomationError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match self.close_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory store recording every call.
#[derive(Default)]
pub struct RecordingStore {
    records: Mutex<BTreeMap<DateKey, StoredRecord>>,
    upserts: Mutex<Vec<DateKey>>,
    closes: AtomicUsize,
    fail_on: Option<DateKey>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A store whose upsert for `date` fails as if the connection dropped.
    pub fn failing_on(date: DateKey) -> Arc<Self> {
        Arc::new(Self {
            fail_on: Some(date),
            ..Self::default()
        })
    }

    pub fn upserts(&self) -> Vec<DateKey> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn record(&self, date: DateKey) -> Option<StoredRecord> {
        self.records.lock().unwrap().get(&date).cloned()
    }
}

#[async_trait]
impl InteractionStore for RecordingStore {
    async fn upsert(&self, record: &InteractionRecord) -> Result<StoredId, StoreError> {
        self.upserts.lock().unwrap().push(record.date);
        if self.fail_on == Some(record.date) {
            return Err(StoreError::Closed);
        }

        let mut records = self.records.lock().unwrap();
        let stored = records
            .entry(record.date)
            .and_modify(|existing| existing.record = record.clone())
            .or_insert_with(|| StoredRecord {
                id: StoredId::new(),
                created_at: Utc::now(),
                record: record.clone(),
            });
        Ok(stored.id)
    }

    async fn get(&self, date: DateKey) -> Result<Option<StoredRecord>, StoreError> {
        Ok(self.record(date))
    }

    async fn list(&self, range: &DateRange) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| range.contains(r.record.date))
            .cloned()
            .collect())
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
