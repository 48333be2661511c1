//! Interaction Session
//!
//! Drives one complete prompt/answer exchange for a single date against an
//! already authenticated browser session:
//!
//! 1. open a fresh conversation and wait for the input
//! 2. type the prompt line by line with soft line breaks, then submit
//! 3. wait for the first response unit
//! 4. poll the visible answer through the [`StabilityDetector`] until it
//!    settles or the ceiling is reached
//!
//! Every wait is bounded. Failures are returned as [`InteractionError`] and
//! never affect other dates.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, trace, warn};

use crate::application::stability_detector::{Decision, StabilityDetector, StreamSample};
use crate::domain::errors::{AutomationError, InteractionError};
use crate::domain::models::{
    Completion, Config, DateKey, DetectorConfig, InteractionOutcome, TimeoutsConfig,
};
use crate::domain::ports::{BrowserAutomation, ElementHandle, Key};
use crate::services::PromptBuilder;

/// Pause between focusing the input and typing into it.
const FOCUS_SETTLE: Duration = Duration::from_millis(200);

/// Page-level settings for one interaction.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Page that opens a fresh conversation
    pub chat_url: String,
    /// CSS selector of the prompt input
    pub prompt_input_selector: String,
    /// CSS selector matching every assistant response unit
    pub assistant_selector: String,
    /// Bounded waits for each step
    pub timeouts: TimeoutsConfig,
    /// Completion detector tunables
    pub detector: DetectorConfig,
}

impl SessionSettings {
    /// Pick the session-relevant sections out of the full config
    pub fn from_config(config: &Config) -> Self {
        Self {
            chat_url: config.browser.chat_url.clone(),
            prompt_input_selector: config.selectors.prompt_input.clone(),
            assistant_selector: config.selectors.assistant_message.clone(),
            timeouts: config.timeouts.clone(),
            detector: config.detector.clone(),
        }
    }
}

/// One prompt/answer exchange per call to [`InteractionSession::run`].
pub struct InteractionSession {
    browser: Arc<dyn BrowserAutomation>,
    prompts: PromptBuilder,
    settings: SessionSettings,
}

impl InteractionSession {
    /// Session over an already connected browser
    pub fn new(
        browser: Arc<dyn BrowserAutomation>,
        prompts: PromptBuilder,
        settings: SessionSettings,
    ) -> Self {
        Self {
            browser,
            prompts,
            settings,
        }
    }

    /// The browser this session drives. Closing it is the caller's job.
    pub fn browser(&self) -> &Arc<dyn BrowserAutomation> {
        &self.browser
    }

    /// Run the full exchange for `date`.
    #[instrument(skip(self), fields(date = %date))]
    pub async fn run(&self, date: DateKey) -> Result<InteractionOutcome, InteractionError> {
        self.open_fresh_context().await?;

        let prompt = self.prompts.build(date);
        self.submit(&prompt).await?;
        info!(lines = prompt.lines().count(), "Prompt submitted");

        self.await_first_response().await?;
        let (answer, completion) = self.collect_answer().await?;

        info!(
            chars = answer.chars().count(),
            completion = completion.as_str(),
            "Answer collected"
        );
        Ok(InteractionOutcome {
            prompt,
            answer,
            completion,
        })
    }

    async fn open_fresh_context(&self) -> Result<(), InteractionError> {
        let timeouts = &self.settings.timeouts;
        self.browser.navigate(&self.settings.chat_url).await?;

        let input = self
            .browser
            .find_element(&self.settings.prompt_input_selector, timeouts.context_ready())
            .await?;
        if input.is_none() {
            return Err(InteractionError::ContextInit {
                timeout_secs: timeouts.context_ready_secs,
            });
        }

        debug!("Fresh conversation ready");
        sleep(timeouts.ui_settle()).await;
        Ok(())
    }

    async fn submit(&self, prompt: &str) -> Result<(), InteractionError> {
        let selector = &self.settings.prompt_input_selector;
        let input = self
            .browser
            .find_element(selector, self.settings.timeouts.input_lookup())
            .await?
            .ok_or_else(|| InteractionError::InputNotFound {
                selector: selector.clone(),
            })?;

        self.type_prompt(&input, prompt).await.map_err(|err| {
            if err.is_transient() {
                InteractionError::InputNotFound {
                    selector: selector.clone(),
                }
            } else {
                err.into()
            }
        })
    }

    async fn type_prompt(&self, input: &ElementHandle, prompt: &str) -> Result<(), AutomationError> {
        self.browser.click(input).await?;
        sleep(FOCUS_SETTLE).await;

        for line in prompt.lines() {
            if !line.is_empty() {
                self.browser.send_text(input, line).await?;
            }
            self.browser.send_key(input, Key::ShiftEnter).await?;
        }
        self.browser.send_key(input, Key::Enter).await
    }

    async fn await_first_response(&self) -> Result<(), InteractionError> {
        let timeouts = &self.settings.timeouts;
        let units = self
            .browser
            .find_elements(&self.settings.assistant_selector, timeouts.first_response())
            .await?;
        if units.is_empty() {
            return Err(InteractionError::NoResponse {
                timeout_secs: timeouts.first_response_secs,
            });
        }
        debug!(units = units.len(), "First response unit visible");
        Ok(())
    }

    /// Poll the visible answer until the detector reaches a verdict.
    async fn collect_answer(&self) -> Result<(String, Completion), InteractionError> {
        let timeouts = &self.settings.timeouts;
        let mut detector = StabilityDetector::start(self.settings.detector.clone(), Instant::now());

        loop {
            let (sample, latest, pause) = match self.sample().await {
                Ok((sample, latest)) => (sample, latest, timeouts.poll_interval()),
                Err(err) if err.is_transient() => {
                    debug!(error = %err, "Transient read failure while sampling");
                    (
                        StreamSample::empty(Instant::now()),
                        None,
                        timeouts.transient_retry(),
                    )
                }
                Err(err) => return Err(err.into()),
            };

            match detector.observe(&sample) {
                Decision::Continue => {}
                Decision::Done(text) => return non_empty(text, Completion::Stable),
                Decision::AbortPartial(text) => {
                    warn!(
                        chars = text.chars().count(),
                        max_wait_secs = self.settings.detector.max_wait_secs,
                        "Answer did not settle before the ceiling; keeping partial text"
                    );
                    return non_empty(text, Completion::Partial);
                }
            }

            if let Some(unit) = latest {
                if let Err(err) = self.browser.scroll_into_view(&unit).await {
                    trace!(error = %err, "Scroll failed");
                }
            }
            sleep(pause).await;
        }
    }

    /// Read every response unit now visible. Returns the joined text and the
    /// newest unit.
    async fn sample(&self) -> Result<(StreamSample, Option<ElementHandle>), AutomationError> {
        let units = self
            .browser
            .find_elements(&self.settings.assistant_selector, Duration::ZERO)
            .await?;

        let mut texts = Vec::with_capacity(units.len());
        for unit in &units {
            texts.push(self.browser.element_text(unit).await?);
        }

        let sample = StreamSample::from_segments(&texts, Instant::now());
        Ok((sample, units.last().cloned()))
    }
}

fn non_empty(text: String, completion: Completion) -> Result<(String, Completion), InteractionError> {
    if text.is_empty() {
        Err(InteractionError::EmptyAnswer)
    } else {
        Ok((text, completion))
    }
}
