//! W3C WebDriver client implementing the browser automation port.

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use super::capabilities::new_session_request;
use super::chromedriver::ChromeDriverProcess;
use crate::domain::errors::AutomationError;
use crate::domain::models::BrowserConfig;
use crate::domain::ports::{BrowserAutomation, ElementHandle, Key};

/// Key under which W3C responses carry an element reference.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Interval between element lookups while waiting for a selector.
const LOOKUP_POLL: Duration = Duration::from_millis(250);

/// Per-request HTTP timeout; page loads can be slow.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const SCROLL_SCRIPT: &str = "arguments[0].scrollIntoView(false);";

/// Key codes from the W3C WebDriver key table. `\u{E000}` releases
/// held modifiers so the next typed text is not shifted.
fn key_sequence(key: Key) -> &'static str {
    match key {
        Key::Enter => "\u{E007}",
        Key::ShiftEnter => "\u{E008}\u{E007}\u{E000}",
    }
}

/// One WebDriver session, optionally owning the chromedriver it talks to.
pub struct WebDriverClient {
    http: ReqwestClient,
    base_url: String,
    session_id: String,
    driver: Mutex<Option<ChromeDriverProcess>>,
    closed: AtomicBool,
}

impl WebDriverClient {
    /// Open a session on an already running WebDriver endpoint.
    pub async fn connect(base_url: &str, capabilities: Value) -> Result<Self, AutomationError> {
        let http = ReqwestClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AutomationError::Transport(e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let value = send(
            http.post(format!("{base_url}/session")).json(&capabilities),
        )
        .await
        .map_err(|err| match err {
            AutomationError::Protocol { message, .. } => AutomationError::SessionNotCreated(message),
            other => other,
        })?;

        let session_id = value["sessionId"]
            .as_str()
            .ok_or_else(|| {
                AutomationError::SessionNotCreated("response carried no sessionId".to_string())
            })?
            .to_string();

        info!(session_id = %session_id, url = %base_url, "WebDriver session created");
        Ok(Self {
            http,
            base_url,
            session_id,
            driver: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    /// Open a Chrome session as configured, spawning chromedriver unless an
    /// endpoint URL is given.
    pub async fn launch(config: &BrowserConfig) -> Result<Self, AutomationError> {
        let capabilities = new_session_request(config);

        if let Some(url) = &config.webdriver_url {
            return Self::connect(url, capabilities).await;
        }

        let mut driver = ChromeDriverProcess::spawn(
            &config.chromedriver_path,
            config.port,
            config.startup_timeout(),
        )
        .await?;

        match Self::connect(&driver.url(), capabilities).await {
            Ok(client) => {
                *client.driver.lock().await = Some(driver);
                Ok(client)
            }
            Err(err) => {
                driver.stop().await;
                Err(err)
            }
        }
    }

    /// Id the driver assigned to this session
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// True once [`close`](BrowserAutomation::close) has run
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, AutomationError> {
        if self.is_closed() {
            return Err(AutomationError::SessionClosed);
        }
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        let request = self.http.request(method, url);
        let request = match body {
            Some(body) => request.json(&body),
            None => request,
        };
        send(request).await
    }

    fn element_path(element: &ElementHandle, suffix: &str) -> String {
        format!("/element/{}{}", element.id(), suffix)
    }

    /// One lookup without waiting.
    async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, AutomationError> {
        let value = self
            .command(
                Method::POST,
                "/elements",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await?;
        Ok(parse_elements(&value))
    }

    /// Repeat the lookup until something matches or the timeout passes.
    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<ElementHandle>, AutomationError> {
        let deadline = Instant::now() + timeout;
        loop {
            let found = self.query(selector).await?;
            let now = Instant::now();
            if !found.is_empty() || now >= deadline {
                return Ok(found);
            }
            sleep(LOOKUP_POLL.min(deadline - now)).await;
        }
    }
}

#[async_trait]
impl BrowserAutomation for WebDriverClient {
    #[instrument(skip(self))]
    async fn navigate(&self, url: &str) -> Result<(), AutomationError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn find_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, AutomationError> {
        Ok(self.wait_for(selector, timeout).await?.into_iter().next())
    }

    async fn find_elements(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<ElementHandle>, AutomationError> {
        self.wait_for(selector, timeout).await
    }

    async fn element_text(&self, element: &ElementHandle) -> Result<String, AutomationError> {
        let value = self
            .command(Method::GET, &Self::element_path(element, "/text"), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), AutomationError> {
        self.command(
            Method::POST,
            &Self::element_path(element, "/click"),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }

    async fn send_text(&self, element: &ElementHandle, text: &str) -> Result<(), AutomationError> {
        self.command(
            Method::POST,
            &Self::element_path(element, "/value"),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    async fn send_key(&self, element: &ElementHandle, key: Key) -> Result<(), AutomationError> {
        self.send_text(element, key_sequence(key)).await
    }

    async fn scroll_into_view(&self, element: &ElementHandle) -> Result<(), AutomationError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({
                "script": SCROLL_SCRIPT,
                "args": [{ ELEMENT_KEY: element.id() }],
            })),
        )
        .await?;
        Ok(())
    }

    /// Delete the session, then stop the owned chromedriver. Closing twice is
    /// a no-op.
    async fn close(&self) -> Result<(), AutomationError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let url = format!("{}/session/{}", self.base_url, self.session_id);
        let result = send(self.http.delete(url)).await.map(|_| ());
        match &result {
            Ok(()) => debug!(session_id = %self.session_id, "WebDriver session deleted"),
            Err(e) => warn!(error = %e, "Failed to delete WebDriver session"),
        }

        if let Some(mut driver) = self.driver.lock().await.take() {
            driver.stop().await;
        }
        result
    }
}

/// Send a request and unwrap the W3C `value` envelope.
async fn send(request: reqwest::RequestBuilder) -> Result<Value, AutomationError> {
    let response = request
        .send()
        .await
        .map_err(|e| AutomationError::Transport(e.to_string()))?;
    let status = response.status();
    let mut body: Value = response
        .json()
        .await
        .map_err(|e| AutomationError::Transport(format!("invalid response body ({status}): {e}")))?;
    let value = body.get_mut("value").map(Value::take).unwrap_or_default();

    if status.is_success() {
        Ok(value)
    } else {
        Err(map_error(&value))
    }
}

/// Translate a W3C error object into the port's error type.
pub fn map_error(value: &Value) -> AutomationError {
    let error = value["error"].as_str().unwrap_or("unknown error").to_string();
    let message = value["message"].as_str().unwrap_or_default().to_string();

    match error.as_str() {
        "stale element reference" => AutomationError::StaleElement(message),
        "no such element" => AutomationError::NoSuchElement(message),
        "invalid session id" => AutomationError::SessionClosed,
        "session not created" => AutomationError::SessionNotCreated(message),
        _ => AutomationError::Protocol { error, message },
    }
}

fn parse_elements(value: &Value) -> Vec<ElementHandle> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item[ELEMENT_KEY].as_str())
                .map(ElementHandle::new)
                .collect()
        })
        .unwrap_or_default()
}
