//! W3C WebDriver client
//!
//! Forwards every session operation to a WebDriver server (chromedriver,
//! geckodriver, a Selenium grid) over its JSON wire protocol.

use super::{scripts, AutomationDriver, DriverError, DriverSession, ElementHandle};
use crate::core::config::DriverConfig;
use crate::core::retry::{Backoff, RetryExecutor, RetryOptions};
use crate::session::{Cookie, NameValue, OriginState, SessionState};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Key under which WebDriver serializes element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const POLL_INTERVAL: Duration = Duration::from_millis(200);

const READY_STATE: &str =
    "return [document.readyState, performance.getEntriesByType('resource').length];";

const SEED_LOCAL_STORAGE: &str = r#"
for (const [name, value] of arguments[0]) { window.localStorage.setItem(name, value); }
"#;

const READ_LOCAL_STORAGE: &str = r#"
const entries = [];
for (let i = 0; i < window.localStorage.length; i++) {
  const name = window.localStorage.key(i);
  entries.push([name, window.localStorage.getItem(name)]);
}
return [window.location.origin, entries];
"#;

#[derive(Debug, Clone, PartialEq)]
pub struct WebDriverOptions {
    pub url: String,
    pub browser: String,
    pub headless: bool,
    pub args: Vec<String>,
}

impl From<&DriverConfig> for WebDriverOptions {
    fn from(config: &DriverConfig) -> Self {
        Self {
            url: config.webdriver_url.clone(),
            browser: config.browser.clone(),
            headless: config.headless,
            args: config.args.clone(),
        }
    }
}

impl WebDriverOptions {
    /// New-session capabilities for the configured browser
    fn capabilities(&self) -> Value {
        let mut args = self.args.clone();
        if self.headless {
            args.push(match self.browser.as_str() {
                "firefox" => "-headless".to_string(),
                _ => "--headless=new".to_string(),
            });
        }

        let mut always_match = json!({ "browserName": self.browser });
        let vendor_key = match self.browser.as_str() {
            "firefox" => "moz:firefoxOptions",
            "MicrosoftEdge" | "msedge" => "ms:edgeOptions",
            _ => "goog:chromeOptions",
        };
        always_match[vendor_key] = json!({ "args": args });

        json!({ "capabilities": { "alwaysMatch": always_match } })
    }
}

/// Failure as reported on the wire
#[derive(Debug)]
enum WireError {
    Transport(String),
    Command { error: String, message: String },
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireError::Transport(message) => write!(f, "{}", message),
            WireError::Command { error, message } => write!(f, "{}: {}", error, message),
        }
    }
}

impl From<WireError> for DriverError {
    fn from(error: WireError) -> Self {
        match error {
            WireError::Transport(message) => DriverError::Protocol(message),
            WireError::Command { error, message } => match error.as_str() {
                "no such window" | "invalid session id" => DriverError::Closed,
                "stale element reference" => DriverError::StaleElement(message),
                "invalid selector" => DriverError::InvalidSelector(message),
                "javascript error" => DriverError::Script(message),
                "timeout" | "script timeout" => DriverError::Timeout(message),
                "element click intercepted" | "element not interactable" => {
                    DriverError::Interaction(message)
                }
                _ => DriverError::Protocol(format!("{}: {}", error, message)),
            },
        }
    }
}

#[derive(Clone)]
struct Wire {
    http: Client,
    base: String,
}

impl Wire {
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, WireError> {
        let url = format!("{}{}", self.base.trim_end_matches('/'), path);
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WireError::Transport(e.to_string()))?;
        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| WireError::Transport(format!("invalid response from {}: {}", url, e)))?;
        let value = payload.get("value").cloned().unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(value);
        }

        Err(WireError::Command {
            error: value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
            message: value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

/// Driver backed by a WebDriver server
#[derive(Clone)]
pub struct WebDriverClient {
    wire: Wire,
    options: WebDriverOptions,
    retry: RetryExecutor,
}

impl WebDriverClient {
    pub fn new(options: WebDriverOptions) -> Self {
        Self {
            wire: Wire {
                http: Client::new(),
                base: options.url.clone(),
            },
            options,
            retry: RetryExecutor::new(RetryOptions {
                max_attempts: 3,
                backoff: Backoff::Exponential {
                    initial: Duration::from_millis(500),
                    max: Duration::from_secs(4),
                    multiplier: 2.0,
                },
            }),
        }
    }

    pub fn options(&self) -> &WebDriverOptions {
        &self.options
    }

    /// Restore cookies domain by domain, then local storage origin by origin
    async fn seed(&self, session: &WebDriverSession, state: &SessionState) -> Result<(), DriverError> {
        let mut by_domain: BTreeMap<&str, Vec<&Cookie>> = BTreeMap::new();
        for cookie in &state.cookies {
            by_domain.entry(cookie.domain.as_str()).or_default().push(cookie);
        }

        for (domain, cookies) in by_domain {
            let host = domain.trim_start_matches('.');
            session
                .navigate(&format!("https://{}/", host), Duration::from_secs(30))
                .await?;
            for cookie in cookies {
                session.command(Method::POST, "/cookie", Some(json!({ "cookie": cookie_to_wire(cookie) }))).await?;
            }
        }

        for origin in &state.origins {
            if origin.local_storage.is_empty() {
                continue;
            }
            session.navigate(&origin.origin, Duration::from_secs(30)).await?;
            let entries: Vec<Value> = origin
                .local_storage
                .iter()
                .map(|entry| json!([entry.name, entry.value]))
                .collect();
            session.evaluate(SEED_LOCAL_STORAGE, vec![Value::Array(entries)]).await?;
        }

        tracing::debug!(
            cookies = state.cookies.len(),
            origins = state.origins.len(),
            "session seeded from storage state"
        );
        Ok(())
    }
}

#[async_trait]
impl AutomationDriver for WebDriverClient {
    fn name(&self) -> &str {
        "webdriver"
    }

    async fn open_session(
        &self,
        state: Option<&SessionState>,
    ) -> Result<Box<dyn DriverSession>, DriverError> {
        let capabilities = self.options.capabilities();
        let created = self
            .retry
            .retry(|| self.wire.send(Method::POST, "/session", Some(capabilities.clone())))
            .await
            .map_err(|e| DriverError::SessionUnavailable(e.to_string()))?;

        let session_id = created
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::SessionUnavailable("response carried no sessionId".to_string()))?
            .to_string();

        tracing::info!(
            browser = %self.options.browser,
            session = %session_id,
            "webdriver session opened"
        );

        let session = WebDriverSession {
            wire: self.wire.clone(),
            session_id,
        };

        if let Some(state) = state {
            if let Err(error) = self.seed(&session, state).await {
                if let Err(close_error) = session.close().await {
                    tracing::warn!(
                        session = %session.session_id,
                        error = %close_error,
                        "failed to close session after seeding error"
                    );
                }
                return Err(error);
            }
        }

        Ok(Box::new(session))
    }
}

struct WebDriverSession {
    wire: Wire,
    session_id: String,
}

impl WebDriverSession {
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, DriverError> {
        let full = format!("/session/{}{}", self.session_id, path);
        self.wire.send(method, &full, body).await.map_err(DriverError::from)
    }

    async fn element_command(
        &self,
        method: Method,
        element: &ElementHandle,
        action: &str,
        body: Option<Value>,
    ) -> Result<Value, DriverError> {
        self.command(method, &format!("/element/{}{}", element.id(), action), body)
            .await
    }
}

/// Translate an engine selector into a WebDriver location strategy
fn location_strategy(selector: &str) -> (&'static str, String) {
    if let Some(xpath) = selector.strip_prefix("xpath=") {
        ("xpath", xpath.to_string())
    } else if let Some(text) = selector.strip_prefix("text=") {
        (
            "xpath",
            format!("//*[contains(normalize-space(.), {})][not(*)]", xpath_literal(text)),
        )
    } else {
        ("css selector", selector.to_string())
    }
}

fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{}'", text)
    } else if !text.contains('"') {
        format!("\"{}\"", text)
    } else {
        let parts: Vec<String> = text.split('\'').map(|part| format!("'{}'", part)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

fn element_ref(element: &ElementHandle) -> Value {
    json!({ ELEMENT_KEY: element.id() })
}

fn cookie_to_wire(cookie: &Cookie) -> Value {
    let mut wire = json!({
        "name": cookie.name,
        "value": cookie.value,
        "domain": cookie.domain,
        "path": cookie.path,
        "secure": cookie.secure,
        "httpOnly": cookie.http_only,
    });
    if cookie.expires >= 0.0 {
        wire["expiry"] = json!(cookie.expires as u64);
    }
    if let Some(same_site) = &cookie.same_site {
        wire["sameSite"] = json!(same_site);
    }
    wire
}

fn cookie_from_wire(value: &Value) -> Option<Cookie> {
    let mut cookie = Cookie::new(
        value.get("name")?.as_str()?,
        value.get("value")?.as_str()?,
        value.get("domain").and_then(Value::as_str).unwrap_or_default(),
    );
    if let Some(path) = value.get("path").and_then(Value::as_str) {
        cookie.path = path.to_string();
    }
    if let Some(expiry) = value.get("expiry").and_then(Value::as_f64) {
        cookie.expires = expiry;
    }
    cookie.http_only = value.get("httpOnly").and_then(Value::as_bool).unwrap_or(false);
    cookie.secure = value.get("secure").and_then(Value::as_bool).unwrap_or(false);
    cookie.same_site = value.get("sameSite").and_then(Value::as_str).map(str::to_string);
    Some(cookie)
}

#[async_trait]
impl DriverSession for WebDriverSession {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        self.command(
            Method::POST,
            "/timeouts",
            Some(json!({ "pageLoad": timeout.as_millis() as u64 })),
        )
        .await?;
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map_err(|e| match e {
                DriverError::Closed => DriverError::Closed,
                other => DriverError::Navigation(format!("{}: {}", url, other)),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let value = self.command(Method::GET, "/url", None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn locate(&self, selector: &str) -> Result<Option<ElementHandle>, DriverError> {
        let (using, value) = location_strategy(selector);
        let path = format!("/session/{}/element", self.session_id);
        match self
            .wire
            .send(Method::POST, &path, Some(json!({ "using": using, "value": value })))
            .await
        {
            Ok(found) => Ok(found
                .get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(ElementHandle::new)),
            Err(WireError::Command { error, .. }) if error == "no such element" => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    async fn wait_visible(&self, element: &ElementHandle, timeout: Duration) -> Result<bool, DriverError> {
        let started = Instant::now();
        loop {
            let displayed = self
                .element_command(Method::GET, element, "/displayed", None)
                .await?;
            if displayed.as_bool().unwrap_or(false) {
                return Ok(true);
            }
            if started.elapsed() >= timeout {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn is_enabled(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        let enabled = self.element_command(Method::GET, element, "/enabled", None).await?;
        Ok(enabled.as_bool().unwrap_or(false))
    }

    async fn click(&self, element: &ElementHandle, forced: bool) -> Result<(), DriverError> {
        if forced {
            self.evaluate_on(element, scripts::FORCE_CLICK, Vec::new()).await?;
        } else {
            self.element_command(Method::POST, element, "/click", Some(json!({})))
                .await?;
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.element_command(Method::POST, element, "/clear", Some(json!({})))
            .await?;
        Ok(())
    }

    async fn fill(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        self.element_command(Method::POST, element, "/value", Some(json!({ "text": text })))
            .await?;
        Ok(())
    }

    async fn read_property(&self, element: &ElementHandle, name: &str) -> Result<Option<String>, DriverError> {
        let value = self
            .element_command(Method::GET, element, &format!("/property/{}", name), None)
            .await?;
        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    async fn evaluate(&self, script: &str, args: Vec<Value>) -> Result<Value, DriverError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn evaluate_on(
        &self,
        element: &ElementHandle,
        script: &str,
        args: Vec<Value>,
    ) -> Result<Value, DriverError> {
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(element_ref(element));
        all.extend(args);
        self.evaluate(script, all).await
    }

    async fn wait_for_stable(&self, timeout: Duration) -> Result<(), DriverError> {
        let started = Instant::now();
        let mut last_resources: Option<u64> = None;

        loop {
            let probe = self.evaluate(READY_STATE, Vec::new()).await?;
            let complete = probe.get(0).and_then(Value::as_str) == Some("complete");
            let resources = probe.get(1).and_then(Value::as_u64);

            if complete && resources.is_some() && resources == last_resources {
                return Ok(());
            }
            last_resources = resources;

            if started.elapsed() >= timeout {
                return Err(DriverError::Timeout(format!(
                    "page not stable after {}ms",
                    timeout.as_millis()
                )));
            }
            sleep(Duration::from_millis(500)).await;
        }
    }

    async fn storage_state(&self) -> Result<SessionState, DriverError> {
        let cookies = self.command(Method::GET, "/cookie", None).await?;
        let cookies = cookies
            .as_array()
            .map(|list| list.iter().filter_map(cookie_from_wire).collect())
            .unwrap_or_default();

        let storage = self.evaluate(READ_LOCAL_STORAGE, Vec::new()).await?;
        let origin = storage.get(0).and_then(Value::as_str).unwrap_or_default();
        let local_storage: Vec<NameValue> = storage
            .get(1)
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        Some(NameValue {
                            name: entry.get(0)?.as_str()?.to_string(),
                            value: entry.get(1)?.as_str()?.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let origins = if origin.is_empty() || origin == "null" || local_storage.is_empty() {
            Vec::new()
        } else {
            vec![OriginState {
                origin: origin.to_string(),
                local_storage,
            }]
        };

        Ok(SessionState { cookies, origins })
    }

    async fn close(&self) -> Result<(), DriverError> {
        match self.wire.send(Method::DELETE, &format!("/session/{}", self.session_id), None).await {
            Ok(_) => Ok(()),
            Err(WireError::Command { error, .. }) if error == "invalid session id" => Ok(()),
            Err(other) => Err(other.into()),
        }
    }
}
