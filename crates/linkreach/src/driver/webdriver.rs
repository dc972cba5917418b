//! Minimal W3C WebDriver client over blocking HTTP.
//!
//! Talks to chromedriver (or any conforming server) directly, one command per
//! request. Only the commands the harvester, classifier and login flow need
//! are implemented.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{ElementRef, Locator, UiDriver};
use crate::config::WebDriverConfig;
use crate::error::DriverError;

/// Key under which the protocol wraps element ids.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: Option<String>,
}

impl WebDriverSession {
    /// Opens a new browser through the WebDriver server at `config.endpoint`.
    pub fn start(config: &WebDriverConfig) -> Result<Self, DriverError> {
        let base_url = config.endpoint.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DriverError::Transport {
                endpoint: base_url.clone(),
                source: e,
            })?;

        let mut session = Self {
            client,
            base_url,
            session_id: None,
        };

        let url = format!("{}/session", session.base_url);
        let value = session.send(Method::POST, &url, Some(capabilities(config)))?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::InvalidResponse("new session without sessionId".into()))?
            .to_string();

        info!(session_id = %session_id, browser = %config.browser_name, "Browser session started");
        session.session_id = Some(session_id);
        Ok(session)
    }

    fn session_url(&self, path: &str) -> Result<String, DriverError> {
        let id = self.session_id.as_ref().ok_or(DriverError::SessionClosed)?;
        Ok(format!("{}/session/{}{}", self.base_url, id, path))
    }

    fn send(&self, method: Method, url: &str, body: Option<Value>) -> Result<Value, DriverError> {
        let transport = |e| DriverError::Transport {
            endpoint: url.to_string(),
            source: e,
        };

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().map_err(transport)?;
        let status = response.status().as_u16();
        let payload: Value = response.json().map_err(transport)?;

        parse_response(status, payload)
    }

    fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, DriverError> {
        let url = self.session_url(path)?;
        self.send(method, &url, body)
    }

    fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, DriverError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
    }
}

impl UiDriver for WebDriverSession {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        debug!(url = %crate::sanitize::strip_query(url), "Navigating");
        self.command(Method::POST, "/url", Some(json!({ "url": url })))?;
        Ok(())
    }

    fn current_extent(&mut self) -> Result<u64, DriverError> {
        let value = self.execute("return document.body.scrollHeight;", vec![])?;
        value
            .as_f64()
            .map(|h| h.max(0.0) as u64)
            .ok_or_else(|| DriverError::InvalidResponse(format!("scrollHeight was {}", value)))
    }

    fn scroll_to_bottom(&mut self) -> Result<(), DriverError> {
        self.execute("window.scrollTo(0, document.body.scrollHeight);", vec![])?;
        Ok(())
    }

    fn scroll_to_top(&mut self) -> Result<(), DriverError> {
        self.execute("window.scrollTo(0, 0);", vec![])?;
        Ok(())
    }

    fn scroll_to_fraction(&mut self, fraction: f64) -> Result<(), DriverError> {
        self.execute(
            "window.scrollTo(0, document.body.scrollHeight * arguments[0]);",
            vec![json!(fraction.clamp(0.0, 1.0))],
        )?;
        Ok(())
    }

    fn find(&mut self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError> {
        let value = self.command(
            Method::POST,
            "/elements",
            Some(json!({ "using": locator.strategy(), "value": locator.value() })),
        )?;
        element_refs(value)
    }

    fn find_within(
        &mut self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>, DriverError> {
        let value = self.command(
            Method::POST,
            &format!("/element/{}/elements", parent.id()),
            Some(json!({ "using": locator.strategy(), "value": locator.value() })),
        )?;
        element_refs(value)
    }

    fn click(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        // Script click sidesteps overlays that intercept native clicks.
        self.execute(
            "arguments[0].scrollIntoView({block: 'center'}); arguments[0].click();",
            vec![element_arg(element)],
        )?;
        Ok(())
    }

    fn type_text(&mut self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        self.command(
            Method::POST,
            &format!("/element/{}/value", element.id()),
            Some(json!({ "text": text })),
        )?;
        Ok(())
    }

    fn text(&mut self, element: &ElementRef) -> Result<String, DriverError> {
        let value = self.command(Method::GET, &format!("/element/{}/text", element.id()), None)?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn attribute(
        &mut self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let value = self.command(
            Method::GET,
            &format!("/element/{}/attribute/{}", element.id(), name),
            None,
        )?;
        Ok(value.as_str().map(String::from))
    }

    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn quit(&mut self) -> Result<(), DriverError> {
        let url = self.session_url("")?;
        self.session_id = None;
        self.send(Method::DELETE, &url, None)?;
        Ok(())
    }
}

fn capabilities(config: &WebDriverConfig) -> Value {
    let mut args = config.args.clone();
    if config.headless {
        args.push("--headless=new".to_string());
    }
    if let Some(dir) = &config.user_data_dir {
        args.push(format!("--user-data-dir={}", dir));
    }

    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": config.browser_name,
                "goog:chromeOptions": {
                    "args": args,
                    "excludeSwitches": ["enable-automation"],
                    "useAutomationExtension": false,
                }
            }
        }
    })
}

/// Unwraps the protocol's `{"value": ...}` envelope, mapping error payloads.
fn parse_response(status: u16, mut payload: Value) -> Result<Value, DriverError> {
    let value = payload.get_mut("value").map(Value::take).unwrap_or(Value::Null);

    if (200..300).contains(&status) {
        return Ok(value);
    }

    let error = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if error == "stale element reference" {
        return Err(DriverError::StaleElement(message));
    }

    Err(DriverError::Command {
        status,
        error,
        message,
    })
}

fn element_refs(value: Value) -> Result<Vec<ElementRef>, DriverError> {
    let Value::Array(items) = value else {
        return Err(DriverError::InvalidResponse(format!(
            "expected element list, got {}",
            value
        )));
    };

    items
        .iter()
        .map(|item| {
            item.get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(ElementRef::new)
                .ok_or_else(|| DriverError::InvalidResponse(format!("not an element: {}", item)))
        })
        .collect()
}

fn element_arg(element: &ElementRef) -> Value {
    json!({ ELEMENT_KEY: element.id() })
}
