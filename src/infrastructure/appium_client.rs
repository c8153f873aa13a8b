//! Appium Client
//!
//! Minimal W3C WebDriver client for an Appium server driving the DexScreener
//! Android app through UiAutomator2. Implements [`ScreenDriver`].

use crate::domain::errors::AutomationError;
use crate::domain::repositories::screen_driver::{
    AutomationResult, ElementHandle, Rect, ScreenDriver,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// W3C element reference key
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
/// Pre-W3C element reference key, still returned by some drivers
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// Session capabilities for the target device and app
#[derive(Debug, Clone)]
pub struct AppiumConfig {
    pub server_url: String,
    pub device_name: String,
    pub app_package: String,
    pub app_activity: String,
    pub request_timeout: Duration,
}

impl AppiumConfig {
    /// W3C `capabilities` payload for a new session
    pub fn capabilities(&self) -> Value {
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "platformName": "Android",
                    "appium:automationName": "UiAutomator2",
                    "appium:deviceName": self.device_name,
                    "appium:appPackage": self.app_package,
                    "appium:appActivity": self.app_activity,
                    "appium:noReset": true,
                    "appium:skipUnlock": true,
                    "appium:disableWindowAnimation": true,
                    "appium:uiautomator2ServerInstallTimeout": 60000,
                    "appium:ignoreHiddenApiPolicyError": true
                },
                "firstMatch": [{}]
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

/// Map a W3C error code to an automation error
pub fn classify_error(code: &str, message: &str) -> AutomationError {
    let detail = if message.is_empty() {
        code.to_string()
    } else {
        message.to_string()
    };
    match code {
        "stale element reference" => AutomationError::StaleElement(detail),
        "no such element" => AutomationError::NoSuchElement(detail),
        "invalid session id" | "session not created" => AutomationError::SessionLost(detail),
        _ => AutomationError::Protocol(format!("{}: {}", code, detail)),
    }
}

/// Element id from a W3C element reference object
pub fn element_id(reference: &Value) -> Option<String> {
    reference
        .get(ELEMENT_KEY)
        .or_else(|| reference.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Decode the base64 clipboard payload returned by Appium
pub fn decode_clipboard(payload: &str) -> AutomationResult<String> {
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| AutomationError::Protocol(format!("invalid clipboard payload: {}", e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Pointer actions for a straight one-finger swipe
pub fn swipe_actions(from: (i64, i64), to: (i64, i64), duration_millis: u64) -> Value {
    json!({
        "actions": [{
            "type": "pointer",
            "id": "finger1",
            "parameters": {"pointerType": "touch"},
            "actions": [
                {"type": "pointerMove", "duration": 0, "x": from.0, "y": from.1},
                {"type": "pointerDown", "button": 0},
                {"type": "pause", "duration": 100},
                {"type": "pointerMove", "duration": duration_millis, "x": to.0, "y": to.1},
                {"type": "pointerUp", "button": 0}
            ]
        }]
    })
}

fn transport(e: reqwest::Error) -> AutomationError {
    AutomationError::Transport(e.to_string())
}

/// An open Appium session
pub struct AppiumClient {
    client: Client,
    server_url: String,
    session_id: String,
}

impl AppiumClient {
    /// Open a session on the device and launch the app
    pub async fn connect(config: &AppiumConfig) -> AutomationResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(transport)?;
        let server_url = config.server_url.trim_end_matches('/').to_string();

        info!(
            "Opening Appium session on {} for device {}",
            server_url, config.device_name
        );
        let value = Self::send(
            &client,
            Method::POST,
            &format!("{}/session", server_url),
            Some(config.capabilities()),
        )
        .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AutomationError::Protocol("session response without sessionId".into()))?;
        info!("Appium session {} opened", session_id);

        Ok(Self {
            client,
            server_url,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Close the session; the app stays installed
    pub async fn quit(&self) -> AutomationResult<()> {
        let url = format!("{}/session/{}", self.server_url, self.session_id);
        Self::send(&self.client, Method::DELETE, &url, None).await?;
        info!("Appium session {} closed", self.session_id);
        Ok(())
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> AutomationResult<Value> {
        let url = format!("{}/session/{}{}", self.server_url, self.session_id, path);
        Self::send(&self.client, method, &url, body).await
    }

    async fn send(
        client: &Client,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> AutomationResult<Value> {
        debug!("{} {}", method, url);
        let mut request = client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let payload: Value = response.json().await.map_err(transport)?;
        let value = payload.get("value").cloned().unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(match serde_json::from_value::<WireError>(value) {
                Ok(wire) => classify_error(&wire.error, &wire.message),
                Err(_) => AutomationError::Protocol(format!("HTTP {} from {}", status, url)),
            });
        }

        Ok(value)
    }
}

#[async_trait]
impl ScreenDriver for AppiumClient {
    async fn find_elements(&self, xpath: &str) -> AutomationResult<Vec<ElementHandle>> {
        let value = self
            .command(
                Method::POST,
                "/elements",
                Some(json!({"using": "xpath", "value": xpath})),
            )
            .await?;

        let references = value
            .as_array()
            .ok_or_else(|| AutomationError::Protocol("elements response is not a list".into()))?;
        Ok(references
            .iter()
            .filter_map(element_id)
            .map(ElementHandle)
            .collect())
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> AutomationResult<Option<String>> {
        let value = self
            .command(
                Method::GET,
                &format!("/element/{}/attribute/{}", element.0, name),
                None,
            )
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn click(&self, element: &ElementHandle) -> AutomationResult<()> {
        self.command(
            Method::POST,
            &format!("/element/{}/click", element.0),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }

    async fn window_rect(&self) -> AutomationResult<Rect> {
        let value = self.command(Method::GET, "/window/rect", None).await?;
        let field = |name: &str| value.get(name).and_then(Value::as_f64).unwrap_or(0.0) as i64;
        Ok(Rect {
            x: field("x"),
            y: field("y"),
            width: field("width"),
            height: field("height"),
        })
    }

    async fn swipe(
        &self,
        from: (i64, i64),
        to: (i64, i64),
        duration_millis: u64,
    ) -> AutomationResult<()> {
        self.command(
            Method::POST,
            "/actions",
            Some(swipe_actions(from, to, duration_millis)),
        )
        .await?;
        if let Err(e) = self.command(Method::DELETE, "/actions", None).await {
            warn!("Failed to release pointer actions: {}", e);
        }
        Ok(())
    }

    async fn clipboard_text(&self) -> AutomationResult<String> {
        let value = self
            .command(
                Method::POST,
                "/appium/device/get_clipboard",
                Some(json!({"contentType": "plaintext"})),
            )
            .await?;
        match value.as_str() {
            Some(payload) => decode_clipboard(payload),
            None => Ok(String::new()),
        }
    }

    async fn set_clipboard_text(&self, text: &str) -> AutomationResult<()> {
        self.command(
            Method::POST,
            "/appium/device/set_clipboard",
            Some(json!({
                "content": STANDARD.encode(text.as_bytes()),
                "contentType": "plaintext"
            })),
        )
        .await?;
        Ok(())
    }

    async fn back(&self) -> AutomationResult<()> {
        self.command(Method::POST, "/back", Some(json!({}))).await?;
        Ok(())
    }
}
