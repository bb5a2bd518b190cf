use crate::error::ConfigError;
use crate::render::{default_rules, payload_text, HighlightRule, Transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_EVENT_NAME: &str = "message";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;

/// How a widget receives its payloads. Chosen once, when the widget is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Event,
    Polling,
    /// Push over a socket. Accepted, but no messages are ever delivered.
    Socket,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Event => "event",
            Mode::Polling => "polling",
            Mode::Socket => "socket",
        }
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "event" => Ok(Mode::Event),
            "polling" => Ok(Mode::Polling),
            "socket" => Ok(Mode::Socket),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

fn default_method() -> String {
    "GET".to_string()
}

/// A full request descriptor, passed to the HTTP client as-is.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestOptions {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl RequestOptions {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: BTreeMap::new(),
            body: None,
            timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Endpoint {
    /// Plain `GET`, body read as text.
    Url(String),
    Request(RequestOptions),
}

impl Endpoint {
    pub fn request(&self) -> RequestOptions {
        match self {
            Endpoint::Url(url) => RequestOptions::get(url.clone()),
            Endpoint::Request(options) => options.clone(),
        }
    }
}

impl From<&str> for Endpoint {
    fn from(url: &str) -> Self {
        Endpoint::Url(url.to_string())
    }
}

impl From<String> for Endpoint {
    fn from(url: String) -> Self {
        Endpoint::Url(url)
    }
}

impl From<RequestOptions> for Endpoint {
    fn from(options: RequestOptions) -> Self {
        Endpoint::Request(options)
    }
}

#[derive(Clone)]
pub struct Configuration {
    pub mode: Mode,
    pub event_name: String,
    pub poll_interval_ms: u64,
    pub endpoint: Option<Endpoint>,
    pub transform: Transform,
    pub highlight_rules: Vec<HighlightRule>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            mode: Mode::Event,
            event_name: DEFAULT_EVENT_NAME.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            endpoint: None,
            transform: Arc::new(payload_text),
            highlight_rules: default_rules(),
        }
    }
}

impl Configuration {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Rejects configurations that could only fail once delivery starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == Mode::Polling {
            let endpoint = self.endpoint.as_ref().ok_or(ConfigError::MissingEndpoint)?;
            if self.poll_interval_ms == 0 {
                return Err(ConfigError::ZeroInterval);
            }
            if let Endpoint::Request(options) = endpoint {
                reqwest::Method::from_bytes(options.method.as_bytes())
                    .map_err(|_| ConfigError::InvalidMethod(options.method.clone()))?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("mode", &self.mode)
            .field("event_name", &self.event_name)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("endpoint", &self.endpoint)
            .field("highlight_rules", &self.highlight_rules)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.mode == other.mode
            && self.event_name == other.event_name
            && self.poll_interval_ms == other.poll_interval_ms
            && self.endpoint == other.endpoint
            && Arc::ptr_eq(&self.transform, &other.transform)
            && self.highlight_rules == other.highlight_rules
    }
}

/// A partial configuration. Present fields win over the configuration they
/// are merged into.
#[derive(Clone, Default, Deserialize)]
pub struct Overrides {
    pub mode: Option<Mode>,
    pub event_name: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub endpoint: Option<Endpoint>,
    pub highlight_rules: Option<Vec<HighlightRule>>,
    #[serde(skip)]
    pub transform: Option<Transform>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn event_name(mut self, name: impl Into<String>) -> Self {
        self.event_name = Some(name.into());
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = Some(ms);
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<Endpoint>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn highlight_rules(mut self, rules: Vec<HighlightRule>) -> Self {
        self.highlight_rules = Some(rules);
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Shallow merge: every field set in `later` replaces the one in `self`.
    pub fn merge(self, later: Overrides) -> Overrides {
        Overrides {
            mode: later.mode.or(self.mode),
            event_name: later.event_name.or(self.event_name),
            poll_interval_ms: later.poll_interval_ms.or(self.poll_interval_ms),
            endpoint: later.endpoint.or(self.endpoint),
            highlight_rules: later.highlight_rules.or(self.highlight_rules),
            transform: later.transform.or(self.transform),
        }
    }
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field("mode", &self.mode)
            .field("event_name", &self.event_name)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("endpoint", &self.endpoint)
            .field("highlight_rules", &self.highlight_rules)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Overlays `overrides` onto `existing`, or onto the defaults when there is
/// no existing configuration yet.
pub fn configure(existing: Option<&Configuration>, overrides: Overrides) -> Configuration {
    let base = existing.cloned().unwrap_or_default();
    Configuration {
        mode: overrides.mode.unwrap_or(base.mode),
        event_name: overrides.event_name.unwrap_or(base.event_name),
        poll_interval_ms: overrides.poll_interval_ms.unwrap_or(base.poll_interval_ms),
        endpoint: overrides.endpoint.or(base.endpoint),
        transform: overrides.transform.unwrap_or(base.transform),
        highlight_rules: overrides.highlight_rules.unwrap_or(base.highlight_rules),
    }
}
