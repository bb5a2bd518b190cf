use crate::config::RequestOptions;
use crate::error::DeliveryError;
use async_trait::async_trait;
use futures_util::stream::Stream;
use reqwest::{Method, Url};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<String, DeliveryError>> + Send>>;

/// Issues one polling request and returns the response body as text.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &RequestOptions) -> Result<String, DeliveryError>;

    /// Rejects requests that could never be sent. Runs before polling starts.
    fn check(&self, _request: &RequestOptions) -> Result<(), DeliveryError> {
        Ok(())
    }
}

pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: None,
        }
    }

    /// Relative endpoints such as `/log` are resolved against `base_url`.
    pub fn with_base_url(base_url: &str) -> Result<Self, DeliveryError> {
        let base = Url::parse(base_url)
            .map_err(|e| DeliveryError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: Some(base),
        })
    }

    fn resolve(&self, url: &str) -> Result<Url, DeliveryError> {
        let resolved = match &self.base_url {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        resolved.map_err(|e| DeliveryError::InvalidUrl(format!("{}: {}", url, e)))
    }

    fn method(request: &RequestOptions) -> Result<Method, DeliveryError> {
        Method::from_bytes(request.method.as_bytes())
            .map_err(|_| DeliveryError::InvalidMethod(request.method.clone()))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &RequestOptions) -> Result<String, DeliveryError> {
        let url = self.resolve(&request.url)?;
        let method = Self::method(request)?;

        let mut builder = self.client.request(method, url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(ms) = request.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    fn check(&self, request: &RequestOptions) -> Result<(), DeliveryError> {
        self.resolve(&request.url)?;
        Self::method(request)?;
        Ok(())
    }
}

/// Fires `request` every `period`, starting one period from now, and yields
/// responses in the order they arrive.
///
/// A tick never waits for earlier requests. Dropping the stream aborts every
/// request still in flight.
pub fn poll_responses(
    fetcher: Arc<dyn Fetcher>,
    request: RequestOptions,
    period: Duration,
) -> ResponseStream {
    Box::pin(async_stream::stream! {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight = JoinSet::new();

        loop {
            let finished = tokio::select! {
                _ = ticker.tick() => {
                    debug!(url = %request.url, method = %request.method, "Issuing poll request");
                    let fetcher = fetcher.clone();
                    let request = request.clone();
                    in_flight.spawn(async move { fetcher.fetch(&request).await });
                    None
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => Some(joined),
            };

            if let Some(joined) = finished {
                yield joined.unwrap_or_else(|e| Err(DeliveryError::Task(e.to_string())));
            }
        }
    })
}

/// The delivery mechanism a widget was attached with.
pub enum Adapter {
    Event { event_name: String },
    Polling { task: JoinHandle<Result<(), DeliveryError>> },
    Socket,
}

impl Adapter {
    pub fn listens_for(&self, event: &str) -> bool {
        matches!(self, Adapter::Event { event_name } if event_name == event)
    }

    pub fn is_polling(&self) -> bool {
        matches!(self, Adapter::Polling { task } if !task.is_finished())
    }

    /// Stops delivery without waiting for the polling loop.
    pub fn abort(&self) {
        if let Adapter::Polling { task } = self {
            task.abort();
        }
    }

    /// Stops delivery. A polling loop that already died reports its error.
    pub async fn stop(self) -> Result<(), DeliveryError> {
        match self {
            Adapter::Polling { task } if task.is_finished() => task
                .await
                .unwrap_or_else(|e| Err(DeliveryError::Task(e.to_string()))),
            Adapter::Polling { task } => {
                task.abort();
                Ok(())
            }
            Adapter::Event { .. } | Adapter::Socket => Ok(()),
        }
    }
}
