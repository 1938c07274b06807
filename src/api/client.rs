use super::stream::{decode_record, StreamParser};
use crate::config::Config;
use crate::logging::emit_debug_payload;
use crate::runtime::StreamEvent;
use crate::types::ApiMessage;
use crate::util::is_local_endpoint_url;
use anyhow::{anyhow, bail, Context, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Supplies canned response bodies in place of the HTTP transport.
pub trait MockStreamProducer: Send + Sync {
    fn create_mock_stream(&self, messages: &[ApiMessage]) -> Result<ByteStream>;
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    stream: bool,
    messages: &'a [ApiMessage],
}

enum Forwarded {
    Complete,
    Abandoned,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_url: String,
    anthropic_version: String,
    max_tokens: u32,
    read_timeout: Duration,
    debug_payload: bool,
    mock_stream_producer: Option<Arc<dyn MockStreamProducer>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .context("ANTHROPIC_API_KEY is not set")?;
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            api_key,
            model: config.model.clone(),
            api_url: config.api_url.clone(),
            anthropic_version: config.anthropic_version.clone(),
            max_tokens: config.max_tokens,
            read_timeout: config.read_timeout,
            debug_payload: config.debug_payload,
            mock_stream_producer: None,
        })
    }

    pub fn new_mock(mock_producer: Arc<dyn MockStreamProducer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: "mock-key".to_string(),
            model: "mock-model".to_string(),
            api_url: "http://localhost:8000/v1/messages".to_string(),
            anthropic_version: "2023-06-01".to_string(),
            max_tokens: 1024,
            read_timeout: Duration::from_secs(5),
            debug_payload: false,
            mock_stream_producer: Some(mock_producer),
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Runs one request and reports it as stream events.
    ///
    /// Zero or more `Delta`s are followed by exactly one `Done` or `Failed`.
    /// Nothing more is sent once the receiver has gone away.
    pub async fn send(&self, messages: &[ApiMessage], events: &mpsc::UnboundedSender<StreamEvent>) {
        let terminal = match self.forward_stream(messages, events).await {
            Ok(Forwarded::Complete) => StreamEvent::Done,
            Ok(Forwarded::Abandoned) => {
                tracing::debug!("stream receiver dropped, abandoning request");
                return;
            }
            Err(error) => {
                let reason = format!("{error:#}");
                tracing::warn!(%reason, "completion request failed");
                StreamEvent::Failed(reason)
            }
        };
        let _ = events.send(terminal);
    }

    async fn forward_stream(
        &self,
        messages: &[ApiMessage],
        events: &mpsc::UnboundedSender<StreamEvent>,
    ) -> Result<Forwarded> {
        let mut stream = self.create_stream(messages).await?;
        let mut parser = StreamParser::new();
        let mut deltas = 0usize;

        loop {
            let next = tokio::time::timeout(self.read_timeout, stream.next())
                .await
                .map_err(|_| anyhow!("no data received for {:?}", self.read_timeout))?;
            let Some(chunk) = next else {
                break;
            };
            parser.push(&chunk?);
            while let Some(record) = parser.next_record()? {
                if !emit_record(&record, events, &mut deltas)? {
                    return Ok(Forwarded::Abandoned);
                }
            }
        }

        if let Some(record) = parser.finish()? {
            if !emit_record(&record, events, &mut deltas)? {
                return Ok(Forwarded::Abandoned);
            }
        }

        tracing::info!(deltas, "stream complete");
        Ok(Forwarded::Complete)
    }

    pub async fn create_stream(&self, messages: &[ApiMessage]) -> Result<ByteStream> {
        if let Some(producer) = &self.mock_stream_producer {
            return producer.create_mock_stream(messages);
        }

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            stream: true,
            messages,
        };
        let body = serde_json::to_vec(&request).context("failed to encode request payload")?;

        if self.debug_payload {
            if let Ok(payload) = serde_json::to_value(&request) {
                emit_debug_payload(&self.api_url, &payload);
            }
        }

        tracing::info!(
            url = %self.api_url,
            model = %self.model,
            messages = messages.len(),
            "sending completion request"
        );

        let pending = self
            .http
            .post(&self.api_url)
            .header("content-type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.anthropic_version)
            .body(body)
            .send();
        let response = tokio::time::timeout(self.read_timeout, pending)
            .await
            .map_err(|_| {
                anyhow!(
                    "no response from '{}' within {:?}",
                    self.api_url,
                    self.read_timeout
                )
            })?
            .map_err(|error| map_api_request_error(error, &self.api_url))?;

        let status = response.status();
        tracing::debug!(%status, "response headers received");
        if !status.is_success() {
            let body = tokio::time::timeout(self.read_timeout, response.text())
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default();
            if body.trim().is_empty() {
                bail!("API endpoint '{}' returned HTTP {}", self.api_url, status);
            }
            bail!("{body}");
        }

        let request_url = self.api_url.clone();
        let stream = response
            .bytes_stream()
            .map(move |item| item.map_err(|error| map_api_request_error(error, &request_url)));
        Ok(Box::pin(stream))
    }
}

fn emit_record(
    record: &str,
    events: &mpsc::UnboundedSender<StreamEvent>,
    deltas: &mut usize,
) -> Result<bool> {
    match decode_record(record)? {
        Some(text) => {
            *deltas += 1;
            Ok(events.send(StreamEvent::Delta(text)).is_ok())
        }
        None => Ok(!events.is_closed()),
    }
}

fn map_api_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return anyhow!(
            "cannot reach local API endpoint '{}': {}. Start your local server or update ANTHROPIC_API_URL.",
            request_url,
            error
        );
    }
    if error.is_connect() {
        return anyhow!("cannot reach API endpoint '{}': {}", request_url, error);
    }
    if error.is_timeout() {
        return anyhow!("API request to '{}' timed out: {}", request_url, error);
    }
    if error.is_body() || error.is_decode() {
        return anyhow!("response stream from '{}' broke: {}", request_url, error);
    }
    anyhow!("API request to '{}' failed: {}", request_url, error)
}
