use crate::api::client::{ByteStream, MockStreamProducer};
use crate::types::ApiMessage;
use anyhow::{anyhow, Result};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Scripted body for one request.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Body delivered as these chunks, then end of stream.
    Chunks(Vec<String>),
    /// Body delivered as these chunks, then no further bytes ever.
    Stalled(Vec<String>),
    /// Chunks followed by a transport error.
    Broken { chunks: Vec<String>, reason: String },
    /// Non-success status; the string is the response body.
    Rejected(String),
}

impl MockResponse {
    /// Messages API event stream carrying one text delta per entry.
    pub fn text_deltas(parts: &[&str]) -> Self {
        let mut chunks = vec![
            "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_mock\",\"model\":\"mock-model\"}}\n\n".to_string(),
            "event: content_block_start\ndata: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n\n".to_string(),
        ];
        for part in parts {
            let data = serde_json::json!({
                "type": "content_block_delta",
                "index": 0,
                "delta": {"type": "text_delta", "text": part},
            });
            chunks.push(format!("event: content_block_delta\ndata: {data}\n\n"));
        }
        chunks.push(
            "event: content_block_stop\ndata: {\"type\":\"content_block_stop\",\"index\":0}\n\n"
                .to_string(),
        );
        chunks.push("event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n".to_string());
        Self::Chunks(chunks)
    }
}

#[derive(Clone, Default)]
pub struct MockApiClient {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    requests: Arc<Mutex<Vec<Vec<ApiMessage>>>>,
}

impl MockApiClient {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push_response(&self, response: MockResponse) {
        lock(&self.responses).push_back(response);
    }

    /// Message histories received so far, one entry per request.
    pub fn requests(&self) -> Vec<Vec<ApiMessage>> {
        lock(&self.requests).clone()
    }
}

impl MockStreamProducer for MockApiClient {
    fn create_mock_stream(&self, messages: &[ApiMessage]) -> Result<ByteStream> {
        lock(&self.requests).push(messages.to_vec());
        let response = lock(&self.responses)
            .pop_front()
            .ok_or_else(|| anyhow!("MockApiClient: No more responses configured"))?;

        let body = |chunks: Vec<String>| {
            stream::iter(
                chunks
                    .into_iter()
                    .map(|chunk| Ok::<_, anyhow::Error>(Bytes::from(chunk))),
            )
        };

        match response {
            MockResponse::Chunks(chunks) => Ok(Box::pin(body(chunks))),
            MockResponse::Stalled(chunks) => Ok(Box::pin(body(chunks).chain(stream::pending()))),
            MockResponse::Broken { chunks, reason } => Ok(Box::pin(
                body(chunks).chain(stream::once(async move { Err(anyhow!(reason)) })),
            )),
            MockResponse::Rejected(body) => Err(anyhow!(body)),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
