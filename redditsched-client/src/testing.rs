//! In-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use redditsched_core::TransportError;
use serde_json::Value;

use crate::transport::{ApiRequest, ApiResponse, Transport};

/// What the transport saw for one request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SentRequest {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

/// Replays queued outcomes in order and records every request.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Result<ApiResponse, TransportError>>>>,
    sent: Arc<Mutex<Vec<SentRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(ApiResponse::new(status, body)));
    }

    pub fn push_error(&self, error: TransportError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.sent.lock().unwrap().push(SentRequest {
            method: request.method.to_string(),
            path: request.path.clone(),
            body: request.body.clone(),
            bearer: request
                .authorization()
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        });

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("script exhausted".to_string())))
    }
}
