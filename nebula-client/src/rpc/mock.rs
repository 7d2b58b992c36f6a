//! Mock transport for testing and development.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use super::transport::Transport;
use super::value::Value;
use crate::error::{ClientError, Result};

/// A call observed by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub params: Vec<Value>,
}

enum Reply {
    Value(Value),
    TransportError(String),
}

/// In-memory transport with scripted replies.
///
/// Replies are queued per procedure name and consumed in order. A call
/// with no reply queued fails with a transport error. Every call,
/// answered or not, is recorded. Useful for:
/// - Unit and integration testing of façades
/// - Exercising error paths without a control plane
pub struct MockTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    /// Create a mock transport with nothing scripted.
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn push(&self, method: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(method.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Queue a raw result value.
    pub fn reply(&self, method: &str, result: Value) -> &Self {
        self.push(method, Reply::Value(result));
        self
    }

    /// Queue `[true, payload, 0]`.
    pub fn succeed(&self, method: &str, payload: impl Into<Value>) -> &Self {
        self.reply(
            method,
            Value::Array(vec![Value::Bool(true), payload.into(), Value::Int(0)]),
        )
    }

    /// Queue `[false, message, code]`.
    pub fn fail(&self, method: &str, message: &str, code: i32) -> &Self {
        self.reply(
            method,
            Value::Array(vec![Value::Bool(false), Value::from(message), Value::Int(code)]),
        )
    }

    /// Queue `[false, message, code, object_id]`.
    pub fn fail_on_object(&self, method: &str, message: &str, code: i32, object_id: i32) -> &Self {
        self.reply(
            method,
            Value::Array(vec![
                Value::Bool(false),
                Value::from(message),
                Value::Int(code),
                Value::Int(object_id),
            ]),
        )
    }

    /// Queue a transport-level failure.
    pub fn fail_transport(&self, method: &str, message: &str) -> &Self {
        self.push(method, Reply::TransportError(message.to_string()));
        self
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Calls received for one procedure.
    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, method: &str, params: &[Value]) -> Result<Value> {
        debug!(method = %method, "Mock XML-RPC call");

        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                method: method.to_string(),
                params: params.to_vec(),
            });

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(method)
            .and_then(VecDeque::pop_front);

        match reply {
            Some(Reply::Value(value)) => Ok(value),
            Some(Reply::TransportError(message)) => Err(ClientError::Transport(message)),
            None => Err(ClientError::Transport(format!(
                "no reply scripted for {}",
                method
            ))),
        }
    }

    fn endpoint(&self) -> &str {
        "mock://"
    }
}
