//! The call envelope shared by every façade.
//!
//! Every remote procedure takes the session token as its first positional
//! argument and answers with an array whose first element is a success
//! flag:
//!
//! ```text
//! success:  [true,  payload, 0, ...]
//! failure:  [false, message, code]
//! failure:  [false, message, code, offending_object_id]
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, RemoteError, Result};
use crate::rpc::{HttpTransport, Transport, Value};

/// Authenticated handle on the control plane.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct Client {
    token: String,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Create a client over an existing transport.
    pub fn new(token: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            token: token.into(),
            transport,
        }
    }

    /// Create an HTTP client from configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let token = config.token()?;
        let transport = HttpTransport::new(config.endpoint.clone(), config.timeout())?;
        Ok(Self::new(token, Arc::new(transport)))
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    /// Invoke `method` with the session token prepended to `args`.
    ///
    /// Remote failures are decoded into [`ClientError::Remote`]; transport
    /// failures are returned unchanged.
    #[instrument(skip(self, args), fields(method = %method))]
    pub async fn call(&self, method: &str, args: Vec<Value>) -> Result<CallResult> {
        let mut params = Vec::with_capacity(args.len() + 1);
        params.push(Value::String(self.token.clone()));
        params.extend(args);

        let raw = match self.transport.call(method, &params).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, endpoint = %self.endpoint(), "XML-RPC transport failure");
                return Err(e);
            }
        };

        let result = CallResult::decode(raw);
        match &result {
            Ok(_) => debug!("Remote call succeeded"),
            Err(ClientError::Remote(err)) => debug!(
                code = err.code,
                object_id = ?err.object_id,
                message = %err.message,
                "Remote call failed"
            ),
            Err(e) => warn!(error = %e, "Malformed result array"),
        }
        result
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint())
            .finish_non_exhaustive()
    }
}

/// A successful result array, kept exactly as the server sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResult {
    values: Vec<Value>,
}

impl CallResult {
    /// Decode a raw result value.
    pub fn decode(raw: Value) -> Result<Self> {
        let values = match raw {
            Value::Array(values) => values,
            other => {
                return Err(ClientError::InvalidResponse(format!(
                    "expected a result array, got {}",
                    other.type_name()
                )))
            }
        };

        let success = values.first().and_then(Value::as_bool).ok_or_else(|| {
            ClientError::InvalidResponse("first element is not a boolean success flag".to_string())
        })?;

        if success {
            return Ok(Self { values });
        }

        if values.len() < 3 {
            return Err(ClientError::InvalidResponse(format!(
                "failure result has {} elements, expected 3 or 4",
                values.len()
            )));
        }

        let message = values[1].as_str().ok_or_else(|| {
            ClientError::InvalidResponse(format!(
                "failure message is {}, expected string",
                values[1].type_name()
            ))
        })?;
        let code = values[2].as_i32().ok_or_else(|| {
            ClientError::InvalidResponse(format!(
                "error code is {}, expected int",
                values[2].type_name()
            ))
        })?;
        let object_id = match values.get(3) {
            Some(value) => Some(value.as_i32().ok_or_else(|| {
                ClientError::InvalidResponse(format!(
                    "offending object id is {}, expected int",
                    value.type_name()
                ))
            })?),
            None => None,
        };

        Err(ClientError::Remote(RemoteError {
            message: message.to_string(),
            code,
            object_id,
        }))
    }

    /// The full result array.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// The payload (index 1).
    pub fn payload(&self) -> Result<&Value> {
        self.values.get(1).ok_or_else(|| {
            ClientError::InvalidResponse("successful result carries no payload".to_string())
        })
    }

    /// The payload as text, usually an XML document.
    pub fn body(&self) -> Result<&str> {
        let payload = self.payload()?;
        payload.as_str().ok_or_else(|| {
            ClientError::InvalidResponse(format!(
                "payload is {}, expected string",
                payload.type_name()
            ))
        })
    }

    /// The payload as an object ID.
    pub fn id(&self) -> Result<i32> {
        let payload = self.payload()?;
        payload.as_i32().ok_or_else(|| {
            ClientError::InvalidResponse(format!(
                "payload is {}, expected int",
                payload.type_name()
            ))
        })
    }
}
