//! XML-RPC plumbing: value model, wire codec and transports.
//!
//! ```text
//! ┌──────────────┐  encode_call   ┌───────────────┐   POST text/xml   ┌──────────┐
//! │    Client    │ ─────────────▶ │ HttpTransport │ ────────────────▶ │  server  │
//! │ (envelope)   │ ◀───────────── │ MockTransport │ ◀──────────────── │          │
//! └──────────────┘ decode_response└───────────────┘                   └──────────┘
//! ```

pub mod codec;
mod mock;
mod transport;
mod value;

pub use mock::{MockTransport, RecordedCall};
pub use transport::{HttpTransport, Transport};
pub use value::Value;
