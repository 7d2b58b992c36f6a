//! # nebula-client
//!
//! Typed client for an XML-RPC virtualization control plane exposing
//! `one.<resource>.<verb>` procedures.
//!
//! The crate is layered so every resource kind shares one call path:
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Service<K>  (clusters(), vms(), images() ...)    │
//! │  info / delete / update / chmod / chown / list / ...    │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │ four shapes
//!                             ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │  Client::call   token first, result array decoded       │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │
//!         ┌───────────────────┴──────────────────┐
//!         ▼                                      ▼
//! ┌───────────────────┐                ┌───────────────────┐
//! │   HttpTransport   │                │   MockTransport   │
//! │ (reqwest, XML-RPC)│                │   (scripted)      │
//! └───────────────────┘                └───────────────────┘
//! ```
//!
//! Responses are wrapped in immutable [`Resource`] envelopes; typed
//! envelopes such as [`Vm`] or [`Host`] add state and membership accessors.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nebula_client::{Client, ClientConfig, OwnershipFilter, Page, VmAction};
//!
//! #[tokio::main]
//! async fn main() -> nebula_client::Result<()> {
//!     let client = Client::from_config(&ClientConfig::from_env())?;
//!
//!     let cluster = client.clusters().allocate("my_cluster").await?;
//!     println!("created cluster {}", cluster.id()?);
//!
//!     for vm in client.vms().list(OwnershipFilter::User, Page::new(1, 20)).await? {
//!         if vm.name().starts_with("scratch-") {
//!             client.vms().action(&vm, VmAction::TerminateHard).await?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod permissions;
pub mod request;
pub mod resource;
pub mod rpc;
pub mod service;
pub mod template;
mod xml;

pub use client::{CallResult, Client};
pub use config::ClientConfig;
pub use error::{ClientError, RemoteError, RemoteErrorKind, Result};
pub use filter::{OwnershipFilter, Page, PoolFilter, VmStateFilter};
pub use permissions::{Capability, PermissionMatrix, Permissions, Subject, TriState};
pub use request::{OwnershipRequest, ResizeRequest, UpdateKind};
pub use resource::{LockLevel, Resource, NO_OBJECT};
pub use rpc::{HttpTransport, MockTransport, Transport, Value};
pub use service::*;
pub use template::{Blueprint, Template};
pub use xml::XmlNode;
