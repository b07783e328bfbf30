//! # vlcm-vapi
//!
//! REST bindings for the vSphere Lifecycle Manager (vLCM) automation API.
//!
//! ## Layout
//!
//! - [`rest`]: the HTTP collaborator. Builds resource URLs, attaches query
//!   parameters and issues a single request per call.
//! - [`depots`]: offline depots and depot content.
//! - [`clusters`]: cluster software drafts and their components.
//! - [`tasks`]: task status lookup and the completion poller used by every
//!   asynchronous (`vmw-task=true`) operation.
//!
//! Every manager is a thin proxy over [`rest::Client`]; none of them keeps
//! state between calls.

pub mod clusters;
pub mod depots;
mod error;
pub mod rest;
pub mod tasks;

pub use error::Error;
pub use rest::{Client, ClientConfig};
pub use tasks::WaitError;
