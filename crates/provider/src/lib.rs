//! The metadata provider contract.
//!
//! The reading list never talks to the remote catalog directly: it goes
//! through a [`MetadataProvider`], which answers two questions (what is this
//! ISBN, and what matches this text) and reports failures through a small
//! [error taxonomy](error::ErrorKind) that callers forward rather than
//! interpret.

pub mod error;
pub mod provider;

pub use crate::provider::MetadataProvider;
use std::sync::Arc;

pub type ProviderHandle = Arc<dyn MetadataProvider + Send + Sync>;
