//! Lorekeep Cloud - remote backups for campaign data
//!
//! This crate mirrors the current campaign to a user-scoped bucket of a
//! Supabase-style object storage service:
//! - Upload, list, download, delete and restore remote backups
//! - Export a remote backup to a local file
//!
//! Every [`CloudMirror`] operation reports through [`CloudResponse`] so callers
//! can render failures inline.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod error;
pub mod mirror;
pub mod naming;
pub mod response;
pub mod store;

pub use config::{CloudConfig, Session, DEFAULT_BUCKET};
pub use error::CloudError;
pub use mirror::{CloudBackupMetadata, CloudMirror};
pub use response::CloudResponse;
pub use store::{HttpObjectStore, ObjectStore, RemoteObject};
