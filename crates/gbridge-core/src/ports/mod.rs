//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteFileStore`] - Hierarchical remote file store (folders, files, batched copies)
//! - [`IDocumentService`] - Rich text document edits and reads
//! - [`ITokenStore`] - Persistence of authorized user credentials
//! - [`IOAuthBackend`] - Token refresh and the silent and interactive sign-in flows

pub mod credentials;
pub mod document_service;
pub mod remote_file_store;

pub use credentials::{ClientSecrets, Credentials, IOAuthBackend, ITokenStore};
pub use document_service::IDocumentService;
pub use remote_file_store::{ChildFilter, ChildPage, CopiedFile, CopyCallback, IRemoteFileStore};
