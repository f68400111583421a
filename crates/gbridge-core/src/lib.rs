//! gbridge Core - Domain model and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `FileItem`, `CopyPlan`, `SyncReport`, `RichTextOp`, `Document`, `Envelope`
//! - **Port definitions** - Traits for adapters: `IRemoteFileStore`, `IDocumentService`,
//!   `ITokenStore`, `IOAuthBackend`
//! - **Configuration** - YAML configuration with defaults and validation
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure data types with no I/O.
//! Ports define trait interfaces that adapter crates implement; the sync
//! engine and the markdown codec are written against these ports only.

pub mod config;
pub mod domain;
pub mod ports;
