//! Integration tests for gbridge-google
//!
//! Uses wiremock to simulate the Drive, Docs and OAuth endpoints and
//! verifies end-to-end behavior of the file store, batch copies, the
//! document service and credential refresh.

mod common;

mod test_auth;
mod test_batch;
mod test_docs;
mod test_drive;
