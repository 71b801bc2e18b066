//! # MockMate (interview practice client)
//!
//! `mockmate` drives the account workflow of the MockMate practice service and
//! the screens that sit behind it: the interview dashboard, interview setup and
//! the profile editor.
//!
//! ## Credential submission
//!
//! A submission is validated locally, then exchanged with the identity provider,
//! staged files are uploaded under `users/{account}/{kind}/{file}`, and finally
//! the backend relay establishes the application session. Account creation
//! always precedes uploads, and uploads always precede the relay call.
//!
//! External collaborators (identity provider, object storage, backend relay and
//! record store) sit behind async traits; the `client` module holds the HTTP
//! adapters used by the `mockmate` binary.

pub mod cli;
pub mod mockmate;
