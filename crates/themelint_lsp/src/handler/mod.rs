//! LSP request/notification handlers.
//!
//! Handlers are generic over the diagnostics publisher so tests can drive
//! them without a client connection.

mod documents;
mod files;
mod initialize;
mod links;

pub use documents::{handle_did_change, handle_did_close, handle_did_open};
pub use files::{
    handle_did_change_watched_files, handle_did_create_files, handle_did_delete_files,
    handle_did_rename_files,
};
pub use initialize::{handle_initialize, handle_initialized, handle_shutdown};
pub use links::handle_document_link;
