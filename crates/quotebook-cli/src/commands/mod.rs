//! Command handlers

pub mod config;
pub mod external;
pub mod quote;

use quotebook_core::{Failure, HttpQuoteRepository, SyncController};

/// Controller used by one-shot commands
pub type Controller = SyncController<HttpQuoteRepository>;

/// Turn a recorded failure into the error shown on exit
pub fn failed(failure: Failure) -> anyhow::Error {
    let message = failure.user_message();
    anyhow::Error::new(failure.source).context(message)
}
