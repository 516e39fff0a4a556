//! External suggestion command handler

use anyhow::Result;

use quotebook_core::ExternalQuery;

use super::quote::report_saved;
use super::{failed, Controller};
use crate::output::Output;

/// Build the lookup from the `--author` / `--text` flags
pub fn query_from_flags(author: Option<String>, text: Option<String>) -> ExternalQuery {
    let author = author.filter(|a| !a.trim().is_empty());
    let text = text.filter(|t| !t.trim().is_empty());
    match (author, text) {
        (Some(author), _) => ExternalQuery::ByAuthor(author.trim().to_string()),
        (None, Some(text)) => ExternalQuery::ByText(text.trim().to_string()),
        (None, None) => ExternalQuery::Any,
    }
}

/// Fetch a suggestion, optionally adding it to the catalog
pub async fn fetch(
    controller: &Controller,
    query: ExternalQuery,
    adopt: bool,
    output: &Output,
) -> Result<()> {
    controller.fetch_external(query).await.map_err(failed)?;

    let state = controller.snapshot();
    let Some(suggestion) = state.suggestion else {
        if let Some(notice) = state.notice.as_deref() {
            output.message(notice);
        }
        return Ok(());
    };

    output.print_suggestion(&suggestion)?;

    if adopt {
        if let Some(saved) = controller.adopt_suggestion().await.map_err(failed)? {
            report_saved(controller, &saved, output)?;
        }
    }

    Ok(())
}
