//! Quote command handlers

use anyhow::{bail, Result};

use quotebook_core::{Quote, QuoteId};

use super::{failed, Controller};
use crate::output::Output;
use crate::prompt::confirm;

/// List the whole catalog
pub async fn list(controller: &Controller, output: &Output) -> Result<()> {
    controller.reload_catalog().await.map_err(failed)?;
    output.print_quotes(&controller.snapshot().quotes)
}

/// Show one random quote
pub async fn random(controller: &Controller, output: &Output) -> Result<()> {
    controller.refresh_random().await.map_err(failed)?;
    match controller.snapshot().random {
        Some(quote) => output.print_quote(&quote),
        None => bail!("The service returned no quote"),
    }
}

/// Search by text or author
pub async fn search(controller: &Controller, term: String, output: &Output) -> Result<()> {
    controller.search(&term).await.map_err(failed)?;
    output.print_quotes(&controller.snapshot().quotes)
}

/// Add a new quote
pub async fn add(
    controller: &Controller,
    text: String,
    author: String,
    output: &Output,
) -> Result<()> {
    controller.toggle_form();
    controller.set_draft_text(&text);
    controller.set_draft_author(&author);
    let saved = controller.submit_form().await.map_err(failed)?;

    report_saved(controller, &saved, output)
}

/// Change the text and/or author of a quote
pub async fn edit(
    controller: &Controller,
    id: QuoteId,
    text: Option<String>,
    author: Option<String>,
    output: &Output,
) -> Result<()> {
    if text.is_none() && author.is_none() {
        bail!("Nothing to change. Pass --text and/or --author.");
    }

    controller.reload_catalog().await.map_err(failed)?;
    controller.begin_edit(id).map_err(failed)?;
    if let Some(ref text) = text {
        controller.set_draft_text(text);
    }
    if let Some(ref author) = author {
        controller.set_draft_author(author);
    }

    let saved = controller.submit_form().await.map_err(failed)?;

    report_saved(controller, &saved, output)
}

/// Delete a quote
pub async fn delete(
    controller: &Controller,
    id: QuoteId,
    yes: bool,
    output: &Output,
) -> Result<()> {
    if output.should_prompt() && !yes {
        controller.reload_catalog().await.map_err(failed)?;
        let state = controller.snapshot();
        let Some(quote) = state.quote(id) else {
            bail!("Quote not found: {}", id);
        };

        println!("Delete quote {}: \"{}\" - {}", quote.id, quote.text, quote.author);
        if !confirm("Are you sure?")? {
            println!("Cancelled. Pass --yes to delete without asking.");
            return Ok(());
        }
    }

    controller.delete(id).await.map_err(failed)?;
    output.success(&format!("Deleted quote: {}", id));
    Ok(())
}

/// Print the saved quote as it came back from the catalog
pub(super) fn report_saved(controller: &Controller, saved: &Quote, output: &Output) -> Result<()> {
    if let Some(notice) = controller.snapshot().notice.as_deref() {
        output.success(notice);
    }
    output.print_quote(saved)
}
