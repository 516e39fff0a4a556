//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use anyhow::{Context, Result};
use serde::Serialize;

use quotebook_core::{ExternalSuggestion, Quote};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single quote
    pub fn print_quote(&self, quote: &Quote) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", quote.id);
                println!("Quote:   {}", quote.text);
                println!("Author:  {}", quote.author);
                if let Some(created) = quote.created_at {
                    println!("Added:   {}", created.format("%Y-%m-%d %H:%M"));
                }
            }
            OutputFormat::Json => print_json(quote)?,
            OutputFormat::Quiet => println!("{}", quote.id),
        }
        Ok(())
    }

    /// Print a list of quotes
    pub fn print_quotes(&self, quotes: &[Quote]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if quotes.is_empty() {
                    println!("No quotes found.");
                    return Ok(());
                }
                for quote in quotes {
                    println!("{}", quote_line(quote));
                }
                println!("\n{} quote(s)", quotes.len());
            }
            OutputFormat::Json => print_json(&quotes)?,
            OutputFormat::Quiet => {
                for quote in quotes {
                    println!("{}", quote.id);
                }
            }
        }
        Ok(())
    }

    /// Print a suggestion from the external source
    pub fn print_suggestion(&self, suggestion: &ExternalSuggestion) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("\"{}\"", suggestion.text);
                println!("    - {}", suggestion.author);
            }
            OutputFormat::Json => print_json(suggestion)?,
            OutputFormat::Quiet => println!("{}", suggestion.text),
        }
        Ok(())
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// One-line summary used in lists
fn quote_line(quote: &Quote) -> String {
    format!(
        "{:>5} | {} | {}",
        quote.id,
        truncate_line(&quote.text, 60),
        truncate(&quote.author, 25)
    )
}

/// Truncate a string to max characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
