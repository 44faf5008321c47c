// FILE: crates/cli/src/commands.rs

use anyhow::{Context, Result};
use bookshelf_catalog::{Catalog, CatalogError, CatalogResult, LoadStatus};
use bookshelf_core::{LoanStatus, Record};
use console::style;
use std::io::Write;

/// Add a new book to the catalog
pub fn add_book<W: Write>(
    catalog: &mut Catalog,
    id: i64,
    title: &str,
    author: &str,
    out: &mut W,
) -> Result<()> {
    let record = match Record::new(id, title.trim(), author.trim()) {
        Ok(record) => record,
        Err(e) => {
            writeln!(out, "{} {}", style("✗").red().bold(), e)?;
            return Ok(());
        }
    };

    let title = record.title().to_string();
    report(out, catalog.add(record), || {
        format!("Book added: {} (ID {})", title, id)
    })
}

/// List all books in the catalog
pub fn list_books<W: Write>(catalog: &Catalog, out: &mut W) -> Result<()> {
    if catalog.is_empty() {
        writeln!(out, "No books in the catalog. Use 'add' to create one.")?;
        return Ok(());
    }

    writeln!(out, "\n{} Books in Catalog", style(catalog.len()).bold().cyan())?;
    writeln!(out, "{}", "=".repeat(80))?;
    for record in catalog.list() {
        print_book_line(out, record)?;
    }

    Ok(())
}

/// Show a single book
pub fn show_book<W: Write>(catalog: &Catalog, id: i64, out: &mut W) -> Result<()> {
    match catalog.find(id) {
        Some(record) => print_book_line(out, record)?,
        None => writeln!(
            out,
            "{} {}",
            style("✗").red().bold(),
            CatalogError::NotFound(id.into())
        )?,
    }
    Ok(())
}

/// Mark a book as borrowed
pub fn borrow_book<W: Write>(catalog: &mut Catalog, id: i64, out: &mut W) -> Result<()> {
    let result = catalog.borrow_item(id);
    report(out, result, || format!("Book {} borrowed", id))
}

/// Mark a book as returned
pub fn return_book<W: Write>(catalog: &mut Catalog, id: i64, out: &mut W) -> Result<()> {
    let result = catalog.return_item(id);
    report(out, result, || format!("Book {} returned", id))
}

/// Remove a book from the catalog
pub fn remove_book<W: Write>(catalog: &mut Catalog, id: i64, out: &mut W) -> Result<()> {
    match catalog.remove(id) {
        Ok(record) => {
            writeln!(out, "{} Book removed: {}", style("✓").green().bold(), record.title())?;
            Ok(())
        }
        Err(e) => report(out, Err(e), String::new),
    }
}

/// Show borrowed and available counts
pub fn show_stats<W: Write>(catalog: &Catalog, out: &mut W) -> Result<()> {
    let stats = catalog.stats();

    writeln!(out, "\n{}", style("Catalog Statistics").bold().cyan())?;
    writeln!(out, "{}", "=".repeat(80))?;
    writeln!(out, "Total Books: {}", style(stats.total).bold())?;
    writeln!(out, "Borrowed: {}", style(stats.borrowed).bold())?;
    writeln!(out, "Available: {}", style(stats.available).bold())?;

    Ok(())
}

/// Message to show when the store could not be loaded and the catalog started empty
pub fn recovery_notice(catalog: &Catalog) -> Option<String> {
    match catalog.load_status() {
        LoadStatus::Recovered {
            reason,
            preserved_at,
        } => {
            let kept = match preserved_at {
                Some(moved) => format!("; original kept at {}", moved.display()),
                None => String::new(),
            };
            Some(format!(
                "{} Catalog store {} could not be read ({}); starting empty{}",
                style("!").yellow().bold(),
                catalog.path().display(),
                reason,
                kept
            ))
        }
        _ => None,
    }
}

/// Prints the outcome of a mutation
///
/// Business outcomes are shown to the user and swallowed; anything else
/// (a failed save) is returned.
fn report<W, F>(out: &mut W, result: CatalogResult<()>, success: F) -> Result<()>
where
    W: Write,
    F: FnOnce() -> String,
{
    match result {
        Ok(()) => {
            writeln!(out, "{} {}", style("✓").green().bold(), success())?;
            Ok(())
        }
        Err(e) if e.is_business() => {
            writeln!(out, "{} {}", style("✗").red().bold(), e)?;
            Ok(())
        }
        Err(e) => Err(e).context("Failed to save catalog"),
    }
}

fn print_book_line<W: Write>(out: &mut W, record: &Record) -> Result<()> {
    let status = match record.status() {
        LoanStatus::Available => style("Available").green(),
        LoanStatus::Borrowed => style("Borrowed").yellow(),
    };
    writeln!(
        out,
        "Book ID: {} | Title: {} | Author: {} | Status: {}",
        record.id(),
        style(record.title()).bold(),
        record.author(),
        status
    )?;
    Ok(())
}
