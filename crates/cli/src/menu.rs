// FILE: crates/cli/src/menu.rs

//! Interactive text menu
//!
//! Reads choices line by line until the user exits or input ends. IDs are
//! parsed here, so the catalog only ever sees integers.

use crate::commands;
use anyhow::{Context, Result};
use bookshelf_catalog::Catalog;
use console::style;
use std::io::{BufRead, Write};

const MENU: &str = "\
1. Add Book
2. Display Books
3. Borrow Book
4. Return Book
5. Exit";

/// Runs the menu loop against `catalog`
///
/// Returns when the user picks Exit or `input` reaches end of file. The
/// caller is responsible for closing the catalog afterwards.
pub fn run_menu<R, W>(catalog: &mut Catalog, mut input: R, out: &mut W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    loop {
        writeln!(out, "\n{}", style("Library Menu").bold().cyan())?;
        writeln!(out, "{}", MENU)?;

        let Some(choice) = prompt(&mut input, out, "Enter your choice: ")? else {
            break;
        };

        let keep_going = match choice.as_str() {
            "1" => add_interactive(catalog, &mut input, out)?,
            "2" => {
                commands::list_books(catalog, out)?;
                true
            }
            "3" => match prompt_id(&mut input, out)? {
                Some(id) => {
                    commands::borrow_book(catalog, id, out)?;
                    true
                }
                None => false,
            },
            "4" => match prompt_id(&mut input, out)? {
                Some(id) => {
                    commands::return_book(catalog, id, out)?;
                    true
                }
                None => false,
            },
            "5" => false,
            other => {
                writeln!(out, "Invalid choice '{}', please enter 1-5.", other)?;
                true
            }
        };

        if !keep_going {
            break;
        }
    }

    writeln!(out, "Goodbye.")?;
    Ok(())
}

/// Returns false if input ended before the book was complete
fn add_interactive<R, W>(catalog: &mut Catalog, input: &mut R, out: &mut W) -> Result<bool>
where
    R: BufRead,
    W: Write,
{
    let Some(id) = prompt_id(input, out)? else {
        return Ok(false);
    };
    let Some(title) = prompt_non_empty(input, out, "Enter book title: ")? else {
        return Ok(false);
    };
    let Some(author) = prompt_non_empty(input, out, "Enter book author: ")? else {
        return Ok(false);
    };

    commands::add_book(catalog, id, &title, &author, out)?;
    Ok(true)
}

fn prompt_id<R, W>(input: &mut R, out: &mut W) -> Result<Option<i64>>
where
    R: BufRead,
    W: Write,
{
    loop {
        let Some(line) = prompt(input, out, "Enter book ID: ")? else {
            return Ok(None);
        };
        match line.parse::<i64>() {
            Ok(id) => return Ok(Some(id)),
            Err(_) => writeln!(out, "Invalid ID '{}', please enter a whole number.", line)?,
        }
    }
}

fn prompt_non_empty<R, W>(input: &mut R, out: &mut W, label: &str) -> Result<Option<String>>
where
    R: BufRead,
    W: Write,
{
    loop {
        let Some(line) = prompt(input, out, label)? else {
            return Ok(None);
        };
        if !line.is_empty() {
            return Ok(Some(line));
        }
        writeln!(out, "This field cannot be empty.")?;
    }
}

/// Prints `label` and reads one trimmed line; `None` on end of input
fn prompt<R, W>(input: &mut R, out: &mut W, label: &str) -> Result<Option<String>>
where
    R: BufRead,
    W: Write,
{
    write!(out, "{}", label)?;
    out.flush()?;

    let mut line = String::new();
    let read = input.read_line(&mut line).context("Failed to read input")?;
    if read == 0 {
        writeln!(out)?;
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
