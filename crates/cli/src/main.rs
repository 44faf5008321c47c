// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use bookshelf_catalog::{Catalog, CatalogConfig};
use clap::{value_parser, Arg, ArgMatches, Command};
use std::io;
use std::path::PathBuf;

mod commands;
mod menu;

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_name("BOOK_ID")
        .help("Book ID (integer)")
        .value_parser(value_parser!(i64))
        .allow_negative_numbers(true)
}

fn build_cli() -> Command {
    Command::new("bookshelf")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Personal book catalog with borrow tracking")
        .arg(
            Arg::new("store")
                .short('s')
                .long("store")
                .value_name("PATH")
                .help("Path to the catalog store file")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to a TOML config file")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(Command::new("menu").about("Run the interactive menu (default)"))
        .subcommand(
            Command::new("add")
                .about("Add a new book to the catalog")
                .arg(id_arg())
                .arg(Arg::new("title").required(true).value_name("TITLE").help("Book title"))
                .arg(Arg::new("author").required(true).value_name("AUTHOR").help("Book author")),
        )
        .subcommand(Command::new("list").about("List all books in the catalog"))
        .subcommand(Command::new("find").about("Show a single book").arg(id_arg()))
        .subcommand(Command::new("borrow").about("Mark a book as borrowed").arg(id_arg()))
        .subcommand(Command::new("return").about("Mark a book as returned").arg(id_arg()))
        .subcommand(Command::new("remove").about("Remove a book from the catalog").arg(id_arg()))
        .subcommand(Command::new("stats").about("Show borrowed and available counts"))
}

fn resolve_config(matches: &ArgMatches) -> Result<CatalogConfig> {
    let config_file = matches.get_one::<PathBuf>("config");
    let mut config = CatalogConfig::load(config_file.map(PathBuf::as_path))
        .context("Failed to load configuration")?;

    if let Some(store) = matches.get_one::<PathBuf>("store") {
        config.store_path = store.clone();
        config.validate().context("Invalid --store path")?;
    }

    Ok(config)
}

fn get_id(matches: &ArgMatches) -> Result<i64> {
    matches
        .get_one::<i64>("id")
        .copied()
        .ok_or_else(|| anyhow::anyhow!("Book ID is required"))
}

fn get_text<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("{} is required", name))
}

fn dispatch(catalog: &mut Catalog, matches: &ArgMatches) -> Result<()> {
    let mut out = io::stdout().lock();

    match matches.subcommand() {
        Some(("add", sub)) => commands::add_book(
            catalog,
            get_id(sub)?,
            get_text(sub, "title")?,
            get_text(sub, "author")?,
            &mut out,
        ),
        Some(("list", _)) => commands::list_books(catalog, &mut out),
        Some(("find", sub)) => commands::show_book(catalog, get_id(sub)?, &mut out),
        Some(("borrow", sub)) => commands::borrow_book(catalog, get_id(sub)?, &mut out),
        Some(("return", sub)) => commands::return_book(catalog, get_id(sub)?, &mut out),
        Some(("remove", sub)) => commands::remove_book(catalog, get_id(sub)?, &mut out),
        Some(("stats", _)) => commands::show_stats(catalog, &mut out),
        _ => menu::run_menu(catalog, io::stdin().lock(), &mut out),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let matches = build_cli().get_matches();
    let config = resolve_config(&matches)?;

    log::info!("Using catalog store {}", config.store_path.display());
    Catalog::scoped(&config, |catalog| {
        if let Some(reason) = commands::recovery_notice(catalog) {
            eprintln!("{}", reason);
        }
        dispatch(catalog, &matches)
    })
}
