//! Entry point for the paginator CLI.
//!
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml` (or `--config`).
//! - Load the book via `epub_loader`, lay it out, and report the page table.

use anyhow::{Context, Result, anyhow, bail};
use epub_paginator::cancellation::CancellationToken;
use epub_paginator::config::{AppConfig, load_config};
use epub_paginator::epub_loader::load_book;
use epub_paginator::pagination::{BookLayout, TextFlowMeasurer, paginate, paginate_parallel};
use epub_paginator::search::{FindJob, pages_for_matches};
use std::env;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const DEFAULT_CONFIG_PATH: &str = "conf/config.toml";
const USAGE: &str = "Usage: epub-paginator <path-to-book> [--json] [--config <path>] [--find <text>]";

#[derive(Debug)]
struct CliArgs {
    book: PathBuf,
    config: PathBuf,
    json: bool,
    find: Option<String>,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let config = load_config(&args.config);
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        path = %args.book.display(),
        level = %config.log_level,
        page_height_mm = config.page_height_mm,
        dpi = config.dpi,
        "Starting paginator"
    );

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Failed to install Ctrl-C handler: {err}");
    }

    let book = load_book(&args.book)?;
    let layout = lay_out(&config, book.clone().into_documents().collect(), &cancel)?;

    if let Some(text) = &args.find {
        report_matches(&layout, book.into_documents().collect(), text, &cancel)?;
    }

    if args.json {
        let json = serde_json::to_string_pretty(&layout).context("Failed to encode layout")?;
        println!("{json}");
    } else {
        report_layout(&layout);
    }
    Ok(())
}

fn lay_out(
    config: &AppConfig,
    documents: Vec<(String, String)>,
    cancel: &CancellationToken,
) -> Result<BookLayout> {
    let geometry = config.page_geometry();
    let files: Vec<String> = documents.iter().map(|(path, _)| path.clone()).collect();
    let measurer = TextFlowMeasurer::new(documents, config.text_flow_settings()?);
    if config.measure_threads > 1 {
        paginate_parallel(files, &geometry, measurer, config.measure_threads, cancel)
    } else {
        let mut measurer = measurer;
        paginate(files, &geometry, &mut measurer, cancel)
    }
}

fn report_layout(layout: &BookLayout) {
    for entry in layout.files() {
        info!(
            path = %entry.path,
            pages = entry.pages_in_file,
            remainder = entry.remainder_factor,
            first_page = entry.first_page,
            "File layout"
        );
    }
    info!(
        files = layout.files().len(),
        pages = layout.total_pagecount(),
        page_height_px = layout.single_page_height(),
        total_height_px = layout.total_height(),
        "Book paginated"
    );
}

fn report_matches(
    layout: &BookLayout,
    documents: Vec<(String, String)>,
    text: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut job = FindJob::spawn(documents, text, cancel.clone())?;
    job.wait()?;
    let matches = job.matches();
    if matches.is_empty() {
        info!(text, "No matches found");
        return Ok(());
    }
    for (path, page) in pages_for_matches(layout, &matches) {
        info!(text, path = %path, page, "Match");
    }
    Ok(())
}

fn parse_args<I>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut book = None;
    let mut config = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut json = false;
    let mut find = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--config needs a path\n{USAGE}"))?;
                config = PathBuf::from(value);
            }
            "--find" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--find needs some text\n{USAGE}"))?;
                find = Some(value);
            }
            flag if flag.starts_with("--") => bail!("Unknown option {flag}\n{USAGE}"),
            _ if book.is_some() => bail!("Only one book path is accepted\n{USAGE}"),
            _ => book = Some(PathBuf::from(arg)),
        }
    }

    let book = book.ok_or_else(|| anyhow!(USAGE))?;
    if !book.exists() {
        return Err(anyhow!("File not found: {}", book.display()));
    }
    Ok(CliArgs {
        book,
        config,
        json,
        find,
    })
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
