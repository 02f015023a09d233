//! folio - render structured books to several formats

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use folio::writer::Format;
use folio::{Book, RenderConfig, render_formats};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Sanitize a book and render it to several formats", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio book.json                     Render every format into the current directory
    folio book.json -f markdown,html    Render Markdown and HTML only
    folio book.json -o out -c cfg.json  Use a render configuration file
    folio book.json --check             Only report sanitizer warnings")]
struct Cli {
    /// Book as JSON
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Formats to render (markdown, html, latex, epub, plaintext); default all
    #[arg(short, long, value_delimiter = ',')]
    format: Vec<String>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Render configuration as JSON
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Render the book as given, without sanitizing it
    #[arg(long)]
    no_sanitize: bool,

    /// Report sanitizer warnings without rendering
    #[arg(long, conflicts_with = "no_sanitize")]
    check: bool,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = if cli.check {
        check(&cli.input, cli.quiet)
    } else {
        convert(&cli)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let data = fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
    serde_json::from_slice(&data).map_err(|e| format!("{}: {e}", path.display()))
}

fn check(input: &Path, quiet: bool) -> Result<(), String> {
    let book: Book = read_json(input)?;
    let result = folio::sanitize(&book);

    if !quiet {
        for warning in &result.warnings {
            println!("{warning}");
        }
        println!("{} warning(s)", result.warnings.len());
    }
    Ok(())
}

fn convert(cli: &Cli) -> Result<(), String> {
    let book: Book = read_json(&cli.input)?;
    let mut config: RenderConfig = match &cli.config {
        Some(path) => read_json(path)?,
        None => RenderConfig::default(),
    };
    if cli.no_sanitize {
        config.sanitize = false;
    }

    let formats = if cli.format.is_empty() {
        Format::ALL.to_vec()
    } else {
        cli.format
            .iter()
            .map(|name| name.parse::<Format>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?
    };

    let rendering = render_formats(&book, &formats, &config);

    if !cli.quiet {
        for warning in &rendering.warnings {
            eprintln!("warning: {warning}");
        }
    }

    fs::create_dir_all(&cli.output).map_err(|e| format!("{}: {e}", cli.output.display()))?;
    let stem = file_stem(&book.id);

    let mut failed = Vec::new();
    for (format, result) in rendering.outputs.into_results() {
        match result {
            Ok(output) => {
                let path = cli.output.join(output.file_name(&stem));
                fs::write(&path, output.as_bytes())
                    .map_err(|e| format!("{}: {e}", path.display()))?;
                if !cli.quiet {
                    println!("Wrote {}", path.display());
                }
            }
            Err(e) => {
                eprintln!("error: {format}: {e}");
                failed.push(format.name());
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!("failed to render {}", failed.join(", ")))
    }
}

/// File name stem derived from a book id.
fn file_stem(id: &str) -> String {
    let stem: String = id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_start_matches('.');
    if stem.is_empty() {
        "book".to_string()
    } else {
        stem.to_string()
    }
}
