//! sdftool - SDF reformatter and JSON converter
//!
//! Reads Standard Delay Format files and writes them back in canonical form,
//! or converts them to and from JSON.
//!
//! # Usage
//!
//! ```bash
//! sdftool reformat --dir out/ design.sdf
//! sdftool -v to-json --indent 2 design.sdf
//! sdftool from-json --dir out/ --force design.json
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{error, warn};

use sdf_timing::{
    emit, error::Result, files, parse, validate_document, Document, EmitOptions,
};

/// Standard Delay Format reformatter and converter
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse SDF files and write them in canonical form
    Reformat {
        #[command(flatten)]
        output: OutputArgs,

        /// Upper-case cell type names
        #[arg(long)]
        uppercase_celltype: bool,
    },

    /// Convert SDF files to JSON
    ToJson {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Convert JSON documents back to SDF
    FromJson {
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Input files
    #[arg(value_name = "FILES", required = true)]
    files: Vec<PathBuf>,

    /// Write outputs into this directory instead of stdout
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Indentation width in spaces
    #[arg(short, long)]
    indent: Option<usize>,

    /// Overwrite existing output files
    #[arg(short, long)]
    force: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Reformat {
            output,
            uppercase_celltype,
        } => {
            let options = EmitOptions::new()
                .with_indent_width(output.indent.unwrap_or(2))
                .with_uppercase_celltype(uppercase_celltype);
            convert(&output, None, |text| Ok(emit(&parse(text)?, &options)))
        }
        Command::ToJson { output } => {
            convert(&output, Some("json"), |text| to_json(&parse(text)?, output.indent))
        }
        Command::FromJson { output } => {
            let options = EmitOptions::new().with_indent_width(output.indent.unwrap_or(2));
            convert(&output, Some("sdf"), |text| {
                let doc: Document = serde_json::from_str(text)?;
                validate_document(&doc)?;
                Ok(emit(&doc, &options))
            })
        }
    }
}

/// Run `transform` over every input, writing to `--dir` or stdout.
fn convert(
    args: &OutputArgs,
    extension: Option<&str>,
    transform: impl Fn(&str) -> Result<String>,
) -> Result<()> {
    if let Some(dir) = &args.dir {
        files::check_output_dir(dir)?;
    }

    for input in &args.files {
        if !input.exists() {
            warn!("Skipping missing input {}", input.display());
            continue;
        }

        let text = files::read_input(input)?;
        let converted = transform(&text).map_err(|e| {
            error!("{}: {}", input.display(), e);
            e
        })?;

        match &args.dir {
            Some(dir) => {
                let path = files::output_path(dir, input, extension);
                files::write_output(&path, &converted, args.force)?;
            }
            None => println!("{}", converted),
        }
    }
    Ok(())
}

/// Serialize a document, pretty printed when an indent width is given.
fn to_json(doc: &Document, indent: Option<usize>) -> Result<String> {
    let Some(width) = indent else {
        return Ok(serde_json::to_string(doc)?);
    };

    let indent = " ".repeat(width);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
