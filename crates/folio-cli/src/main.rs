//! Folio CLI - inspect and edit Jupyter notebooks with atomic edit batches.

mod apply;
mod clear;
mod colors;
mod info;
mod notebook;
mod output;

use clap::{ArgGroup, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Inspect and edit Jupyter notebooks with atomic edit batches")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cells of a notebook
    Info {
        /// Path to the notebook (.ipynb file)
        notebook: String,

        /// Print cells as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply a JSON array of cell edits as one batch
    Apply {
        /// Path to the notebook (.ipynb file)
        notebook: String,

        /// Path to the edit batch (.json file)
        edits: String,

        /// Write the result here instead of over the notebook
        #[arg(short, long)]
        output: Option<String>,

        /// Apply and report, but do not write anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove the outputs of every code cell
    ClearOutputs {
        /// Path to the notebook (.ipynb file)
        notebook: String,
    },

    /// Replace or append the output of one cell
    #[command(group(ArgGroup::new("payload").required(true).args(["text", "file"])))]
    Output {
        /// Path to the notebook (.ipynb file)
        notebook: String,

        /// Index of the cell
        #[arg(long)]
        cell: usize,

        /// Output text
        #[arg(long)]
        text: Option<String>,

        /// Read the output from a file
        #[arg(long)]
        file: Option<String>,

        /// Mime type of the output (default: text/plain)
        #[arg(long)]
        mime: Option<String>,

        /// Append instead of replacing existing outputs
        #[arg(long)]
        append: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info { notebook, json } => info::execute(&notebook, json)?,

        Commands::Apply {
            notebook,
            edits,
            output,
            dry_run,
        } => {
            apply::execute(&notebook, &edits, output.as_deref(), dry_run)?;
        }

        Commands::ClearOutputs { notebook } => {
            clear::execute(&notebook)?;
        }

        Commands::Output {
            notebook,
            cell,
            text,
            file,
            mime,
            append,
        } => {
            let payload = match (&text, &file) {
                (Some(text), _) => output::Payload::Text(text),
                (None, Some(file)) => output::Payload::File(file),
                (None, None) => anyhow::bail!("one of --text or --file is required"),
            };
            output::execute(&notebook, cell, payload, mime.as_deref(), append)?;
        }
    }

    Ok(())
}
