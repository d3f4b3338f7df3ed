//! Command line front end for docx-merge.

use clap::Parser;
use docx_merge::merge::{MergeOptions, NamePolicy, merge_files};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Merge Word documents into one, keeping each document's layout.
#[derive(Parser, Debug)]
#[command(name = "docx-merge", version, about)]
struct Args {
    /// Documents to merge, in order
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Path of the merged document
    #[arg(short, long)]
    output: PathBuf,

    /// Keep display names of renamed styles, only changing their identifiers
    #[arg(long)]
    keep_style_names: bool,

    /// Detect collisions by display name only
    #[arg(long)]
    no_id_collisions: bool,

    /// Let content flow into the next document's section
    #[arg(long)]
    drop_sections: bool,

    /// Log every rename and rewrite
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let policy = if args.keep_style_names {
        NamePolicy::Preserve
    } else {
        NamePolicy::Synthetic
    };
    let options = MergeOptions::new()
        .with_keep_sections(!args.drop_sections)
        .with_id_collisions(!args.no_id_collisions)
        .with_name_policy(policy);

    match merge_files(&args.inputs, &args.output, &options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("docx-merge: {e}");
            ExitCode::FAILURE
        },
    }
}
