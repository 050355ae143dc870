//!
//! Check an LDSL program against its previously generated artifacts.
//!
//! Usage: `check <program.json> [--generated-dir DIR] [--model-dir DIR]
//! [--revision-status] [--dependor-graph]`
//!
//! Reads the type-checked declaration tree produced by the frontend,
//! builds the dependor graph, classifies every declaration against the
//! fingerprints of the previous run, and reports what the next
//! compilation would regenerate and retrain.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::error;

use cognate_ldsl_ast::Program;
use cognate_revision::FingerprintStore;

#[derive(Parser, Debug)]
#[command(name = "check")]
#[command(version)]
#[command(about = "Report revision status for an LDSL program")]
struct Args {
    /// Path to the type-checked program (JSON declaration tree)
    program: PathBuf,

    /// Directory holding generated sources and pre-extracted examples
    #[arg(long = "generated-dir", default_value = "generated")]
    generated_dir: PathBuf,

    /// Directory holding models, lexicons and search parameters;
    /// defaults to the generated-source directory
    #[arg(long = "model-dir", short = 'd')]
    model_dir: Option<PathBuf>,

    /// Print every declaration's revision status
    #[arg(long = "revision-status")]
    revision_status: bool,

    /// Print the dependor graph
    #[arg(long = "dependor-graph")]
    dependor_graph: bool,
}

fn main() {
    cognate_tools::init_logging();

    let args = Args::parse();
    let model_dir = args
        .model_dir
        .clone()
        .unwrap_or_else(|| args.generated_dir.clone());

    let source = match fs::read_to_string(&args.program) {
        Ok(s) => s,
        Err(e) => {
            error!("can't read '{}': {}", args.program.display(), e);
            process::exit(1);
        }
    };

    let program: Program = match serde_json::from_str(&source) {
        Ok(p) => p,
        Err(e) => {
            error!("'{}' is not a valid program: {}", args.program.display(), e);
            process::exit(1);
        }
    };

    let resolved = cognate_ldsl_resolve::build(&program);
    if args.dependor_graph {
        print!("{}", resolved.graph.format());
    }

    let store = FingerprintStore::new(&args.generated_dir, &model_dir);
    let (report, revision_errors) = cognate_revision::classify(&program, &resolved.graph, &store);

    let mut failures: Vec<(u32, String)> = Vec::new();
    for e in &resolved.errors {
        failures.push((e.line, e.to_string()));
    }
    for e in &revision_errors {
        failures.push((e.line, e.to_string()));
    }
    failures.sort_by_key(|(line, _)| *line);

    if args.revision_status {
        print!("{}", report.format());
    }

    if !failures.is_empty() {
        for (_, message) in &failures {
            eprintln!("{message}");
        }
        process::exit(1);
    }

    if report.no_changes {
        println!("no changes since last run");
    }
}
