//! CLI logic for the copybook layout compiler.
//!
//! This module contains the core CLI logic: rules loading, compilation and
//! report writing.

pub mod error_adapter;

mod args;
mod config;
mod report;

pub use args::Args;
pub use report::Report;

use std::{fs, io, path::Path};

use log::{info, warn};

use copybook::{CopybookError, LayoutCompiler};

use error_adapter::{DiagnosticAdapter, Reportable};

/// Run the copybook CLI application
///
/// This function compiles the input copybook and writes the JSON report to
/// the output file. Warnings are logged through miette's graphical handler.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `CopybookError` for:
/// - File I/O errors
/// - Rules loading errors
/// - Invalid rules
/// - Error diagnostics found while compiling
pub fn run(args: &Args) -> Result<(), CopybookError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing copybook"
    );

    let rules = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;

    let compiler = LayoutCompiler::new(rules);
    let copybook = compiler.compile_source(&source)?;

    for warning in copybook.warnings() {
        let reportable = Reportable::Diagnostic(DiagnosticAdapter::new(warning, &source));
        warn!("{}", error_adapter::render(&reportable));
    }

    let name = Path::new(&args.input)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let json = Report::new(name, &copybook, &source)
        .to_json(args.compact)
        .map_err(io::Error::from)?;

    fs::write(&args.output, json)?;

    info!(
        output_file = args.output,
        record_types = copybook.layouts().len();
        "Layout report written successfully"
    );

    Ok(())
}
