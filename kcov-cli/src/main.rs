//! `kcov` instruments a C source file for branch coverage.
//!
//! `kcov prog.c` writes `prog-cov.c` next to the input. Compiling and running `prog-cov.c` produces
//! `prog-cov-measure.txt` in the working directory, which `kcov-report` summarizes.

#![recursion_limit = "128"] // needed for error_chain.
#![allow(dangerous_implicit_autorefs)] // triggered inside clap 2.x `crate_authors!`.

#[macro_use]
extern crate clap;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;
extern crate env_logger;
extern crate kcov;
extern crate serde_json;
extern crate tempfile;
extern crate termcolor;

#[macro_use]
mod ui;
mod error;

use error::{Result, ResultExt};
use kcov::{instrument, output_path, Options, SourceFile};
use tempfile::NamedTempFile;

use std::io::Write;
use std::path::Path;
use std::process::exit;

/// Program entry. Calls [`run()`] and prints any error returned to `stderr`.
///
/// [`run()`]: ./fn.run.html
fn main() {
    if let Err(error) = run() {
        ui::print_error(&error).expect("error while printing error 🤷");
        exit(1);
    }
}

/// Runs the `kcov` program.
fn run() -> Result<()> {
    let matches = clap_app!(kcov =>
        (author: crate_authors!(", "))
        (about: "Instruments a C source file for branch coverage")
        (version: crate_version!())
        (@arg input: +required "The C source file to instrument")
    ).get_matches();
    env_logger::init();

    let input = Path::new(matches.value_of_os("input").expect("input"));
    progress!("Parsing", "{}", input.display());
    let source = SourceFile::open(input)?;

    let instrumented = instrument(&source, &Options::for_input(input))?;
    if instrumented.catalogue.is_empty() {
        warning!("no branch found in {}", input.display());
    }
    progress!("Instrumented", "{} branches", instrumented.catalogue.len());

    let output = output_path(input);
    write_atomically(&output, instrumented.text.as_bytes())
        .chain_err(|| format!("cannot write the instrumented program to {}", output.display()))?;
    progress!("Created", "{}", output.display());
    Ok(())
}

/// Writes `content` to a temporary file next to `path`, then moves it over `path`. Readers never see a partially
/// written output.
fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content)?;
    file.flush()?;
    debug!("persisting {:?} to {:?}", file.path(), path);
    file.persist(path)?;
    Ok(())
}
