//! `kcov-report` summarizes the results file written by an instrumented program.

#![recursion_limit = "128"] // needed for error_chain.
#![allow(dangerous_implicit_autorefs)] // triggered inside clap 2.x `crate_authors!`.

#[macro_use]
extern crate clap;
#[macro_use]
extern crate error_chain;
extern crate env_logger;
extern crate kcov;
extern crate serde_json;
extern crate tempfile;
extern crate termcolor;

#[path = "../ui.rs"]
#[macro_use]
mod ui;
#[path = "../error.rs"]
mod error;

use error::Result;
use kcov::{Enumerator, Measurement, SourceFile, Summary};

use std::io::{self, sink, Write};
use std::process::exit;

fn main() {
    if let Err(error) = run() {
        ui::print_error(&error).expect("error while printing error 🤷");
        exit(1);
    }
}

fn run() -> Result<()> {
    let matches = clap_app!(("kcov-report") =>
        (author: crate_authors!(", "))
        (about: "Summarizes the branch coverage measured by an instrumented program")
        (version: crate_version!())
        (@arg source: --source [FILE] "The original C source file, to count fully covered branches")
        (@arg json: --json "Print the summary as JSON")
        (@arg measure: +required "The results file, `<stem>-cov-measure.txt`")
    ).get_matches();
    env_logger::init();

    let measurement = Measurement::open(matches.value_of_os("measure").expect("measure"))?;
    let catalogue = match matches.value_of_os("source") {
        Some(path) => Some(Enumerator::new(&SourceFile::open(path)?, sink()).run()?),
        None => None,
    };
    let summary = measurement.summary(catalogue.as_ref());
    if catalogue.is_some() && summary.fully_covered.is_none() {
        warning!("the source file does not match the measurement, fully covered branches are not counted");
    }

    let stdout = io::stdout();
    let mut lock = stdout.lock();
    if matches.is_present("json") {
        serde_json::to_writer_pretty(&mut lock, &summary)?;
        writeln!(lock)?;
    } else {
        print_summary(&mut lock, &summary)?;
    }
    Ok(())
}

fn print_summary<W: Write>(mut output: W, summary: &Summary) -> io::Result<()> {
    let total = summary.branches_count;
    writeln!(output, "Branches:       {}", total)?;
    writeln!(output, "Executed:       {}", ratio(summary.branches_executed, total))?;
    writeln!(output, "Then taken:     {}", ratio(summary.then_taken, total))?;
    writeln!(output, "Else taken:     {}", ratio(summary.else_taken, total))?;
    if let Some(fully_covered) = summary.fully_covered {
        writeln!(output, "Fully covered:  {}", ratio(fully_covered, total))?;
    }
    Ok(())
}

fn ratio(count: usize, total: usize) -> String {
    if total == 0 {
        format!("{}", count)
    } else {
        format!("{} ({:.2}%)", count, count as f64 * 100.0 / total as f64)
    }
}
