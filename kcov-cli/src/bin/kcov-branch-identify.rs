//! `kcov-branch-identify` lists the branches `kcov` would instrument, without writing anything.
//!
//! The listing shows every function definition, then one line per branch with its label, index, line, column and file
//! name. `--json` prints the branch catalogue as JSON instead.

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
use kcov::{Enumerator, SourceFile};

use std::io::{self, sink, Write};
use std::path::Path;
use std::process::exit;

fn main() {
    if let Err(error) = run() {
        ui::print_error(&error).expect("error while printing error 🤷");
        exit(1);
    }
}

fn run() -> Result<()> {
    let matches = clap_app!(("kcov-branch-identify") =>
        (author: crate_authors!(", "))
        (about: "Lists the branches of a C source file")
        (version: crate_version!())
        (@arg json: --json "Print the branch catalogue as JSON")
        (@arg input: +required "The C source file to inspect")
    ).get_matches();
    env_logger::init();

    let input = Path::new(matches.value_of_os("input").expect("input"));
    let source = SourceFile::open(input)?;

    let stdout = io::stdout();
    let mut lock = stdout.lock();
    let catalogue = if matches.is_present("json") {
        let catalogue = Enumerator::new(&source, sink()).run()?;
        serde_json::to_writer_pretty(&mut lock, &catalogue)?;
        writeln!(lock)?;
        catalogue
    } else {
        Enumerator::new(&source, &mut lock).run()?
    };
    if catalogue.is_empty() {
        warning!("no branch found in {}", input.display());
    }
    Ok(())
}
