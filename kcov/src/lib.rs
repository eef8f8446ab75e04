//! Branch coverage instrumentation of C programs.
//!
//! The crate rewrites a C source file into an instrumented copy. Every decision point (loop conditions, `if`, `?:`,
//! `case` and `default` labels, and a synthesized `default` for switches lacking one) is numbered in a [`Catalogue`]
//! and receives a probe, and a small runtime is spliced in front of the first function. When the instrumented program
//! exits, the runtime writes how often each outcome of each branch was taken.
//!
//! ```rust,no_run
//! extern crate kcov;
//!
//! use kcov::{instrument, output_path, Options, SourceFile};
//! use std::fs::write;
//! use std::path::Path;
//!
//! # fn run() -> kcov::Result<()> {
//! let input = Path::new("prog.c");
//! let source = SourceFile::open(input)?;
//! let instrumented = instrument(&source, &Options::for_input(input))?;
//! write(output_path(input), instrumented.text)?;
//! # Ok(())
//! # }
//! # fn main() { run().unwrap(); }
//! ```
//!
//! [`Catalogue`]: ./catalogue/struct.Catalogue.html

#![recursion_limit="128"] // needed for error_chain.

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;
#[cfg_attr(test, macro_use)]
extern crate serde_json;
extern crate tera;
extern crate tree_sitter;
extern crate tree_sitter_c;

mod utils;
pub mod error;
pub mod source;
pub mod catalogue;
pub mod rewrite;
pub mod classify;
pub mod planner;
pub mod synth;
pub mod template;
pub mod enumerate;
pub mod measure;
pub mod instrument;

pub use catalogue::{Branch, BranchKind, Catalogue};
pub use enumerate::Enumerator;
pub use error::{Error, ErrorKind, Result};
pub use instrument::{instrument, output_path, Instrumented};
pub use measure::{Measurement, Summary};
pub use source::SourceFile;
pub use synth::Options;
