//! Instruments every `test-data/*.c` and checks the result against `test-data/*.json`.
//!
//! The fixture holds the expected catalogue, the exit status of the program and the `(then, else)` counts one run of
//! the instrumented program records. When a C compiler is available (`$CC`, or `cc`), both the original and the
//! instrumented program are compiled and run: they must exit with the same status and print the same output, and the
//! results file must hold one row per branch with the expected counts.

extern crate diff;
#[macro_use]
extern crate error_chain;
extern crate kcov;
#[macro_use]
extern crate serde;
extern crate serde_json;
extern crate tempfile;
extern crate termcolor;

use kcov::*;
use serde_json::from_reader;
use tempfile::TempDir;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use std::env;
use std::ffi::{OsStr, OsString};
use std::fs::{File, read_dir, write};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, exit};

#[derive(Deserialize)]
struct Expected {
    /// Exit status of `main`, with or without instrumentation.
    status: i32,
    catalogue: Catalogue,
    counts: Vec<(u64, u64)>,
}

enum Failure {
    Catalogue {
        actual: Catalogue,
        expected: Catalogue,
    },
    Message(String),
}

fn main() {
    run().expect("IO");
}

fn run() -> io::Result<()> {
    let mut failed_tests = 0;
    let compiler = find_compiler();

    let stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut lock = stdout.lock();

    let mut paths = read_dir("test-data")?.map(|entry| entry.map(|e| e.path())).collect::<io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.extension() == Some(OsStr::new("c")) {
            write!(lock, "test {} ... ", path.display())?;
            lock.flush()?;
            if !print_test_result(&mut lock, test(&path, compiler.as_ref().map(OsString::as_os_str)))? {
                failed_tests += 1;
            }
        }
    }

    if compiler.is_none() {
        writeln!(lock, "\nno C compiler found, the instrumented programs were not run.")?;
    }

    if failed_tests != 0 {
        writeln!(lock, "\ntest result: {} failed.\n", failed_tests)?;
        exit(101);
    } else {
        writeln!(lock, "\ntest result: ok.\n")?;
    }

    Ok(())
}

fn find_compiler() -> Option<OsString> {
    let compiler = env::var_os("CC").unwrap_or_else(|| OsString::from("cc"));
    match Command::new(&compiler).arg("--version").output() {
        Ok(ref output) if output.status.success() => Some(compiler),
        _ => None,
    }
}

fn test(path: &Path, compiler: Option<&OsStr>) -> Result<Vec<Failure>> {
    let expected: Expected = from_reader(File::open(path.with_extension("json"))?)?;
    let source = SourceFile::open(path)?;
    let options = Options::for_input(path);
    let instrumented = instrument(&source, &options)?;
    let mut failures = Vec::new();

    if instrumented.catalogue != expected.catalogue {
        failures.push(Failure::Catalogue {
            actual: instrumented.catalogue.clone(),
            expected: expected.catalogue.clone(),
        });
    }

    let listed = Enumerator::new(&source, io::sink()).run()?;
    if listed != instrumented.catalogue {
        failures.push(Failure::Message("the enumerator disagrees with the planner".to_owned()));
    }

    let output = SourceFile::parse(output_path(path), instrumented.text.clone())?;
    for branch in &instrumented.catalogue {
        let call = format!("kcov_visit_then({})", branch.index);
        if !output.text().contains(&call) {
            failures.push(Failure::Message(format!("branch {} has no `{}`", branch.index, call)));
        }
    }

    if let Some(compiler) = compiler {
        failures.extend(run_both(path, compiler, &instrumented, &options, &expected)?);
    }
    Ok(failures)
}

/// Compiles and runs the original and the instrumented program in a scratch directory.
fn run_both(
    path: &Path,
    compiler: &OsStr,
    instrumented: &Instrumented,
    options: &Options,
    expected: &Expected,
) -> Result<Vec<Failure>> {
    let dir = TempDir::new()?;
    let instrumented_source = dir.path().join("instrumented.c");
    write(&instrumented_source, &instrumented.text)?;

    let original_program = compile(compiler, path, &dir.path().join("original"))?;
    let instrumented_program = compile(compiler, &instrumented_source, &dir.path().join("instrumented"))?;
    let original_run = Command::new(&original_program).current_dir(dir.path()).output()?;
    let instrumented_run = Command::new(&instrumented_program).current_dir(dir.path()).output()?;

    let mut failures = Vec::new();
    let mut check = |success: bool, message: String| {
        if !success {
            failures.push(Failure::Message(message));
        }
    };

    check(
        original_run.status.code() == Some(expected.status),
        format!("the original program exited with {}, expected {}", original_run.status, expected.status),
    );
    check(
        instrumented_run.status.code() == original_run.status.code(),
        format!("the instrumented program exited with {}, the original with {}", instrumented_run.status, original_run.status),
    );
    check(instrumented_run.stdout == original_run.stdout, "the instrumented program printed something else".to_owned());

    let measurement = Measurement::open(dir.path().join(&options.measure_file))?;
    let records = &measurement.records;
    check(
        records.len() == instrumented.catalogue.len(),
        format!("{} rows in the results file for {} branches", records.len(), instrumented.catalogue.len()),
    );
    for (record, branch) in records.iter().zip(&instrumented.catalogue) {
        check(
            record.line == branch.line && record.condition == branch.condition,
            format!("row {} is `{}: {}`, expected `{}: {}`", branch.index, record.line, record.condition, branch.line, branch.condition),
        );
    }
    let counts = records.iter().map(|r| (r.then_count, r.else_count)).collect::<Vec<_>>();
    check(counts == expected.counts, format!("recorded {:?}, expected {:?}", counts, expected.counts));

    Ok(failures)
}

fn compile(compiler: &OsStr, source: &Path, program: &Path) -> Result<PathBuf> {
    let output = Command::new(compiler).arg("-o").arg(program).arg(source).output()?;
    ensure!(
        output.status.success(),
        "cannot compile {}:\n{}",
        source.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(program.to_owned())
}

/// One line per branch, so a mismatch shows which index, kind, line or condition moved.
fn catalogue_lines(catalogue: &Catalogue) -> String {
    catalogue
        .iter()
        .map(|b| format!("#{} {} @{}: {}\n", b.index, b.kind, b.line, b.condition))
        .collect()
}

fn print_test_result<W: Write + WriteColor>(mut lock: W, result: Result<Vec<Failure>>) -> io::Result<bool> {
    Ok(match result {
        Ok(ref failures) if failures.is_empty() => {
            lock.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            writeln!(lock, "ok")?;
            lock.reset()?;
            true
        },
        Ok(failures) => {
            lock.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
            writeln!(lock, "FAILED")?;
            for failure in failures {
                match failure {
                    Failure::Catalogue { actual, expected } => {
                        let actual = catalogue_lines(&actual);
                        let expected = catalogue_lines(&expected);
                        for d in diff::lines(&actual, &expected) {
                            let (color, prefix, line) = match d {
                                diff::Result::Left(line) => (Color::Green, '+', line),
                                diff::Result::Both(line, _) => (Color::White, ' ', line),
                                diff::Result::Right(line) => (Color::Red, '-', line),
                            };
                            lock.set_color(ColorSpec::new().set_fg(Some(color)))?;
                            writeln!(lock, "    {} {}", prefix, line)?;
                        }
                    },
                    Failure::Message(message) => {
                        lock.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
                        writeln!(lock, "    {}", message)?;
                    },
                }
            }
            lock.reset()?;
            writeln!(lock)?;
            false
        },
        Err(e) => {
            lock.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
            writeln!(lock, "ERRORED")?;
            lock.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_intense(true).set_bold(true))?;
            write!(lock, "error: ")?;
            lock.reset()?;
            writeln!(lock, "{}\n", e)?;
            false
        },
    })
}
