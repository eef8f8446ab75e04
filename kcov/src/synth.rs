//! Synthesis of the coverage runtime.
//!
//! Once the walk is over and the [`Catalogue`] is sealed, the runtime is rendered from it:
//!
//! * the support block, placed right before the first function definition: the counter record type, the counter
//!   table, the table of condition strings, the initialization helper, the two visit-recording functions and the
//!   result writer;
//! * the initializer sequence, placed right after the opening brace of `main`: one initialization call per branch in
//!   index order, then the `atexit` registration of the result writer;
//! * a call to the result writer, placed right before the closing brace of `main`.
//!
//! The templates are rendered with this data:
//!
//! ```json
//! {
//!     "count": 2,
//!     "capacity": 2,
//!     "measure_file": "prog-cov-measure.txt",
//!     "branches": [
//!         {"index": 0, "line": 4, "condition": "x > 0", "kind": "decision"},
//!         {"index": 1, "line": 9, "condition": "default", "kind": "switch-default"}
//!     ],
//!     "init_branch": "kcov_init_branch",
//!     "visit_then": "kcov_visit_then",
//!     "visit_else": "kcov_visit_else",
//!     "write_results": "kcov_write_results"
//! }
//! ```
//!
//! [`Catalogue`]: ../catalogue/struct.Catalogue.html

use catalogue::Catalogue;
use error::*;
use planner::Anchors;
use rewrite::Rewriter;
use template::{self, INIT_TEMPLATE, RUNTIME_TEMPLATE};

use tera::Context;

use std::cmp::max;
use std::path::Path;

/// Records a "then" outcome (or a visit) of a branch and returns 1.
pub const VISIT_THEN: &str = "kcov_visit_then";
/// Records an "else" outcome of a branch and returns 0.
pub const VISIT_ELSE: &str = "kcov_visit_else";
/// Fills one record of the counter table.
pub const INIT_BRANCH: &str = "kcov_init_branch";
/// Writes the results file.
pub const WRITE_RESULTS: &str = "kcov_write_results";

/// Suffix appended to the file stem to name the results file.
pub const MEASURE_SUFFIX: &str = "-cov-measure.txt";

/// Header row of the results file.
pub const MEASURE_HEADER: &str = "Line\tThen\tElse\tCondition";

//----------------------------------------------------------------------------------------------------------------------
//{{{ Probes

/// Text inserted in front of a dual-outcome condition.
pub fn dual_probe_prefix() -> &'static str {
    "(("
}

/// Text inserted behind a dual-outcome condition `E`, completing `((E) ? then(i) : else(i))`.
///
/// `E` is evaluated exactly once, and the whole expression is true exactly when `E` is, since the "then" recorder
/// returns 1 and the "else" recorder returns 0.
pub fn dual_probe_suffix(index: usize) -> String {
    format!(") ? {}({}) : {}({}))", VISIT_THEN, index, VISIT_ELSE, index)
}

/// The statement recording a visit of a single-outcome branch.
pub fn visit_statement(index: usize) -> String {
    format!("{}({});", VISIT_THEN, index)
}

/// The clause added to a switch without `default`. It starts with `break` so that falling off the last case still
/// leaves the switch instead of counting as a default visit.
pub fn implicit_default_clause(index: usize) -> String {
    format!("\nbreak;\ndefault: {}\nbreak;\n", visit_statement(index))
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ Options

/// Settings of the synthesized runtime.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Options {
    /// Name of the results file the instrumented program writes, relative to its working directory.
    pub measure_file: String,
}

impl Options {
    /// The options for instrumenting `input`: results go to `<stem>-cov-measure.txt`.
    pub fn for_input(input: &Path) -> Options {
        Options {
            measure_file: format!("{}{}", file_stem(input), MEASURE_SUFFIX),
        }
    }
}

/// The file name of `path` without its extension, `"out"` if there is none.
pub fn file_stem(path: &Path) -> String {
    path.file_stem().map_or_else(|| "out".to_owned(), |stem| stem.to_string_lossy().into_owned())
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ Runtime

/// The rendered runtime, ready to be spliced into the program.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Runtime {
    /// Declarations and functions placed before the first function definition.
    pub support: String,
    /// Statements placed at the start of `main`.
    pub init: String,
    /// Statement placed at the end of `main`.
    pub finish: String,
}

impl Runtime {
    /// Renders the runtime for `catalogue`.
    pub fn render(catalogue: &Catalogue, options: &Options) -> Result<Runtime> {
        let tera = template::new()?;

        let mut context = Context::new();
        context.insert("count", &catalogue.len());
        // A zero-length array is not valid C.
        context.insert("capacity", &max(catalogue.len(), 1));
        context.insert("measure_file", &options.measure_file);
        context.insert("branches", catalogue);
        context.insert("init_branch", INIT_BRANCH);
        context.insert("visit_then", VISIT_THEN);
        context.insert("visit_else", VISIT_ELSE);
        context.insert("write_results", WRITE_RESULTS);

        let mut support = tera.render(RUNTIME_TEMPLATE, &context)?.trim_end().to_owned();
        support.push_str("\n\n");
        let mut init = tera.render(INIT_TEMPLATE, &context)?.trim_end().to_owned();
        init.push('\n');
        debug!("rendered runtime for {} branches ({} bytes)", catalogue.len(), support.len() + init.len());
        Ok(Runtime {
            support,
            init,
            finish: format!("\n    {}();\n", WRITE_RESULTS),
        })
    }

    /// Queues the insertion of the runtime at the anchors.
    ///
    /// Every definition of `main` gets the hooks. Only one of them survives preprocessing in a valid program.
    ///
    /// # Errors
    ///
    /// Returns [`NoFunction`] if there is no function definition to put the support block in front of.
    ///
    /// [`NoFunction`]: ../error/enum.ErrorKind.html#variant.NoFunction
    pub fn splice(&self, anchors: &Anchors, text: &str, rewriter: &mut Rewriter) -> Result<()> {
        let anchor = anchors.runtime.ok_or(ErrorKind::NoFunction)?;

        // The block starts with `#include`, which must begin a line.
        let mut support = String::with_capacity(self.support.len() + 1);
        if anchor != 0 && !text[..anchor].ends_with('\n') {
            support.push('\n');
        }
        support.push_str(&self.support);
        rewriter.insert_before(anchor, support);

        if anchors.main_bodies.is_empty() {
            warn!("no `main` function, the coverage runtime will never be initialized nor written");
        }
        for body in &anchors.main_bodies {
            rewriter.insert_after(body.start + 1, self.init.clone());
            rewriter.insert_before(body.end - 1, self.finish.clone());
        }
        Ok(())
    }
}

//}}}

#[test]
fn test_options_for_input() {
    assert_eq!(Options::for_input(Path::new("dir/prog.c")).measure_file, "prog-cov-measure.txt");
    assert_eq!(Options::for_input(Path::new("prog")).measure_file, "prog-cov-measure.txt");
}

#[test]
fn test_dual_probe_text() {
    let probe = format!("{}x > 0{}", dual_probe_prefix(), dual_probe_suffix(7));
    assert_eq!(probe, "((x > 0) ? kcov_visit_then(7) : kcov_visit_else(7))");
}

#[test]
fn test_render_runtime() {
    use catalogue::BranchKind;

    let mut catalogue = Catalogue::new();
    catalogue.register(4, "s == \"a\"", BranchKind::Decision);
    catalogue.register(9, "default", BranchKind::SwitchDefault);
    let options = Options {
        measure_file: "prog-cov-measure.txt".to_owned(),
    };
    let runtime = Runtime::render(&catalogue, &options).unwrap();

    assert!(runtime.support.starts_with("#include <stdio.h>\n"));
    assert!(runtime.support.contains("static struct kcov_branch kcov_branches[2];"));
    assert!(runtime.support.contains("= {\n    \"s == \\\"a\\\"\",\n    \"default\",\n};"));
    assert!(runtime.support.contains("static int kcov_visit_then(unsigned int index) {"));
    assert!(runtime.support.contains("static int kcov_visit_else(unsigned int index) {"));
    assert!(runtime.support.contains("fopen(\"prog-cov-measure.txt\", \"w\")"));
    assert!(runtime.support.contains("fprintf(output, \"Line\\tThen\\tElse\\tCondition\\n\");"));
    assert!(runtime.support.contains("for (i = 0; i < 2u; i++)"));

    assert_eq!(
        runtime.init,
        "\n    kcov_init_branch(kcov_branches, 0, 4, kcov_conditions[0]);\
         \n    kcov_init_branch(kcov_branches, 1, 9, kcov_conditions[1]);\
         \n    atexit(kcov_write_results);\n"
    );
    assert_eq!(runtime.finish, "\n    kcov_write_results();\n");
}

#[test]
fn test_render_empty_runtime() {
    let options = Options {
        measure_file: "empty-cov-measure.txt".to_owned(),
    };
    let runtime = Runtime::render(&Catalogue::new(), &options).unwrap();
    assert!(runtime.support.contains("static struct kcov_branch kcov_branches[1];"));
    assert!(runtime.support.contains("= {\n    0\n};"));
    assert!(runtime.support.contains("for (i = 0; i < 0u; i++)"));
    assert_eq!(runtime.init, "\n    atexit(kcov_write_results);\n");
}

#[test]
fn test_splice_without_function() {
    let runtime = Runtime::render(&Catalogue::new(), &Options::for_input(Path::new("a.c"))).unwrap();
    let mut rewriter = Rewriter::new();
    match *runtime.splice(&Anchors::default(), "int x;\n", &mut rewriter).unwrap_err().kind() {
        ErrorKind::NoFunction => {},
        ref kind => panic!("unexpected error {:?}", kind),
    }
    assert!(rewriter.is_empty());
}
