//! The instrumentation pipeline: walk, seal, synthesize, materialize.

use catalogue::Catalogue;
use classify::walk;
use error::*;
use planner::{Plan, Planner};
use source::SourceFile;
use synth::{file_stem, Options, Runtime};

use std::path::{Path, PathBuf};

/// The result of instrumenting one file.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Instrumented {
    /// Every branch that received a probe, in index order.
    pub catalogue: Catalogue,
    /// The instrumented program.
    pub text: String,
}

/// Instruments a parsed source file.
///
/// Either the whole program is instrumented or an error is returned; there is no partial result.
///
/// # Errors
///
/// * Returns [`MalformedConstruct`] if a branch construct cannot be located.
/// * Returns [`NoFunction`] if the file contains no function definition.
///
/// [`MalformedConstruct`]: ../error/enum.ErrorKind.html#variant.MalformedConstruct
/// [`NoFunction`]: ../error/enum.ErrorKind.html#variant.NoFunction
pub fn instrument(source: &SourceFile, options: &Options) -> Result<Instrumented> {
    let mut planner = Planner::new(source);
    walk(source, &mut planner)?;
    let Plan {
        catalogue,
        mut rewriter,
        anchors,
    } = planner.finish();

    let runtime = Runtime::render(&catalogue, options)?;
    runtime.splice(&anchors, source.text(), &mut rewriter)?;
    let text = rewriter.materialize(source.text())?;

    Ok(Instrumented { catalogue, text })
}

/// Where the instrumented copy of `input` goes: `<dir>/<stem>-cov.c`.
pub fn output_path(input: &Path) -> PathBuf {
    input.with_file_name(format!("{}-cov.c", file_stem(input)))
}

#[test]
fn test_output_path() {
    assert_eq!(output_path(Path::new("src/prog.c")), Path::new("src/prog-cov.c"));
    assert_eq!(output_path(Path::new("prog.c")), Path::new("prog-cov.c"));
}

#[cfg(test)]
fn instrument_text(text: &str) -> Result<Instrumented> {
    let source = SourceFile::parse("prog.c", text.to_owned())?;
    instrument(&source, &Options::for_input(source.path()))
}

#[test]
fn test_instrumented_program_is_valid_c() {
    let instrumented = instrument_text(
        "#include <stdio.h>\n\
         \n\
         static int sign(int x) {\n\
         \x20   return x > 0 ? 1 : (x < 0 ? -1 : 0);\n\
         }\n\
         \n\
         int main(int argc, char **argv) {\n\
         \x20   int i;\n\
         \x20   for (i = 0; i < argc; i++) {\n\
         \x20       switch (sign(i)) {\n\
         \x20       case 1: printf(\"%s\\n\", argv[i]); break;\n\
         \x20       case 0: break;\n\
         \x20       }\n\
         \x20   }\n\
         \x20   return 0;\n\
         }\n",
    ).unwrap();
    assert_eq!(instrumented.catalogue.len(), 6);

    let text = &instrumented.text;
    SourceFile::parse("prog-cov.c", text.clone()).unwrap();

    let runtime_at = text.find("#include <stdlib.h>").unwrap();
    assert!(runtime_at < text.find("static int sign").unwrap());
    assert!(text[..runtime_at].ends_with("#include <stdio.h>\n\n#include <stdio.h>\n"));
    assert!(text.contains(
        "int main(int argc, char **argv) {\n    kcov_init_branch(kcov_branches, 0, 4, kcov_conditions[0]);"
    ));
    assert!(text.contains("    atexit(kcov_write_results);\n\n    int i;"));
    assert!(text.ends_with("    return 0;\n\n    kcov_write_results();\n}\n"));
    assert!(text.contains("fopen(\"prog-cov-measure.txt\", \"w\")"));
}

#[test]
fn test_straight_line_main() {
    let instrumented = instrument_text("int main(void) {\n    return 0;\n}\n").unwrap();
    assert!(instrumented.catalogue.is_empty());
    assert!(instrumented.text.contains("static struct kcov_branch kcov_branches[1];"));
    assert!(instrumented.text.contains("for (i = 0; i < 0u; i++)"));
    SourceFile::parse("prog-cov.c", instrumented.text).unwrap();
}

#[test]
fn test_no_function_is_an_error() {
    match *instrument_text("int x = 1;\n").unwrap_err().kind() {
        ErrorKind::NoFunction => {},
        ref kind => panic!("unexpected error {:?}", kind),
    }
}

#[test]
fn test_classification_is_idempotent() {
    let text = "int f(int a) { if (a) { return a ? 1 : 2; } switch (a) { case 3: return 3; } return 0; }\n";
    let first = instrument_text(text).unwrap();
    let second = instrument_text(text).unwrap();
    assert_eq!(first.catalogue, second.catalogue);
    assert_eq!(first.text, second.text);
}

#[test]
fn test_runtime_is_not_compiled_out() {
    let instrumented = instrument_text(
        "#include <stdio.h>\n\
         #ifdef DEBUG\n\
         static void trace(void) { puts(\"trace\"); }\n\
         #endif\n\
         int main(void) {\n\
         \x20   int x = 1;\n\
         \x20   if (x) x = 0;\n\
         \x20   return x;\n\
         }\n",
    ).unwrap();
    let text = &instrumented.text;
    let runtime_at = text.find("#include <stdlib.h>").unwrap();
    assert!(runtime_at < text.find("#ifdef DEBUG").unwrap());
    assert!(text[..runtime_at].ends_with("#include <stdio.h>\n#include <stdio.h>\n"));
    assert!(text.contains("int main(void) {\n    kcov_init_branch(kcov_branches, 0, 7, kcov_conditions[0]);"));
    SourceFile::parse("prog-cov.c", text.clone()).unwrap();
}
