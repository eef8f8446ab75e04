//! Errors related to the `kcov` crate.
//!
//! Please see documentation of the [`error-chain` crate](https://docs.rs/error-chain/0.12.4/error_chain/) for detailed
//! usage.

use std::io;

error_chain! {
    foreign_links {
        Io(io::Error) /** Wrapper of standard I/O error. */;
        Json(::serde_json::Error) /** Wrapper of JSON error. */;
        Template(::tera::Error) /** Wrapper of a template rendering error. */;
        Language(::tree_sitter::LanguageError) /** The C grammar is incompatible with the linked tree-sitter. */;
    }

    errors {
        /// The front end could not build a syntax tree without error nodes. The position is the first error node found,
        /// 1-based.
        ParseFailed(line: usize, column: usize) {
            description("cannot parse C source")
            display("cannot parse C source, syntax error at line {}, column {}", line, column)
        }

        /// A branch-bearing construct has no locatable condition, label or body.
        MalformedConstruct(construct: &'static str, line: usize) {
            description("malformed construct")
            display("cannot locate the parts of the `{}` construct at line {}", construct, line)
        }

        /// The program contains no function definition, so there is nowhere to insert the coverage runtime.
        NoFunction {
            description("no function definition to anchor the coverage runtime")
        }

        /// A branch index beyond the end of the [`Catalogue`] was requested.
        ///
        /// [`Catalogue`]: ../catalogue/struct.Catalogue.html
        OutOfRange(index: usize, len: usize) {
            description("branch index out of range")
            display("branch index {} out of range, the catalogue has {} branches", index, len)
        }

        /// An edit points outside of the text, or into the middle of a UTF-8 sequence.
        EditOutOfBounds(offset: usize, len: usize) {
            description("edit out of bounds")
            display("edit at byte {} does not fit into a text of {} bytes", offset, len)
        }

        /// A results file written by an instrumented program cannot be understood.
        MalformedMeasurement(line: usize) {
            description("malformed measurement")
            display("malformed coverage measurement at line {}", line)
        }
    }
}
