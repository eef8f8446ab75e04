//! Diagnostic listing of branches.
//!
//! The [`Enumerator`] classifies exactly like the [`Planner`] but never plans an edit. It prints one line per function
//! and per branch, then the total:
//!
//! ```text
//! function: main
//!     If      ID: 0   Line: 4 Column: 5   Filename: prog.c
//! Total number of branches: 1
//! ```
//!
//! It keeps a catalogue of its own, so the listing can also be dumped as JSON.
//!
//! [`Enumerator`]: ./struct.Enumerator.html
//! [`Planner`]: ../planner/struct.Planner.html

use catalogue::Catalogue;
use classify::{walk, Function, Site, Visitor};
use error::*;
use source::SourceFile;

use std::io::Write;

/// Prints the branches of a file while it is walked.
#[derive(Debug)]
pub struct Enumerator<'s, W> {
    source: &'s SourceFile,
    output: W,
    catalogue: Catalogue,
}

impl<'s, W: Write> Enumerator<'s, W> {
    pub fn new(source: &'s SourceFile, output: W) -> Enumerator<'s, W> {
        Enumerator {
            source,
            output,
            catalogue: Catalogue::new(),
        }
    }

    /// Walks the whole file, prints the summary line and returns the branches found.
    pub fn run(mut self) -> Result<Catalogue> {
        let source = self.source;
        walk(source, &mut self)?;
        writeln!(self.output, "Total number of branches: {}", self.catalogue.len())?;
        self.output.flush()?;
        Ok(self.catalogue)
    }
}

impl<'s, W: Write> Visitor for Enumerator<'s, W> {
    fn visit_function(&mut self, function: &Function) -> Result<()> {
        let name = function.name.as_ref().map_or("<unknown>", String::as_str);
        writeln!(self.output, "function: {}", name)?;
        Ok(())
    }

    fn visit_site(&mut self, site: &Site) -> Result<()> {
        let construct = site.construct;
        let index = self.catalogue.register(site.position.line, construct.condition_text(self.source), construct.kind());
        writeln!(
            self.output,
            "\t{}\tID: {}\tLine: {}\tColumn: {}\tFilename: {}",
            construct.label(),
            index,
            site.position.line,
            site.position.column,
            self.source.path().display()
        )?;
        Ok(())
    }
}

#[test]
fn test_enumerate_listing() {
    let source = SourceFile::parse(
        "prog.c",
        "int main(void) {\n    int x = 0;\n    if (x) x = 1;\n    switch (x) { case 1: break; }\n    return x;\n}\n"
            .to_owned(),
    ).unwrap();
    let mut output = Vec::new();
    let catalogue = Enumerator::new(&source, &mut output).run().unwrap();
    assert_eq!(catalogue.len(), 3);
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "function: main\n\
         \tIf\tID: 0\tLine: 3\tColumn: 5\tFilename: prog.c\n\
         \tImpDef.\tID: 1\tLine: 4\tColumn: 5\tFilename: prog.c\n\
         \tCase\tID: 2\tLine: 4\tColumn: 18\tFilename: prog.c\n\
         Total number of branches: 3\n"
    );
}

#[test]
fn test_enumerator_agrees_with_planner() {
    use planner::Planner;

    let source = SourceFile::parse(
        "agree.c",
        "int f(int a, int b) {\n    while (a < b ? a : b) { a++; }\n    return a;\n}\n".to_owned(),
    ).unwrap();
    let listed = Enumerator::new(&source, ::std::io::sink()).run().unwrap();
    let mut planner = Planner::new(&source);
    walk(&source, &mut planner).unwrap();
    assert_eq!(listed, planner.finish().catalogue);
}
