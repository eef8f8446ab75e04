//! The instrumentation planner.
//!
//! The [`Planner`] is the [`Visitor`] that turns each construct into catalogue entries and probe edits:
//!
//! | Construct | Points | Probe |
//! |-----------|--------|-------|
//! | `for`, `while`, `do`, `if`, `?:` | 1, dual | condition `E` becomes `((E) ? then(i) : else(i))` |
//! | `case`, explicit `default` | 1, single | `then(i);` right after the label's colon |
//! | `switch` without `default` | 1, single | `break; default: then(i); break;` before the closing brace |
//!
//! The edits of a branch are queued the moment it is registered and never retracted. The planner also remembers the
//! anchors of the runtime (first function, body of `main`). [`Planner::finish()`] seals the catalogue: it consumes the
//! planner and hands the catalogue, the edits and the anchors over to the synthesis step.
//!
//! [`Planner`]: ./struct.Planner.html
//! [`Visitor`]: ../classify/trait.Visitor.html
//! [`Planner::finish()`]: ./struct.Planner.html#method.finish

use catalogue::Catalogue;
use classify::{Construct, Function, Site, Visitor};
use error::*;
use rewrite::Rewriter;
use source::{SourceFile, Span};
use synth::{dual_probe_prefix, dual_probe_suffix, implicit_default_clause, visit_statement};

/// Locations where the runtime is spliced in.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Anchors {
    /// Start of the top-level item holding the first function definition. When that definition sits in a
    /// preprocessor conditional, this is the start of the whole `#if` block, so the runtime is never compiled out.
    pub runtime: Option<usize>,
    /// Bodies of every definition of `main`, braces included. More than one only happens when the definitions are
    /// alternatives of a preprocessor conditional.
    pub main_bodies: Vec<Span>,
}

/// Everything the walk produced, in the state required by the synthesis step.
#[derive(Debug)]
pub struct Plan {
    pub catalogue: Catalogue,
    pub rewriter: Rewriter,
    pub anchors: Anchors,
}

/// Registers branches and queues their probes while the tree is walked.
#[derive(Debug)]
pub struct Planner<'s> {
    source: &'s SourceFile,
    catalogue: Catalogue,
    rewriter: Rewriter,
    anchors: Anchors,
}

impl<'s> Planner<'s> {
    pub fn new(source: &'s SourceFile) -> Planner<'s> {
        Planner {
            source,
            catalogue: Catalogue::new(),
            rewriter: Rewriter::new(),
            anchors: Anchors::default(),
        }
    }

    /// The branches registered so far.
    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Ends the walk.
    pub fn finish(self) -> Plan {
        debug!(
            "planned {} branches with {} edits in {}",
            self.catalogue.len(),
            self.rewriter.len(),
            self.source.path().display()
        );
        Plan {
            catalogue: self.catalogue,
            rewriter: self.rewriter,
            anchors: self.anchors,
        }
    }

    /// Turns the condition `E` into `((E) ? then(i) : else(i))`.
    fn wrap_condition(&mut self, index: usize, condition: Span) {
        self.rewriter.insert_before(condition.start, dual_probe_prefix());
        self.rewriter.insert_after(condition.end, dual_probe_suffix(index));
    }
}

impl<'s> Visitor for Planner<'s> {
    fn visit_function(&mut self, function: &Function) -> Result<()> {
        if self.anchors.runtime.is_none() {
            debug!("runtime anchor: {:?} at {} (item at byte {})", function.name, function.position, function.top_level);
            self.anchors.runtime = Some(function.top_level);
        }
        if function.name.as_ref().map(String::as_str) == Some("main") {
            debug!("`main` body at {}, conditional: {}", function.position, function.conditional);
            self.anchors.main_bodies.push(function.body);
        }
        Ok(())
    }

    fn visit_site(&mut self, site: &Site) -> Result<()> {
        let construct = site.construct;
        let condition = construct.condition_text(self.source);
        let index = self.catalogue.register(site.position.line, condition, construct.kind());

        match construct {
            Construct::For { condition }
            | Construct::While { condition }
            | Construct::Do { condition }
            | Construct::If { condition }
            | Construct::Ternary { condition } => self.wrap_condition(index, condition),
            Construct::Case { label_end, .. } | Construct::Default { label_end } => {
                self.rewriter.insert_after(label_end, format!(" {}", visit_statement(index)));
            },
            Construct::ImplicitDefault { close } => {
                self.rewriter.insert_before(close, implicit_default_clause(index));
            },
        }
        Ok(())
    }
}

#[cfg(test)]
fn plan(text: &str) -> (Plan, String) {
    use classify::walk;

    let source = SourceFile::parse("test.c", text.to_owned()).unwrap();
    let mut planner = Planner::new(&source);
    walk(&source, &mut planner).unwrap();
    let plan = planner.finish();
    let rewritten = plan.rewriter.clone().materialize(source.text()).unwrap();
    (plan, rewritten)
}

#[test]
fn test_if_condition_is_wrapped() {
    let (plan, rewritten) = plan("int main(void) {\n    int x = 1, y = 0;\n    if (x > 0) { y = 1; }\n    return y;\n}\n");
    assert_eq!(plan.catalogue.len(), 1);
    let branch = plan.catalogue.get(0).unwrap();
    assert_eq!(branch.condition, "x > 0");
    assert_eq!(branch.line, 3);
    assert_eq!(branch.kind, ::catalogue::BranchKind::Decision);
    assert!(rewritten.contains("if (((x > 0) ? kcov_visit_then(0) : kcov_visit_else(0))) { y = 1; }"));
    assert_eq!(plan.anchors.runtime, Some(0));
    assert_eq!(plan.anchors.main_bodies.len(), 1);
}

#[test]
fn test_switch_without_default_gets_one() {
    let (plan, rewritten) = plan("int main(void) {\n    int x = 1;\n    switch(x){case 1: break;}\n    return 0;\n}\n");
    let kinds = plan.catalogue.iter().map(|b| (b.condition.as_str(), b.kind)).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        [("default", ::catalogue::BranchKind::SwitchDefault), ("1", ::catalogue::BranchKind::SwitchCase)]
    );
    assert!(rewritten.contains(
        "switch(x){case 1: kcov_visit_then(1); break;\nbreak;\ndefault: kcov_visit_then(0);\nbreak;\n}"
    ));
    assert_eq!(rewritten.matches("default:").count(), 1);
}

#[test]
fn test_switch_with_default_is_left_alone() {
    let (plan, rewritten) = plan("void f(int x) { switch (x) { default: x++; } }\n");
    assert_eq!(plan.catalogue.len(), 1);
    assert_eq!(plan.catalogue.get(0).unwrap().kind, ::catalogue::BranchKind::SwitchDefault);
    assert_eq!(rewritten, "void f(int x) { switch (x) { default: kcov_visit_then(0); x++; } }\n");
}

#[test]
fn test_loops_and_ternary() {
    let (plan, rewritten) = plan(
        "int f(int n) {\n    int i, t = 0;\n    for (i = 0; i < n; i++) t += i;\n    do t--; while (t > 9);\n    return n ? t : -t;\n}\n",
    );
    assert_eq!(plan.catalogue.len(), 3);
    assert!(rewritten.contains("for (i = 0; ((i < n) ? kcov_visit_then(0) : kcov_visit_else(0)); i++)"));
    assert!(rewritten.contains("while (((t > 9) ? kcov_visit_then(1) : kcov_visit_else(1)));"));
    assert!(rewritten.contains("return ((n) ? kcov_visit_then(2) : kcov_visit_else(2)) ? t : -t;"));
    assert!(plan.anchors.main_bodies.is_empty());
}

#[test]
fn test_condition_with_side_effect_is_evaluated_once() {
    let (_, rewritten) = plan("int f(int *p) {\n    while (*p++)\n        ;\n    return 0;\n}\n");
    assert_eq!(rewritten.matches("*p++").count(), 1);
    assert!(rewritten.contains("while (((*p++) ? kcov_visit_then(0) : kcov_visit_else(0)))"));
}

#[test]
fn test_first_function_and_main_are_anchors() {
    let (plan, _) = plan("static int g(void) { return 1; }\nint main(void) { return g(); }\n");
    assert_eq!(plan.anchors.runtime, Some(0));
    assert_eq!(plan.anchors.main_bodies.len(), 1);
    assert_eq!(plan.anchors.main_bodies[0].start, "static int g(void) { return 1; }\nint main(void) ".len());
}

#[test]
fn test_anchors_under_preprocessor_conditionals() {
    let text = "int x;\n\
                #ifdef DEBUG\n\
                static void trace(void) {}\n\
                #endif\n\
                #if defined(TWO)\n\
                int main(void) { return 2; }\n\
                #else\n\
                int main(void) { return 1; }\n\
                #endif\n";
    let (plan, _) = plan(text);
    assert_eq!(plan.anchors.runtime, Some(text.find("#ifdef").unwrap()));
    let starts = plan.anchors.main_bodies.iter().map(|body| &text[body.start..body.end]).collect::<Vec<_>>();
    assert_eq!(starts, ["{ return 2; }", "{ return 1; }"]);
}
