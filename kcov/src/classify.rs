//! Recognition of branch-bearing constructs and the traversal shared by every consumer.
//!
//! The set of constructs that carry a coverage point is small and fixed, so it is modelled as the closed enum
//! [`Construct`]. [`walk()`] visits the syntax tree in preorder, reports every function definition and every construct
//! found inside a function body to a [`Visitor`]. The [`Planner`] and the [`Enumerator`] are the two visitors.
//!
//! [`Construct`]: ./enum.Construct.html
//! [`walk()`]: ./fn.walk.html
//! [`Visitor`]: ./trait.Visitor.html
//! [`Planner`]: ../planner/struct.Planner.html
//! [`Enumerator`]: ../enumerate/struct.Enumerator.html

use catalogue::BranchKind;
use error::*;
use source::{Position, SourceFile, Span};
use utils::collapse_whitespace;

use tree_sitter::Node;

/// Condition text recorded for default labels, which have no expression.
pub const DEFAULT_CONDITION: &str = "default";

//----------------------------------------------------------------------------------------------------------------------
//{{{ Construct

/// A construct carrying exactly one coverage point.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Construct {
    /// `for (init; condition; update)`, with a condition present.
    For { condition: Span },
    /// `while (condition)`.
    While { condition: Span },
    /// `do ... while (condition);`.
    Do { condition: Span },
    /// `if (condition)`.
    If { condition: Span },
    /// `condition ? a : b`.
    Ternary { condition: Span },
    /// `case value:`. `label_end` is the offset right after the colon.
    Case { value: Span, label_end: usize },
    /// `default:` written in the source. `label_end` is the offset right after the colon.
    Default { label_end: usize },
    /// A `switch` without any `default` label. `close` is the offset of the closing brace of its body.
    ImplicitDefault { close: usize },
}

impl Construct {
    pub fn kind(&self) -> BranchKind {
        match *self {
            Construct::For { .. } | Construct::While { .. } | Construct::Do { .. } => BranchKind::Loop,
            Construct::If { .. } => BranchKind::Decision,
            Construct::Ternary { .. } => BranchKind::Ternary,
            Construct::Case { .. } => BranchKind::SwitchCase,
            Construct::Default { .. } | Construct::ImplicitDefault { .. } => BranchKind::SwitchDefault,
        }
    }

    /// The short label printed by the diagnostic listing.
    pub fn label(&self) -> &'static str {
        match *self {
            Construct::For { .. } => "For",
            Construct::While { .. } => "While",
            Construct::Do { .. } => "Do",
            Construct::If { .. } => "If",
            Construct::Ternary { .. } => "?:",
            Construct::Case { .. } => "Case",
            Construct::Default { .. } => "Default",
            Construct::ImplicitDefault { .. } => "ImpDef.",
        }
    }

    /// The condition guarded by a dual-outcome construct. `None` for labels.
    pub fn condition(&self) -> Option<Span> {
        match *self {
            Construct::For { condition }
            | Construct::While { condition }
            | Construct::Do { condition }
            | Construct::If { condition }
            | Construct::Ternary { condition } => Some(condition),
            Construct::Case { .. } | Construct::Default { .. } | Construct::ImplicitDefault { .. } => None,
        }
    }

    /// The text describing the branch in the catalogue, with whitespace runs collapsed to single spaces.
    pub fn condition_text(&self, source: &SourceFile) -> String {
        match *self {
            Construct::Case { value, .. } => collapse_whitespace(source.span_text(value)),
            Construct::Default { .. } | Construct::ImplicitDefault { .. } => DEFAULT_CONDITION.to_owned(),
            _ => self.condition().map_or_else(String::new, |span| collapse_whitespace(source.span_text(span))),
        }
    }
}

/// A construct together with where it starts.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Site {
    /// Start of the construct: the keyword of a statement, or the first token of a `?:`.
    pub position: Position,
    pub construct: Construct,
}

/// A function definition.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Function {
    /// Name of the function, `None` if the declarator is too exotic to find one.
    pub name: Option<String>,
    /// Start of the definition, including storage class and return type.
    pub position: Position,
    /// The body including both braces.
    pub body: Span,
    /// Start of the item of the translation unit holding the definition. This is the definition itself, unless it is
    /// nested in a preprocessor conditional, where it is the opening `#if`/`#ifdef` of the outermost block.
    pub top_level: usize,
    /// Whether the definition is nested in a `#if`, `#ifdef`, `#elif` or `#else` block, so it may be compiled out.
    pub conditional: bool,
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ Traversal

/// Receives the functions and constructs found by [`walk()`], in source order.
///
/// [`walk()`]: ./fn.walk.html
pub trait Visitor {
    fn visit_function(&mut self, function: &Function) -> Result<()>;
    fn visit_site(&mut self, site: &Site) -> Result<()>;
}

/// Where in the translation unit the walk currently is.
#[derive(Copy, Clone, Debug, Default)]
struct Scope {
    top_level: usize,
    conditional: bool,
    in_function: bool,
    /// Inside an expression that C requires to be a constant expression: a `case` value, an enumerator value, a bit
    /// field width, a member array size, a static assertion, or anything in a `static` declaration. A counting call is
    /// not a constant expression, so nothing is classified there.
    constant: bool,
}

/// Walks the whole translation unit in preorder.
///
/// Constructs are only reported inside function bodies, and never inside a constant expression. A `?:` in a
/// file-scope initializer or a `case` label is evaluated at compile time and cannot hold a call.
pub fn walk<V: Visitor>(source: &SourceFile, visitor: &mut V) -> Result<()> {
    let root = source.root();
    let mut cursor = root.walk();
    for item in root.named_children(&mut cursor) {
        let scope = Scope {
            top_level: item.start_byte(),
            ..Scope::default()
        };
        walk_node(source, item, scope, visitor)?;
    }
    Ok(())
}

fn walk_node<V: Visitor>(source: &SourceFile, node: Node, scope: Scope, visitor: &mut V) -> Result<()> {
    let mut scope = scope;
    match node.kind() {
        "function_definition" => {
            visitor.visit_function(&function(source, node, scope)?)?;
            scope.in_function = true;
        },
        "preproc_if" | "preproc_ifdef" | "preproc_elif" | "preproc_elifdef" | "preproc_else" => {
            scope.conditional = true;
        },
        _ if scope.constant => {
            if node.kind() == "conditional_expression" {
                trace!("`?:` in a constant expression at line {}", node.start_position().row + 1);
            }
        },
        _ if scope.in_function => {
            if let Some(construct) = classify(source, node)? {
                let site = Site {
                    position: source.start(node),
                    construct,
                };
                visitor.visit_site(&site)?;
            }
        },
        _ => {},
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        let child_scope = Scope {
            constant: scope.constant || is_constant_context(source, node, child),
            ..scope
        };
        walk_node(source, child, child_scope, visitor)?;
    }
    Ok(())
}

/// Whether C requires `child` of `parent` to be a constant expression (or, in a `static` declaration, a constant
/// initializer).
fn is_constant_context(source: &SourceFile, parent: Node, child: Node) -> bool {
    match parent.kind() {
        "case_statement" | "enumerator" => parent.child_by_field_name("value") == Some(child),
        "bitfield_clause" | "field_declaration" => true,
        "declaration" => has_static_storage(source, parent),
        "call_expression" => {
            child.kind() == "argument_list" && parent.child_by_field_name("function").map_or(false, |function| {
                let name = source.node_text(function);
                name == "_Static_assert" || name == "static_assert"
            })
        },
        _ => false,
    }
}

fn has_static_storage(source: &SourceFile, declaration: Node) -> bool {
    let mut cursor = declaration.walk();
    let found = declaration
        .named_children(&mut cursor)
        .any(|child| child.kind() == "storage_class_specifier" && source.node_text(child) == "static");
    found
}

fn function(source: &SourceFile, node: Node, scope: Scope) -> Result<Function> {
    let position = source.start(node);
    let body = node.child_by_field_name("body")
        .ok_or(ErrorKind::MalformedConstruct("function", position.line))?;
    Ok(Function {
        name: function_name(source, node),
        position,
        body: Span::of(body),
        top_level: scope.top_level,
        conditional: scope.conditional,
    })
}

/// Follows the chain of declarators (`*f`, `(f)`, `f(...)`) down to the identifier.
fn function_name(source: &SourceFile, node: Node) -> Option<String> {
    let mut declarator = node.child_by_field_name("declarator")?;
    loop {
        if declarator.kind() == "identifier" {
            return Some(source.node_text(declarator).to_owned());
        }
        declarator = declarator.child_by_field_name("declarator").or_else(|| declarator.named_child(0))?;
    }
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ Classification

/// Decides whether `node` is a coverage point.
///
/// A `for` without a condition never branches and a `switch` with a `default` label has nothing to synthesize, so both
/// yield `None` like any other node.
///
/// # Errors
///
/// Returns [`MalformedConstruct`] when the node is a branch construct whose condition, label or body cannot be found.
///
/// [`MalformedConstruct`]: ../error/enum.ErrorKind.html#variant.MalformedConstruct
pub fn classify(source: &SourceFile, node: Node) -> Result<Option<Construct>> {
    let line = node.start_position().row + 1;
    Ok(Some(match node.kind() {
        "for_statement" => match node.child_by_field_name("condition") {
            Some(condition) => Construct::For {
                condition: Span::of(condition),
            },
            None => {
                trace!("for loop without condition at line {}", line);
                return Ok(None);
            },
        },
        "while_statement" => Construct::While {
            condition: parenthesized_condition(source, node, "while", line)?,
        },
        "do_statement" => Construct::Do {
            condition: parenthesized_condition(source, node, "do", line)?,
        },
        "if_statement" => Construct::If {
            condition: parenthesized_condition(source, node, "if", line)?,
        },
        "conditional_expression" => {
            let condition = node.child_by_field_name("condition").ok_or(ErrorKind::MalformedConstruct("?:", line))?;
            if node.child_by_field_name("consequence").is_none() {
                // GNU `a ?: b` yields `a` itself, which a wrapped condition would turn into 1.
                warn!("`?:` without middle operand at line {} is not instrumented", line);
                return Ok(None);
            }
            Construct::Ternary {
                condition: Span::of(condition),
            }
        },
        "case_statement" => {
            let label_end = label_end(node).ok_or(ErrorKind::MalformedConstruct("case", line))?;
            match node.child_by_field_name("value") {
                Some(value) => Construct::Case {
                    value: Span::of(value),
                    label_end,
                },
                None => Construct::Default { label_end },
            }
        },
        "switch_statement" => {
            let body = node.child_by_field_name("body").ok_or(ErrorKind::MalformedConstruct("switch", line))?;
            if has_default_label(body) {
                return Ok(None);
            }
            let close = body.end_byte().saturating_sub(1);
            ensure!(
                body.kind() == "compound_statement" && source.text()[close..].starts_with('}'),
                ErrorKind::MalformedConstruct("switch", line)
            );
            Construct::ImplicitDefault { close }
        },
        _ => return Ok(None),
    }))
}

/// The expression between the parentheses of `if`, `while` and `do ... while`, without surrounding whitespace.
fn parenthesized_condition(source: &SourceFile, node: Node, construct: &'static str, line: usize) -> Result<Span> {
    let parens = node.child_by_field_name("condition").ok_or(ErrorKind::MalformedConstruct(construct, line))?;
    let text = source.node_text(parens);
    ensure!(
        text.len() >= 2 && text.starts_with('(') && text.ends_with(')'),
        ErrorKind::MalformedConstruct(construct, line)
    );
    let inner = Span {
        start: parens.start_byte() + 1,
        end: parens.end_byte() - 1,
    }.trim(source.text());
    ensure!(!inner.is_empty(), ErrorKind::MalformedConstruct(construct, line));
    Ok(inner)
}

/// The offset right after the colon of a `case`/`default` label.
fn label_end(node: Node) -> Option<usize> {
    let mut cursor = node.walk();
    let colon = node.children(&mut cursor).find(|child| child.kind() == ":");
    colon.map(|c| c.end_byte())
}

/// Whether a `default` label belonging to this switch exists anywhere in `node`. Labels of nested switches belong to
/// those switches and are skipped.
fn has_default_label(node: Node) -> bool {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).any(|child| match child.kind() {
        "switch_statement" => false,
        "case_statement" if child.child_by_field_name("value").is_none() => true,
        _ => has_default_label(child),
    });
    found
}

//}}}

#[cfg(test)]
struct Collect(Vec<Site>, Vec<Function>);

#[cfg(test)]
impl Visitor for Collect {
    fn visit_function(&mut self, function: &Function) -> Result<()> {
        self.1.push(function.clone());
        Ok(())
    }
    fn visit_site(&mut self, site: &Site) -> Result<()> {
        self.0.push(*site);
        Ok(())
    }
}

#[cfg(test)]
fn collect(text: &str) -> (SourceFile, Vec<Site>, Vec<Function>) {
    let source = SourceFile::parse("test.c", text.to_owned()).unwrap();
    let mut collect = Collect(Vec::new(), Vec::new());
    walk(&source, &mut collect).unwrap();
    (source, collect.0, collect.1)
}

#[test]
fn test_classify_every_construct() {
    let (source, sites, _) = collect(
        "int f(int x) {\n\
         \x20   for (x = 0; x < 3; x++) {}\n\
         \x20   while (x) x--;\n\
         \x20   do { x++; } while (x < 2);\n\
         \x20   if (x == 2) x = x > 1 ? 1 : 0;\n\
         \x20   switch (x) { case 1: break; default: break; }\n\
         \x20   return x;\n\
         }\n",
    );
    let labels = sites.iter().map(|s| s.construct.label()).collect::<Vec<_>>();
    assert_eq!(labels, ["For", "While", "Do", "If", "?:", "Case", "Default"]);
    let texts = sites.iter().map(|s| s.construct.condition_text(&source)).collect::<Vec<_>>();
    assert_eq!(texts, ["x < 3", "x", "x < 2", "x == 2", "x > 1", "1", "default"]);
    let lines = sites.iter().map(|s| s.position.line).collect::<Vec<_>>();
    assert_eq!(lines, [2, 3, 4, 5, 5, 6, 6]);
}

#[test]
fn test_for_without_condition_is_not_a_branch() {
    let (_, sites, _) = collect("void f(void) { for (;;) { break; } }\n");
    assert!(sites.is_empty());
}

#[test]
fn test_implicit_default_detection() {
    let (source, sites, _) = collect(
        "void f(int x) {\n\
         \x20   switch (x) { case 1: switch (x) { default: break; } break; }\n\
         }\n",
    );
    // The outer switch only has a default inside the nested switch, so it needs one of its own.
    let labels = sites.iter().map(|s| s.construct.label()).collect::<Vec<_>>();
    assert_eq!(labels, ["ImpDef.", "Case", "Default"]);
    match sites[0].construct {
        Construct::ImplicitDefault { close } => {
            assert_eq!(&source.text()[close..close + 1], "}");
            assert_eq!(source.text()[..close].trim_end().chars().last(), Some(';'));
        },
        ref c => panic!("unexpected construct {:?}", c),
    }
}

#[test]
fn test_default_inside_nested_block_counts() {
    let (_, sites, _) = collect("void f(int x) { switch (x) { case 1: { default: break; } } }\n");
    let labels = sites.iter().map(|s| s.construct.label()).collect::<Vec<_>>();
    assert_eq!(labels, ["Case", "Default"]);
}

#[test]
fn test_constructs_outside_functions_are_ignored() {
    let (_, sites, functions) = collect("int g = 1 ? 2 : 3;\nstatic int *h(void) { return 0; }\nint main(void) { return 0; }\n");
    assert!(sites.is_empty());
    let names = functions.iter().map(|f| f.name.clone()).collect::<Vec<_>>();
    assert_eq!(names, [Some("h".to_owned()), Some("main".to_owned())]);
    assert_eq!(functions[0].position.line, 2);
}

#[test]
fn test_case_label_is_a_constant_expression() {
    let (source, sites, _) = collect("int f(int x) { switch (x) { case 4 > 2 ? 2 : 3: return 1; } return 0; }\n");
    let labels = sites.iter().map(|s| s.construct.label()).collect::<Vec<_>>();
    assert_eq!(labels, ["ImpDef.", "Case"]);
    assert_eq!(sites[1].construct.condition_text(&source), "4 > 2 ? 2 : 3");
}

#[test]
fn test_static_locals_are_constant_expressions() {
    let (source, sites, _) = collect(
        "int f(void) {\n\
         \x20   static int buf[8 > 2 ? 8 : 2];\n\
         \x20   static int k = 8 > 3 ? 1 : 0;\n\
         \x20   int m = k ? 1 : 2;\n\
         \x20   return buf[0] + m;\n\
         }\n",
    );
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].construct.condition_text(&source), "k");
    assert_eq!(sites[0].position.line, 4);
}

#[test]
fn test_enumerators_and_members_are_constant_expressions() {
    let (_, sites, _) = collect(
        "int f(void) {\n\
         \x20   enum { A = 1 ? 2 : 3, B };\n\
         \x20   struct { unsigned a : 4 > 2 ? 3 : 1; int b[2 ? 1 : 2]; } s;\n\
         \x20   s.a = B;\n\
         \x20   return s.a;\n\
         }\n",
    );
    assert!(sites.is_empty());
}

#[test]
fn test_static_assertion_is_a_constant_expression() {
    let (_, sites, _) = collect("void f(int x) { _Static_assert(4 > 2 ? 1 : 0, \"size\"); (void)(x ? 1 : 0); }\n");
    let labels = sites.iter().map(|s| s.construct.label()).collect::<Vec<_>>();
    assert_eq!(labels, ["?:"]);
}

#[test]
fn test_conditional_without_middle_operand_is_skipped() {
    let (_, sites, _) = collect("int f(int a) { return a ?: 3; }\n");
    assert!(sites.is_empty());
}

#[test]
fn test_functions_under_preprocessor_conditionals() {
    let text = "#ifdef DEBUG\nstatic void trace(void) {}\n#endif\nint main(void) { return 0; }\n";
    let (_, _, functions) = collect(text);
    assert_eq!(functions.len(), 2);
    assert!(functions[0].conditional);
    assert_eq!(functions[0].top_level, 0);
    assert!(!functions[1].conditional);
    assert_eq!(functions[1].top_level, text.find("int main").unwrap());
}
