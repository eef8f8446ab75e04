//! The C front end.
//!
//! A [`SourceFile`] owns the text of one C file together with its syntax tree, built by [tree-sitter] with the C
//! grammar. The tree is built from the raw text without running the preprocessor, so every byte offset reported by a
//! node is an offset into the file as written, which is exactly what the [`Rewriter`] needs.
//!
//! [`SourceFile`]: ./struct.SourceFile.html
//! [`Rewriter`]: ../rewrite/struct.Rewriter.html
//! [tree-sitter]: https://tree-sitter.github.io/

use error::*;

use tree_sitter::{Language, Node, Parser, Tree};
use tree_sitter_c;

use std::fmt;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

//----------------------------------------------------------------------------------------------------------------------
//{{{ Position & Span

/// A location in the source text.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize)]
pub struct Position {
    /// Byte offset from the start of the file.
    pub offset: usize,
    /// Line number, 1-based.
    pub line: usize,
    /// Column number in bytes, 1-based.
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}:{}", self.line, self.column)
    }
}

/// A half-open byte range `start..end` of the source text.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// The bytes covered by a syntax node.
    pub fn of(node: Node) -> Span {
        Span {
            start: node.start_byte(),
            end: node.end_byte(),
        }
    }

    /// Shrinks the span so that it neither starts nor ends with whitespace.
    pub fn trim(self, text: &str) -> Span {
        let slice = &text[self.start..self.end];
        let leading = slice.len() - slice.trim_start().len();
        let trailing = slice.len() - slice.trim_end().len();
        if leading == slice.len() {
            return Span {
                start: self.start,
                end: self.start,
            };
        }
        Span {
            start: self.start + leading,
            end: self.end - trailing,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ SourceFile

/// A parsed C source file.
pub struct SourceFile {
    path: PathBuf,
    text: String,
    tree: Tree,
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("SourceFile").field("path", &self.path).field("len", &self.text.len()).finish()
    }
}

impl SourceFile {
    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// * Returns [`Io`] if the file cannot be read or is not valid UTF-8.
    /// * Returns [`ParseFailed`] if the file is not syntactically valid C.
    ///
    /// [`Io`]: ../error/enum.ErrorKind.html#variant.Io
    /// [`ParseFailed`]: ../error/enum.ErrorKind.html#variant.ParseFailed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SourceFile> {
        let path = path.as_ref();
        debug!("open source file {:?}", path);
        let text = read_to_string(path)?;
        SourceFile::parse(path, text)
    }

    /// Parses `text` as the content of a file named `path`. The file itself is never touched.
    ///
    /// # Errors
    ///
    /// Returns [`ParseFailed`] if the tree contains any error or missing node. tree-sitter recovers from syntax errors,
    /// but a recovered tree cannot be instrumented safely, so recovery is treated as failure.
    ///
    /// [`ParseFailed`]: ../error/enum.ErrorKind.html#variant.ParseFailed
    pub fn parse<P: Into<PathBuf>>(path: P, text: String) -> Result<SourceFile> {
        let mut parser = Parser::new();
        let language: Language = tree_sitter_c::LANGUAGE.into();
        parser.set_language(&language)?;
        let tree = parser.parse(&text, None).ok_or(ErrorKind::ParseFailed(1, 1))?;
        if let Some(node) = first_error(tree.root_node()) {
            let point = node.start_position();
            bail!(ErrorKind::ParseFailed(point.row + 1, point.column + 1));
        }
        trace!("parsed {} bytes", text.len());
        Ok(SourceFile {
            path: path.into(),
            text,
            tree,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The translation unit node.
    pub fn root(&self) -> Node {
        self.tree.root_node()
    }

    /// The source text covered by `node`.
    pub fn node_text(&self, node: Node) -> &str {
        &self.text[node.byte_range()]
    }

    /// The source text covered by `span`.
    pub fn span_text(&self, span: Span) -> &str {
        &self.text[span.start..span.end]
    }

    /// Where `node` starts.
    pub fn start(&self, node: Node) -> Position {
        let point = node.start_position();
        Position {
            offset: node.start_byte(),
            line: point.row + 1,
            column: point.column + 1,
        }
    }
}

/// Finds the first error or missing node in preorder, if the tree has any.
fn first_error<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(error) = first_error(child) {
            return Some(error);
        }
    }
    Some(node)
}

//}}}

#[test]
fn test_parse_reports_syntax_error_position() {
    let error = SourceFile::parse("broken.c", "int main(void) {\n    if (x > ) {}\n}\n".to_owned()).unwrap_err();
    match *error.kind() {
        ErrorKind::ParseFailed(line, _) => assert_eq!(line, 2),
        ref kind => panic!("unexpected error {:?}", kind),
    }
}

#[test]
fn test_positions_are_one_based() {
    let source = SourceFile::parse("pos.c", "int x;\nint main(void) { return 0; }\n".to_owned()).unwrap();
    let root = source.root();
    let main = root.named_child(1).unwrap();
    assert_eq!(main.kind(), "function_definition");
    let position = source.start(main);
    assert_eq!(position.line, 2);
    assert_eq!(position.column, 1);
    assert_eq!(position.offset, 7);
    assert_eq!(position.to_string(), "2:1");
}

#[test]
fn test_span_trim() {
    let text = "(  a + b )";
    let span = Span { start: 1, end: 9 }.trim(text);
    assert_eq!(&text[span.start..span.end], "a + b");
    let blank = Span { start: 1, end: 3 }.trim(text);
    assert!(blank.is_empty());
}
