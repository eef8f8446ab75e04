//! Planned text insertions and their materialization.
//!
//! The planner never mutates the source text. It queues [`Edit`]s in a [`Rewriter`] while walking the tree, and the
//! whole list is applied in one pass at the very end by [`Rewriter::materialize()`].
//!
//! # Ordering
//!
//! Several edits may land on the same offset, e.g. an `if` whose condition starts with a `?:` gets two opening
//! parentheses in front of the same token. Insertions compose so that the latest edit sits nearest the original token:
//!
//! * [`Placement::Before`] text belongs to the source starting at the offset. Such edits are emitted in registration
//!   order, the last one touching the token.
//! * [`Placement::After`] text belongs to the source ending at the offset. Such edits are emitted in reverse
//!   registration order, the last one touching the token.
//! * At a shared offset, all `After` text comes before all `Before` text.
//!
//! Since the planner registers outer constructs before inner ones, this nests the probe text properly.
//!
//! [`Edit`]: ./struct.Edit.html
//! [`Rewriter`]: ./struct.Rewriter.html
//! [`Rewriter::materialize()`]: ./struct.Rewriter.html#method.materialize
//! [`Placement::Before`]: ./enum.Placement.html#variant.Before
//! [`Placement::After`]: ./enum.Placement.html#variant.After

use error::*;

/// Which side of the offset an inserted text is attached to.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Placement {
    /// Attached to the source that starts at the offset.
    Before,
    /// Attached to the source that ends at the offset.
    After,
}

/// A planned insertion.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Edit {
    /// Byte offset into the original text.
    pub offset: usize,
    pub placement: Placement,
    pub text: String,
}

/// An ordered list of edits against one text.
#[derive(Clone, Debug, Default)]
pub struct Rewriter {
    edits: Vec<Edit>,
}

impl Rewriter {
    pub fn new() -> Rewriter {
        Rewriter::default()
    }

    /// Queues `text` to be inserted in front of the source starting at `offset`.
    pub fn insert_before<S: Into<String>>(&mut self, offset: usize, text: S) {
        self.push(offset, Placement::Before, text.into());
    }

    /// Queues `text` to be inserted behind the source ending at `offset`.
    pub fn insert_after<S: Into<String>>(&mut self, offset: usize, text: S) {
        self.push(offset, Placement::After, text.into());
    }

    fn push(&mut self, offset: usize, placement: Placement, text: String) {
        trace!("queue edit {:?} @{}: {:?}", placement, offset, text);
        self.edits.push(Edit {
            offset,
            placement,
            text,
        });
    }

    /// The edits queued so far, in registration order.
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Applies every queued edit to `source` and returns the rewritten text.
    ///
    /// # Errors
    ///
    /// Returns [`EditOutOfBounds`] if any edit points beyond the end of `source` or inside a UTF-8 sequence. Nothing is
    /// produced in that case.
    ///
    /// [`EditOutOfBounds`]: ../error/enum.ErrorKind.html#variant.EditOutOfBounds
    pub fn materialize(self, source: &str) -> Result<String> {
        for edit in &self.edits {
            ensure!(
                edit.offset <= source.len() && source.is_char_boundary(edit.offset),
                ErrorKind::EditOutOfBounds(edit.offset, source.len())
            );
        }

        let mut order = (0..self.edits.len()).collect::<Vec<_>>();
        order.sort_by_key(|&i| {
            let edit = &self.edits[i];
            match edit.placement {
                Placement::After => (edit.offset, 0, usize::MAX - i),
                Placement::Before => (edit.offset, 1, i),
            }
        });

        let extra_len = self.edits.iter().map(|e| e.text.len()).sum::<usize>();
        let mut output = String::with_capacity(source.len() + extra_len);
        let mut cursor = 0;
        for i in order {
            let edit = &self.edits[i];
            output.push_str(&source[cursor..edit.offset]);
            output.push_str(&edit.text);
            cursor = edit.offset;
        }
        output.push_str(&source[cursor..]);

        debug!("materialized {} edits, {} -> {} bytes", self.edits.len(), source.len(), output.len());
        Ok(output)
    }
}

#[test]
fn test_materialize_without_edits() {
    assert_eq!(Rewriter::new().materialize("int x;").unwrap(), "int x;");
}

#[test]
fn test_nested_insertions_compose_inside_out() {
    // `if (a ? b : c)`: the `if` wraps `a ? b : c`, the ternary then wraps `a`.
    let source = "if (a ? b : c) x;";
    let mut rewriter = Rewriter::new();
    rewriter.insert_before(4, "((");
    rewriter.insert_after(13, ") ? T(0) : E(0))");
    rewriter.insert_before(4, "((");
    rewriter.insert_after(5, ") ? T(1) : E(1))");
    assert_eq!(
        rewriter.materialize(source).unwrap(),
        "if (((((a) ? T(1) : E(1)) ? b : c) ? T(0) : E(0))) x;"
    );
}

#[test]
fn test_after_edits_sharing_an_offset() {
    let mut rewriter = Rewriter::new();
    rewriter.insert_after(1, "outer");
    rewriter.insert_after(1, "inner");
    rewriter.insert_before(1, "next");
    assert_eq!(rewriter.materialize("ab").unwrap(), "ainnerouternextb");
}

#[test]
fn test_edit_out_of_bounds() {
    let mut rewriter = Rewriter::new();
    rewriter.insert_before(10, "x");
    match *rewriter.materialize("short").unwrap_err().kind() {
        ErrorKind::EditOutOfBounds(10, 5) => {},
        ref kind => panic!("unexpected error {:?}", kind),
    }

    let mut rewriter = Rewriter::new();
    rewriter.insert_before(1, "x");
    assert!(rewriter.materialize("é").is_err());
}
