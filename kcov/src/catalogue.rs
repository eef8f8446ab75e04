//! The branch catalogue.
//!
//! Every coverage point found while walking the program is registered here exactly once. The index returned by
//! [`Catalogue::register()`] is baked into the probe text, and the same catalogue is later handed to the
//! [`synth`] module to size and fill the counter table, so both artifacts agree on every index.
//!
//! [`Catalogue::register()`]: ./struct.Catalogue.html#method.register
//! [`synth`]: ../synth/index.html

use error::*;

use std::fmt;
use std::slice;

/// The syntactic origin of a branch, which decides how many outcomes it has.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchKind {
    /// The condition of a `for`, `while` or `do ... while` loop.
    Loop,
    /// The condition of an `if` statement.
    Decision,
    /// The condition of a `?:` expression.
    Ternary,
    /// A `case` label.
    SwitchCase,
    /// A `default` label, written in the source or synthesized.
    SwitchDefault,
}

impl BranchKind {
    /// Whether the branch records both a "then" and an "else" outcome. Single-outcome branches only record visits.
    pub fn is_dual(self) -> bool {
        match self {
            BranchKind::Loop | BranchKind::Decision | BranchKind::Ternary => true,
            BranchKind::SwitchCase | BranchKind::SwitchDefault => false,
        }
    }
}

impl fmt::Display for BranchKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(match *self {
            BranchKind::Loop => "loop",
            BranchKind::Decision => "decision",
            BranchKind::Ternary => "ternary",
            BranchKind::SwitchCase => "switch-case",
            BranchKind::SwitchDefault => "switch-default",
        })
    }
}

/// One coverage point.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Branch {
    /// Position in the catalogue, equal to the registration order.
    pub index: usize,

    /// The line of the construct owning the branch (not the line of its condition).
    pub line: usize,

    /// Source text of the condition, or `"default"` for default labels.
    pub condition: String,

    pub kind: BranchKind,
}

/// Append-only registry of branches.
///
/// The invariant `catalogue[i].index == i` always holds, because indices are only ever handed out by
/// [`register()`](#method.register).
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalogue {
    branches: Vec<Branch>,
}

impl Catalogue {
    pub fn new() -> Catalogue {
        Catalogue::default()
    }

    /// Appends a new branch and returns its index.
    pub fn register<S: Into<String>>(&mut self, line: usize, condition: S, kind: BranchKind) -> usize {
        let index = self.branches.len();
        let condition = condition.into();
        trace!("register branch {} ({}) at line {}: {}", index, kind, line, condition);
        self.branches.push(Branch {
            index,
            line,
            condition,
            kind,
        });
        index
    }

    /// Obtains the branch at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange`] if no branch has been registered with that index.
    ///
    /// [`OutOfRange`]: ../error/enum.ErrorKind.html#variant.OutOfRange
    pub fn get(&self, index: usize) -> Result<&Branch> {
        self.branches.get(index).ok_or_else(|| ErrorKind::OutOfRange(index, self.branches.len()).into())
    }

    /// Number of branches registered so far.
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<Branch> {
        self.branches.iter()
    }

    /// Number of outcomes the catalogue can observe: two for every dual branch, one for every other.
    pub fn outcomes_count(&self) -> usize {
        self.branches.iter().map(|b| if b.kind.is_dual() { 2 } else { 1 }).sum()
    }
}

impl<'a> IntoIterator for &'a Catalogue {
    type Item = &'a Branch;
    type IntoIter = slice::Iter<'a, Branch>;
    fn into_iter(self) -> Self::IntoIter {
        self.branches.iter()
    }
}

#[test]
fn test_register_assigns_dense_indices() {
    let mut catalogue = Catalogue::new();
    assert!(catalogue.is_empty());
    assert_eq!(catalogue.register(3, "x > 0", BranchKind::Decision), 0);
    assert_eq!(catalogue.register(5, "1", BranchKind::SwitchCase), 1);
    assert_eq!(catalogue.register(5, "default", BranchKind::SwitchDefault), 2);
    assert_eq!(catalogue.len(), 3);
    for (i, branch) in catalogue.iter().enumerate() {
        assert_eq!(branch.index, i);
    }
    assert_eq!(catalogue.outcomes_count(), 4);
}

#[test]
fn test_get_out_of_range() {
    let mut catalogue = Catalogue::new();
    catalogue.register(1, "a", BranchKind::Loop);
    assert_eq!(catalogue.get(0).unwrap().condition, "a");
    match *catalogue.get(1).unwrap_err().kind() {
        ErrorKind::OutOfRange(1, 1) => {},
        ref kind => panic!("unexpected error {:?}", kind),
    }
}

#[test]
fn test_serialize_catalogue() {
    let mut catalogue = Catalogue::new();
    catalogue.register(7, "i < n", BranchKind::Loop);
    catalogue.register(9, "default", BranchKind::SwitchDefault);
    let json = ::serde_json::to_value(&catalogue).unwrap();
    assert_eq!(
        json,
        json!([
            {"index": 0, "line": 7, "condition": "i < n", "kind": "loop"},
            {"index": 1, "line": 9, "condition": "default", "kind": "switch-default"},
        ])
    );
}
