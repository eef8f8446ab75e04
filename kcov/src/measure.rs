//! Reader of the results file written by an instrumented program.
//!
//! The file is tab separated. The first row is the header `Line Then Else Condition`, then comes one row per branch in
//! index order:
//!
//! ```text
//! Line    Then    Else    Condition
//! 4       3       1       x > 0
//! 9       0       0       default
//! ```
//!
//! For single-outcome branches (labels), `Then` is the number of visits and `Else` is always zero.

use catalogue::Catalogue;
use error::*;
use synth::MEASURE_HEADER;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One row of the results file.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct Record {
    pub line: usize,
    pub then_count: u64,
    pub else_count: u64,
    pub condition: String,
}

impl Record {
    /// Whether any outcome of the branch has been recorded.
    pub fn is_executed(&self) -> bool {
        self.then_count > 0 || self.else_count > 0
    }
}

/// The content of a results file. `records[i]` belongs to branch `i`.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize)]
pub struct Measurement {
    pub records: Vec<Record>,
}

/// Statistical summary of a measurement.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize)]
pub struct Summary {
    /// Number of branches in the results file.
    pub branches_count: usize,

    /// Number of branches with at least one recorded outcome.
    pub branches_executed: usize,

    /// Number of branches whose "then" outcome (or visit) has been recorded.
    pub then_taken: usize,

    /// Number of branches whose "else" outcome has been recorded.
    pub else_taken: usize,

    /// Number of branches with every possible outcome recorded. Only known when the catalogue of the program is given,
    /// since the results file does not say which branches have two outcomes.
    pub fully_covered: Option<usize>,
}

impl Measurement {
    /// Reads the results file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Measurement> {
        let path = path.as_ref();
        debug!("open measurement {:?}", path);
        Measurement::parse(BufReader::new(File::open(path)?))
    }

    /// Parses a results file.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedMeasurement`] with the 1-based line number if the header is missing or a row does not have
    /// four columns with numeric counts.
    ///
    /// [`MalformedMeasurement`]: ../error/enum.ErrorKind.html#variant.MalformedMeasurement
    pub fn parse<R: BufRead>(reader: R) -> Result<Measurement> {
        let mut lines = reader.lines();
        match lines.next() {
            Some(header) => ensure!(header?.trim_end_matches('\r') == MEASURE_HEADER, ErrorKind::MalformedMeasurement(1)),
            None => bail!(ErrorKind::MalformedMeasurement(1)),
        }

        let mut records = Vec::new();
        for (i, line) in lines.enumerate() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            records.push(parse_record(line).ok_or(ErrorKind::MalformedMeasurement(i + 2))?);
        }
        Ok(Measurement { records })
    }

    /// Produces a summary of the measurement.
    ///
    /// When `catalogue` is given, it should be the catalogue of the program that wrote the file. A catalogue of a
    /// different size is ignored with a warning.
    pub fn summary(&self, catalogue: Option<&Catalogue>) -> Summary {
        let records = &self.records;
        let catalogue = catalogue.and_then(|catalogue| {
            if catalogue.len() == records.len() {
                Some(catalogue)
            } else {
                warn!(
                    "the catalogue has {} branches but the measurement has {}, ignoring the catalogue",
                    catalogue.len(),
                    records.len()
                );
                None
            }
        });

        Summary {
            branches_count: records.len(),
            branches_executed: records.iter().filter(|r| r.is_executed()).count(),
            then_taken: records.iter().filter(|r| r.then_count > 0).count(),
            else_taken: records.iter().filter(|r| r.else_count > 0).count(),
            fully_covered: catalogue.map(|catalogue| {
                catalogue
                    .iter()
                    .zip(records)
                    .filter(|&(branch, record)| record.then_count > 0 && (!branch.kind.is_dual() || record.else_count > 0))
                    .count()
            }),
        }
    }
}

fn parse_record(line: &str) -> Option<Record> {
    let mut columns = line.splitn(4, '\t');
    let line = columns.next()?.parse().ok()?;
    let then_count = columns.next()?.parse().ok()?;
    let else_count = columns.next()?.parse().ok()?;
    let condition = columns.next()?.to_owned();
    Some(Record {
        line,
        then_count,
        else_count,
        condition,
    })
}

#[test]
fn test_parse_measurement() {
    let text = "Line\tThen\tElse\tCondition\n4\t3\t1\tx > 0\n9\t0\t0\tdefault\n12\t2\t0\ta\tb\n";
    let measurement = Measurement::parse(text.as_bytes()).unwrap();
    assert_eq!(
        measurement.records,
        vec![
            Record {
                line: 4,
                then_count: 3,
                else_count: 1,
                condition: "x > 0".to_owned(),
            },
            Record {
                line: 9,
                then_count: 0,
                else_count: 0,
                condition: "default".to_owned(),
            },
            Record {
                line: 12,
                then_count: 2,
                else_count: 0,
                condition: "a\tb".to_owned(),
            },
        ]
    );
}

#[test]
fn test_parse_malformed_measurement() {
    fn error_line(text: &str) -> usize {
        match *Measurement::parse(text.as_bytes()).unwrap_err().kind() {
            ErrorKind::MalformedMeasurement(line) => line,
            ref kind => panic!("unexpected error {:?}", kind),
        }
    }

    assert_eq!(error_line(""), 1);
    assert_eq!(error_line("Line,Then,Else,Condition\n"), 1);
    assert_eq!(error_line("Line\tThen\tElse\tCondition\n1\t1\t0\tx\n2\tmany\t0\ty\n"), 3);
    assert_eq!(error_line("Line\tThen\tElse\tCondition\n1\t1\t0\n"), 2);
}

#[test]
fn test_summary() {
    use catalogue::BranchKind;

    let text = "Line\tThen\tElse\tCondition\n3\t2\t1\tx\n3\t2\t0\ty\n5\t1\t0\t1\n5\t0\t0\tdefault\n";
    let measurement = Measurement::parse(text.as_bytes()).unwrap();

    let summary = measurement.summary(None);
    assert_eq!(
        summary,
        Summary {
            branches_count: 4,
            branches_executed: 3,
            then_taken: 3,
            else_taken: 1,
            fully_covered: None,
        }
    );

    let mut catalogue = Catalogue::new();
    catalogue.register(3, "x", BranchKind::Decision);
    catalogue.register(3, "y", BranchKind::Ternary);
    catalogue.register(5, "1", BranchKind::SwitchCase);
    catalogue.register(5, "default", BranchKind::SwitchDefault);
    assert_eq!(measurement.summary(Some(&catalogue)).fully_covered, Some(2));

    catalogue.register(6, "z", BranchKind::Loop);
    assert_eq!(measurement.summary(Some(&catalogue)).fully_covered, None);
}
