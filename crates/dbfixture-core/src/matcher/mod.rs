//! Polling comparison of expected rows against live data.
//!
//! Each attempt reloads the live dataset in full and looks, for every
//! non-empty expected row, for the first live row of the same table whose
//! cells all satisfy the expected predicates. Columns the expected row does
//! not name are ignored. Attempts repeat with a pause until everything
//! matches or the [`TimedPeriod`] budget runs out.
//!
//! A failed match is a [`MatchOutcome`], not an error. Errors are reserved
//! for failures to load live data.

mod period;
mod source;

use std::fmt;

use serde_json::Value;
use tracing::{debug, warn};

use crate::dataset::{ColumnPredicate, ExpectedDataset, LiveDataset, Row};
use crate::error::FixtureResult;
use crate::obs;

pub use period::{Deadline, TimedPeriod};
pub use source::{DatabaseDatasetLoader, DatasetSource};

const SEPARATOR_WIDTH: usize = 80;

/// One expected column that the chosen candidate row did not satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMismatch {
    pub column: String,
    /// Description of the expected predicate.
    pub expected: String,
    /// `None` when the candidate has no such column, or there is no candidate.
    pub actual: Option<Value>,
}

/// An expected row with no matching live row, and the closest live row seen.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchedRow {
    pub expected: Row<ColumnPredicate>,
    /// Live row with the fewest failing columns; earliest wins ties.
    pub candidate: Option<Row<Value>>,
    pub mismatches: Vec<ColumnMismatch>,
}

/// Result of one comparison pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    expected_rows: usize,
    unmatched: Vec<UnmatchedRow>,
}

impl Comparison {
    /// At least one expected row, and every expected row matched.
    pub fn is_match(&self) -> bool {
        self.expected_rows > 0 && self.unmatched.is_empty()
    }

    pub fn unmatched(&self) -> &[UnmatchedRow] {
        &self.unmatched
    }
}

/// Compare once, without retrying.
pub fn compare(expected: &ExpectedDataset, live: &LiveDataset) -> Comparison {
    let mut expected_rows = 0;
    let mut unmatched = Vec::new();

    for row in expected.non_empty_rows() {
        expected_rows += 1;
        let candidates: Vec<&Row<Value>> = live.rows_of(row.table()).collect();

        let mut best: Option<(usize, Vec<ColumnMismatch>)> = None;
        let mut matched = false;
        for (i, candidate) in candidates.iter().copied().enumerate() {
            let mismatches = evaluate(row, Some(candidate));
            if mismatches.is_empty() {
                matched = true;
                break;
            }
            if best.as_ref().map_or(true, |(_, m)| mismatches.len() < m.len()) {
                best = Some((i, mismatches));
            }
        }
        if matched {
            continue;
        }

        let (candidate, mismatches) = match best {
            Some((i, mismatches)) => (Some(candidates[i].clone()), mismatches),
            None => (None, evaluate(row, None)),
        };
        unmatched.push(UnmatchedRow {
            expected: row.clone(),
            candidate,
            mismatches,
        });
    }

    Comparison {
        expected_rows,
        unmatched,
    }
}

fn evaluate(expected: &Row<ColumnPredicate>, live: Option<&Row<Value>>) -> Vec<ColumnMismatch> {
    expected
        .columns()
        .filter_map(|(column, predicate)| {
            let actual = live.and_then(|row| row.get(column));
            (!predicate.accepts(actual)).then(|| ColumnMismatch {
                column: column.to_string(),
                expected: predicate.description().to_string(),
                actual: actual.cloned(),
            })
        })
        .collect()
}

/// Final result of [`DatasetMatcher::matches`].
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    matched: bool,
    attempts: u32,
    expected: ExpectedDataset,
    unmatched: Vec<UnmatchedRow>,
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        self.matched
    }

    /// Number of times live data was loaded and compared.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Unmatched rows of the last attempt.
    pub fn unmatched(&self) -> &[UnmatchedRow] {
        &self.unmatched
    }

    /// Human-readable diff. Empty when the match succeeded.
    pub fn report(&self) -> String {
        if self.matched {
            return String::new();
        }
        let separator = "-".repeat(SEPARATOR_WIDTH);

        let mut failed = ExpectedDataset::new();
        for row in &self.unmatched {
            failed.push(row.expected.clone());
        }

        let mut report = format!("{}{separator}\nFailed to match:\n{failed}", self.expected);
        if self.expected.non_empty_rows().next().is_none() {
            report.push_str("(expected dataset has no rows)\n");
        }
        for row in &self.unmatched {
            for mismatch in &row.mismatches {
                let actual = mismatch
                    .actual
                    .as_ref()
                    .map_or_else(|| "<missing>".to_string(), Value::to_string);
                report.push_str(&format!(
                    "Table={}, column={}, expected value='{}', actual value='{}'\n",
                    row.expected.table().name(),
                    mismatch.column,
                    mismatch.expected,
                    actual
                ));
            }
        }
        report.push_str(&separator);
        report.push('\n');
        report
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report())
    }
}

/// Polls a [`DatasetSource`] until the expected dataset matches or the time
/// budget runs out.
#[derive(Debug, Clone, Default)]
pub struct DatasetMatcher {
    period: TimedPeriod,
}

impl DatasetMatcher {
    pub fn new(period: TimedPeriod) -> Self {
        Self { period }
    }

    pub fn period(&self) -> TimedPeriod {
        self.period
    }

    /// The budget starts after the first failed attempt, so at least one
    /// attempt is always made. An expected dataset without non-empty rows
    /// never matches and is not polled.
    pub async fn matches<S>(
        &self,
        expected: &ExpectedDataset,
        source: &S,
    ) -> FixtureResult<MatchOutcome>
    where
        S: DatasetSource + ?Sized,
    {
        if expected.non_empty_rows().next().is_none() {
            warn!("expected dataset has no rows, refusing to report a match");
            obs::emit_match_finished(false, 0);
            return Ok(MatchOutcome {
                matched: false,
                attempts: 0,
                expected: expected.clone(),
                unmatched: Vec::new(),
            });
        }

        let mut deadline: Option<Deadline> = None;
        let mut attempts = 0;
        loop {
            attempts += 1;
            let live = source.load().await?;
            let comparison = compare(expected, &live);
            obs::emit_match_attempt(attempts, comparison.unmatched.len());

            if comparison.is_match() {
                obs::emit_match_finished(true, attempts);
                return Ok(MatchOutcome {
                    matched: true,
                    attempts,
                    expected: expected.clone(),
                    unmatched: Vec::new(),
                });
            }

            let budget = *deadline.get_or_insert_with(|| self.period.start());
            if self.period.timeout.is_zero() || budget.expired() {
                warn!(
                    attempts,
                    unmatched = comparison.unmatched.len(),
                    timeout_ms = u64::try_from(self.period.timeout.as_millis()).unwrap_or(u64::MAX),
                    "dataset did not match within time budget"
                );
                obs::emit_match_finished(false, attempts);
                return Ok(MatchOutcome {
                    matched: false,
                    attempts,
                    expected: expected.clone(),
                    unmatched: comparison.unmatched,
                });
            }

            debug!(
                attempt = attempts,
                remaining_ms = u64::try_from(budget.remaining().as_millis()).unwrap_or(u64::MAX),
                "dataset not matched yet, retrying"
            );
            tokio::time::sleep(self.period.pause).await;
        }
    }
}
