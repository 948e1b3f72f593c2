//! Typed list filters.
//!
//! These replace ad-hoc SQL string building: the HTTP layer constructs them
//! from query parameters and both store backends interpret them, so the
//! substring-search and date-range semantics are defined once.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

/// Case-insensitive substring search. `None`/empty matches everything,
/// mirroring `ILIKE '%%'`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Search(Option<String>);

impl Search {
    pub fn new(term: Option<String>) -> Self {
        Self(term.filter(|t| !t.is_empty()))
    }

    pub fn any() -> Self {
        Self(None)
    }

    /// In-memory check: does any of `fields` contain the term?
    pub fn matches<'a>(&self, fields: impl IntoIterator<Item = Option<&'a str>>) -> bool {
        match &self.0 {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                fields
                    .into_iter()
                    .flatten()
                    .any(|f| f.to_lowercase().contains(&term))
            }
        }
    }

    /// `ILIKE` pattern for the SQL backend; `None` means "no filter".
    pub fn like_pattern(&self) -> Option<String> {
        self.0.as_ref().map(|t| {
            // Escape LIKE metacharacters so the term is a literal substring.
            let escaped = t.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
            format!("%{escaped}%")
        })
    }
}

/// Inclusive calendar date range over a creation timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn all() -> Self {
        Self::default()
    }

    /// Inclusive lower bound as a UTC instant.
    pub fn start_bound(&self) -> Option<DateTime<Utc>> {
        self.start
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    /// Exclusive upper bound (midnight after `end`), so the end date itself
    /// is fully included.
    pub fn end_bound(&self) -> Option<DateTime<Utc>> {
        self.end
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    /// In-memory check.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(start) = self.start_bound() {
            if at < start {
                return false;
            }
        }
        if let Some(end) = self.end_bound() {
            if at >= end {
                return false;
            }
        }
        true
    }
}
