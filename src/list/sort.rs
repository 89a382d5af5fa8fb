//! Column sorting
//!
//! Each column cycles `default → asc → desc → default`; picking another
//! column starts over at `asc`. Default is the server's order.

use chrono::NaiveDate;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SortState {
    #[default]
    Default,
    Sorted {
        key: String,
        direction: SortDirection,
    },
}

impl SortState {
    /// Advance the three-state cycle for `key`
    pub fn toggle(&mut self, key: &str) {
        *self = match std::mem::take(self) {
            SortState::Sorted { key: current, direction } if current == key => match direction {
                SortDirection::Asc => SortState::Sorted {
                    key: current,
                    direction: SortDirection::Desc,
                },
                SortDirection::Desc => SortState::Default,
            },
            _ => SortState::Sorted {
                key: key.to_string(),
                direction: SortDirection::Asc,
            },
        };
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            SortState::Sorted { key, .. } => Some(key),
            SortState::Default => None,
        }
    }

    pub fn direction(&self) -> Option<SortDirection> {
        match self {
            SortState::Sorted { direction, .. } => Some(*direction),
            SortState::Default => None,
        }
    }
}

/// Comparable cell value
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    /// Missing dates sort first
    Date(Option<NaiveDate>),
    Number(i64),
    Decimal(f64),
}

impl SortValue {
    pub fn text(value: impl Into<String>) -> Self {
        SortValue::Text(value.into())
    }

    /// Integer column fed from free text; unparseable counts as 0
    pub fn number(raw: &str) -> Self {
        SortValue::Number(raw.trim().parse().unwrap_or(0))
    }

    pub fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            (SortValue::Number(a), SortValue::Number(b)) => a.cmp(b),
            (SortValue::Decimal(a), SortValue::Decimal(b)) => a.total_cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Stable sort of `rows` by the value `key_of` extracts
pub fn sort_rows<'a, T, F>(rows: Vec<&'a T>, direction: SortDirection, key_of: F) -> Vec<&'a T>
where
    F: Fn(&T) -> SortValue,
{
    let mut keyed: Vec<(SortValue, &'a T)> = rows.into_iter().map(|r| (key_of(r), r)).collect();
    keyed.sort_by(|(a, _), (b, _)| direction.apply(a.compare(b)));
    keyed.into_iter().map(|(_, r)| r).collect()
}
