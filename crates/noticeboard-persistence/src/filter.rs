//! Filter expression compiler
//!
//! A filter is a comma separated list of `column comparator value` clauses,
//! implicitly ANDed. Each clause is split on its first two spaces, so the value
//! may itself contain spaces. Compilation is all-or-nothing: a single bad
//! clause rejects the whole expression.

use crate::error::FilterError;
use crate::store::timestamp;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use noticeboard_types::{Column, FieldError};
use std::str::FromStr;

/// Separator between alternatives of an `in` clause
const SET_SEPARATOR: char = '|';

/// Accepted spellings of a timestamp value, for error reporting
const TIMESTAMP_FORMATS: &str = "rfc3339 %Y-%m-%d %H:%M:%S %Y-%m-%d";

/// Comparison operators a clause may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Gt,
    Eq,
    Lt,
    Ge,
    Le,
    Ne,
    Like,
    In,
}

impl Comparator {
    pub const ALL: [Comparator; 8] = [
        Comparator::Gt,
        Comparator::Eq,
        Comparator::Lt,
        Comparator::Ge,
        Comparator::Le,
        Comparator::Ne,
        Comparator::Like,
        Comparator::In,
    ];

    /// Token accepted in filter expressions
    pub fn token(self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Eq => "=",
            Comparator::Lt => "<",
            Comparator::Ge => ">=",
            Comparator::Le => "<=",
            Comparator::Ne => "!=",
            Comparator::Like => "like",
            Comparator::In => "in",
        }
    }

    /// Operator emitted into query text
    pub fn as_sql(self) -> &'static str {
        match self {
            Comparator::Like => "LIKE",
            Comparator::In => "IN",
            other => other.token(),
        }
    }

    fn allowed() -> String {
        Self::ALL
            .iter()
            .map(|c| c.token())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromStr for Comparator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|c| c.token() == s).ok_or(())
    }
}

/// A single bound value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Text(String),
    Integer(i64),
}

impl Scalar {
    /// Bind value for `raw` against `column`
    ///
    /// Status binds as an integer when the text parses as one. Timestamp
    /// columns are rewritten into the stored form so they compare as times;
    /// `None` means the value is not a timestamp. `like` patterns stay text.
    fn for_column(column: Column, comparator: Comparator, raw: &str) -> Option<Self> {
        match column {
            Column::Status => Some(match raw.parse::<i64>() {
                Ok(n) => Scalar::Integer(n),
                Err(_) => Scalar::Text(raw.to_string()),
            }),
            Column::CreatedAt | Column::UpdatedAt if comparator != Comparator::Like => {
                parse_time(raw).map(|at| Scalar::Text(timestamp(at)))
            }
            _ => Some(Scalar::Text(raw.to_string())),
        }
    }
}

/// RFC 3339, or a UTC `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DD`
fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(at.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateValue {
    One(Scalar),
    Set(Vec<Scalar>),
}

/// One compiled clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: Column,
    pub comparator: Comparator,
    pub value: PredicateValue,
}

/// Compile a filter expression into predicates
///
/// A blank expression yields no predicates. Every clause error is collected so
/// the caller sees all of them at once.
pub fn compile(expression: &str) -> Result<Vec<Predicate>, FilterError> {
    if expression.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut predicates = Vec::new();
    let mut errors = Vec::new();

    for (index, raw) in expression.split(',').enumerate() {
        match compile_clause(index, raw.trim()) {
            Ok(predicate) => predicates.push(predicate),
            Err(mut clause_errors) => errors.append(&mut clause_errors),
        }
    }

    if errors.is_empty() {
        Ok(predicates)
    } else {
        Err(FilterError { errors })
    }
}

fn compile_clause(index: usize, clause: &str) -> Result<Predicate, Vec<FieldError>> {
    let mut tokens = clause.splitn(3, ' ');
    let column_token = tokens.next().unwrap_or_default();
    let comparator_token = tokens.next().unwrap_or_default();
    let value_token = tokens.next().unwrap_or_default();

    let field = |name: &str| format!("filter[{}].{}", index, name);
    let mut errors = Vec::new();

    let column = if column_token.is_empty() {
        errors.push(FieldError::new(field("column"), "required", "", ""));
        None
    } else {
        match column_token.parse::<Column>() {
            Ok(column) => Some(column),
            Err(_) => {
                errors.push(FieldError::new(
                    field("column"),
                    "oneof",
                    column_token,
                    Column::allowed(),
                ));
                None
            }
        }
    };

    let comparator = if comparator_token.is_empty() {
        errors.push(FieldError::new(field("comparator"), "required", "", ""));
        None
    } else {
        match comparator_token.parse::<Comparator>() {
            Ok(comparator) => Some(comparator),
            Err(()) => {
                errors.push(FieldError::new(
                    field("comparator"),
                    "oneof",
                    comparator_token,
                    Comparator::allowed(),
                ));
                None
            }
        }
    };

    if value_token.is_empty() {
        errors.push(FieldError::new(field("value"), "required", "", ""));
    }

    match (column, comparator) {
        (Some(column), Some(comparator)) if errors.is_empty() => {
            let scalar = |raw: &str| {
                Scalar::for_column(column, comparator, raw).ok_or_else(|| {
                    vec![FieldError::new(field("value"), "datetime", raw, TIMESTAMP_FORMATS)]
                })
            };

            let value = if comparator == Comparator::In {
                let parts: Vec<&str> = value_token.split(SET_SEPARATOR).collect();
                if parts.iter().any(|p| p.is_empty()) {
                    return Err(vec![FieldError::new(
                        field("value"),
                        "required",
                        value_token,
                        SET_SEPARATOR.to_string(),
                    )]);
                }
                PredicateValue::Set(parts.into_iter().map(scalar).collect::<Result<_, _>>()?)
            } else {
                PredicateValue::One(scalar(value_token)?)
            };
            Ok(Predicate {
                column,
                comparator,
                value,
            })
        }
        _ => Err(errors),
    }
}
