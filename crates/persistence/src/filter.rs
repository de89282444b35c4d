//! Typed filter expressions compiled into parameterized `WHERE` clauses.
//!
//! A filter is a conjunction of predicates. Empty predicates (an empty id set, an
//! absent bound) are dropped, so an empty filter selects every row.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    TextIn {
        column: &'static str,
        values: Vec<String>,
    },
    TextEq {
        column: &'static str,
        value: String,
    },
    AtOrAfter {
        column: &'static str,
        bound: DateTime<Utc>,
    },
    Before {
        column: &'static str,
        bound: DateTime<Utc>,
    },
    OccupiesGroup {
        column: &'static str,
        group: i32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `column` is one of `values`. No predicate is added for an empty set.
    pub fn text_in(mut self, column: &'static str, values: &[String]) -> Self {
        if !values.is_empty() {
            self.predicates.push(Predicate::TextIn {
                column,
                values: values.to_vec(),
            });
        }
        self
    }

    pub fn text_eq(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.predicates.push(Predicate::TextEq {
            column,
            value: value.into(),
        });
        self
    }

    /// `column >= bound`, skipped when no bound is given.
    pub fn at_or_after(mut self, column: &'static str, bound: Option<DateTime<Utc>>) -> Self {
        if let Some(bound) = bound {
            self.predicates.push(Predicate::AtOrAfter { column, bound });
        }
        self
    }

    pub fn before(mut self, column: &'static str, bound: DateTime<Utc>) -> Self {
        self.predicates.push(Predicate::Before { column, bound });
        self
    }

    /// The reservation id in `column` owns a unit of `group`.
    pub fn occupies_group(mut self, column: &'static str, group: i32) -> Self {
        self.predicates
            .push(Predicate::OccupiesGroup { column, group });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Appends ` WHERE ...` to the builder; appends nothing for an empty filter.
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        for (i, predicate) in self.predicates.iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            match predicate {
                Predicate::TextIn { column, values } => {
                    builder
                        .push(*column)
                        .push(" = ANY(")
                        .push_bind(values.clone())
                        .push(")");
                }
                Predicate::TextEq { column, value } => {
                    builder.push(*column).push(" = ").push_bind(value.clone());
                }
                Predicate::AtOrAfter { column, bound } => {
                    builder.push(*column).push(" >= ").push_bind(*bound);
                }
                Predicate::Before { column, bound } => {
                    builder.push(*column).push(" < ").push_bind(*bound);
                }
                Predicate::OccupiesGroup { column, group } => {
                    builder
                        .push(*column)
                        .push(r#" IN (SELECT reservation_id FROM "reservationUnits" WHERE ipad_group = "#)
                        .push_bind(*group)
                        .push(")");
                }
            }
        }
    }
}
