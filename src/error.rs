// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Typed failures raised by the flow engine.
//!
//! "Nothing matched" is never an error here: empty windows and empty
//! leaderboards come back as empty results.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("schema error: {0}")]
    Schema(String),

    #[error("no usable rows in {0}")]
    EmptyData(String),

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("reference snapshot '{0}' was not supplied")]
    MissingReference(String),

    #[error("snapshot '{0}' was not supplied")]
    UnknownSnapshot(String),

    #[error("category '{category}' present at '{reference}' is missing at '{comparison}'")]
    CategoryMismatch {
        category: String,
        reference: String,
        comparison: String,
    },

    #[error("snapshot '{0}' has a zero total")]
    ZeroTotal(String),

    /// An amount left the range a `Decimal` can hold.
    #[error("amount overflow: {0}")]
    Overflow(String),

    #[error("series is not sorted by date: {previous} comes before {next}")]
    UnsortedInput {
        previous: chrono::NaiveDate,
        next: chrono::NaiveDate,
    },
}

pub type Result<T> = std::result::Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_item() {
        let err = FlowError::CategoryMismatch {
            category: "Equity".into(),
            reference: "t".into(),
            comparison: "t-7".into(),
        };
        assert_eq!(
            err.to_string(),
            "category 'Equity' present at 't' is missing at 't-7'"
        );
        assert_eq!(
            FlowError::ColumnNotFound("PYŞ".into()).to_string(),
            "column 'PYŞ' not found"
        );
        assert_eq!(
            FlowError::Overflow("net flow of AFT on 2025-01-02".into()).to_string(),
            "amount overflow: net flow of AFT on 2025-01-02"
        );
    }

    #[test]
    fn converts_into_anyhow_with_context() {
        use anyhow::Context;
        let res: anyhow::Result<()> = Err(FlowError::MissingReference("t".into()))
            .context("building comparison");
        let err = res.unwrap_err();
        assert_eq!(err.to_string(), "building comparison");
        assert!(format!("{:?}", err).contains("reference snapshot 't'"));
    }
}
