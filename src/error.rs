//! Validation errors surfaced to the person entering or editing observations.
//!
//! Database and I/O failures travel as `anyhow::Error`; these are the cases a
//! caller is expected to match on and report back verbatim.

use thiserror::Error;

use crate::catalog::QuestionKey;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    /// Entry was submitted without a student name.
    #[error("please enter a student name before saving")]
    BlankStudentName,

    #[error("unknown question key: {0}")]
    UnknownQuestion(String),

    /// The label is not one of the five answers for that question.
    #[error("'{label}' is not an answer for {key}; expected one of: {expected}")]
    UnknownLabel {
        key: QuestionKey,
        label: String,
        expected: String,
    },

    /// An `--answer` argument without the `KEY=LABEL` shape.
    #[error("answer must look like KEY=LABEL, got '{0}'")]
    MalformedAnswer(String),

    #[error("observation {0} not found")]
    NotFound(i64),

    #[error("no observations yet; record one first")]
    NoData,
}

impl FlowError {
    pub fn unknown_label(key: QuestionKey, label: &str) -> Self {
        FlowError::UnknownLabel {
            key,
            label: label.to_string(),
            expected: key.question().labels.join(", "),
        }
    }
}
