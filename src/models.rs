use chrono::NaiveDateTime;
use serde::Serialize;

use crate::catalog::{QuestionKey, QUESTIONS, QUESTION_COUNT};
use crate::scoring;

pub type ScoreVector = [f64; QUESTION_COUNT];

/// One label per question, indexed in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ratings([String; QUESTION_COUNT]);

impl Ratings {
    pub fn new(labels: [String; QUESTION_COUNT]) -> Self {
        Self(labels)
    }

    /// Every question answered with its best label, as the entry form starts.
    pub fn best() -> Self {
        Self(std::array::from_fn(|i| QUESTIONS[i].best_label().to_string()))
    }

    #[cfg(test)]
    pub fn worst() -> Self {
        Self(std::array::from_fn(|i| QUESTIONS[i].worst_label().to_string()))
    }

    pub fn get(&self, key: QuestionKey) -> &str {
        &self.0[key.index()]
    }

    pub fn set(&mut self, key: QuestionKey, label: impl Into<String>) {
        self.0[key.index()] = label.into();
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionKey, &str)> {
        QuestionKey::ALL
            .into_iter()
            .zip(self.0.iter().map(String::as_str))
    }

    pub fn scores(&self) -> [u8; QUESTION_COUNT] {
        std::array::from_fn(|i| scoring::score(QuestionKey::ALL[i], &self.0[i]))
    }

    /// Copy with every stored label snapped onto the question's known labels,
    /// unrecognized values falling back to the best label.
    pub fn normalized(&self) -> Self {
        Self(std::array::from_fn(|i| {
            let question = &QUESTIONS[i];
            question.labels[question.default_index(&self.0[i])].to_string()
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub student_name: String,
    pub ratings: Ratings,
}

impl Observation {
    pub fn display_label(&self) -> String {
        format!("{} (ID: {})", self.timestamp.format("%Y-%m-%d %H:%M"), self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentSummary {
    pub student_name: String,
    pub observation_count: usize,
    pub latest: NaiveDateTime,
    pub scores: ScoreVector,
    pub overall: f64,
}
