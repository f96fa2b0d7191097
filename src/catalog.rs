use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FlowError;

pub const QUESTION_COUNT: usize = 10;
pub const LABELS_PER_QUESTION: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKey {
    Q1Instructions,
    Q2Turns,
    Q3Emotions,
    Q4Sharing,
    Q5Space,
    Q6Focus,
    Q7Joining,
    Q8Help,
    Q9Independence,
    Q10Persistence,
}

impl QuestionKey {
    /// Catalog order. Every chart axis, bar row and score vector follows it.
    pub const ALL: [QuestionKey; QUESTION_COUNT] = [
        QuestionKey::Q1Instructions,
        QuestionKey::Q2Turns,
        QuestionKey::Q3Emotions,
        QuestionKey::Q4Sharing,
        QuestionKey::Q5Space,
        QuestionKey::Q6Focus,
        QuestionKey::Q7Joining,
        QuestionKey::Q8Help,
        QuestionKey::Q9Independence,
        QuestionKey::Q10Persistence,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name in the `observations` table.
    pub fn column(self) -> &'static str {
        match self {
            QuestionKey::Q1Instructions => "q1_instructions",
            QuestionKey::Q2Turns => "q2_turns",
            QuestionKey::Q3Emotions => "q3_emotions",
            QuestionKey::Q4Sharing => "q4_sharing",
            QuestionKey::Q5Space => "q5_space",
            QuestionKey::Q6Focus => "q6_focus",
            QuestionKey::Q7Joining => "q7_joining",
            QuestionKey::Q8Help => "q8_help",
            QuestionKey::Q9Independence => "q9_independence",
            QuestionKey::Q10Persistence => "q10_persistence",
        }
    }

    pub fn question(self) -> &'static Question {
        &QUESTIONS[self.index()]
    }
}

impl fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for QuestionKey {
    type Err = FlowError;

    /// Accepts the column name (`q3_emotions`) or its numeric prefix (`q3`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        QuestionKey::ALL
            .into_iter()
            .find(|key| {
                let column = key.column();
                column == wanted || column.split('_').next() == Some(wanted.as_str())
            })
            .ok_or_else(|| FlowError::UnknownQuestion(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub key: QuestionKey,
    /// Short axis name used on charts.
    pub category: &'static str,
    pub prompt: &'static str,
    /// Best (score 5) to worst (score 1).
    pub labels: [&'static str; LABELS_PER_QUESTION],
}

impl Question {
    /// Position of `label` among this question's labels, falling back to the
    /// first (best) label when the stored text is not one of them.
    pub fn default_index(&self, label: &str) -> usize {
        self.labels
            .iter()
            .position(|candidate| *candidate == label)
            .unwrap_or(0)
    }

    pub fn accepts(&self, label: &str) -> bool {
        self.labels.contains(&label)
    }

    pub fn best_label(&self) -> &'static str {
        self.labels[0]
    }

    #[cfg(test)]
    pub fn worst_label(&self) -> &'static str {
        self.labels[LABELS_PER_QUESTION - 1]
    }
}

pub static QUESTIONS: [Question; QUESTION_COUNT] = [
    Question {
        key: QuestionKey::Q1Instructions,
        category: "Instructions",
        prompt: "Follows Instructions: How consistently the child listens to and correctly follows teacher directions.",
        labels: [
            "Immediately",
            "After 1 reminder",
            "After several reminders",
            "Rarely follows",
            "Never follows",
        ],
    },
    Question {
        key: QuestionKey::Q2Turns,
        category: "Turns",
        prompt: "Takes Turns: How well the child waits for their turn during activities or discussions.",
        labels: [
            "Always waits",
            "Usually waits",
            "Sometimes waits",
            "Rarely waits",
            "Never waits",
        ],
    },
    Question {
        key: QuestionKey::Q3Emotions,
        category: "Emotions",
        prompt: "Controls Emotions: How the child regulates emotions like frustration or anger.",
        labels: [
            "Independent",
            "Mostly independent",
            "Sometimes needs help",
            "Often loses control",
            "Cannot regulate",
        ],
    },
    Question {
        key: QuestionKey::Q4Sharing,
        category: "Sharing",
        prompt: "Shares & Cooperates: Willingness to share toys and cooperate with peers.",
        labels: [
            "Always shares",
            "Usually shares",
            "Sometimes shares",
            "Rarely shares",
            "Never shares",
        ],
    },
    Question {
        key: QuestionKey::Q5Space,
        category: "Space",
        prompt: "Maintains Personal Space: Respects others' personal space and classroom boundaries.",
        labels: [
            "Always respects",
            "Mostly respects",
            "Sometimes respects",
            "Rarely respects",
            "Never respects",
        ],
    },
    Question {
        key: QuestionKey::Q6Focus,
        category: "Focus",
        prompt: "Focuses on Tasks: Ability to maintain attention until completion.",
        labels: [
            "Highly focused",
            "Mostly focused",
            "Sometimes focused",
            "Rarely focused",
            "Cannot focus",
        ],
    },
    Question {
        key: QuestionKey::Q7Joining,
        category: "Joining",
        prompt: "Joins Activities: Willingness to participate in group activities.",
        labels: [
            "Eagerly participates",
            "Usually participates",
            "Sometimes participates",
            "Rarely participates",
            "Does not participate",
        ],
    },
    Question {
        key: QuestionKey::Q8Help,
        category: "Help",
        prompt: "Asks for Help: Whether the child seeks help appropriately when needed.",
        labels: [
            "Asks independently",
            "Asks after prompt",
            "Sometimes asks",
            "Rarely asks",
            "Never asks",
        ],
    },
    Question {
        key: QuestionKey::Q9Independence,
        category: "Indep.",
        prompt: "Independent Work: Ability to perform tasks independently.",
        labels: [
            "Completely independent",
            "Mostly independent",
            "Partially independent",
            "Needs guidance",
            "Not independent",
        ],
    },
    Question {
        key: QuestionKey::Q10Persistence,
        category: "Persistence",
        prompt: "Keeps Trying: How the child responds to challenging tasks.",
        labels: [
            "Persistent",
            "Mostly persistent",
            "Sometimes gives up",
            "Often gives up",
            "Does not try",
        ],
    },
];

pub fn categories() -> [&'static str; QUESTION_COUNT] {
    std::array::from_fn(|i| QUESTIONS[i].category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_in_key_order() {
        for (i, question) in QUESTIONS.iter().enumerate() {
            assert_eq!(question.key.index(), i);
            assert_eq!(QuestionKey::ALL[i], question.key);
        }
    }

    #[test]
    fn keys_parse_from_column_and_short_form() {
        assert_eq!(
            "q3_emotions".parse::<QuestionKey>().unwrap(),
            QuestionKey::Q3Emotions
        );
        assert_eq!("q10".parse::<QuestionKey>().unwrap(), QuestionKey::Q10Persistence);
        assert_eq!("Q1".parse::<QuestionKey>().unwrap(), QuestionKey::Q1Instructions);
        assert!("q11".parse::<QuestionKey>().is_err());
        assert!("emotions".parse::<QuestionKey>().is_err());
    }

    #[test]
    fn default_index_falls_back_to_best_label() {
        let question = QuestionKey::Q2Turns.question();
        assert_eq!(question.default_index("Rarely waits"), 3);
        assert_eq!(question.default_index("Immediately"), 0);
        assert_eq!(question.default_index(""), 0);
    }

    #[test]
    fn categories_follow_catalog() {
        let names = categories();
        assert_eq!(names[0], "Instructions");
        assert_eq!(names[8], "Indep.");
        assert_eq!(names[9], "Persistence");
    }
}
