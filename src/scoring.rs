use crate::catalog::QuestionKey;
use crate::catalog::QuestionKey::*;

/// Score given to any label the table does not know.
pub const UNRECOGNIZED: u8 = 0;
pub const MAX_SCORE: u8 = 5;

const SCORE_TABLE: [(QuestionKey, &str, u8); 50] = [
    (Q1Instructions, "Immediately", 5),
    (Q1Instructions, "After 1 reminder", 4),
    (Q1Instructions, "After several reminders", 3),
    (Q1Instructions, "Rarely follows", 2),
    (Q1Instructions, "Never follows", 1),
    (Q2Turns, "Always waits", 5),
    (Q2Turns, "Usually waits", 4),
    (Q2Turns, "Sometimes waits", 3),
    (Q2Turns, "Rarely waits", 2),
    (Q2Turns, "Never waits", 1),
    (Q3Emotions, "Independent", 5),
    (Q3Emotions, "Mostly independent", 4),
    (Q3Emotions, "Sometimes needs help", 3),
    (Q3Emotions, "Often loses control", 2),
    (Q3Emotions, "Cannot regulate", 1),
    (Q4Sharing, "Always shares", 5),
    (Q4Sharing, "Usually shares", 4),
    (Q4Sharing, "Sometimes shares", 3),
    (Q4Sharing, "Rarely shares", 2),
    (Q4Sharing, "Never shares", 1),
    (Q5Space, "Always respects", 5),
    (Q5Space, "Mostly respects", 4),
    (Q5Space, "Sometimes respects", 3),
    (Q5Space, "Rarely respects", 2),
    (Q5Space, "Never respects", 1),
    (Q6Focus, "Highly focused", 5),
    (Q6Focus, "Mostly focused", 4),
    (Q6Focus, "Sometimes focused", 3),
    (Q6Focus, "Rarely focused", 2),
    (Q6Focus, "Cannot focus", 1),
    (Q7Joining, "Eagerly participates", 5),
    (Q7Joining, "Usually participates", 4),
    (Q7Joining, "Sometimes participates", 3),
    (Q7Joining, "Rarely participates", 2),
    (Q7Joining, "Does not participate", 1),
    (Q8Help, "Asks independently", 5),
    (Q8Help, "Asks after prompt", 4),
    (Q8Help, "Sometimes asks", 3),
    (Q8Help, "Rarely asks", 2),
    (Q8Help, "Never asks", 1),
    (Q9Independence, "Completely independent", 5),
    (Q9Independence, "Mostly independent", 4),
    (Q9Independence, "Partially independent", 3),
    (Q9Independence, "Needs guidance", 2),
    (Q9Independence, "Not independent", 1),
    (Q10Persistence, "Persistent", 5),
    (Q10Persistence, "Mostly persistent", 4),
    (Q10Persistence, "Sometimes gives up", 3),
    (Q10Persistence, "Often gives up", 2),
    (Q10Persistence, "Does not try", 1),
];

/// Score of `label` as an answer to `key`, or [`UNRECOGNIZED`] when the label
/// is not one of that question's answers.
pub fn score(key: QuestionKey, label: &str) -> u8 {
    SCORE_TABLE
        .iter()
        .find(|(entry_key, entry_label, _)| *entry_key == key && *entry_label == label)
        .map(|(_, _, value)| *value)
        .unwrap_or(UNRECOGNIZED)
}

/// Label-only lookup across every question.
///
/// Labels shared between questions ("Mostly independent") resolve to the last
/// entry; all of them currently carry the same value.
pub fn score_label(label: &str) -> u8 {
    SCORE_TABLE
        .iter()
        .rev()
        .find(|(_, entry_label, _)| *entry_label == label)
        .map(|(_, _, value)| *value)
        .unwrap_or(UNRECOGNIZED)
}

pub fn is_recognized(key: QuestionKey, label: &str) -> bool {
    score(key, label) != UNRECOGNIZED
}
