use std::collections::HashMap;

use crate::catalog::{QuestionKey, QUESTION_COUNT};
use crate::models::{Observation, ScoreVector, StudentSummary};
use crate::scoring;

/// Mean score per key over `observations`, in the order of `keys`.
///
/// Returns `None` for an empty slice; report views show a "no data" message
/// instead of a chart in that case. Unrecognized labels add 0 without logging;
/// callers warn once per view using [`count_unrecognized`].
pub fn mean_scores_across(
    observations: &[Observation],
    keys: &[QuestionKey; QUESTION_COUNT],
) -> Option<ScoreVector> {
    if observations.is_empty() {
        return None;
    }

    let mut totals = [0u32; QUESTION_COUNT];
    for observation in observations {
        for (slot, key) in keys.iter().enumerate() {
            totals[slot] += u32::from(scoring::score(*key, observation.ratings.get(*key)));
        }
    }

    let count = observations.len() as f64;
    Some(totals.map(|total| f64::from(total) / count))
}

/// Class profile in catalog order.
pub fn class_profile(observations: &[Observation]) -> Option<ScoreVector> {
    mean_scores_across(observations, &QuestionKey::ALL)
}

pub fn overall(scores: &ScoreVector) -> f64 {
    scores.iter().sum::<f64>() / scores.len() as f64
}

pub fn count_unrecognized(observations: &[Observation]) -> usize {
    observations
        .iter()
        .flat_map(|observation| observation.ratings.iter())
        .filter(|(key, label)| !scoring::is_recognized(*key, label))
        .count()
}

/// Groups observations by exact student name, sorted by lowest overall score
/// first so the children needing the most support lead the report.
pub fn student_summaries(observations: &[Observation]) -> Vec<StudentSummary> {
    let mut groups: HashMap<&str, Vec<Observation>> = HashMap::new();
    for observation in observations {
        groups
            .entry(observation.student_name.as_str())
            .or_default()
            .push(observation.clone());
    }

    let mut summaries: Vec<StudentSummary> = groups
        .into_iter()
        .filter_map(|(name, group)| {
            let scores = class_profile(&group)?;
            let latest = group.iter().map(|o| o.timestamp).max()?;
            Some(StudentSummary {
                student_name: name.to_string(),
                observation_count: group.len(),
                latest,
                overall: overall(&scores),
                scores,
            })
        })
        .collect();

    summaries.sort_by(|a, b| {
        a.overall
            .partial_cmp(&b.overall)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.student_name.cmp(&b.student_name))
    });
    summaries
}
