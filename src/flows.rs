//! Entry, edit/delete and class-view flows.
//!
//! Every mutating flow hands back the freshly read state the next view needs,
//! so callers never have to re-query after a change.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::aggregate;
use crate::catalog::QuestionKey;
use crate::charts::{ChartSet, CLASS_COLOR, STUDENT_COLOR};
use crate::db;
use crate::error::FlowError;
use crate::models::{Observation, Ratings, StudentSummary};

/// One `KEY=LABEL` choice from the entry or edit surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub key: QuestionKey,
    pub label: String,
}

impl std::str::FromStr for Answer {
    type Err = FlowError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (key, label) = value
            .split_once('=')
            .ok_or_else(|| FlowError::MalformedAnswer(value.to_string()))?;
        let key: QuestionKey = key.parse()?;
        let label = label.trim();
        if label.is_empty() {
            return Err(FlowError::MalformedAnswer(value.to_string()));
        }
        Ok(Answer {
            key,
            label: label.to_string(),
        })
    }
}

/// Applies answers on top of `base`, checking each label against its question.
pub fn apply_answers(base: Ratings, answers: &[Answer]) -> Result<Ratings, FlowError> {
    let mut ratings = base;
    for answer in answers {
        if !answer.key.question().accepts(&answer.label) {
            return Err(FlowError::unknown_label(answer.key, &answer.label));
        }
        ratings.set(answer.key, answer.label.clone());
    }
    Ok(ratings)
}

/// State shown after an observation is saved, selected or edited.
#[derive(Debug, Clone)]
pub struct ObservationView {
    pub observation: Observation,
    pub charts: ChartSet,
}

impl ObservationView {
    fn new(observation: Observation, radar_title: &str) -> Self {
        let scores = observation.ratings.scores().map(f64::from);
        let charts = ChartSet::new(
            scores,
            radar_title,
            "Performance Breakdown",
            STUDENT_COLOR,
            &observation.student_name,
        );
        Self { observation, charts }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassView {
    pub observation_count: usize,
    /// Stored labels outside the catalog, each counted as 0 in the averages.
    pub unrecognized: usize,
    pub charts: ChartSet,
    pub students: Vec<StudentSummary>,
}

/// Result of a delete: what remains of that student's history.
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub deleted: Observation,
    pub remaining_history: Vec<Observation>,
}

/// Validates and saves a new observation. Questions without an answer take
/// their best label, the same starting point as the entry form.
pub async fn record(
    pool: &SqlitePool,
    student_name: &str,
    answers: &[Answer],
) -> anyhow::Result<ObservationView> {
    if student_name.trim().is_empty() {
        return Err(FlowError::BlankStudentName.into());
    }
    let ratings = apply_answers(Ratings::best(), answers)?;
    let observation = db::insert(pool, student_name, &ratings).await?;
    Ok(ObservationView::new(observation, "Skill Profile (Radar Chart)"))
}

pub async fn show(pool: &SqlitePool, id: i64) -> anyhow::Result<ObservationView> {
    let observation = db::get(pool, id).await?.ok_or(FlowError::NotFound(id))?;
    warn_unrecognized(&observation);
    Ok(ObservationView::new(observation, "Skill Profile (Radar)"))
}

/// The edit surface: stored labels pre-populate each question (unknown ones
/// fall back to the best label), answers override them, and all ten fields
/// are written back.
pub async fn edit(pool: &SqlitePool, id: i64, answers: &[Answer]) -> anyhow::Result<ObservationView> {
    let current = db::get(pool, id).await?.ok_or(FlowError::NotFound(id))?;
    warn_unrecognized(&current);

    let ratings = apply_answers(current.ratings.normalized(), answers)?;
    if !db::update(pool, id, &ratings).await? {
        return Err(FlowError::NotFound(id).into());
    }

    let refreshed = db::get(pool, id).await?.ok_or(FlowError::NotFound(id))?;
    Ok(ObservationView::new(refreshed, "Skill Profile (Radar)"))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> anyhow::Result<DeleteOutcome> {
    let existing = db::get(pool, id).await?.ok_or(FlowError::NotFound(id))?;
    if !db::delete(pool, id).await? {
        return Err(FlowError::NotFound(id).into());
    }

    let remaining_history = db::history(pool, &existing.student_name).await?;
    Ok(DeleteOutcome {
        deleted: existing,
        remaining_history,
    })
}

pub async fn students(pool: &SqlitePool) -> anyhow::Result<Vec<String>> {
    db::list_students(pool).await
}

pub async fn history(pool: &SqlitePool, student_name: &str) -> anyhow::Result<Vec<Observation>> {
    db::history(pool, student_name).await
}

/// Class averages over every stored observation.
pub async fn class_view(pool: &SqlitePool) -> anyhow::Result<ClassView> {
    let observations = db::list_all(pool).await?;
    class_view_of(&observations)
}

pub fn class_view_of(observations: &[Observation]) -> anyhow::Result<ClassView> {
    let scores = aggregate::class_profile(observations).ok_or(FlowError::NoData)?;
    let charts = ChartSet::new(
        scores,
        "Class Average Skill Profile",
        "Class Average Breakdown",
        CLASS_COLOR,
        "Class Average",
    );

    let unrecognized = aggregate::count_unrecognized(observations);
    if unrecognized > 0 {
        tracing::warn!(unrecognized, "class averages include labels outside the catalog; they score 0");
    }

    Ok(ClassView {
        observation_count: observations.len(),
        unrecognized,
        charts,
        students: aggregate::student_summaries(observations),
    })
}

fn warn_unrecognized(observation: &Observation) {
    let unknown = aggregate::count_unrecognized(std::slice::from_ref(observation));
    if unknown > 0 {
        tracing::warn!(
            id = observation.id,
            unknown,
            "observation has labels outside the catalog; they score 0"
        );
    }
}
