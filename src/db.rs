use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, Row, Sqlite};

use crate::catalog::{QuestionKey, QUESTIONS};
use crate::config::Config;
use crate::models::{Observation, Ratings};

pub async fn connect(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("invalid database url '{}'", config.database_url))?
        .create_if_missing(true);

    // Every connection to an in-memory database sees its own empty database.
    let max_connections = if config.database_url.contains(":memory:") {
        1
    } else {
        config.max_connections
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;

    tracing::debug!(url = %config.database_url, max_connections, "database pool ready");
    Ok(pool)
}

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn rating_columns() -> String {
    QuestionKey::ALL
        .iter()
        .map(|key| key.column())
        .collect::<Vec<_>>()
        .join(", ")
}

fn select_sql(tail: &str) -> String {
    format!(
        "SELECT id, timestamp, student_name, {} FROM observations {tail}",
        rating_columns()
    )
}

fn observation_from_row(row: &SqliteRow) -> anyhow::Result<Observation> {
    let mut ratings = Ratings::new(Default::default());
    for key in QuestionKey::ALL {
        let label: Option<String> = row.try_get(key.column())?;
        ratings.set(key, label.unwrap_or_default());
    }

    let student_name: Option<String> = row.try_get("student_name")?;
    Ok(Observation {
        id: row.try_get("id")?,
        timestamp: row.try_get("timestamp")?,
        student_name: student_name.unwrap_or_default(),
        ratings,
    })
}

/// Inserts through any executor, so imports can run inside one transaction.
pub async fn insert<'c, E>(
    executor: E,
    student_name: &str,
    ratings: &Ratings,
) -> anyhow::Result<Observation>
where
    E: Executor<'c, Database = Sqlite>,
{
    let placeholders = vec!["?"; QuestionKey::ALL.len()].join(", ");
    let sql = format!(
        "INSERT INTO observations (student_name, {}) VALUES (?, {placeholders}) \
         RETURNING id, timestamp",
        rating_columns()
    );

    let mut query = sqlx::query(&sql).bind(student_name);
    for (_, label) in ratings.iter() {
        query = query.bind(label);
    }

    let row = query
        .fetch_one(executor)
        .await
        .context("failed to insert observation")?;

    let observation = Observation {
        id: row.try_get("id")?,
        timestamp: row.try_get("timestamp")?,
        student_name: student_name.to_string(),
        ratings: ratings.clone(),
    };
    tracing::info!(id = observation.id, student = student_name, "observation saved");
    Ok(observation)
}

/// Overwrites the ten rating columns of `id`. Returns `false` when no such
/// observation exists.
pub async fn update(pool: &SqlitePool, id: i64, ratings: &Ratings) -> anyhow::Result<bool> {
    let assignments = QuestionKey::ALL
        .iter()
        .map(|key| format!("{} = ?", key.column()))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE observations SET {assignments} WHERE id = ?");

    let mut query = sqlx::query(&sql);
    for (_, label) in ratings.iter() {
        query = query.bind(label);
    }

    let result = query
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("failed to update observation {id}"))?;

    let updated = result.rows_affected() > 0;
    if updated {
        tracing::info!(id, "observation updated");
    } else {
        tracing::warn!(id, "update skipped, observation not found");
    }
    Ok(updated)
}

/// Hard delete. Returns `false` when nothing was removed.
pub async fn delete(pool: &SqlitePool, id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM observations WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("failed to delete observation {id}"))?;

    let deleted = result.rows_affected() > 0;
    if deleted {
        tracing::info!(id, "observation deleted");
    }
    Ok(deleted)
}

pub async fn list_all(pool: &SqlitePool) -> anyhow::Result<Vec<Observation>> {
    let rows = sqlx::query(&select_sql("ORDER BY id"))
        .fetch_all(pool)
        .await
        .context("failed to read observations")?;

    rows.iter().map(observation_from_row).collect()
}

pub async fn get(pool: &SqlitePool, id: i64) -> anyhow::Result<Option<Observation>> {
    let row = sqlx::query(&select_sql("WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to read observation {id}"))?;

    row.as_ref().map(observation_from_row).transpose()
}

/// Distinct student names in the order they were first recorded.
pub async fn list_students(pool: &SqlitePool) -> anyhow::Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT student_name
        FROM observations
        WHERE student_name IS NOT NULL
        GROUP BY student_name
        ORDER BY MIN(id)
        "#,
    )
    .fetch_all(pool)
    .await
    .context("failed to list students")?;

    rows.iter()
        .map(|row| row.try_get::<String, _>("student_name").map_err(anyhow::Error::from))
        .collect()
}

/// One student's observations, newest first.
pub async fn history(pool: &SqlitePool, student_name: &str) -> anyhow::Result<Vec<Observation>> {
    let rows = sqlx::query(&select_sql(
        "WHERE student_name = ? ORDER BY timestamp DESC, id DESC",
    ))
    .bind(student_name)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to read history for {student_name}"))?;

    rows.iter().map(observation_from_row).collect()
}

pub async fn count(pool: &SqlitePool) -> anyhow::Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS total FROM observations")
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("total")?)
}

/// Loads a small demo class. Does nothing if observations already exist.
pub async fn seed(pool: &SqlitePool) -> anyhow::Result<usize> {
    if count(pool).await? > 0 {
        tracing::info!("observations already present, skipping seed");
        return Ok(0);
    }

    // Label position per question: 0 is the best answer, 4 the worst.
    let students: [(&str, [usize; 10]); 4] = [
        ("Rohan Sharma", [0, 1, 2, 1, 0, 2, 1, 0, 1, 2]),
        ("Rohan Sharma", [0, 0, 1, 1, 0, 1, 0, 0, 1, 1]),
        ("Aanya Gupta", [1, 2, 3, 2, 1, 3, 2, 2, 3, 3]),
        ("Kabir Mehta", [0, 1, 0, 0, 1, 0, 0, 1, 0, 0]),
    ];

    let mut inserted = 0usize;
    for (name, positions) in students {
        let ratings = Ratings::new(std::array::from_fn(|i| {
            QUESTIONS[i].labels[positions[i]].to_string()
        }));
        insert(pool, name, &ratings).await?;
        inserted += 1;
    }

    Ok(inserted)
}

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    student_name: String,
    q1_instructions: String,
    q2_turns: String,
    q3_emotions: String,
    q4_sharing: String,
    q5_space: String,
    q6_focus: String,
    q7_joining: String,
    q8_help: String,
    q9_independence: String,
    q10_persistence: String,
}

impl CsvRow {
    fn into_parts(self) -> (String, Ratings) {
        let ratings = Ratings::new([
            self.q1_instructions,
            self.q2_turns,
            self.q3_emotions,
            self.q4_sharing,
            self.q5_space,
            self.q6_focus,
            self.q7_joining,
            self.q8_help,
            self.q9_independence,
            self.q10_persistence,
        ]);
        (self.student_name, ratings)
    }
}

/// Imports observations from a CSV file with a `student_name` column and one
/// column per question. Extra columns such as `id` or `timestamp` are ignored;
/// imported rows get fresh ids and timestamps. The whole file is imported in
/// one transaction: a bad record leaves the table untouched.
pub async fn import_csv(pool: &SqlitePool, csv_path: &Path) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut tx = pool.begin().await.context("failed to start import")?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let (student_name, ratings) = result
            .with_context(|| format!("invalid CSV record {} in {}", line + 1, csv_path.display()))?
            .into_parts();

        if student_name.trim().is_empty() {
            tracing::warn!(record = line + 1, "skipping row without a student name");
            continue;
        }

        for (key, label) in ratings.iter() {
            if !crate::scoring::is_recognized(key, label) {
                tracing::warn!(record = line + 1, question = %key, label, "unrecognized label imported");
            }
        }

        insert(&mut *tx, &student_name, &ratings).await?;
        inserted += 1;
    }

    tx.commit().await.context("failed to commit import")?;
    Ok(inserted)
}

pub async fn export_csv(pool: &SqlitePool, csv_path: &Path) -> anyhow::Result<usize> {
    let observations = list_all(pool).await?;
    let mut writer = csv::Writer::from_path(csv_path)
        .with_context(|| format!("failed to create {}", csv_path.display()))?;

    let mut header = vec!["id", "timestamp", "student_name"];
    header.extend(QuestionKey::ALL.iter().map(|key| key.column()));
    writer.write_record(&header)?;

    for observation in &observations {
        let mut record = vec![
            observation.id.to_string(),
            observation.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            observation.student_name.clone(),
        ];
        record.extend(observation.ratings.iter().map(|(_, label)| label.to_string()));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(observations.len())
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        ..Config::default()
    };
    let pool = connect(&config).await.unwrap();
    init_db(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_list_returns_record() {
        let pool = memory_pool().await;
        let ratings = Ratings::best();
        let saved = insert(&pool, "Rohan Sharma", &ratings).await.unwrap();

        let all = list_all(&pool).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, saved.id);
        assert_eq!(all[0].student_name, "Rohan Sharma");
        assert_eq!(all[0].ratings, ratings);
        assert_eq!(all[0].timestamp, saved.timestamp);
    }

    #[tokio::test]
    async fn update_rewrites_only_ratings() {
        let pool = memory_pool().await;
        let saved = insert(&pool, "Aanya", &Ratings::best()).await.unwrap();

        let mut changed = Ratings::worst();
        changed.set(QuestionKey::Q6Focus, "Mostly focused");
        assert!(update(&pool, saved.id, &changed).await.unwrap());

        let reread = get(&pool, saved.id).await.unwrap().unwrap();
        assert_eq!(reread.ratings, changed);
        assert_eq!(reread.student_name, "Aanya");
        assert_eq!(reread.timestamp, saved.timestamp);
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_ids() {
        let pool = memory_pool().await;
        assert!(!update(&pool, 42, &Ratings::best()).await.unwrap());
        assert!(!delete(&pool, 42).await.unwrap());
        assert!(list_all(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_and_ids_are_not_reused() {
        let pool = memory_pool().await;
        let first = insert(&pool, "Kabir", &Ratings::best()).await.unwrap();
        let second = insert(&pool, "Kabir", &Ratings::worst()).await.unwrap();

        assert!(delete(&pool, second.id).await.unwrap());
        assert!(!delete(&pool, second.id).await.unwrap());
        let remaining = list_all(&pool).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, first.id);

        let third = insert(&pool, "Kabir", &Ratings::best()).await.unwrap();
        assert!(third.id > second.id);
    }

    #[tokio::test]
    async fn students_and_history() {
        let pool = memory_pool().await;
        let a = insert(&pool, "Rohan", &Ratings::best()).await.unwrap();
        insert(&pool, "Aanya", &Ratings::best()).await.unwrap();
        let b = insert(&pool, "Rohan", &Ratings::worst()).await.unwrap();

        assert_eq!(list_students(&pool).await.unwrap(), vec!["Rohan", "Aanya"]);

        let history = history(&pool, "Rohan").await.unwrap();
        let ids: Vec<i64> = history.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
        assert!(super::history(&pool, "rohan").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seed_runs_once() {
        let pool = memory_pool().await;
        assert_eq!(seed(&pool).await.unwrap(), 4);
        assert_eq!(seed(&pool).await.unwrap(), 0);
        assert_eq!(count(&pool).await.unwrap(), 4);
    }

    const CSV_HEADER: &str = "student_name,q1_instructions,q2_turns,q3_emotions,q4_sharing,\
q5_space,q6_focus,q7_joining,q8_help,q9_independence,q10_persistence\n";

    fn best_row(name: &str) -> String {
        let labels: Vec<&str> = QUESTIONS.iter().map(|q| q.best_label()).collect();
        format!("{name},{}\n", labels.join(","))
    }

    #[tokio::test]
    async fn import_is_all_or_nothing() {
        let pool = memory_pool().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        let body = format!(
            "{CSV_HEADER}{}{}Kabir,Immediately,Always waits\n",
            best_row("Rohan"),
            best_row("Aanya")
        );
        std::fs::write(&path, body).unwrap();

        assert!(import_csv(&pool, &path).await.is_err());
        assert_eq!(count(&pool).await.unwrap(), 0);

        let fixed = format!("{CSV_HEADER}{}{}", best_row("Rohan"), best_row("Aanya"));
        std::fs::write(&path, fixed).unwrap();
        assert_eq!(import_csv(&pool, &path).await.unwrap(), 2);
        assert_eq!(count(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn import_skips_blank_names_and_keeps_unknown_labels() {
        let pool = memory_pool().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.csv");
        let odd = best_row("Asha").replace("Always shares", "Shares on good days");
        let body = format!("{CSV_HEADER}{}{odd}", best_row("  "));
        std::fs::write(&path, body).unwrap();

        assert_eq!(import_csv(&pool, &path).await.unwrap(), 1);
        let all = list_all(&pool).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].student_name, "Asha");
        assert_eq!(all[0].ratings.get(QuestionKey::Q4Sharing), "Shares on good days");
        assert_eq!(all[0].ratings.get(QuestionKey::Q1Instructions), "Immediately");
    }

    #[tokio::test]
    async fn csv_export_then_import() {
        let source = memory_pool().await;
        seed(&source).await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observations.csv");
        assert_eq!(export_csv(&source, &path).await.unwrap(), 4);

        let target = memory_pool().await;
        assert_eq!(import_csv(&target, &path).await.unwrap(), 4);
        let imported = list_all(&target).await.unwrap();
        let original = list_all(&source).await.unwrap();
        for (a, b) in imported.iter().zip(original.iter()) {
            assert_eq!(a.student_name, b.student_name);
            assert_eq!(a.ratings, b.ratings);
        }
    }
}
