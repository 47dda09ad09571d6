//! SQLite persistence for generated articles and daily statistics.
//!
//! Handles:
//! - Article INSERT for each generated batch (one transaction per batch)
//! - Published flag updates after a successful post
//! - Per-day aggregates and the `daily_stats` upsert
//! - Dashboard and weekly-report queries
//!
//! Timestamps are stored as local wall-clock text (`%Y-%m-%d %H:%M:%S`) so
//! `DATE(created_at)` compares directly against local calendar dates.

use crate::models::{GeneratedArticle, UNKNOWN};
use crate::utils::db_timestamp;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, instrument};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("could not encode categories: {0}")]
    Encode(#[from] serde_json::Error),
}

const CREATE_ARTICLES: &str = r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        category TEXT,
        word_count INTEGER,
        reading_time TEXT,
        quality_score INTEGER,
        status TEXT DEFAULT 'generated',
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        published BOOLEAN DEFAULT FALSE,
        views INTEGER DEFAULT 0,
        likes INTEGER DEFAULT 0
    )
"#;

const CREATE_DAILY_STATS: &str = r#"
    CREATE TABLE IF NOT EXISTS daily_stats (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date DATE UNIQUE,
        total_articles INTEGER,
        total_words INTEGER,
        avg_quality REAL,
        categories_json TEXT
    )
"#;

/// Aggregates for the articles created on one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: String,
    pub total_articles: i64,
    pub total_words: i64,
    pub avg_quality: f64,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// Whole-database figures shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewStats {
    pub total_articles: i64,
    pub today_articles: i64,
    pub avg_quality: f64,
    /// Ordered by descending count.
    pub categories: Vec<CategoryCount>,
    pub total_words: i64,
}

/// One row of the weekly breakdown table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRow {
    pub date: String,
    pub article_count: i64,
    pub total_words: i64,
    pub avg_quality: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTotals {
    pub total_articles: i64,
    pub total_words: i64,
    pub avg_quality: f64,
    pub unique_categories: i64,
}

fn day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Article and statistics store.
#[derive(Clone)]
pub struct MedicalDatabase {
    pool: SqlitePool,
}

impl MedicalDatabase {
    /// Open the database file and ensure the schema exists.
    ///
    /// The file is created if missing. Both tables are created with
    /// `IF NOT EXISTS`, so opening an existing database leaves its rows alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created, or if a
    /// schema statement fails.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// Wrap an existing pool and ensure the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if a schema statement fails on the pool.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        let db = Self { pool };
        db.init().await?;
        Ok(db)
    }

    async fn init(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_ARTICLES).execute(&self.pool).await?;
        sqlx::query(CREATE_DAILY_STATS).execute(&self.pool).await?;
        info!("Database schema ready");
        Ok(())
    }

    /// Insert a batch of articles stamped with `created_at`.
    ///
    /// All rows go in one transaction: either the whole batch is stored or
    /// none of it is.
    ///
    /// # Returns
    ///
    /// The row id of each inserted article, in the order of `articles`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started, any insert
    /// fails, or the commit fails. Nothing is stored in that case.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn save_articles(
        &self,
        articles: &[GeneratedArticle],
        created_at: NaiveDateTime,
    ) -> Result<Vec<i64>, StorageError> {
        let stamp = db_timestamp(created_at);
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(articles.len());
        for article in articles {
            let result = sqlx::query(
                r#"
                INSERT INTO articles
                    (title, content, category, word_count, reading_time, quality_score, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&article.title)
            .bind(&article.content)
            .bind(&article.category)
            .bind(article.word_count as i64)
            .bind(&article.reading_time)
            .bind(article.quality_score as i64)
            .bind(&stamp)
            .execute(&mut *tx)
            .await?;
            ids.push(result.last_insert_rowid());
        }
        tx.commit().await?;
        info!(saved = ids.len(), "Saved articles");
        Ok(ids)
    }

    /// Flag the article with row id `id` as published.
    ///
    /// # Returns
    ///
    /// `true` if a row with that id existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update statement fails.
    pub async fn mark_published(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("UPDATE articles SET published = TRUE, status = 'published' WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Aggregate the articles created on `date`.
    ///
    /// # Returns
    ///
    /// Counts, word total and average quality for that local day, with the
    /// distinct categories in name order. A day without articles gives zeros
    /// and no categories.
    ///
    /// # Errors
    ///
    /// Returns an error if either query fails.
    pub async fn daily_stats(&self, date: NaiveDate) -> Result<DailyStats, StorageError> {
        let date = day(date);
        let (total_articles, total_words, avg_quality): (i64, Option<i64>, Option<f64>) = sqlx::query_as(
            r#"
            SELECT COUNT(*), SUM(word_count), AVG(quality_score)
            FROM articles
            WHERE DATE(created_at) = ?
            "#,
        )
        .bind(&date)
        .fetch_one(&self.pool)
        .await?;

        let categories: Vec<(Option<String>,)> = sqlx::query_as(
            "SELECT DISTINCT category FROM articles WHERE DATE(created_at) = ? ORDER BY category",
        )
        .bind(&date)
        .fetch_all(&self.pool)
        .await?;

        Ok(DailyStats {
            date,
            total_articles,
            total_words: total_words.unwrap_or(0),
            avg_quality: avg_quality.unwrap_or(0.0),
            categories: categories.into_iter().filter_map(|(c,)| c).collect(),
        })
    }

    /// Recompute `date`'s aggregates and upsert them into `daily_stats`.
    ///
    /// Running it twice for the same day replaces the row, so there is at
    /// most one `daily_stats` row per date.
    ///
    /// # Returns
    ///
    /// The aggregates that were written.
    ///
    /// # Errors
    ///
    /// Returns an error if the aggregation or the upsert fails, or if the
    /// category list cannot be encoded as JSON.
    #[instrument(level = "info", skip(self))]
    pub async fn record_daily_stats(&self, date: NaiveDate) -> Result<DailyStats, StorageError> {
        let stats = self.daily_stats(date).await?;
        let categories_json = serde_json::to_string(&stats.categories)?;
        sqlx::query(
            r#"
            INSERT INTO daily_stats (date, total_articles, total_words, avg_quality, categories_json)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(date) DO UPDATE SET
                total_articles = excluded.total_articles,
                total_words = excluded.total_words,
                avg_quality = excluded.avg_quality,
                categories_json = excluded.categories_json
            "#,
        )
        .bind(&stats.date)
        .bind(stats.total_articles)
        .bind(stats.total_words)
        .bind(stats.avg_quality)
        .bind(&categories_json)
        .execute(&self.pool)
        .await?;
        info!(
            articles = stats.total_articles,
            words = stats.total_words,
            "Recorded daily stats"
        );
        Ok(stats)
    }

    /// Dashboard overview. Query failures are logged and yield zeroed stats.
    pub async fn overview_stats(&self, today: NaiveDate) -> OverviewStats {
        match self.try_overview_stats(today).await {
            Ok(stats) => stats,
            Err(e) => {
                error!(error = %e, "Failed to load overview stats");
                OverviewStats::default()
            }
        }
    }

    async fn try_overview_stats(&self, today: NaiveDate) -> Result<OverviewStats, StorageError> {
        let (total_articles, total_words, avg_quality): (i64, Option<i64>, Option<f64>) =
            sqlx::query_as("SELECT COUNT(*), SUM(word_count), AVG(quality_score) FROM articles")
                .fetch_one(&self.pool)
                .await?;

        let (today_articles,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM articles WHERE DATE(created_at) = ?")
                .bind(day(today))
                .fetch_one(&self.pool)
                .await?;

        let rows: Vec<(Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT category, COUNT(*) AS count
            FROM articles
            GROUP BY category
            ORDER BY count DESC, category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(OverviewStats {
            total_articles,
            today_articles,
            avg_quality: avg_quality.unwrap_or(0.0),
            categories: rows
                .into_iter()
                .map(|(category, count)| CategoryCount {
                    category: category.unwrap_or_else(|| UNKNOWN.to_string()),
                    count,
                })
                .collect(),
            total_words: total_words.unwrap_or(0),
        })
    }

    /// Per-day rows from `since` onwards, newest first. Failures are logged
    /// and yield an empty list.
    pub async fn weekly_breakdown(&self, since: NaiveDate) -> Vec<DayRow> {
        let rows: Result<Vec<(String, i64, Option<i64>, Option<f64>)>, sqlx::Error> = sqlx::query_as(
            r#"
            SELECT DATE(created_at) AS date, COUNT(*), SUM(word_count), AVG(quality_score)
            FROM articles
            WHERE DATE(created_at) >= ?
            GROUP BY DATE(created_at)
            ORDER BY date DESC
            "#,
        )
        .bind(day(since))
        .fetch_all(&self.pool)
        .await;

        match rows {
            Ok(rows) => rows
                .into_iter()
                .map(|(date, article_count, words, quality)| DayRow {
                    date,
                    article_count,
                    total_words: words.unwrap_or(0),
                    avg_quality: quality.unwrap_or(0.0),
                })
                .collect(),
            Err(e) => {
                error!(error = %e, "Failed to load weekly breakdown");
                Vec::new()
            }
        }
    }

    /// Totals over everything created on or after `since`.
    ///
    /// # Arguments
    ///
    /// * `since` - First calendar day included, compared against the local
    ///   date part of `created_at`
    ///
    /// # Errors
    ///
    /// Returns an error if the aggregate query fails. Unlike
    /// [`overview_stats`](Self::overview_stats), nothing is zeroed here; the
    /// weekly report decides what to do.
    pub async fn weekly_totals(&self, since: NaiveDate) -> Result<WeeklyTotals, StorageError> {
        let (total_articles, total_words, avg_quality, unique_categories): (
            i64,
            Option<i64>,
            Option<f64>,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT COUNT(*), SUM(word_count), AVG(quality_score), COUNT(DISTINCT category)
            FROM articles
            WHERE DATE(created_at) >= ?
            "#,
        )
        .bind(day(since))
        .fetch_one(&self.pool)
        .await?;

        Ok(WeeklyTotals {
            total_articles,
            total_words: total_words.unwrap_or(0),
            avg_quality: avg_quality.unwrap_or(0.0),
            unique_categories,
        })
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) async fn memory_db() -> MedicalDatabase {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        MedicalDatabase::with_pool(pool).await.unwrap()
    }

    pub(crate) fn article(title: &str, category: &str, words: usize, quality: u8) -> GeneratedArticle {
        GeneratedArticle {
            title: title.to_string(),
            content: format!("## {title}\n\nbody"),
            category: category.to_string(),
            topic: title.to_lowercase(),
            word_count: words,
            reading_time: "1 دقیقه".to_string(),
            quality_score: quality,
            source_count: 2,
        }
    }

    pub(crate) fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, d)
            .unwrap()
            .and_hms_opt(h, 15, 0)
            .unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[tokio::test]
    async fn test_empty_database_stats() {
        let db = memory_db().await;
        let stats = db.daily_stats(date(6)).await.unwrap();
        assert_eq!(stats.total_articles, 0);
        assert_eq!(stats.total_words, 0);
        assert_eq!(stats.avg_quality, 0.0);
        assert!(stats.categories.is_empty());
        assert_eq!(db.overview_stats(date(6)).await, OverviewStats::default());
        assert!(db.weekly_breakdown(date(1)).await.is_empty());
    }

    #[tokio::test]
    async fn test_save_and_daily_stats() {
        let db = memory_db().await;
        let saved = db
            .save_articles(
                &[article("A", "دیابت", 300, 8), article("B", "کبد", 100, 6)],
                at(6, 23),
            )
            .await
            .unwrap();
        assert_eq!(saved.len(), 2);
        assert_ne!(saved[0], saved[1]);
        db.save_articles(&[article("C", "دیابت", 50, 5)], at(5, 10))
            .await
            .unwrap();

        let stats = db.daily_stats(date(6)).await.unwrap();
        assert_eq!(stats.date, "2025-05-06");
        assert_eq!(stats.total_articles, 2);
        assert_eq!(stats.total_words, 400);
        assert!((stats.avg_quality - 7.0).abs() < 1e-9);
        assert_eq!(stats.categories.len(), 2);
        assert!(stats.categories.contains(&"دیابت".to_string()));
    }

    #[tokio::test]
    async fn test_status_defaults_and_mark_published() {
        let db = memory_db().await;
        let ids = db
            .save_articles(&[article("A", "x", 10, 5), article("B", "x", 10, 5)], at(6, 9))
            .await
            .unwrap();
        assert!(db.mark_published(ids[0]).await.unwrap());
        assert!(!db.mark_published(9999).await.unwrap());

        let rows: Vec<(String, bool, String)> =
            sqlx::query_as("SELECT title, published, status FROM articles ORDER BY title")
                .fetch_all(db.pool())
                .await
                .unwrap();
        assert_eq!(rows[0], ("A".to_string(), true, "published".to_string()));
        assert_eq!(rows[1], ("B".to_string(), false, "generated".to_string()));
    }

    #[tokio::test]
    async fn test_mark_published_only_touches_one_of_same_titled_rows() {
        let db = memory_db().await;
        let older = db.save_articles(&[article("T", "x", 10, 5)], at(5, 9)).await.unwrap();
        let newer = db.save_articles(&[article("T", "x", 10, 5)], at(6, 9)).await.unwrap();

        assert!(db.mark_published(newer[0]).await.unwrap());

        let rows: Vec<(i64, bool)> = sqlx::query_as("SELECT id, published FROM articles ORDER BY id")
            .fetch_all(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, vec![(older[0], false), (newer[0], true)]);
    }

    #[tokio::test]
    async fn test_record_daily_stats_upserts() {
        let db = memory_db().await;
        db.save_articles(&[article("A", "قلب", 200, 7)], at(6, 9))
            .await
            .unwrap();
        db.record_daily_stats(date(6)).await.unwrap();
        db.save_articles(&[article("B", "قلب", 100, 9)], at(6, 11))
            .await
            .unwrap();
        db.record_daily_stats(date(6)).await.unwrap();

        let rows: Vec<(String, i64, i64, f64, String)> = sqlx::query_as(
            "SELECT date, total_articles, total_words, avg_quality, categories_json FROM daily_stats",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
        let (d, count, words, quality, categories) = &rows[0];
        assert_eq!(d, "2025-05-06");
        assert_eq!(*count, 2);
        assert_eq!(*words, 300);
        assert!((quality - 8.0).abs() < 1e-9);
        let categories: Vec<String> = serde_json::from_str(categories).unwrap();
        assert_eq!(categories, vec!["قلب"]);
    }

    #[tokio::test]
    async fn test_overview_orders_categories_by_count() {
        let db = memory_db().await;
        db.save_articles(
            &[
                article("A", "دیابت", 100, 6),
                article("B", "قلب", 100, 8),
                article("C", "قلب", 100, 7),
            ],
            at(6, 9),
        )
        .await
        .unwrap();
        db.save_articles(&[article("D", "کبد", 50, 5)], at(4, 9))
            .await
            .unwrap();

        let stats = db.overview_stats(date(6)).await;
        assert_eq!(stats.total_articles, 4);
        assert_eq!(stats.today_articles, 3);
        assert_eq!(stats.total_words, 350);
        assert!((stats.avg_quality - 6.5).abs() < 1e-9);
        assert_eq!(stats.categories[0].category, "قلب");
        assert_eq!(stats.categories[0].count, 2);
        assert_eq!(stats.categories.len(), 3);
    }

    #[tokio::test]
    async fn test_weekly_breakdown_newest_first() {
        let db = memory_db().await;
        db.save_articles(&[article("old", "x", 10, 5)], at(1, 9))
            .await
            .unwrap();
        db.save_articles(&[article("A", "x", 100, 6)], at(4, 9))
            .await
            .unwrap();
        db.save_articles(&[article("B", "y", 200, 8), article("C", "y", 300, 10)], at(6, 9))
            .await
            .unwrap();

        let rows = db.weekly_breakdown(date(3)).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "2025-05-06");
        assert_eq!(rows[0].article_count, 2);
        assert_eq!(rows[0].total_words, 500);
        assert!((rows[0].avg_quality - 9.0).abs() < 1e-9);
        assert_eq!(rows[1].date, "2025-05-04");

        let totals = db.weekly_totals(date(3)).await.unwrap();
        assert_eq!(totals.total_articles, 3);
        assert_eq!(totals.total_words, 600);
        assert_eq!(totals.unique_categories, 2);
    }

    #[tokio::test]
    async fn test_open_creates_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("content.db");
        let db = MedicalDatabase::open(&path).await.unwrap();
        db.save_articles(&[article("A", "x", 10, 5)], at(6, 9))
            .await
            .unwrap();
        assert!(path.exists());
    }
}
