//! Weekly report: totals for the last seven days written to
//! `{output_dir}/weekly_report_YYYYMMDD.json`.

use crate::outputs::json::write_pretty;
use crate::storage::{MedicalDatabase, WeeklyTotals};
use chrono::{Days, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

pub const REPORT_PERIOD: &str = "weekly";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub period: String,
    pub start_date: String,
    pub end_date: String,
    pub stats: WeeklyTotals,
    pub generated_at: String,
}

/// Build the report for the seven days ending at `now` and write it.
///
/// Failures are logged and yield `None`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn generate_weekly_report(
    db: &MedicalDatabase,
    output_dir: &Path,
    now: NaiveDateTime,
) -> Option<(WeeklyReport, PathBuf)> {
    let today = now.date();
    let start = today.checked_sub_days(Days::new(7)).unwrap_or(today);

    let stats = match db.weekly_totals(start).await {
        Ok(stats) => stats,
        Err(e) => {
            error!(error = %e, "Failed to compute weekly totals");
            return None;
        }
    };

    let report = WeeklyReport {
        period: REPORT_PERIOD.to_string(),
        start_date: start.format("%Y-%m-%d").to_string(),
        end_date: today.format("%Y-%m-%d").to_string(),
        stats,
        generated_at: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
    };

    let path = output_dir.join(format!("weekly_report_{}.json", today.format("%Y%m%d")));
    if let Err(e) = write_pretty(&report, &path).await {
        error!(path = %path.display(), error = %e, "Failed to write weekly report");
        return None;
    }

    info!(
        path = %path.display(),
        articles = report.stats.total_articles,
        words = report.stats.total_words,
        quality = format!("{:.1}/10", report.stats.avg_quality),
        categories = report.stats.unique_categories,
        "Weekly report written"
    );
    Some((report, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::{article, at, memory_db};

    #[tokio::test]
    async fn test_weekly_report_covers_last_seven_days() {
        let db = memory_db().await;
        db.save_articles(&[article("A", "قلب", 200, 8), article("B", "کبد", 100, 6)], at(10, 9))
            .await
            .unwrap();
        db.save_articles(&[article("old", "قلب", 999, 1)], at(1, 9))
            .await
            .unwrap();
        let tmp = tempfile::tempdir().unwrap();

        let (report, path) = generate_weekly_report(&db, tmp.path(), at(12, 8)).await.unwrap();

        assert_eq!(report.period, REPORT_PERIOD);
        assert_eq!(report.start_date, "2025-05-05");
        assert_eq!(report.end_date, "2025-05-12");
        assert_eq!(report.stats.total_articles, 2);
        assert_eq!(report.stats.total_words, 300);
        assert_eq!(report.stats.unique_categories, 2);
        assert_eq!(path, tmp.path().join("weekly_report_20250512.json"));

        let back: WeeklyReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, report);
    }

    #[tokio::test]
    async fn test_weekly_report_on_empty_database() {
        let db = memory_db().await;
        let tmp = tempfile::tempdir().unwrap();
        let (report, _) = generate_weekly_report(&db, tmp.path(), at(12, 8)).await.unwrap();
        assert_eq!(report.stats, WeeklyTotals::default());
    }
}
