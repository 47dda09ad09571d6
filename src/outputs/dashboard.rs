//! Static HTML dashboard.
//!
//! A single right-to-left Persian page with four stat cards (total articles,
//! today's articles, average quality, total words), the per-day table for
//! the last week and the category distribution. Every value taken from the
//! database is HTML-escaped before interpolation.

use crate::storage::{DayRow, MedicalDatabase, OverviewStats};
use chrono::{Days, NaiveDateTime};
use quick_xml::escape::escape;
use std::error::Error;
use std::fmt::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const STYLE: &str = r#"
        body { font-family: Tahoma, Arial; background: #f0f8ff; margin: 0; padding: 20px; }
        .dashboard { max-width: 1200px; margin: 0 auto; background: white; padding: 30px; border-radius: 15px; box-shadow: 0 5px 15px rgba(0,0,0,0.1); }
        .stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin-bottom: 30px; }
        .stat-card { background: linear-gradient(135deg, #2c5aa0, #1e3a8a); color: white; padding: 25px; border-radius: 10px; text-align: center; }
        .stat-number { font-size: 2.5em; font-weight: bold; margin-bottom: 10px; }
        .stat-label { font-size: 1.1em; opacity: 0.9; }
        h1 { color: #2c5aa0; text-align: center; margin-bottom: 30px; }
        table { width: 100%; border-collapse: collapse; margin-top: 20px; }
        th, td { padding: 12px; text-align: center; border: 1px solid #ddd; }
        th { background: #2c5aa0; color: white; }
        tr:nth-child(even) { background: #f8f9fa; }
        .empty { padding: 20px; }
        .last-update { text-align: center; color: #666; margin-top: 30px; font-style: italic; }
"#;

pub const NO_WEEKLY_DATA: &str = "هیچ داده‌ای برای نمایش وجود ندارد";
pub const NO_CATEGORIES: &str = "هیچ دسته‌بندی‌ای وجود ندارد";

fn stat_card(out: &mut String, value: &str, label: &str) {
    let _ = write!(
        out,
        r#"
            <div class="stat-card">
                <div class="stat-number">{}</div>
                <div class="stat-label">{}</div>
            </div>"#,
        escape(value),
        escape(label)
    );
}

fn empty_row(out: &mut String, colspan: u8, message: &str) {
    let _ = write!(
        out,
        r#"
            <tr><td colspan="{colspan}" class="empty">{}</td></tr>"#,
        escape(message)
    );
}

/// Render the dashboard page.
pub fn render(stats: &OverviewStats, weekly: &[DayRow], updated_at: NaiveDateTime) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<!DOCTYPE html>
<html dir="rtl" lang="fa">
<head>
    <meta charset="UTF-8">
    <title>داشبورد مدیریت محتوای پزشکی</title>
    <style>{STYLE}    </style>
</head>
<body>
    <div class="dashboard">
        <h1>داشبورد مدیریت محتوای پزشکی</h1>
        <div class="stats">"#
    );

    stat_card(&mut out, &stats.total_articles.to_string(), "کل مقالات");
    stat_card(&mut out, &stats.today_articles.to_string(), "مقالات امروز");
    stat_card(&mut out, &format!("{:.1}/10", stats.avg_quality), "میانگین کیفیت");
    stat_card(&mut out, &stats.total_words.to_string(), "کل کلمات");

    out.push_str(
        r#"
        </div>
        <h2>گزارش هفتگی عملکرد</h2>
        <table id="weekly">
            <tr><th>تاریخ</th><th>تعداد مقالات</th><th>کل کلمات</th><th>میانگین کیفیت</th></tr>"#,
    );
    if weekly.is_empty() {
        empty_row(&mut out, 4, NO_WEEKLY_DATA);
    }
    for row in weekly {
        let _ = write!(
            out,
            r#"
            <tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}/10</td></tr>"#,
            escape(row.date.as_str()),
            row.article_count,
            row.total_words,
            row.avg_quality
        );
    }

    out.push_str(
        r#"
        </table>
        <h2>توزیع موضوعات</h2>
        <table id="categories">
            <tr><th>دسته‌بندی</th><th>تعداد مقالات</th></tr>"#,
    );
    if stats.categories.is_empty() {
        empty_row(&mut out, 2, NO_CATEGORIES);
    }
    for category in &stats.categories {
        let _ = write!(
            out,
            r#"
            <tr><td>{}</td><td>{}</td></tr>"#,
            escape(category.category.as_str()),
            category.count
        );
    }

    let _ = write!(
        out,
        r#"
        </table>
        <div class="last-update">آخرین بروزرسانی: {}</div>
    </div>
</body>
</html>
"#,
        updated_at.format("%Y-%m-%d %H:%M:%S")
    );
    out
}

/// Query storage and write the dashboard to `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_dashboard(
    db: &MedicalDatabase,
    path: &Path,
    now: NaiveDateTime,
) -> Result<(), Box<dyn Error>> {
    let today = now.date();
    let week_ago = today.checked_sub_days(Days::new(7)).unwrap_or(today);
    let stats = db.overview_stats(today).await;
    let weekly = db.weekly_breakdown(week_ago).await;

    let html = render(&stats, &weekly, now);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, html).await?;
    info!(
        total = stats.total_articles,
        days = weekly.len(),
        "Wrote dashboard"
    );
    Ok(())
}
