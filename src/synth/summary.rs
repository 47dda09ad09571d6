//! Plain evidence summary printed by the `search` command.

use crate::models::ArticleRecord;
use crate::utils::truncate_chars;
use std::fmt::Write;

/// Abstracts longer than this are cut in the summary.
pub const SUMMARY_ABSTRACT_CHARS: usize = 500;

const KEY_POINTS: [&str; 3] = [
    "این مطالعات بر اساس شواهد علمی معتبر انجام شده‌اند",
    "متاآنالیزها معتبرترین سطح شواهد پزشکی هستند",
    "برای اطلاعات بیشتر با پزشک خود مشورت کنید",
];

/// List each study with its metadata and a shortened abstract, followed by
/// fixed key points. `None` when there are no records.
pub fn summarize(topic: &str, records: &[ArticleRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "بر اساس {} مطالعه متاآنالیز از PubMed درباره «{}»:\n",
        records.len(),
        topic.trim()
    );
    for (i, record) in records.iter().enumerate() {
        let _ = writeln!(out, "مطالعه {}:", i + 1);
        let _ = writeln!(out, "   عنوان: {}", record.title);
        let _ = writeln!(out, "   نویسندگان: {}", record.author_line());
        let _ = writeln!(out, "   سال: {}", record.year);
        let _ = writeln!(
            out,
            "   خلاصه: {}\n",
            truncate_chars(&record.abstract_text, SUMMARY_ABSTRACT_CHARS)
        );
    }
    out.push_str("نکات کلیدی:\n");
    for point in KEY_POINTS {
        let _ = writeln!(out, "• {point}");
    }
    Some(out)
}
