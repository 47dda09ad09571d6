//! Output generation for batch JSON, the HTML dashboard and weekly reports.
//!
//! # Submodules
//!
//! - [`json`]: Writes each run's `ArticleBatch` to a timestamped JSON file
//! - [`dashboard`]: Renders storage statistics as a static RTL HTML page
//! - [`report`]: Summarizes the last seven days into a JSON report
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── medical_articles_20250506_143000.json
//! └── weekly_report_20250506.json
//!
//! index.html                 # dashboard, path configurable
//! ```

pub mod dashboard;
pub mod json;
pub mod report;
