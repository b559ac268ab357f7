//! Output generation for the dataset and the run log.
//!
//! # Submodules
//!
//! - [`table`]: writes the tabular dataset (CSV, fixed column order)
//! - [`report`]: accumulates run events and writes the human-readable log
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── images/
//! │   ├── 0.jpg
//! │   └── 1.png
//! ├── POLITICS_articles_20250506143000.csv
//! └── POLITICS_run_log_20250506143000.txt
//! ```

pub mod report;
pub mod table;
