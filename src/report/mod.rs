//! Read-only views over a [`crate::output::ValidationResult`].
//!
//! - [`table`]: paginated rows with per-code highlight classes
//! - [`chart`]: one bar per error code
//! - [`pdf`]: the full table exported as a PDF document
//!
//! The views never mutate the result and do not depend on each other, so a
//! PDF failure leaves the table and chart usable.

pub mod chart;
pub mod pdf;
pub mod table;

pub use chart::{ChartBar, ChartView};
pub use pdf::{export_pdf, export_pdf_to_file, render_report, FontMetrics, PrintPdfCanvas, ReportCanvas, ReportFont};
pub use table::{highlight_class, TablePage, TableRow, TableView};
