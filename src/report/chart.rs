//! Bar chart of error counts per code.

use crate::output::ValidationResult;
use serde::Serialize;

/// One bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartBar {
    pub code: String,
    pub count: u64,
}

impl ChartBar {
    pub fn label(&self) -> String {
        format!("{} ({})", self.code, self.count)
    }
}

/// Bars in code order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartView {
    pub bars: Vec<ChartBar>,
}

impl ChartView {
    pub fn from_result(result: &ValidationResult) -> Self {
        let bars = result
            .error_type_counts
            .iter()
            .map(|(code, count)| ChartBar {
                code: code.clone(),
                count: *count,
            })
            .collect();
        Self { bars }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn max_count(&self) -> u64 {
        self.bars.iter().map(|b| b.count).max().unwrap_or(0)
    }

    /// Bar length in cells for a chart `width` cells wide. Any non-zero
    /// count gets at least one cell.
    pub fn scaled(&self, bar: &ChartBar, width: usize) -> usize {
        let max = self.max_count();
        if max == 0 || bar.count == 0 {
            return 0;
        }
        let cells = (bar.count as u128 * width as u128 + max as u128 / 2) / max as u128;
        (cells as usize).clamp(1, width)
    }

    /// Horizontal bars, labels padded to a common width.
    pub fn render(&self, width: usize) -> String {
        let labels: Vec<String> = self.bars.iter().map(ChartBar::label).collect();
        let pad = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let mut out = String::new();
        for (bar, label) in self.bars.iter().zip(&labels) {
            out.push_str(&format!(
                "{:<pad$} │{}\n",
                label,
                "█".repeat(self.scaled(bar, width)),
            ));
        }
        out
    }
}
