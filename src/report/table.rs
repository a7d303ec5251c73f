//! Paginated error table.
//!
//! One row per error, in the order the backend reported them. Context is
//! shortened for display only; the PDF export always uses the full text.

use crate::config::PAGE_SIZE_OPTIONS;
use crate::output::{ValidationError, ValidationResult};
use serde::Serialize;

/// Display class for an error code; `None` for codes without one.
pub fn highlight_class(code: &str) -> Option<&'static str> {
    let class = match code {
        "FontSizeMismatch" => "error-font-size",
        "AlignmentError" => "error-alignment",
        "CenterAlignmentError" => "error-centerAlignment",
        "ContentMismatch" => "error-contentMismatch",
        "BoldError" => "error-boldError",
        "MissingTOC" => "error-missingTOC",
        "MissingSection" => "error-missingSection",
        "TOCNotOnNewPageBefore" => "error-TOCNotOnNewPageBefore",
        "TOCNotOnNewPageAfter" => "error-TOCNotOnNewPageAfter",
        _ => return None,
    };
    Some(class)
}

/// ANSI SGR colour used for a highlight class in the terminal.
pub fn ansi_colour(class: &str) -> &'static str {
    match class {
        "error-font-size" => "33",
        "error-alignment" | "error-centerAlignment" => "36",
        "error-contentMismatch" => "35",
        "error-boldError" => "34",
        "error-missingTOC" | "error-missingSection" => "31",
        "error-TOCNotOnNewPageBefore" | "error-TOCNotOnNewPageAfter" => "91",
        _ => "0",
    }
}

/// Shorten `text` to at most `width` characters, ending in `…` when cut.
pub fn truncate_context(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}

/// One table row as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    /// 1-based position in the full error list.
    pub index: usize,
    pub code: String,
    pub message: String,
    pub suggestion: String,
    /// Context shortened for display.
    pub context: String,
    pub class: Option<&'static str>,
}

impl TableRow {
    fn from_error(index: usize, e: &ValidationError, context_width: usize) -> Self {
        Self {
            index,
            code: e.code.clone(),
            message: e.message.clone(),
            suggestion: e.suggestion.clone(),
            context: truncate_context(&e.context, context_width),
            class: highlight_class(&e.code),
        }
    }
}

/// One page of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePage {
    /// 1-based page number actually shown.
    pub number: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    pub rows: Vec<TableRow>,
}

/// The table view over a result.
#[derive(Debug, Clone)]
pub struct TableView<'a> {
    errors: &'a [ValidationError],
    page_size: usize,
    context_width: usize,
}

impl<'a> TableView<'a> {
    /// `page_size` outside [`PAGE_SIZE_OPTIONS`] falls back to the smallest option.
    pub fn new(result: &'a ValidationResult, page_size: usize, context_width: usize) -> Self {
        let page_size = if PAGE_SIZE_OPTIONS.contains(&page_size) {
            page_size
        } else {
            PAGE_SIZE_OPTIONS[0]
        };
        Self {
            errors: &result.errors,
            page_size,
            context_width,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages; an empty table still has one (empty) page.
    pub fn total_pages(&self) -> usize {
        self.errors.len().div_ceil(self.page_size).max(1)
    }

    /// Page `number` (1-based). 0 shows the first page and anything past
    /// the end shows the last.
    pub fn page(&self, number: usize) -> TablePage {
        let total_pages = self.total_pages();
        let number = number.clamp(1, total_pages);
        let start = (number - 1) * self.page_size;
        let rows = self
            .errors
            .iter()
            .enumerate()
            .skip(start)
            .take(self.page_size)
            .map(|(i, e)| TableRow::from_error(i + 1, e, self.context_width))
            .collect();
        TablePage {
            number,
            total_pages,
            total_rows: self.errors.len(),
            rows,
        }
    }

    /// Every row on one page.
    pub fn all_rows(&self) -> Vec<TableRow> {
        self.errors
            .iter()
            .enumerate()
            .map(|(i, e)| TableRow::from_error(i + 1, e, self.context_width))
            .collect()
    }
}

/// Render `rows` as plain terminal text, colouring highlighted rows when
/// `colour` is set.
pub fn render_rows(rows: &[TableRow], colour: bool) -> String {
    let mut out = String::new();
    for row in rows {
        let line = format!(
            "{:>3}. [{}] {}\n     -> {}\n     \"{}\"",
            row.index, row.code, row.message, row.suggestion, row.context
        );
        match row.class {
            Some(class) if colour => {
                out.push_str(&format!("\x1b[{}m{}\x1b[0m\n", ansi_colour(class), line));
            }
            _ => {
                out.push_str(&line);
                out.push('\n');
            }
        }
    }
    out
}
