//! PDF export of the full error table.
//!
//! Layout is A4 portrait with a 15 mm margin: a title line, then a table
//! whose header row repeats on every page. Columns share the content width
//! in the ratio 2:5:5:5. Cell text is word-wrapped, never truncated; a row
//! taller than the space left moves to the next page, and a row taller than
//! a whole page is split across pages.
//!
//! The report is mostly Cyrillic, so a TrueType font with Cyrillic glyphs is
//! embedded. Before anything is drawn every character of the report is
//! checked against the font's `cmap`; a font that cannot show the text is
//! refused with [`ThesisCheckError::RenderFailed`].
//!
//! Drawing goes through [`ReportCanvas`]. [`PrintPdfCanvas`] writes a real
//! document with `printpdf`; tests substitute a canvas that records calls.

use crate::config::ReportConfig;
use crate::error::ThesisCheckError;
use crate::output::ValidationResult;
use printpdf::{IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point};
use std::collections::{BTreeMap, BTreeSet};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Header row labels, in column order.
pub const HEADERS: [&str; 4] = [
    "Тип ошибки",
    "Сообщение об ошибке",
    "Предложение",
    "Контекст ошибки",
];

/// Relative column widths.
pub const COLUMN_WEIGHTS: [f32; 4] = [2.0, 5.0, 5.0, 5.0];

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const CELL_PADDING_MM: f32 = 1.5;
const PT_TO_MM: f32 = 0.352_778;
const LINE_SPACING: f32 = 1.3;
/// Advance used for a space when the font has no space glyph.
const FALLBACK_SPACE_EM: f32 = 0.25;

/// Fonts in common system locations that cover Cyrillic.
const SYSTEM_FONTS: [&str; 8] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

// ── Fonts ────────────────────────────────────────────────────────────────

/// Horizontal metrics the layout needs from a font.
pub trait FontMetrics {
    /// Name the canvas selects the font by.
    fn name(&self) -> &str;

    /// Advance width of `ch` in ems, or `None` when the font has no glyph.
    fn glyph_advance(&self, ch: char) -> Option<f32>;
}

/// A TrueType font loaded for embedding.
#[derive(Clone)]
pub struct ReportFont {
    name: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for ReportFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportFont")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl ReportFont {
    /// Read and parse a `.ttf`/`.otf` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ThesisCheckError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ThesisCheckError::FontLoadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report-font".to_string());
        Self::from_bytes(name, bytes).map_err(|detail| ThesisCheckError::FontLoadFailed {
            path: path.to_path_buf(),
            detail,
        })
    }

    /// Parse font data already in memory.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, String> {
        ttf_parser::Face::parse(&bytes, 0).map_err(|e| format!("not a usable TrueType font: {e}"))?;
        Ok(Self {
            name: name.into(),
            bytes,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl FontMetrics for ReportFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn glyph_advance(&self, ch: char) -> Option<f32> {
        let face = ttf_parser::Face::parse(&self.bytes, 0).ok()?;
        let glyph = face.glyph_index(ch)?;
        // .notdef is glyph 0; a cmap pointing at it is no coverage.
        if glyph.0 == 0 {
            return None;
        }
        let advance = face.glyph_hor_advance(glyph)?;
        Some(f32::from(advance) / f32::from(face.units_per_em().max(1)))
    }
}

/// First system font from a short list of well-known locations.
pub fn discover_font() -> Option<PathBuf> {
    SYSTEM_FONTS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Characters of `texts` (whitespace excluded) that `font` has no glyph for.
pub fn missing_glyphs<'a>(
    font: &dyn FontMetrics,
    texts: impl IntoIterator<Item = &'a str>,
) -> BTreeSet<char> {
    let mut seen = BTreeSet::new();
    for t in texts {
        seen.extend(t.chars().filter(|c| !c.is_whitespace()));
    }
    seen.into_iter()
        .filter(|c| font.glyph_advance(*c).is_none())
        .collect()
}

// ── Canvas ───────────────────────────────────────────────────────────────

/// Drawing surface for the report. Coordinates are millimetres from the
/// bottom-left corner of the page.
pub trait ReportCanvas {
    /// Start a new page; the first call starts page 1.
    fn begin_page(&mut self) -> Result<(), ThesisCheckError>;

    /// Make `font` at `size_pt` current for following text on this page.
    fn select_font(&mut self, font: &str, size_pt: f32) -> Result<(), ThesisCheckError>;

    /// Draw one line of text with its baseline at `y_mm`.
    fn text(&mut self, text: &str, x_mm: f32, y_mm: f32) -> Result<(), ThesisCheckError>;

    /// Draw a straight line.
    fn rule(&mut self, from: (f32, f32), to: (f32, f32)) -> Result<(), ThesisCheckError>;
}

/// A `printpdf` document with one embedded font.
pub struct PrintPdfCanvas {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_name: String,
    first_page: Option<PdfLayerReference>,
    layer: Option<PdfLayerReference>,
    current: Option<f32>,
    pages: usize,
}

impl PrintPdfCanvas {
    pub fn new(title: &str, font: &ReportFont) -> Result<Self, ThesisCheckError> {
        let (doc, page1, layer1) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let first_page = doc.get_page(page1).get_layer(layer1);
        let embedded = doc
            .add_external_font(font.bytes())
            .map_err(|e| render_failed(format!("embedding font '{}': {e}", font.name)))?;
        Ok(Self {
            doc,
            font: embedded,
            font_name: font.name.clone(),
            first_page: Some(first_page),
            layer: None,
            current: None,
            pages: 0,
        })
    }

    /// Serialise the document.
    pub fn finish(self) -> Result<Vec<u8>, ThesisCheckError> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| render_failed(format!("PDF save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| render_failed(format!("PDF buffer: {e}")))
    }

    fn layer(&self) -> Result<&PdfLayerReference, ThesisCheckError> {
        self.layer
            .as_ref()
            .ok_or_else(|| ThesisCheckError::Internal("drawing before begin_page".into()))
    }
}

impl ReportCanvas for PrintPdfCanvas {
    fn begin_page(&mut self) -> Result<(), ThesisCheckError> {
        self.pages += 1;
        let layer = match self.first_page.take() {
            Some(layer) => layer,
            None => {
                let (page, layer) = self.doc.add_page(
                    Mm(PAGE_WIDTH_MM),
                    Mm(PAGE_HEIGHT_MM),
                    format!("Layer {}", self.pages),
                );
                self.doc.get_page(page).get_layer(layer)
            }
        };
        layer.set_outline_thickness(0.5);
        self.layer = Some(layer);
        self.current = None;
        Ok(())
    }

    fn select_font(&mut self, font: &str, size_pt: f32) -> Result<(), ThesisCheckError> {
        if font != self.font_name {
            return Err(render_failed(format!(
                "font '{font}' is not embedded (have '{}')",
                self.font_name
            )));
        }
        self.current = Some(size_pt);
        Ok(())
    }

    fn text(&mut self, text: &str, x_mm: f32, y_mm: f32) -> Result<(), ThesisCheckError> {
        let size = self
            .current
            .ok_or_else(|| ThesisCheckError::Internal("text drawn before a font was selected".into()))?;
        self.layer()?
            .use_text(text, size, Mm(x_mm), Mm(y_mm), &self.font);
        Ok(())
    }

    fn rule(&mut self, from: (f32, f32), to: (f32, f32)) -> Result<(), ThesisCheckError> {
        let line = Line {
            points: vec![
                (Point::new(Mm(from.0), Mm(from.1)), false),
                (Point::new(Mm(to.0), Mm(to.1)), false),
            ],
            is_closed: false,
        };
        self.layer()?.add_line(line);
        Ok(())
    }
}

// ── Layout ───────────────────────────────────────────────────────────────

/// What a render produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub pages: usize,
    pub rows: usize,
}

/// Character advances resolved once per render.
struct Advances {
    ems: BTreeMap<char, f32>,
    size_pt: f32,
}

impl Advances {
    fn new(font: &dyn FontMetrics, chars: &BTreeSet<char>, size_pt: f32) -> Self {
        let mut ems: BTreeMap<char, f32> = chars
            .iter()
            .filter_map(|c| font.glyph_advance(*c).map(|a| (*c, a)))
            .collect();
        ems.entry(' ')
            .or_insert_with(|| font.glyph_advance(' ').unwrap_or(FALLBACK_SPACE_EM));
        Self { ems, size_pt }
    }

    fn width_mm(&self, s: &str) -> f32 {
        let ems: f32 = s.chars().map(|c| self.ems.get(&c).copied().unwrap_or(0.5)).sum();
        ems * self.size_pt * PT_TO_MM
    }
}

/// Break `text` into lines no wider than `width_mm`. Whitespace runs become
/// single spaces; a word wider than the cell is broken between characters.
fn wrap(text: &str, width_mm: f32, adv: &Advances) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };
        if adv.width_mm(&candidate) <= width_mm {
            line = candidate;
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if adv.width_mm(word) <= width_mm {
            line = word.to_string();
            continue;
        }
        for ch in word.chars() {
            let mut next = line.clone();
            next.push(ch);
            if !line.is_empty() && adv.width_mm(&next) > width_mm {
                lines.push(std::mem::replace(&mut line, ch.to_string()));
            } else {
                line = next;
            }
        }
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// Column x positions and inner text widths.
fn columns() -> [(f32, f32); 4] {
    let content = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let total: f32 = COLUMN_WEIGHTS.iter().sum();
    let mut x = MARGIN_MM;
    let mut out = [(0.0, 0.0); 4];
    for (slot, weight) in out.iter_mut().zip(COLUMN_WEIGHTS) {
        let w = content * weight / total;
        *slot = (x, w);
        x += w;
    }
    out
}

struct Layout<'c> {
    canvas: &'c mut dyn ReportCanvas,
    font: String,
    size_pt: f32,
    line_mm: f32,
    y: f32,
    pages: usize,
    header: [Vec<String>; 4],
}

impl Layout<'_> {
    fn bottom(&self) -> f32 {
        MARGIN_MM
    }

    fn new_page(&mut self) -> Result<(), ThesisCheckError> {
        self.canvas.begin_page()?;
        self.canvas.select_font(&self.font, self.size_pt)?;
        self.pages += 1;
        self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        Ok(())
    }

    fn rule_across(&mut self) -> Result<(), ThesisCheckError> {
        self.canvas
            .rule((MARGIN_MM, self.y), (PAGE_WIDTH_MM - MARGIN_MM, self.y))
    }

    fn row_height(&self, cells: &[Vec<String>; 4]) -> f32 {
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1);
        lines as f32 * self.line_mm + 2.0 * CELL_PADDING_MM
    }

    fn draw_header(&mut self) -> Result<(), ThesisCheckError> {
        let header = self.header.clone();
        self.draw_row(&header, false)
    }

    /// Draw one row, breaking to a new page (with the header repeated) when
    /// the page fills.
    fn draw_row(&mut self, cells: &[Vec<String>; 4], repeat_header: bool) -> Result<(), ThesisCheckError> {
        let height = self.row_height(cells);
        let page_room = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM - self.row_height(&self.header);
        if repeat_header && self.y - height < self.bottom() && height <= page_room {
            self.new_page()?;
            self.draw_header()?;
        }

        let cols = columns();
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1);
        self.rule_across()?;
        self.y -= CELL_PADDING_MM;
        for i in 0..lines {
            if self.y - self.line_mm < self.bottom() {
                if !repeat_header {
                    return Err(render_failed("header row does not fit on a page".into()));
                }
                self.new_page()?;
                self.draw_header()?;
                self.rule_across()?;
                self.y -= CELL_PADDING_MM;
            }
            self.y -= self.line_mm;
            let baseline = self.y + self.line_mm * 0.25;
            for (cell, (x, _)) in cells.iter().zip(cols) {
                if let Some(text) = cell.get(i).filter(|t| !t.is_empty()) {
                    self.canvas.text(text, x + CELL_PADDING_MM, baseline)?;
                }
            }
        }
        self.y -= CELL_PADDING_MM;
        self.rule_across()
    }
}

/// Lay out `result` onto `canvas`.
///
/// Fails before drawing anything if `font` lacks a glyph for any character
/// of the title, headers or cells.
pub fn render_report(
    result: &ValidationResult,
    config: &ReportConfig,
    font: &dyn FontMetrics,
    canvas: &mut dyn ReportCanvas,
) -> Result<RenderSummary, ThesisCheckError> {
    let mut texts: Vec<&str> = vec![config.title.as_str()];
    texts.extend(HEADERS);
    for e in &result.errors {
        texts.extend([
            e.code.as_str(),
            e.message.as_str(),
            e.suggestion.as_str(),
            e.context.as_str(),
        ]);
    }

    let missing = missing_glyphs(font, texts.iter().copied());
    if !missing.is_empty() {
        let sample: String = missing.iter().take(20).collect();
        return Err(render_failed(format!(
            "font '{}' has no glyphs for {} character(s): {sample}",
            font.name(),
            missing.len()
        )));
    }

    let chars: BTreeSet<char> = texts.iter().flat_map(|t| t.chars()).collect();
    let size_pt = config.font_size;
    let adv = Advances::new(font, &chars, size_pt);
    let cols = columns();
    let cell_width = |i: usize| cols[i].1 - 2.0 * CELL_PADDING_MM;
    let wrap_cells = |cells: [&str; 4]| -> [Vec<String>; 4] {
        [
            wrap(cells[0], cell_width(0), &adv),
            wrap(cells[1], cell_width(1), &adv),
            wrap(cells[2], cell_width(2), &adv),
            wrap(cells[3], cell_width(3), &adv),
        ]
    };

    let mut layout = Layout {
        canvas,
        font: font.name().to_string(),
        size_pt,
        line_mm: size_pt * PT_TO_MM * LINE_SPACING,
        y: 0.0,
        pages: 0,
        header: wrap_cells(HEADERS),
    };

    layout.new_page()?;
    let title_size = size_pt + 2.0;
    let title_adv = Advances::new(font, &chars, title_size);
    layout.canvas.select_font(&layout.font, title_size)?;
    for line in wrap(&config.title, PAGE_WIDTH_MM - 2.0 * MARGIN_MM, &title_adv) {
        layout.y -= title_size * PT_TO_MM * LINE_SPACING;
        layout.canvas.text(&line, MARGIN_MM, layout.y)?;
    }
    layout.y -= title_size * PT_TO_MM;
    layout.canvas.select_font(&layout.font, size_pt)?;

    layout.draw_header()?;
    for e in &result.errors {
        let cells = wrap_cells([
            e.code.as_str(),
            e.message.as_str(),
            e.suggestion.as_str(),
            e.context.as_str(),
        ]);
        layout.draw_row(&cells, true)?;
    }

    debug!("Report laid out on {} page(s)", layout.pages);
    Ok(RenderSummary {
        pages: layout.pages,
        rows: result.errors.len(),
    })
}

/// Load the configured font, or a discovered system one.
pub fn load_report_font(config: &ReportConfig) -> Result<ReportFont, ThesisCheckError> {
    let path = config
        .font_path
        .clone()
        .or_else(discover_font)
        .ok_or_else(|| {
            render_failed("no TrueType font with Cyrillic coverage found; pass --font".into())
        })?;
    debug!("Report font: {}", path.display());
    ReportFont::load(path)
}

/// Render `result` to PDF bytes.
pub fn export_pdf(result: &ValidationResult, config: &ReportConfig) -> Result<Vec<u8>, ThesisCheckError> {
    let font = load_report_font(config)?;
    let mut canvas = PrintPdfCanvas::new(&config.title, &font)?;
    let summary = render_report(result, config, &font, &mut canvas)?;
    let bytes = canvas.finish()?;
    info!(
        "PDF report: {} rows on {} page(s), {} bytes",
        summary.rows,
        summary.pages,
        bytes.len()
    );
    Ok(bytes)
}

/// Render `result` and write it to `path` atomically.
pub async fn export_pdf_to_file(
    result: &ValidationResult,
    config: &ReportConfig,
    path: impl AsRef<Path>,
) -> Result<RenderSummary, ThesisCheckError> {
    let path = path.as_ref();
    let font = load_report_font(config)?;
    let mut canvas = PrintPdfCanvas::new(&config.title, &font)?;
    let summary = render_report(result, config, &font, &mut canvas)?;
    let bytes = canvas.finish()?;

    let write_err = |e: std::io::Error| ThesisCheckError::ReportWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(summary)
}

fn render_failed(detail: String) -> ThesisCheckError {
    ThesisCheckError::RenderFailed { detail }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ValidationError;

    /// Fixed-width font covering ASCII and Cyrillic.
    struct CyrillicStub;

    impl FontMetrics for CyrillicStub {
        fn name(&self) -> &str {
            "StubSans"
        }
        fn glyph_advance(&self, ch: char) -> Option<f32> {
            (ch.is_ascii() || ('\u{0400}'..='\u{04FF}').contains(&ch) || ch == '…').then_some(0.5)
        }
    }

    struct AsciiStub;

    impl FontMetrics for AsciiStub {
        fn name(&self) -> &str {
            "Courier"
        }
        fn glyph_advance(&self, ch: char) -> Option<f32> {
            ch.is_ascii().then_some(0.6)
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Page,
        Font(String, f32),
        Text(String, f32, f32),
        Rule,
    }

    #[derive(Default)]
    struct RecordingCanvas {
        ops: Vec<Op>,
    }

    impl RecordingCanvas {
        fn texts(&self) -> Vec<&str> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Text(t, _, _) => Some(t.as_str()),
                    _ => None,
                })
                .collect()
        }

        fn pages(&self) -> usize {
            self.ops.iter().filter(|op| **op == Op::Page).count()
        }
    }

    impl ReportCanvas for RecordingCanvas {
        fn begin_page(&mut self) -> Result<(), ThesisCheckError> {
            self.ops.push(Op::Page);
            Ok(())
        }
        fn select_font(&mut self, font: &str, size_pt: f32) -> Result<(), ThesisCheckError> {
            self.ops.push(Op::Font(font.to_string(), size_pt));
            Ok(())
        }
        fn text(&mut self, text: &str, x_mm: f32, y_mm: f32) -> Result<(), ThesisCheckError> {
            self.ops.push(Op::Text(text.to_string(), x_mm, y_mm));
            Ok(())
        }
        fn rule(&mut self, _from: (f32, f32), _to: (f32, f32)) -> Result<(), ThesisCheckError> {
            self.ops.push(Op::Rule);
            Ok(())
        }
    }

    fn error(code: &str, message: &str) -> ValidationError {
        ValidationError {
            code: code.into(),
            message: message.into(),
            suggestion: "Установите выравнивание по ширине".into(),
            context: "Введение".into(),
        }
    }

    #[test]
    fn font_is_selected_before_any_text_on_every_page() {
        let errors = (0..80)
            .map(|i| error("AlignmentError", &format!("Абзац {i} выровнен по левому краю")))
            .collect();
        let result = ValidationResult::from_errors(errors);
        let mut canvas = RecordingCanvas::default();
        let summary =
            render_report(&result, &ReportConfig::default(), &CyrillicStub, &mut canvas).unwrap();

        assert!(summary.pages > 1);
        assert_eq!(canvas.pages(), summary.pages);

        let mut font_on_page = false;
        for op in &canvas.ops {
            match op {
                Op::Page => font_on_page = false,
                Op::Font(name, _) => {
                    assert_eq!(name, "StubSans");
                    font_on_page = true;
                }
                Op::Text(..) => assert!(font_on_page, "text before font selection"),
                Op::Rule => {}
            }
        }
    }

    #[test]
    fn long_title_wraps_within_the_margins() {
        let title = "Отчет о проверке шаблона ВКР ".repeat(12);
        let config = ReportConfig {
            title: title.clone(),
            ..ReportConfig::default()
        };
        let result = ValidationResult::from_errors(vec![error("BoldError", "bold")]);
        let mut canvas = RecordingCanvas::default();
        render_report(&result, &config, &CyrillicStub, &mut canvas).unwrap();

        let texts = canvas.texts();
        let header_at = texts.iter().position(|t| *t == HEADERS[0]).unwrap();
        let title_lines = &texts[..header_at];
        assert!(title_lines.len() > 1, "{title_lines:?}");
        assert_eq!(title_lines.join(" "), title.trim_end());

        let chars: BTreeSet<char> = title.chars().collect();
        let adv = Advances::new(&CyrillicStub, &chars, config.font_size + 2.0);
        for line in title_lines {
            assert!(adv.width_mm(line) <= PAGE_WIDTH_MM - 2.0 * MARGIN_MM);
        }
    }

    #[test]
    fn header_repeats_on_every_page() {
        let errors = (0..80).map(|i| error("BoldError", &format!("m{i}"))).collect();
        let result = ValidationResult::from_errors(errors);
        let mut canvas = RecordingCanvas::default();
        let summary =
            render_report(&result, &ReportConfig::default(), &CyrillicStub, &mut canvas).unwrap();
        let headers = canvas.texts().iter().filter(|t| **t == HEADERS[0]).count();
        assert_eq!(headers, summary.pages);
        assert_eq!(canvas.texts().iter().filter(|t| t.starts_with('m')).count(), 80);
    }

    #[test]
    fn font_without_cyrillic_is_refused_before_drawing() {
        let result = ValidationResult::from_errors(vec![error("BoldError", "bold")]);
        let mut canvas = RecordingCanvas::default();
        let err = render_report(&result, &ReportConfig::default(), &AsciiStub, &mut canvas)
            .unwrap_err();
        match err {
            ThesisCheckError::RenderFailed { detail } => assert!(detail.contains("Courier")),
            other => panic!("expected RenderFailed, got {other:?}"),
        }
        assert!(canvas.ops.is_empty());
    }

    #[test]
    fn unexpected_script_in_cell_is_refused() {
        let result = ValidationResult::from_errors(vec![error("BoldError", "漢字")]);
        let mut canvas = RecordingCanvas::default();
        assert!(matches!(
            render_report(&result, &ReportConfig::default(), &CyrillicStub, &mut canvas),
            Err(ThesisCheckError::RenderFailed { .. })
        ));
    }

    #[test]
    fn long_cells_wrap_without_losing_text() {
        let long = "слово ".repeat(60);
        let result = ValidationResult::from_errors(vec![error("ContentMismatch", long.trim())]);
        let mut canvas = RecordingCanvas::default();
        render_report(&result, &ReportConfig::default(), &CyrillicStub, &mut canvas).unwrap();

        let message_col_x = columns()[1].0 + CELL_PADDING_MM;
        let lines: Vec<&str> = canvas
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(t, x, _) if (*x - message_col_x).abs() < 0.01 && t.starts_with("слово") => {
                    Some(t.as_str())
                }
                _ => None,
            })
            .collect();
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), long.trim());
    }

    #[test]
    fn empty_result_renders_title_and_header() {
        let mut canvas = RecordingCanvas::default();
        let summary = render_report(
            &ValidationResult::default(),
            &ReportConfig::default(),
            &CyrillicStub,
            &mut canvas,
        )
        .unwrap();
        assert_eq!(summary, RenderSummary { pages: 1, rows: 0 });
        let texts = canvas.texts();
        assert_eq!(texts[0], "Отчет о проверке шаблона ВКР");
        assert!(HEADERS.iter().all(|h| texts.contains(h)));
    }

    #[test]
    fn column_widths_follow_weights() {
        let cols = columns();
        let total: f32 = cols.iter().map(|c| c.1).sum();
        assert!((total - 180.0).abs() < 0.01);
        assert!((cols[1].1 / cols[0].1 - 2.5).abs() < 0.01);
        assert!((cols[3].0 + cols[3].1 - 195.0).abs() < 0.01);
    }

    #[test]
    fn wrap_breaks_overlong_words() {
        let chars: BTreeSet<char> = "a".chars().collect();
        let adv = Advances::new(&CyrillicStub, &chars, 10.0);
        let lines = wrap(&"a".repeat(100), 20.0, &adv);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat().len(), 100);
        assert!(lines.iter().all(|l| adv.width_mm(l) <= 20.0));
    }

    #[test]
    fn garbage_bytes_are_not_a_font() {
        assert!(ReportFont::from_bytes("x", b"not a font".to_vec()).is_err());
        let err = ReportFont::load("/no/such/font.ttf").unwrap_err();
        assert!(matches!(err, ThesisCheckError::FontLoadFailed { .. }));
    }
}
