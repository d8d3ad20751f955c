//! PDF export: make the cleaned memo encodable, lay it out, write a PDF.
//!
//! The built-in PDF fonts only cover a single-byte Latin repertoire, so the
//! memo goes through two passes first:
//!
//! 1. [`normalize_for_pdf`] — a fixed table maps typographic punctuation
//!    (dashes, curly quotes, bullets, arrows, ≤/≥) to ASCII.
//! 2. [`to_pdf_safe`] — anything still outside printable ASCII + Latin-1 is
//!    replaced by `?` and counted. The Markdown artifact is never touched.
//!
//! Layout is one flowing cell per source line: long lines wrap on word
//! boundaries, empty lines keep their height, pages break automatically at
//! the bottom margin. Courier is used so wrapping by character count is exact.

use crate::error::MemoError;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::io::BufWriter;
use tracing::{debug, warn};

/// Typographic characters and their ASCII replacements.
pub const PDF_SUBSTITUTIONS: &[(char, &str)] = &[
    ('\u{2014}', "-"),   // em dash
    ('\u{2013}', "-"),   // en dash
    ('\u{201C}', "\""),  // left double quote
    ('\u{201D}', "\""),  // right double quote
    ('\u{2018}', "'"),   // left single quote
    ('\u{2019}', "'"),   // right single quote
    ('\u{2022}', "-"),   // bullet
    ('\u{2192}', "->"),  // right arrow
    ('\u{2264}', "<="),
    ('\u{2265}', ">="),
    ('\u{2026}', "..."), // ellipsis
    ('\u{2212}', "-"),   // minus sign
    ('\u{00A0}', " "),   // no-break space
];

/// Stand-in for characters the PDF font cannot encode.
pub const REPLACEMENT_CHAR: char = '?';

/// Page and type geometry, in millimetres and points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
    /// Auto page-break margin at the bottom.
    pub bottom_margin_mm: f32,
    pub line_height_mm: f32,
    pub font_size_pt: f32,
}

impl Default for PageGeometry {
    /// A4, 10 mm margins, 15 mm break margin, 6 mm lines, 10 pt.
    fn default() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 10.0,
            bottom_margin_mm: 15.0,
            line_height_mm: 6.0,
            font_size_pt: 10.0,
        }
    }
}

impl PageGeometry {
    /// Characters per line. Courier glyphs are 0.6 em wide.
    pub fn chars_per_line(&self) -> usize {
        const MM_PER_PT: f32 = 25.4 / 72.0;
        let glyph_mm = self.font_size_pt * 0.6 * MM_PER_PT;
        let usable = self.width_mm - 2.0 * self.margin_mm;
        ((usable / glyph_mm).floor() as usize).max(1)
    }

    /// Lines that fit between the top margin and the break margin.
    pub fn lines_per_page(&self) -> usize {
        let usable = self.height_mm - self.margin_mm - self.bottom_margin_mm;
        ((usable / self.line_height_mm).floor() as usize).max(1)
    }
}

/// Memo text restricted to the PDF font repertoire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfSafeText {
    pub text: String,
    /// Characters replaced by [`REPLACEMENT_CHAR`].
    pub substituted: usize,
}

/// Apply the fixed punctuation table.
pub fn normalize_for_pdf(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match PDF_SUBSTITUTIONS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None => out.push(c),
        }
    }
    out
}

fn in_repertoire(c: char) -> bool {
    matches!(c, '\n' | ' '..='~' | '\u{A0}'..='\u{FF}')
}

/// Normalise punctuation, then replace whatever the font still cannot encode.
pub fn to_pdf_safe(text: &str) -> PdfSafeText {
    let normalized = normalize_for_pdf(text);
    let mut out = String::with_capacity(normalized.len());
    let mut substituted = 0usize;
    for c in normalized.chars() {
        if c == '\t' {
            out.push_str("    ");
        } else if in_repertoire(c) {
            out.push(c);
        } else {
            out.push(REPLACEMENT_CHAR);
            substituted += 1;
        }
    }
    if substituted > 0 {
        warn!(
            "{} character(s) outside the PDF font repertoire replaced with '{}'",
            substituted, REPLACEMENT_CHAR
        );
    }
    PdfSafeText {
        text: out,
        substituted,
    }
}

/// Wrap one source line to at most `max_chars` characters per output line.
///
/// Lines that fit are returned unchanged. Longer lines break on whitespace;
/// a single word longer than a line is split hard. An empty line yields one
/// empty output line.
pub fn wrap_line(line: &str, max_chars: usize) -> Vec<String> {
    if line.chars().count() <= max_chars {
        return vec![line.to_string()];
    }

    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in line.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
            continue;
        }
        if current_len > 0 {
            out.push(std::mem::take(&mut current));
        }

        let mut rest: Vec<char> = word.chars().collect();
        while rest.len() > max_chars {
            out.push(rest.drain(..max_chars).collect());
        }
        current = rest.iter().collect();
        current_len = rest.len();
    }

    if current_len > 0 || out.is_empty() {
        out.push(current);
    }
    out
}

/// Split text into pages of wrapped lines. Always returns at least one page.
pub fn layout_pages(text: &str, geometry: &PageGeometry) -> Vec<Vec<String>> {
    let width = geometry.chars_per_line();
    let per_page = geometry.lines_per_page();

    let lines: Vec<String> = text
        .split('\n')
        .flat_map(|line| wrap_line(line, width))
        .collect();

    let mut pages: Vec<Vec<String>> = lines.chunks(per_page).map(|c| c.to_vec()).collect();
    if pages.is_empty() {
        pages.push(Vec::new());
    }
    pages
}

/// Render PDF-safe memo text to PDF bytes.
pub fn render_memo_pdf(memo: &PdfSafeText, title: &str) -> Result<Vec<u8>, MemoError> {
    render_with_geometry(memo, title, &PageGeometry::default())
}

/// Render with explicit geometry.
pub fn render_with_geometry(
    memo: &PdfSafeText,
    title: &str,
    geometry: &PageGeometry,
) -> Result<Vec<u8>, MemoError> {
    let pages = layout_pages(&memo.text, geometry);
    let width = Mm(geometry.width_mm);
    let height = Mm(geometry.height_mm);

    let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(|e| MemoError::PdfRender(format!("font: {e}")))?;

    for (page_idx, lines) in pages.iter().enumerate() {
        let (page, layer) = if page_idx == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, format!("Layer {}", page_idx + 1))
        };
        let layer = doc.get_page(page).get_layer(layer);

        for (line_idx, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            // Baseline sits a little above the bottom of the line's cell.
            let y = geometry.height_mm
                - geometry.margin_mm
                - geometry.line_height_mm * (line_idx as f32 + 1.0)
                + geometry.line_height_mm * 0.3;
            layer.use_text(
                line.as_str(),
                geometry.font_size_pt,
                Mm(geometry.margin_mm),
                Mm(y),
                &font,
            );
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| MemoError::PdfRender(format!("save: {e}")))?;
    let bytes = buf
        .into_inner()
        .map_err(|e| MemoError::PdfRender(format!("flush: {e}")))?;

    debug!("Rendered PDF: {} pages, {} bytes", pages.len(), bytes.len());
    Ok(bytes)
}
