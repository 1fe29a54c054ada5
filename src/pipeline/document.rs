//! Document assembly: record blocks → one PDF, finalised once.
//!
//! [`Document`] is an ordered element list: an optional heading, then every
//! [`RecordBlock`] immediately followed by a [`Separator`]. Nothing touches
//! the disk until [`Document::finalize`], which hands the whole list to
//! `genpdf` for text flow and page breaking, renders into memory, and only
//! then writes the file (temp file + rename).
//!
//! Text is set in a TrueType family loaded from disk and embedded in the
//! PDF, so any character the family covers can appear in a title or cast
//! list. A family needs at least a regular face; missing bold and italic
//! faces fall back to the closest face that exists.

use crate::error::ExportError;
use crate::pipeline::assets::Asset;
use crate::pipeline::layout::{
    self, RecordBlock, Separator, TextStyle, BODY_STYLE, DOCUMENT_TITLE_STYLE, FLAG_BOX_PT,
    MOVIE_TITLE_STYLE, POSTER_BOX_IN, RATING_STYLE, RECORD_COLUMNS_IN, SEPARATOR,
    TITLE_COLUMNS_IN,
};
use genpdf::elements::{Image, LinearLayout, Paragraph, TableLayout};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Color, Style};
use genpdf::{
    render, Alignment, Context, Element, Margins, Mm, Position, RenderResult, Scale, Size,
};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MM_PER_INCH: f64 = 25.4;
const MM_PER_POINT: f64 = MM_PER_INCH / 72.0;

/// Resolution images are scaled against.
const IMAGE_DPI: f64 = 300.0;

fn pt(points: f64) -> f64 {
    points * MM_PER_POINT
}

fn inch(inches: f64) -> f64 {
    inches * MM_PER_INCH
}

// ── Geometry ─────────────────────────────────────────────────────────────────

/// Paper size and margins, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_top_mm: f64,
    pub margin_right_mm: f64,
    pub margin_bottom_mm: f64,
    pub margin_left_mm: f64,
}

/// A4 with 36pt side margins and 72pt top/bottom margins.
pub const A4_GEOMETRY: PageGeometry = PageGeometry {
    width_mm: 210.0,
    height_mm: 297.0,
    margin_top_mm: 72.0 * MM_PER_POINT,
    margin_right_mm: 36.0 * MM_PER_POINT,
    margin_bottom_mm: 72.0 * MM_PER_POINT,
    margin_left_mm: 36.0 * MM_PER_POINT,
};

impl PageGeometry {
    /// Width available between the side margins.
    pub fn content_width_mm(&self) -> f64 {
        self.width_mm - self.margin_left_mm - self.margin_right_mm
    }
}

// ── Element list ─────────────────────────────────────────────────────────────

/// One entry of the flowing element list.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentElement {
    Heading(String),
    Record(Box<RecordBlock>),
    Separator(Separator),
}

/// The whole export, before rendering.
#[derive(Debug, Clone)]
pub struct Document {
    title: String,
    geometry: PageGeometry,
    elements: Vec<DocumentElement>,
}

impl Document {
    /// Start a document. With `include_heading` the title is also printed
    /// above the first record.
    pub fn new(title: impl Into<String>, include_heading: bool) -> Self {
        let title = title.into();
        let mut elements = Vec::new();
        if include_heading {
            elements.push(DocumentElement::Heading(title.clone()));
        }
        Self {
            title,
            geometry: A4_GEOMETRY,
            elements,
        }
    }

    /// Append a record block and its trailing separator.
    pub fn push_record(&mut self, block: RecordBlock) {
        self.elements.push(DocumentElement::Record(Box::new(block)));
        self.elements.push(DocumentElement::Separator(SEPARATOR));
    }

    pub fn elements(&self) -> &[DocumentElement] {
        &self.elements
    }

    pub fn record_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e, DocumentElement::Record(_)))
            .count()
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Render to PDF bytes with the given font family.
    pub fn render(&self, font_family: FontFamily<FontData>) -> Result<Vec<u8>, ExportError> {
        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(self.title.clone());
        doc.set_paper_size(Size::new(self.geometry.width_mm, self.geometry.height_mm));
        doc.set_font_size(BODY_STYLE.size);

        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(Margins::trbl(
            self.geometry.margin_top_mm,
            self.geometry.margin_right_mm,
            self.geometry.margin_bottom_mm,
            self.geometry.margin_left_mm,
        ));
        doc.set_page_decorator(decorator);

        // Records are narrower than the text area; centre them.
        let inset =
            ((self.geometry.content_width_mm() - inch(SEPARATOR.width_in)) / 2.0).max(0.0);

        for element in &self.elements {
            match element {
                DocumentElement::Heading(text) => doc.push(heading(text)),
                DocumentElement::Record(block) => {
                    let table = record_table(block)?;
                    doc.push(table.padded(Margins::trbl(0.0, inset, 0.0, inset)))
                }
                DocumentElement::Separator(sep) => doc.push(separator(sep, inset)),
            }
        }

        let mut buf = Vec::new();
        doc.render(&mut buf)
            .map_err(|e| ExportError::RenderFailed(e.to_string()))?;
        debug!("Rendered {} elements → {} bytes", self.elements.len(), buf.len());
        Ok(buf)
    }

    /// Render and write the PDF to `path`.
    ///
    /// The file is written to `<path>.tmp` and renamed, so a failed render
    /// never leaves a truncated PDF at `path`.
    pub fn finalize(
        &self,
        path: &Path,
        font_dir: &Path,
        font_family: &str,
    ) -> Result<PathBuf, ExportError> {
        let fonts = load_fonts(font_dir, font_family)?;
        let bytes = self.render(fonts)?;

        let write_err = |source| ExportError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp_path = path.with_extension("pdf.tmp");
        std::fs::write(&tmp_path, &bytes).map_err(write_err)?;
        std::fs::rename(&tmp_path, path).map_err(write_err)?;

        info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path.to_path_buf())
    }
}

// ── Fonts ────────────────────────────────────────────────────────────────────

/// Common system locations of fonts usable for the export, in lookup order.
pub const SYSTEM_FONT_FAMILIES: &[(&str, &str)] = &[
    ("/usr/share/fonts/truetype/liberation", "LiberationSans"),
    ("/usr/share/fonts/truetype/liberation2", "LiberationSans"),
    ("/usr/share/fonts/liberation-sans", "LiberationSans"),
    ("/usr/share/fonts/truetype/dejavu", "DejaVuSans"),
    ("/usr/share/fonts/dejavu", "DejaVuSans"),
    ("/usr/share/fonts/TTF", "DejaVuSans"),
    ("/usr/share/fonts/TTF", "LiberationSans"),
];

const REGULAR_SUFFIXES: &[&str] = &["-Regular", ""];
const BOLD_SUFFIXES: &[&str] = &["-Bold"];
const ITALIC_SUFFIXES: &[&str] = &["-Italic", "-Oblique"];
const BOLD_ITALIC_SUFFIXES: &[&str] = &["-BoldItalic", "-BoldOblique"];

fn face_path(dir: &Path, family: &str, suffixes: &[&str]) -> Option<PathBuf> {
    suffixes
        .iter()
        .map(|suffix| dir.join(format!("{family}{suffix}.ttf")))
        .find(|p| p.is_file())
}

/// Whether `dir` holds at least a regular face of `family`.
pub fn has_font_family(dir: &Path, family: &str) -> bool {
    face_path(dir, family, REGULAR_SUFFIXES).is_some()
}

/// The first entry of [`SYSTEM_FONT_FAMILIES`] present on this machine.
pub fn find_system_font_family() -> Option<(PathBuf, &'static str)> {
    SYSTEM_FONT_FAMILIES
        .iter()
        .map(|(dir, family)| (Path::new(dir), *family))
        .find(|(dir, family)| has_font_family(dir, family))
        .map(|(dir, family)| (dir.to_path_buf(), family))
}

/// Load `<dir>/<family>-Regular.ttf` (or `<family>.ttf`) plus whatever bold
/// and italic faces exist, for embedding.
pub fn load_fonts(dir: &Path, family: &str) -> Result<FontFamily<FontData>, ExportError> {
    let font_err = |detail: String| ExportError::FontLoad {
        dir: dir.to_path_buf(),
        family: family.to_string(),
        detail,
    };
    let load = |path: PathBuf| -> Result<FontData, ExportError> {
        let bytes = std::fs::read(&path)
            .map_err(|e| font_err(format!("{}: {e}", path.display())))?;
        FontData::new(bytes, None).map_err(|e| font_err(format!("{}: {e}", path.display())))
    };

    let regular_path = face_path(dir, family, REGULAR_SUFFIXES)
        .ok_or_else(|| font_err(format!("no {family}-Regular.ttf or {family}.ttf")))?;
    let regular = load(regular_path)?;

    let bold = match face_path(dir, family, BOLD_SUFFIXES) {
        Some(p) => load(p)?,
        None => regular.clone(),
    };
    let italic = match face_path(dir, family, ITALIC_SUFFIXES) {
        Some(p) => load(p)?,
        None => regular.clone(),
    };
    let bold_italic = match face_path(dir, family, BOLD_ITALIC_SUFFIXES) {
        Some(p) => load(p)?,
        None => bold.clone(),
    };

    debug!("Loaded font family {} from {}", family, dir.display());
    Ok(FontFamily {
        regular,
        bold,
        italic,
        bold_italic,
    })
}

// ── genpdf mapping ───────────────────────────────────────────────────────────

fn style(s: TextStyle) -> Style {
    let (r, g, b) = s.color;
    let style = Style::new()
        .with_font_size(s.size)
        .with_color(Color::Rgb(r, g, b));
    if s.bold {
        style.bold()
    } else {
        style
    }
}

/// Column widths in inches → integer table weights.
fn weights(widths_in: &[f64]) -> Vec<usize> {
    widths_in.iter().map(|w| (w * 10.0).round() as usize).collect()
}

fn heading(text: &str) -> impl Element {
    let mut p = Paragraph::default();
    p.push_styled(layout::normalize_text(text), style(DOCUMENT_TITLE_STYLE));
    p.aligned(Alignment::Center)
        .padded(Margins::trbl(0.0, 0.0, pt(layout::HEADING_SPACING_PT), 0.0))
}

/// An image stretched into a fixed box.
fn boxed_image(asset: &Asset, box_mm: (f64, f64)) -> Result<Image, genpdf::error::Error> {
    let natural_w = f64::from(asset.width.max(1)) * MM_PER_INCH / IMAGE_DPI;
    let natural_h = f64::from(asset.height.max(1)) * MM_PER_INCH / IMAGE_DPI;
    Ok(Image::from_reader(Cursor::new(asset.png.clone()))?
        .with_dpi(IMAGE_DPI)
        .with_scale(Scale::new(box_mm.0 / natural_w, box_mm.1 / natural_h)))
}

fn poster_cell(block: &RecordBlock) -> ImageSlot {
    let box_mm = (inch(POSTER_BOX_IN.0), inch(POSTER_BOX_IN.1));
    ImageSlot::place(block.poster.as_ref(), box_mm, &block.title)
}

/// The flag, right-aligned and lowered to sit mid-height of the title line.
fn flag_cell(block: &RecordBlock) -> impl Element {
    let box_mm = (pt(FLAG_BOX_PT.0), pt(FLAG_BOX_PT.1));
    let mut slot = ImageSlot::place(block.flag.as_ref(), box_mm, &block.title);
    slot.0 = slot.0.map(|img| img.with_alignment(Alignment::Right));
    slot.padded(Margins::trbl(pt(layout::flag_top_inset_pt()), 0.0, 0.0, 0.0))
}

fn title_row(block: &RecordBlock) -> Result<TableLayout, ExportError> {
    let mut title = Paragraph::default();
    title.push_styled(block.title.clone(), style(MOVIE_TITLE_STYLE));

    let mut table = TableLayout::new(weights(&TITLE_COLUMNS_IN));
    table
        .row()
        .element(title.padded(Margins::trbl(0.0, 0.0, pt(layout::TITLE_SPACING_PT), 0.0)))
        .element(flag_cell(block))
        .push()
        .map_err(|e| ExportError::RenderFailed(format!("title row: {e}")))?;
    Ok(table)
}

fn info_cell(block: &RecordBlock) -> Result<LinearLayout, ExportError> {
    let mut info = LinearLayout::vertical().element(title_row(block)?);

    let mut rating = Paragraph::default();
    rating.push_styled(block.rating.personal.clone(), style(RATING_STYLE).bold());
    rating.push_styled(format!(" ({})", block.rating.community), style(RATING_STYLE));
    info.push(rating.padded(Margins::trbl(0.0, 0.0, pt(layout::RATING_SPACING_PT), 0.0)));

    for line in &block.metadata {
        let mut p = Paragraph::default();
        p.push_styled(format!("{}:", line.label), style(BODY_STYLE).bold());
        p.push_styled(format!(" {}", line.value), style(BODY_STYLE));
        info.push(p);
    }
    Ok(info)
}

fn record_table(block: &RecordBlock) -> Result<TableLayout, ExportError> {
    let mut table = TableLayout::new(weights(&RECORD_COLUMNS_IN));
    table
        .row()
        .element(poster_cell(block))
        .element(info_cell(block)?)
        .push()
        .map_err(|e| ExportError::RenderFailed(format!("record '{}': {e}", block.title)))?;
    Ok(table)
}

fn separator(sep: &Separator, inset: f64) -> impl Element {
    let (r, g, b) = sep.color;
    HorizontalRule {
        thickness_mm: pt(sep.thickness_pt),
        color: Color::Rgb(r, g, b),
    }
    .padded(Margins::trbl(pt(sep.padding_pt), inset, pt(sep.padding_pt), inset))
}

/// A table cell that holds an image or nothing.
struct ImageSlot(Option<Image>);

impl ImageSlot {
    fn place(asset: Option<&Asset>, box_mm: (f64, f64), title: &str) -> Self {
        let image = asset.and_then(|a| match boxed_image(a, box_mm) {
            Ok(img) => Some(img),
            Err(e) => {
                warn!("Error embedding image {} for {}: {}", a.url, title, e);
                None
            }
        });
        Self(image)
    }
}

impl Element for ImageSlot {
    fn render(
        &mut self,
        context: &Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, genpdf::error::Error> {
        match &mut self.0 {
            Some(img) => img.render(context, area, style),
            None => Ok(RenderResult::default()),
        }
    }
}

/// A full-width line, drawn at the engine's stroke width.
struct HorizontalRule {
    thickness_mm: f64,
    color: Color,
}

impl Element for HorizontalRule {
    fn render(
        &mut self,
        _context: &Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, genpdf::error::Error> {
        let width = area.size().width;
        let y = Mm::from(self.thickness_mm / 2.0);
        area.draw_line(
            vec![Position::new(Mm::from(0.0), y), Position::new(width, y)],
            Style::new().with_color(self.color),
        );
        Ok(RenderResult {
            size: Size::new(width, Mm::from(self.thickness_mm)),
            has_more: false,
        })
    }
}
