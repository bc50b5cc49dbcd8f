//! PDF certificate rendering.
//!
//! Fixed landscape-letter page with a double border, centered text blocks,
//! an optional PNG logo and the completion date. A Unicode-capable TTF can
//! be supplied for non-Latin student names; when absent or unreadable the
//! renderer falls back to a builtin font and still produces a valid PDF.

use std::io::Cursor;

use chrono::NaiveDate;
use printpdf::{BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, Point, Rgb};
use tracing::warn;

use crate::errors::ExportError;

/// Landscape US letter.
const PAGE_WIDTH_MM: f32 = 279.4;
const PAGE_HEIGHT_MM: f32 = 215.9;
const MM_PER_PT: f32 = 0.352_778;

#[derive(Debug, Clone)]
pub struct CertificateRequest {
    pub student_name: String,
    pub course_title: String,
    /// PNG bytes; skipped silently if it does not decode.
    pub logo_png: Option<Vec<u8>>,
    pub issued_on: NaiveDate,
}

/// Render a certificate to PDF bytes.
pub fn render_certificate(
    request: &CertificateRequest,
    font_bytes: Option<&[u8]>,
) -> Result<Vec<u8>, ExportError> {
    let (doc, page, layer) = PdfDocument::new(
        "Certificate of Completion",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "certificate",
    );
    let layer = doc.get_page(page).get_layer(layer);

    let font = match font_bytes {
        Some(bytes) => match doc.add_external_font(Cursor::new(bytes.to_vec())) {
            Ok(font) => font,
            Err(e) => {
                warn!(error = %e, "certificate font rejected, using builtin fallback");
                builtin_font(&doc)?
            }
        },
        None => builtin_font(&doc)?,
    };

    draw_border(&layer, 8.0, 1.5);
    draw_border(&layer, 11.0, 0.5);

    if let Some(png) = &request.logo_png {
        draw_logo(&doc, page, png);
    }

    let accent = Color::Rgb(Rgb::new(0.18, 0.22, 0.35, None));
    let ink = Color::Rgb(Rgb::new(0.15, 0.15, 0.16, None));

    layer.set_fill_color(accent);
    centered_text(&layer, &font, "CERTIFICATE OF COMPLETION", 28.0, 160.0);

    layer.set_fill_color(ink);
    centered_text(&layer, &font, "This certifies that", 14.0, 135.0);
    centered_text(&layer, &font, &request.student_name, 32.0, 115.0);
    centered_text(&layer, &font, "has successfully completed", 14.0, 95.0);
    centered_text(&layer, &font, &request.course_title, 22.0, 78.0);

    let date_line = request.issued_on.format("%d.%m.%Y").to_string();
    centered_text(&layer, &font, &date_line, 12.0, 40.0);

    doc.save_to_bytes()
        .map_err(|e| ExportError::Certificate(e.to_string()))
}

fn builtin_font(
    doc: &printpdf::PdfDocumentReference,
) -> Result<IndirectFontRef, ExportError> {
    doc.add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Font(e.to_string()))
}

/// Stroke a rectangle inset from the page edge.
fn draw_border(layer: &printpdf::PdfLayerReference, inset_mm: f32, thickness: f32) {
    layer.set_outline_color(Color::Rgb(Rgb::new(0.18, 0.22, 0.35, None)));
    layer.set_outline_thickness(thickness);
    let line = Line {
        points: vec![
            (Point::new(Mm(inset_mm), Mm(inset_mm)), false),
            (Point::new(Mm(PAGE_WIDTH_MM - inset_mm), Mm(inset_mm)), false),
            (
                Point::new(Mm(PAGE_WIDTH_MM - inset_mm), Mm(PAGE_HEIGHT_MM - inset_mm)),
                false,
            ),
            (Point::new(Mm(inset_mm), Mm(PAGE_HEIGHT_MM - inset_mm)), false),
        ],
        is_closed: true,
    };
    layer.add_line(line);
}

/// Place text horizontally centered. Width is estimated at half an em per
/// glyph, which is close enough for certificate-length lines.
fn centered_text(
    layer: &printpdf::PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    size_pt: f32,
    baseline_mm: f32,
) {
    let est_width_mm = text.chars().count() as f32 * size_pt * 0.5 * MM_PER_PT;
    let x = ((PAGE_WIDTH_MM - est_width_mm) / 2.0).max(15.0);
    layer.use_text(text, size_pt, Mm(x), Mm(baseline_mm), font);
}

fn draw_logo(
    doc: &printpdf::PdfDocumentReference,
    page: printpdf::PdfPageIndex,
    png: &[u8],
) {
    use printpdf::image_crate::codecs::png::PngDecoder;
    use printpdf::{Image, ImageTransform};

    let decoder = match PngDecoder::new(Cursor::new(png)) {
        Ok(d) => d,
        Err(e) => {
            warn!(error = %e, "certificate logo is not a decodable PNG, skipping");
            return;
        }
    };
    let image = match Image::try_from(decoder) {
        Ok(i) => i,
        Err(e) => {
            warn!(error = %e, "certificate logo could not be embedded, skipping");
            return;
        }
    };

    let layer = doc.get_page(page).add_layer("logo");
    image.add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(PAGE_WIDTH_MM / 2.0 - 15.0)),
            translate_y: Some(Mm(175.0)),
            ..Default::default()
        },
    );
}
