// src/pdf_render.rs

use std::fs;
use std::path::Path;

use printpdf::image_crate::codecs::jpeg::JpegDecoder;
use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::image_crate::ImageError;
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Pt, Rect, Rgb,
};
use thiserror::Error;
use tracing::warn;

use crate::signature::{parse_signature_data, SignatureError, SignatureFormat, SignatureImage};
use crate::timesheet::{
    grand_total, Submission, EMPLOYEE_TYPE_CERTIFICATED, EMPLOYEE_TYPE_CLASSIFIED,
    FIXED_ALPHA_CODES,
};

// --- Layout Constants ---
// All coordinates are in PDF points on a US-letter page, tuned to mirror the
// district's paper form. Treat them as configuration, not logic.

const PAGE_WIDTH_PT: f32 = 612.0;
const PAGE_HEIGHT_PT: f32 = 792.0;
const MARGIN_X: f32 = 50.0;
const TOP_MARGIN: f32 = 50.0;
const ROW_HEIGHT: f32 = 20.0;

// Day, then 3x (In, Out, Tot, Cd), then the daily total.
const GRID_HEADERS: [&str; 14] = [
    "Day", "In", "Out", "Tot", "Cd", "In", "Out", "Tot", "Cd", "In", "Out", "Tot", "Cd", "Total",
];
const GRID_COL_WIDTHS: [f32; 14] = [
    30.0, 38.0, 38.0, 38.0, 28.0, 38.0, 38.0, 38.0, 28.0, 38.0, 38.0, 38.0, 28.0, 50.0,
];

const ACCOUNT_HEADERS: [&str; 13] = [
    "Fund", "Loc", "Prog", "Goal", "Func", "Obj", "Res", "Yr", "Mgr", "Alpha", "Hrs", "Rate",
    "Total",
];
const ACCOUNT_COL_WIDTHS: [f32; 13] = [
    35.0, 35.0, 35.0, 35.0, 35.0, 35.0, 35.0, 35.0, 50.0, 35.0, 35.0, 50.0, 62.0,
];

const LOGO_SCALE: f32 = 0.25;
const SIGNATURE_SCALE: f32 = 0.5;
// Embedded rasters carry no meaningful DPI; 72 maps one pixel to one point.
const IMAGE_DPI: f32 = 72.0;

const DISTRICT_NAME: &str = "EAST SIDE UNION HIGH SCHOOL DISTRICT";
const FORM_TITLE: &str = "DAILY TIMESHEET";

const DISCLAIMER: &str = "As per CA Labor Code Section 512, an employee with a work period of \
more than five hours per day must take a meal period of not less than 30 minutes; an employee \
with a work period of more than ten hours per day must take a second meal period of not less \
than 30 minutes.";

// --- Errors ---

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Signature rejected: {0}")]
    Signature(#[from] SignatureError),

    #[error("Signature bytes could not be decoded as {format}: {source}")]
    SignatureDecode {
        format: &'static str,
        #[source]
        source: ImageError,
    },

    #[error("PDF generation failed: {0}")]
    Pdf(#[from] printpdf::Error),
}

// --- Page Cursor ---

fn pt(value: f32) -> Mm {
    Mm::from(Pt(value))
}

/// Approximate Helvetica advance width, used only to center cell text.
fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.5
}

/// Tracks the active page layer and the vertical write position, adding pages
/// as sections run out of room.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    font: &'a IndirectFontRef,
    bold: &'a IndirectFontRef,
    y: f32,
}

impl PageCursor<'_> {
    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(pt(PAGE_WIDTH_PT), pt(PAGE_HEIGHT_PT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.layer.set_outline_thickness(1.0);
        self.y = PAGE_HEIGHT_PT - TOP_MARGIN;
    }

    fn text(&self, text: &str, x: f32, y: f32, font_size: f32, font: &IndirectFontRef) {
        if !text.is_empty() {
            self.layer.use_text(text, font_size, pt(x), pt(y), font);
        }
    }

    fn line(&self, from: (f32, f32), to: (f32, f32)) {
        self.layer.add_line(Line {
            points: vec![
                (Point::new(pt(from.0), pt(from.1)), false),
                (Point::new(pt(to.0), pt(to.1)), false),
            ],
            is_closed: false,
        });
    }

    /// Bordered cell with vertically centered text, lower-left corner at
    /// `(x, y)`.
    fn cell(
        &self,
        text: &str,
        x: f32,
        y: f32,
        width: f32,
        font_size: f32,
        font: &IndirectFontRef,
        centered: bool,
    ) {
        self.layer.add_rect(
            Rect::new(pt(x), pt(y), pt(x + width), pt(y + ROW_HEIGHT))
                .with_mode(PaintMode::Stroke),
        );
        if !text.is_empty() {
            let text_x = if centered {
                x + (width - text_width(text, font_size)) / 2.0
            } else {
                x + 2.0
            };
            let text_y = y + (ROW_HEIGHT - font_size) / 2.0 + 2.0;
            self.text(text, text_x, text_y, font_size, font);
        }
    }

    /// Bold label above an underlined value, the paper form's fill-in style.
    fn label_value(&self, label: &str, value: &str, x: f32, y: f32, width: f32) {
        self.text(label, x, y + 10.0, 8.0, self.bold);
        self.line((x, y), (x + width, y));
        self.text(value, x, y + 2.0, 10.0, self.font);
    }
}

// --- Renderer ---

/// Renders a submission into the fixed-layout PDF replica of the paper form.
/// The decorative logo is optional; a signature that fails to decode aborts
/// the whole render.
pub fn render_timesheet(submission: &Submission, logo_path: &Path) -> Result<Vec<u8>, RenderError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        FORM_TITLE,
        pt(PAGE_WIDTH_PT),
        pt(PAGE_HEIGHT_PT),
        "Layer 1",
    );
    let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut cursor = PageCursor {
        doc: &doc,
        layer: doc.get_page(first_page).get_layer(first_layer),
        font: &font,
        bold: &bold,
        y: PAGE_HEIGHT_PT - TOP_MARGIN,
    };
    cursor.layer.set_outline_thickness(1.0);

    draw_header(&mut cursor, submission, logo_path);
    draw_employee_info(&mut cursor, submission);
    draw_day_grids(&mut cursor, submission);
    draw_account_grid(&mut cursor, submission);
    draw_alpha_legend(&mut cursor, submission);
    draw_signature_blocks(&mut cursor, submission)?;
    draw_disclaimer(&mut cursor);

    doc.save_to_bytes().map_err(RenderError::from)
}

fn draw_header(cursor: &mut PageCursor, submission: &Submission, logo_path: &Path) {
    embed_logo(cursor, logo_path);

    cursor.text(DISTRICT_NAME, 130.0, cursor.y - 15.0, 14.0, cursor.bold);
    cursor.text(FORM_TITLE, 130.0, cursor.y - 35.0, 18.0, cursor.bold);

    let classified = checkbox(submission.employee_type == EMPLOYEE_TYPE_CLASSIFIED);
    let certificated = checkbox(submission.employee_type == EMPLOYEE_TYPE_CERTIFICATED);
    cursor.text(
        &format!("[{}] CLASSIFIED", classified),
        430.0,
        cursor.y - 15.0,
        9.0,
        cursor.font,
    );
    cursor.text(
        &format!("[{}] CERTIFICATED", certificated),
        500.0,
        cursor.y - 15.0,
        9.0,
        cursor.font,
    );

    cursor.y -= 80.0;
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "X"
    } else {
        " "
    }
}

/// The logo is decorative: any failure to read or decode it is logged and
/// rendering continues without it.
fn embed_logo(cursor: &PageCursor, logo_path: &Path) {
    let bytes = match fs::read(logo_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                "Logo {} could not be read, rendering without it: {}",
                logo_path.display(),
                e
            );
            return;
        }
    };
    let image = match PngDecoder::new(std::io::Cursor::new(bytes.as_slice()))
        .and_then(Image::try_from)
    {
        Ok(image) => image,
        Err(e) => {
            warn!(
                "Logo {} could not be decoded, rendering without it: {}",
                logo_path.display(),
                e
            );
            return;
        }
    };

    let logo_height = image.image.height.0 as f32 * LOGO_SCALE;
    image.add_to_layer(
        cursor.layer.clone(),
        ImageTransform {
            translate_x: Some(pt(MARGIN_X)),
            translate_y: Some(pt(cursor.y - logo_height)),
            scale_x: Some(LOGO_SCALE),
            scale_y: Some(LOGO_SCALE),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

fn draw_employee_info(cursor: &mut PageCursor, submission: &Submission) {
    cursor.label_value(
        "EMPLOYEE (Legal Name Only)",
        &submission.employee_name,
        50.0,
        cursor.y,
        250.0,
    );
    cursor.label_value("EMPLOYEE ID", &submission.employee_id, 310.0, cursor.y, 80.0);
    cursor.label_value("FTE", &submission.fte, 400.0, cursor.y, 60.0);
    cursor.label_value(
        "HOURS/WEEK",
        &submission.hours_per_week,
        470.0,
        cursor.y,
        90.0,
    );
    cursor.y -= 35.0;

    cursor.label_value("MONTH 1", &submission.month1, 50.0, cursor.y, 80.0);
    cursor.label_value("MONTH 2", &submission.month2, 140.0, cursor.y, 80.0);
    cursor.label_value("YEAR", &submission.year, 230.0, cursor.y, 60.0);
    cursor.label_value("POSITION", &submission.position, 300.0, cursor.y, 150.0);
    cursor.label_value(
        "SCHOOL SITE / LOCATION",
        &submission.school,
        460.0,
        cursor.y,
        100.0,
    );
    cursor.y -= 35.0;

    cursor.label_value("EMAIL", &submission.email, 50.0, cursor.y, 510.0);
    cursor.y -= 40.0;
}

fn draw_grid_header(cursor: &PageCursor, y: f32) {
    let mut x = MARGIN_X;
    for (header, width) in GRID_HEADERS.iter().zip(GRID_COL_WIDTHS) {
        cursor.cell(header, x, y, width, 8.0, cursor.bold, true);
        x += width;
    }
}

fn draw_day_grids(cursor: &mut PageCursor, submission: &Submission) {
    draw_day_window(cursor, submission, "MONTH 1 (16-31)", crate::timesheet::window_one_days());

    cursor.y -= 20.0;
    if cursor.y < 100.0 {
        cursor.new_page();
    }
    draw_day_window(cursor, submission, "MONTH 2 (1-15)", crate::timesheet::window_two_days());
}

fn draw_day_window(
    cursor: &mut PageCursor,
    submission: &Submission,
    title: &str,
    days: impl Iterator<Item = u32>,
) {
    cursor.text(title, MARGIN_X, cursor.y, 10.0, cursor.bold);
    cursor.y -= 20.0;
    draw_grid_header(cursor, cursor.y);
    cursor.y -= ROW_HEIGHT;

    let grid = &submission.timesheet_data;
    for day in days {
        if cursor.y < 50.0 {
            cursor.new_page();
            draw_grid_header(cursor, cursor.y);
            cursor.y -= ROW_HEIGHT;
        }

        let row = [
            day.to_string(),
            grid.get(day, "in1").to_string(),
            grid.get(day, "out1").to_string(),
            grid.get(day, "total1").to_string(),
            grid.get(day, "code1").to_string(),
            grid.get(day, "in2").to_string(),
            grid.get(day, "out2").to_string(),
            grid.get(day, "total2").to_string(),
            grid.get(day, "code2").to_string(),
            grid.get(day, "in3").to_string(),
            grid.get(day, "out3").to_string(),
            grid.get(day, "total3").to_string(),
            grid.get(day, "code3").to_string(),
            grid.get(day, "dailyTotal").to_string(),
        ];

        let mut x = MARGIN_X;
        for (index, (value, width)) in row.iter().zip(GRID_COL_WIDTHS).enumerate() {
            cursor.cell(value, x, cursor.y, width, 8.0, cursor.font, index == 0);
            x += width;
        }
        cursor.y -= ROW_HEIGHT;
    }
}

fn draw_account_grid(cursor: &mut PageCursor, submission: &Submission) {
    cursor.y -= 30.0;
    if cursor.y < 150.0 {
        cursor.new_page();
    }

    cursor.text("ACCOUNT CODES:", MARGIN_X, cursor.y, 10.0, cursor.bold);
    cursor.y -= 20.0;

    let mut x = MARGIN_X;
    for (header, width) in ACCOUNT_HEADERS.iter().zip(ACCOUNT_COL_WIDTHS) {
        cursor.cell(header, x, cursor.y, width, 8.0, cursor.bold, true);
        x += width;
    }
    cursor.y -= ROW_HEIGHT;

    for row in &submission.account_codes {
        let values = [
            row.fund.as_str(),
            row.location.as_str(),
            row.program.as_str(),
            row.goal.as_str(),
            row.function.as_str(),
            row.object.as_str(),
            row.resource.as_str(),
            row.year.as_str(),
            row.manager.as_str(),
            row.alpha.as_str(),
            row.hours.as_str(),
            row.pay_rate.as_str(),
            row.total_pay.as_str(),
        ];
        let mut x = MARGIN_X;
        for (value, width) in values.iter().zip(ACCOUNT_COL_WIDTHS) {
            cursor.cell(value, x, cursor.y, width, 8.0, cursor.font, true);
            x += width;
        }
        cursor.y -= ROW_HEIGHT;
    }

    // Grand total is re-derived from the row totals so a stale client value
    // cannot reach the signed document.
    let total_column_x: f32 = MARGIN_X
        + ACCOUNT_COL_WIDTHS[..ACCOUNT_COL_WIDTHS.len() - 1]
            .iter()
            .sum::<f32>();
    cursor.text(
        "Grand Total Pay:",
        total_column_x - 110.0,
        cursor.y + 5.0,
        10.0,
        cursor.bold,
    );
    cursor.cell(
        &grand_total(&submission.account_codes),
        total_column_x,
        cursor.y,
        ACCOUNT_COL_WIDTHS[ACCOUNT_COL_WIDTHS.len() - 1],
        10.0,
        cursor.bold,
        true,
    );
    cursor.y -= ROW_HEIGHT;
}

fn draw_alpha_legend(cursor: &mut PageCursor, submission: &Submission) {
    cursor.y -= 30.0;
    if cursor.y < 100.0 {
        cursor.new_page();
    }

    cursor.text("Alpha Codes:", MARGIN_X, cursor.y, 10.0, cursor.bold);
    cursor.y -= 15.0;

    // Fixed portion of the legend, two columns.
    let rows = (FIXED_ALPHA_CODES.len() + 1) / 2;
    for (index, (code, description)) in FIXED_ALPHA_CODES.iter().enumerate() {
        let x = MARGIN_X + (index / rows) as f32 * 250.0;
        let y = cursor.y - (index % rows) as f32 * 9.0;
        cursor.text(&format!("{}: {}", code, description), x, y, 7.0, cursor.font);
    }
    cursor.y -= rows as f32 * 9.0 + 6.0;

    cursor.text(
        &format!("L: {}", submission.alpha_l),
        50.0,
        cursor.y,
        9.0,
        cursor.font,
    );
    cursor.text(
        &format!("M: {}", submission.alpha_m),
        200.0,
        cursor.y,
        9.0,
        cursor.font,
    );
    cursor.text(
        &format!("N: {}", submission.alpha_n),
        350.0,
        cursor.y,
        9.0,
        cursor.font,
    );
}

fn decode_signature_image(signature: &SignatureImage) -> Result<Image, RenderError> {
    let reader = std::io::Cursor::new(signature.bytes.as_slice());
    match signature.format {
        SignatureFormat::Png => PngDecoder::new(reader).and_then(Image::try_from),
        SignatureFormat::Jpeg => JpegDecoder::new(reader).and_then(Image::try_from),
    }
    .map_err(|source| RenderError::SignatureDecode {
        format: signature.format.as_str(),
        source,
    })
}

fn draw_signature_blocks(cursor: &mut PageCursor, submission: &Submission) -> Result<(), RenderError> {
    cursor.y -= 50.0;

    match submission.signature_data.as_deref().map(str::trim) {
        Some(data) if !data.is_empty() => {
            let signature = parse_signature_data(data)?;
            let image = decode_signature_image(&signature)?;
            let signature_height = image.image.height.0 as f32 * SIGNATURE_SCALE;
            image.add_to_layer(
                cursor.layer.clone(),
                ImageTransform {
                    translate_x: Some(pt(MARGIN_X)),
                    translate_y: Some(pt(cursor.y - signature_height)),
                    scale_x: Some(SIGNATURE_SCALE),
                    scale_y: Some(SIGNATURE_SCALE),
                    dpi: Some(IMAGE_DPI),
                    ..Default::default()
                },
            );
            let caption_y = cursor.y - signature_height - 15.0;
            cursor.text("Employee Signature", MARGIN_X, caption_y, 10.0, cursor.font);
            if !submission.date_employee.is_empty() {
                cursor.text(
                    &format!("Date: {}", submission.date_employee),
                    300.0,
                    caption_y,
                    10.0,
                    cursor.font,
                );
            }
        }
        _ => {
            // No signature captured: draw the blank line the paper form has.
            cursor.line((MARGIN_X, cursor.y - 40.0), (250.0, cursor.y - 40.0));
            cursor.text("Employee Signature", MARGIN_X, cursor.y - 55.0, 10.0, cursor.font);
            if !submission.date_employee.is_empty() {
                cursor.text(
                    &format!("Date: {}", submission.date_employee),
                    300.0,
                    cursor.y - 55.0,
                    10.0,
                    cursor.font,
                );
            }
        }
    }

    cursor.y -= 120.0;
    draw_approval_line(cursor, "Principal / Supervisor", &submission.date_principal);

    cursor.y -= 100.0;
    draw_approval_line(cursor, "Program Manager", &submission.date_manager);

    Ok(())
}

fn draw_approval_line(cursor: &mut PageCursor, role: &str, date: &str) {
    if cursor.y < 50.0 {
        cursor.new_page();
    }
    cursor.line((MARGIN_X, cursor.y), (250.0, cursor.y));
    cursor.text(role, MARGIN_X, cursor.y - 15.0, 10.0, cursor.font);
    cursor.text("Date:", 270.0, cursor.y, 10.0, cursor.font);
    cursor.line((300.0, cursor.y), (400.0, cursor.y));
    cursor.text(date, 305.0, cursor.y + 2.0, 10.0, cursor.font);
}

fn draw_disclaimer(cursor: &mut PageCursor) {
    if cursor.y < 100.0 {
        cursor.new_page();
    }

    cursor
        .layer
        .set_fill_color(Color::Rgb(Rgb::new(1.0, 0.0, 0.0, None)));
    for (index, line) in wrap_text(DISCLAIMER, 128).iter().enumerate() {
        cursor.text(line, MARGIN_X, 40.0 - index as f32 * 10.0, 8.0, cursor.font);
    }
    cursor
        .layer
        .set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
}

/// Greedy word wrap by character count; good enough for the single fixed
/// disclaimer paragraph.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timesheet::{AccountField, ClockField};
    use std::path::PathBuf;

    const TINY_PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR4nGNgYGD4DwABBAEAX+XDSwAAAABJRU5ErkJggg==";

    fn missing_logo() -> PathBuf {
        PathBuf::from("no-such-logo.png")
    }

    fn filled_submission() -> Submission {
        let mut submission = Submission::default();
        submission.employee_name = "Jane Doe".to_string();
        submission.employee_id = "123456".to_string();
        submission.record_account_value(0, AccountField::PayRate, "20");
        for day in [16, 17, 1, 2] {
            submission.record_clock_time(day, 1, ClockField::In, "08:00");
            submission.record_clock_time(day, 1, ClockField::Out, "12:30");
            submission.record_shift_code(day, 1, "A");
        }
        submission
    }

    #[test]
    fn renders_an_unsigned_submission_to_pdf_bytes() {
        let bytes =
            render_timesheet(&filled_submission(), &missing_logo()).expect("render should succeed");
        assert!(bytes.starts_with(b"%PDF"), "output must be a PDF stream");
    }

    #[test]
    fn renders_a_signed_submission() {
        let mut submission = filled_submission();
        submission.signature_data = Some(format!("data:image/png;base64,{}", TINY_PNG_B64));
        submission.date_employee = "2025-04-01".to_string();

        let bytes = render_timesheet(&submission, &missing_logo()).expect("render should succeed");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn missing_logo_does_not_fail_the_render() {
        let submission = filled_submission();
        assert!(render_timesheet(&submission, &missing_logo()).is_ok());
    }

    #[test]
    fn undecodable_signature_bytes_abort_the_render() {
        let mut submission = filled_submission();
        // Declared as JPEG, but the payload is PNG bytes.
        submission.signature_data = Some(format!("data:image/jpeg;base64,{}", TINY_PNG_B64));

        let result = render_timesheet(&submission, &missing_logo());
        assert!(
            matches!(result, Err(RenderError::SignatureDecode { format: "JPEG", .. })),
            "a signature that is not the declared format must fail the submission"
        );
    }

    #[test]
    fn garbage_signature_base64_aborts_the_render() {
        let mut submission = filled_submission();
        submission.signature_data = Some("data:image/png;base64,@@@".to_string());

        assert!(matches!(
            render_timesheet(&submission, &missing_logo()),
            Err(RenderError::Signature(_))
        ));
    }

    #[test]
    fn wrap_text_keeps_lines_within_the_limit() {
        let lines = wrap_text(DISCLAIMER, 128);
        assert!(lines.len() >= 2, "the disclaimer does not fit on one line");
        for line in &lines {
            assert!(line.len() <= 128, "line exceeded wrap width: {}", line);
        }
        assert_eq!(lines.join(" "), DISCLAIMER);
    }
}
