use super::{ExportError, ExportFormat, ExportOptions, Exporter};
use crate::report::{Field, Table};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rect,
    Rgb,
};

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 15.0;
const ROW_HEIGHT: f32 = 8.0;
const CELL_PADDING: f32 = 2.5;
const FONT_SIZE: f32 = 10.0;
const HEADER_FONT_SIZE: f32 = 12.0;
const PT_TO_MM: f32 = 0.3528;

type Shade = (f32, f32, f32);

const BLACK: Shade = (0.0, 0.0, 0.0);
const GREY: Shade = (0.5, 0.5, 0.5);
const WHITE_SMOKE: Shade = (0.96, 0.96, 0.96);
const BEIGE: Shade = (0.96, 0.96, 0.86);

/// Fill behind a row and the colour of its text.
struct RowStyle {
    fill: Shade,
    text: Shade,
}

const HEADER_STYLE: RowStyle = RowStyle {
    fill: GREY,
    text: WHITE_SMOKE,
};
const BODY_STYLE: RowStyle = RowStyle {
    fill: BEIGE,
    text: BLACK,
};

/// Landscape A4 document: title, generation date and a gridded table with a
/// grey header over beige rows, continued on new pages with the header repeated.
pub struct PdfExporter;

impl Exporter for PdfExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn export(&self, table: &Table, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
        let (doc, page, layer) = PdfDocument::new(
            options.title.as_str(),
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            "Layer 1",
        );
        let fonts = Fonts {
            regular: doc
                .add_builtin_font(BuiltinFont::Helvetica)
                .map_err(pdf_error)?,
            bold: doc
                .add_builtin_font(BuiltinFont::HelveticaBold)
                .map_err(pdf_error)?,
        };
        let widths = column_widths(table);

        let mut layer = doc.get_page(page).get_layer(layer);
        let mut y = PAGE_HEIGHT - MARGIN;
        layer.use_text(options.title.as_str(), 20.0, Mm(MARGIN), Mm(y), &fonts.bold);
        y -= 9.0;
        let as_of = format!("As of {}", options.generated.format("%Y-%m-%d"));
        layer.use_text(as_of, FONT_SIZE, Mm(MARGIN), Mm(y), &fonts.regular);
        y -= 8.0;
        y = draw_header(&layer, &fonts, table, &widths, y);

        for row in &table.rows {
            if y - ROW_HEIGHT < MARGIN {
                let (page, new_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
                layer = doc.get_page(page).get_layer(new_layer);
                y = draw_header(&layer, &fonts, table, &widths, PAGE_HEIGHT - MARGIN);
            }
            y = draw_row(&layer, &fonts.regular, FONT_SIZE, row, &widths, y, &BODY_STYLE);
        }

        doc.save_to_bytes().map_err(pdf_error)
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn color((r, g, b): Shade) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn pdf_error(err: printpdf::Error) -> ExportError {
    ExportError::Pdf(err.to_string())
}

/// "customer name" becomes "Customer Name".
fn title_case(column: &str) -> String {
    column
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Helvetica advance widths in em for the characters amounts use, 0.5 em otherwise.
fn text_width(text: &str, font_size: f32) -> f32 {
    let em: f32 = text
        .chars()
        .map(|c| match c {
            '0'..='9' => 0.556,
            ',' | '.' | ' ' => 0.278,
            '-' => 0.333,
            'i' | 'l' | 'j' | 'I' => 0.25,
            'm' | 'w' | 'M' | 'W' => 0.85,
            _ => 0.5,
        })
        .sum();
    em * font_size * PT_TO_MM
}

/// Natural column widths, shrunk proportionally to fit the page.
fn column_widths(table: &Table) -> Vec<f32> {
    let natural: Vec<f32> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let header = text_width(&title_case(column), HEADER_FONT_SIZE);
            table
                .rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|field| text_width(&field.to_string(), FONT_SIZE))
                .fold(header, f32::max)
                + 2.0 * CELL_PADDING
        })
        .collect();
    let available = PAGE_WIDTH - 2.0 * MARGIN;
    let total: f32 = natural.iter().sum();
    if total > available {
        natural.iter().map(|w| w * available / total).collect()
    } else {
        natural
    }
}

fn rule(layer: &PdfLayerReference, x1: f32, x2: f32, y: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y)), false),
            (Point::new(Mm(x2), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn grid(layer: &PdfLayerReference, widths: &[f32], top: f32, bottom: f32) {
    let right = MARGIN + widths.iter().sum::<f32>();
    rule(layer, MARGIN, right, bottom);
    let mut x = MARGIN;
    for width in std::iter::once(&0.0).chain(widths) {
        x += width;
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x), Mm(top)), false),
                (Point::new(Mm(x), Mm(bottom)), false),
            ],
            is_closed: false,
        });
    }
}

fn draw_header(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    table: &Table,
    widths: &[f32],
    top: f32,
) -> f32 {
    layer.set_outline_color(color(BLACK));
    layer.set_outline_thickness(1.0);
    let right = MARGIN + widths.iter().sum::<f32>();
    rule(layer, MARGIN, right, top);
    let header: Vec<Field> = table
        .columns
        .iter()
        .map(|c| Field::Text(title_case(c)))
        .collect();
    let bottom = draw_row(
        layer,
        &fonts.bold,
        HEADER_FONT_SIZE,
        &header,
        widths,
        top,
        &HEADER_STYLE,
    );
    layer.set_outline_thickness(0.5);
    bottom
}

/// Draws one filled, gridded row below `top` and returns its bottom edge.
fn draw_row(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    font_size: f32,
    row: &[Field],
    widths: &[f32],
    top: f32,
    style: &RowStyle,
) -> f32 {
    let bottom = top - ROW_HEIGHT;
    let right = MARGIN + widths.iter().sum::<f32>();
    layer.set_fill_color(color(style.fill));
    layer.add_rect(
        Rect::new(Mm(MARGIN), Mm(bottom), Mm(right), Mm(top)).with_mode(PaintMode::Fill),
    );
    layer.set_fill_color(color(style.text));
    let baseline = bottom + (ROW_HEIGHT - font_size * PT_TO_MM) / 2.0 + 0.5;
    let mut x = MARGIN;
    for (field, width) in row.iter().zip(widths) {
        let text = field.to_string();
        let left = match field {
            Field::Amount(_) | Field::Count(_) => {
                x + width - CELL_PADDING - text_width(&text, font_size)
            }
            _ => x + CELL_PADDING,
        };
        layer.use_text(text, font_size, Mm(left), Mm(baseline), font);
        x += width;
    }
    grid(layer, widths, top, bottom);
    bottom
}

#[cfg(test)]
mod pdf_tests {
    use super::*;
    use crate::money::Money;
    use anyhow::Result;
    use chrono::NaiveDate;

    fn outstanding(rows: usize) -> Result<Table> {
        let mut table = Table::new("Customer Outstanding", &["customer name", "outstanding"]);
        for i in 0..rows {
            let amount: Money = format!("{}.5", i * 1000).parse()?;
            table.push(vec![Field::Text(format!("Customer {i}")), amount.into()]);
        }
        Ok(table)
    }

    fn options() -> ExportOptions {
        ExportOptions {
            sheet_name: "outstanding".to_string(),
            title: "Customer Outstanding Report".to_string(),
            generated: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    #[test]
    fn renders_a_pdf() -> Result<()> {
        let bytes = PdfExporter.export(&outstanding(3)?, &options())?;
        assert!(bytes.starts_with(b"%PDF"));
        Ok(())
    }

    #[test]
    fn long_tables_span_pages() -> Result<()> {
        let short = PdfExporter.export(&outstanding(3)?, &options())?;
        let long = PdfExporter.export(&outstanding(200)?, &options())?;
        assert!(long.starts_with(b"%PDF"));
        assert!(long.len() > short.len());
        Ok(())
    }

    #[test]
    fn header_only_table_renders() -> Result<()> {
        let bytes = PdfExporter.export(&outstanding(0)?, &options())?;
        assert!(bytes.starts_with(b"%PDF"));
        assert_ne!(HEADER_STYLE.fill, BODY_STYLE.fill);
        assert_ne!(HEADER_STYLE.text, HEADER_STYLE.fill);
        Ok(())
    }

    #[test]
    fn headers_are_title_cased() {
        assert_eq!(title_case("customer name"), "Customer Name");
        assert_eq!(title_case(" outstanding "), "Outstanding");
    }

    #[test]
    fn widths_fit_the_page() -> Result<()> {
        let mut wide = Table::new("wide", &["a"; 40]);
        wide.push(vec![Field::Text("a fairly long piece of text".to_string()); 40]);
        let widths = column_widths(&wide);
        let total: f32 = widths.iter().sum();
        assert!(total <= PAGE_WIDTH - 2.0 * MARGIN + 0.01);
        let widths = column_widths(&outstanding(2)?);
        assert_eq!(widths.len(), 2);
        Ok(())
    }
}
