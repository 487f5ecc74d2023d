use std::io::BufWriter;

use image::{DynamicImage, GenericImageView};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Polygon,
};

use crate::error::{AssetKind, Error, Result};

use super::layout::{Mark, Page, Rgb};
use super::metrics::Font;

/// Resolution the images are placed at before scaling to their box.
const IMAGE_DPI: f32 = 300.0;

/// Decoded logo and signature images.
#[derive(Debug, Clone)]
pub struct Assets {
    pub logo: DynamicImage,
    pub signature: DynamicImage,
}

impl Assets {
    fn get(&self, kind: AssetKind) -> &DynamicImage {
        match kind {
            AssetKind::Logo => &self.logo,
            AssetKind::Signature => &self.signature,
        }
    }
}

/// Paints `page` into a complete single-page PDF held in memory.
pub fn paint(title: &str, page: &Page, assets: &Assets) -> Result<Vec<u8>> {
    let (doc, page_idx, layer_idx) =
        PdfDocument::new(title, Mm(page.width), Mm(page.height), "Layer 1");
    let layer = doc.get_page(page_idx).get_layer(layer_idx);

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| Error::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| Error::Pdf(e.to_string()))?;

    for mark in &page.marks {
        match mark {
            Mark::Text {
                text,
                x,
                y,
                font,
                size,
                color,
            } => {
                let font_ref: &IndirectFontRef = match font {
                    Font::Regular => &regular,
                    Font::Bold => &bold,
                };
                layer.set_fill_color(rgb(*color));
                layer.use_text(text.as_str(), *size, Mm(*x), Mm(*y), font_ref);
            }
            Mark::Fill {
                x,
                y,
                width,
                height,
                color,
            } => {
                layer.set_fill_color(rgb(*color));
                layer.add_polygon(Polygon {
                    rings: vec![vec![
                        (Point::new(Mm(*x), Mm(*y)), false),
                        (Point::new(Mm(*x + *width), Mm(*y)), false),
                        (Point::new(Mm(*x + *width), Mm(*y + *height)), false),
                        (Point::new(Mm(*x), Mm(*y + *height)), false),
                    ]],
                    mode: PaintMode::Fill,
                    winding_order: WindingOrder::NonZero,
                });
            }
            Mark::Rule { x1, x2, y, color } => {
                layer.set_outline_color(rgb(*color));
                layer.set_outline_thickness(1.0);
                layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(*x1), Mm(*y)), false),
                        (Point::new(Mm(*x2), Mm(*y)), false),
                    ],
                    is_closed: false,
                });
            }
            Mark::Image {
                asset,
                x,
                y,
                width,
                height,
            } => place_image(&layer, assets.get(*asset), *x, *y, *width, *height),
        }
    }

    let mut writer = BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer).map_err(|e| Error::Pdf(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| Error::Pdf(e.to_string()))
}

/// Stretches `source` into the `width` x `height` box whose lower-left corner
/// is at (`x`, `y`).
fn place_image(
    layer: &PdfLayerReference,
    source: &DynamicImage,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) {
    let (px_w, px_h) = source.dimensions();
    let natural_w = px_w.max(1) as f32 / IMAGE_DPI * 25.4;
    let natural_h = px_h.max(1) as f32 / IMAGE_DPI * 25.4;

    Image::from_dynamic_image(source).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            scale_x: Some(width / natural_w),
            scale_y: Some(height / natural_h),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}

fn rgb(Rgb(r, g, b): Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(r, g, b, None))
}
