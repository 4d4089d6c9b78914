//! Label Compositor
//!
//! Builds the whole label in memory: frame, three header cells, scaled
//! barcode and the size glyph. Output happens elsewhere.

use image::{Rgb, RgbImage};
use tracing::{debug, warn};

use crate::barcode::BarcodeRasterizer;
use crate::catalog::Variant;
use crate::ean::Ean13;
use crate::error::LabelResult;
use crate::font::{FontHandle, LabelFonts};
use crate::layout::{fit_text, fit_within, place_text, LabelGeometry, Rect};
use crate::raster::{draw_border, draw_hline, draw_text, draw_vline, paste, resize_sharp};

pub struct LabelCompositor {
    geometry: LabelGeometry,
    fonts: LabelFonts,
    rasterizer: Box<dyn BarcodeRasterizer>,
}

impl LabelCompositor {
    pub fn new(
        geometry: LabelGeometry,
        fonts: LabelFonts,
        rasterizer: Box<dyn BarcodeRasterizer>,
    ) -> LabelResult<Self> {
        geometry.validate()?;
        Ok(Self { geometry, fonts, rasterizer })
    }

    pub fn geometry(&self) -> &LabelGeometry {
        &self.geometry
    }

    pub fn symbology(&self) -> &'static str {
        self.rasterizer.symbology()
    }

    /// Render one label. Barcode failures propagate untouched.
    pub fn render_label(&self, variant: &Variant, identifier: &Ean13) -> LabelResult<RgbImage> {
        let g = &self.geometry;
        let region = g.barcode_region().inset(g.barcode_padding);
        let barcode = self
            .rasterizer
            .rasterize_within(identifier.as_str(), region.width, region.height)?;

        let mut img = RgbImage::from_pixel(g.width, g.height, Rgb(g.background));
        self.draw_frame(&mut img);

        let texts = [
            (variant.sku(), &self.fonts.header),
            (variant.product_name.clone(), &self.fonts.product),
            (variant.color_name.to_uppercase(), &self.fonts.header),
        ];
        for (cell, (text, font)) in g.header_cells().iter().zip(texts.iter()) {
            self.draw_centered(&mut img, cell, text, font);
        }

        let (w, h) = fit_within(barcode.dimensions(), (region.width, region.height));
        debug!(
            sku = %variant.sku(),
            symbology = self.rasterizer.symbology(),
            source = ?barcode.dimensions(),
            scaled = ?(w, h),
            "barcode fitted"
        );
        let (x, y) = region.center(w, h);
        if barcode.dimensions() == (w, h) {
            paste(&mut img, &barcode, x as i64, y as i64);
        } else {
            paste(&mut img, &resize_sharp(&barcode, w, h), x as i64, y as i64);
        }

        self.draw_centered(&mut img, &g.size_region(), &variant.size, &self.fonts.size);

        Ok(img)
    }

    fn draw_frame(&self, img: &mut RgbImage) {
        let g = &self.geometry;
        let color = Rgb(g.line_color);
        let (w, h) = (g.width as i32, g.height as i32);
        let header = g.header_height as i32;
        let [a, b, _] = g.header_columns;

        draw_border(img, g.stroke, color);
        draw_hline(img, header, 0, w, g.stroke, color);
        draw_vline(img, a as i32, 0, header, g.stroke, color);
        draw_vline(img, (a + b) as i32, 0, header, g.stroke, color);
        draw_vline(img, g.body_split() as i32, header, h, g.stroke, color);
    }

    /// Shrink-to-fit then center on the measured glyph box
    fn draw_centered(&self, img: &mut RgbImage, cell: &Rect, text: &str, font: &FontHandle) {
        let inner = cell.inset(self.geometry.cell_padding.max(self.geometry.stroke));
        let fitted = fit_text(font, text, inner.width, inner.height, self.fonts.min_px);
        let placed = place_text(&inner, &fitted.extent);
        if !inner.contains(&placed) {
            warn!(text, shown = %fitted.text, "text overflows its cell");
        }
        draw_text(img, &fitted.font, placed.x, placed.y, &fitted.text, Rgb(self.geometry.text_color));
    }
}
