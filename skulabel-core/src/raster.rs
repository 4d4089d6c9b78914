//! Drawing surface over `image::RgbImage`
//!
//! Rectangles, strokes, measured text, paste and sharp resize. Every
//! primitive clips to the canvas.

use image::{imageops, Rgb, RgbImage};
use rusttype::{point, Scale};

use crate::font::FontHandle;

/// Rendered glyph extents of a string, relative to the layout origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextExtent {
    pub min_x: i32,
    pub min_y: i32,
    pub width: u32,
    pub height: u32,
}

/// Union of the pixel bounding boxes of `text` laid out at `font.px`.
pub fn measure_text(font: &FontHandle, text: &str) -> TextExtent {
    let scale = Scale::uniform(font.px);
    let ascent = font.font().v_metrics(scale).ascent;
    let mut bounds: Option<(i32, i32, i32, i32)> = None;
    for glyph in font.font().layout(text, scale, point(0.0, ascent)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            bounds = Some(match bounds {
                None => (bb.min.x, bb.min.y, bb.max.x, bb.max.y),
                Some((x0, y0, x1, y1)) => (x0.min(bb.min.x), y0.min(bb.min.y), x1.max(bb.max.x), y1.max(bb.max.y)),
            });
        }
    }
    match bounds {
        Some((x0, y0, x1, y1)) => TextExtent {
            min_x: x0,
            min_y: y0,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        },
        None => TextExtent::default(),
    }
}

/// Draw `text` so its measured bounding box starts at (`x`, `y`).
pub fn draw_text(img: &mut RgbImage, font: &FontHandle, x: i32, y: i32, text: &str, color: Rgb<u8>) {
    let extent = measure_text(font, text);
    let scale = Scale::uniform(font.px);
    let ascent = font.font().v_metrics(scale).ascent;
    let origin_x = (x - extent.min_x) as f32;
    let origin_y = (y - extent.min_y) as f32 + ascent;

    for glyph in font.font().layout(text, scale, point(origin_x, origin_y)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, v| {
            let px = gx as i32 + bb.min.x;
            let py = gy as i32 + bb.min.y;
            if px < 0 || py < 0 || px >= img.width() as i32 || py >= img.height() as i32 {
                return;
            }
            let coverage = v.clamp(0.0, 1.0);
            if coverage == 0.0 {
                return;
            }
            let dst = img.get_pixel_mut(px as u32, py as u32);
            for c in 0..3 {
                let blended = color.0[c] as f32 * coverage + dst.0[c] as f32 * (1.0 - coverage);
                dst.0[c] = blended.round() as u8;
            }
        });
    }
}

pub fn fill_rect(img: &mut RgbImage, x: i32, y: i32, w: u32, h: u32, color: Rgb<u8>) {
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    let x1 = ((x as i64 + w as i64).min(img.width() as i64)).max(0) as u32;
    let y1 = ((y as i64 + h as i64).min(img.height() as i64)).max(0) as u32;
    for py in y0..y1 {
        for px in x0..x1 {
            img.put_pixel(px, py, color);
        }
    }
}

/// Horizontal stroke centered on `y`
pub fn draw_hline(img: &mut RgbImage, y: i32, x0: i32, x1: i32, stroke: u32, color: Rgb<u8>) {
    let top = y - (stroke as i32 / 2);
    fill_rect(img, x0, top, (x1 - x0).max(0) as u32, stroke, color);
}

/// Vertical stroke centered on `x`
pub fn draw_vline(img: &mut RgbImage, x: i32, y0: i32, y1: i32, stroke: u32, color: Rgb<u8>) {
    let left = x - (stroke as i32 / 2);
    fill_rect(img, left, y0, stroke, (y1 - y0).max(0) as u32, color);
}

/// Outline drawn inward from the canvas edge
pub fn draw_border(img: &mut RgbImage, stroke: u32, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    fill_rect(img, 0, 0, w, stroke, color);
    fill_rect(img, 0, h as i32 - stroke as i32, w, stroke, color);
    fill_rect(img, 0, 0, stroke, h, color);
    fill_rect(img, w as i32 - stroke as i32, 0, stroke, h, color);
}

/// Nearest-neighbour resize; keeps bar edges hard.
pub fn resize_sharp(src: &RgbImage, width: u32, height: u32) -> RgbImage {
    imageops::resize(src, width, height, imageops::FilterType::Nearest)
}

pub fn paste(dest: &mut RgbImage, src: &RgbImage, x: i64, y: i64) {
    imageops::replace(dest, src, x, y);
}
