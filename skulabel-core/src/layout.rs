//! Label Geometry - fixed canvas, cell regions, fit and centering math

use serde::{Deserialize, Serialize};

use crate::error::{LabelError, LabelResult};
use crate::font::FontHandle;
use crate::raster::{measure_text, TextExtent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Shrink by `pad` on every side; never below zero size.
    pub fn inset(&self, pad: u32) -> Rect {
        let pad_w = pad.min(self.width / 2);
        let pad_h = pad.min(self.height / 2);
        Rect {
            x: self.x + pad_w as i32,
            y: self.y + pad_h as i32,
            width: self.width - 2 * pad_w,
            height: self.height - 2 * pad_h,
        }
    }

    /// Top-left corner that centers a `width`×`height` box in this rect.
    ///
    /// A box no larger than the rect always lands fully inside it.
    pub fn center(&self, width: u32, height: u32) -> (i32, i32) {
        (
            self.x + (self.width as i32 - width as i32) / 2,
            self.y + (self.height as i32 - height as i32) / 2,
        )
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x && other.y >= self.y && other.right() <= self.right() && other.bottom() <= self.bottom()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelGeometry {
    pub width: u32,
    pub height: u32,
    pub header_height: u32,
    /// SKU, product name and color cells, left to right
    pub header_columns: [u32; 3],
    pub stroke: u32,
    pub cell_padding: u32,
    pub barcode_padding: u32,
    pub line_color: [u8; 3],
    pub background: [u8; 3],
    pub text_color: [u8; 3],
}

impl Default for LabelGeometry {
    fn default() -> Self {
        Self {
            width: 600,
            height: 300,
            header_height: 100,
            header_columns: [200, 200, 200],
            stroke: 3,
            cell_padding: 8,
            barcode_padding: 10,
            line_color: [0, 0, 0],
            background: [255, 255, 255],
            text_color: [0, 0, 0],
        }
    }
}

impl LabelGeometry {
    pub fn validate(&self) -> LabelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LabelError::InvalidConfig("canvas must be non-empty".into()));
        }
        let columns: u32 = self.header_columns.iter().sum();
        if columns != self.width {
            return Err(LabelError::InvalidConfig(format!(
                "header columns sum to {}, canvas width is {}",
                columns, self.width
            )));
        }
        if self.header_height == 0 || self.header_height >= self.height {
            return Err(LabelError::InvalidConfig(format!(
                "header height {} must be within canvas height {}",
                self.header_height, self.height
            )));
        }
        if self.stroke == 0 {
            return Err(LabelError::InvalidConfig("stroke must be > 0".into()));
        }
        Ok(())
    }

    /// X coordinate where the body splits into barcode and size regions
    pub fn body_split(&self) -> u32 {
        self.width * 2 / 3
    }

    pub fn header_cells(&self) -> [Rect; 3] {
        let [a, b, c] = self.header_columns;
        let h = self.header_height;
        [
            Rect::new(0, 0, a, h),
            Rect::new(a as i32, 0, b, h),
            Rect::new((a + b) as i32, 0, c, h),
        ]
    }

    pub fn barcode_region(&self) -> Rect {
        Rect::new(0, self.header_height as i32, self.body_split(), self.height - self.header_height)
    }

    pub fn size_region(&self) -> Rect {
        let split = self.body_split();
        Rect::new(split as i32, self.header_height as i32, self.width - split, self.height - self.header_height)
    }
}

/// Integer size of `src` scaled uniformly to fit inside `avail`.
///
/// The result never exceeds `avail` and matches it exactly on the limiting
/// dimension.
pub fn fit_within(src: (u32, u32), avail: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = (src.0.max(1) as u64, src.1.max(1) as u64);
    let (aw, ah) = (avail.0 as u64, avail.1 as u64);
    if aw * sh <= ah * sw {
        (avail.0, ((sh * aw) / sw).max(1).min(ah) as u32)
    } else {
        (((sw * ah) / sh).max(1).min(aw) as u32, avail.1)
    }
}

const ELLIPSIS: &str = "\u{2026}";

/// Text measured at the size it will actually be drawn
#[derive(Debug, Clone)]
pub struct FittedText {
    pub font: FontHandle,
    /// What gets drawn; shortened with an ellipsis if `min_px` was not enough
    pub text: String,
    pub extent: TextExtent,
}

/// Shrink `font` until `text` fits a `max_w`×`max_h` box, stopping at `min_px`.
///
/// Text still too wide at `min_px` is cut at the end and marked with `…`.
pub fn fit_text(font: &FontHandle, text: &str, max_w: u32, max_h: u32, min_px: f32) -> FittedText {
    let mut current = font.clone();
    let mut extent = measure_text(&current, text);
    for _ in 0..8 {
        if extent.width <= max_w && extent.height <= max_h {
            break;
        }
        if current.px <= min_px {
            break;
        }
        let ratio = (max_w as f32 / extent.width.max(1) as f32).min(max_h as f32 / extent.height.max(1) as f32);
        let next = (current.px * ratio).floor().min(current.px - 1.0).max(min_px);
        current = current.with_px(next);
        extent = measure_text(&current, text);
    }
    if extent.width <= max_w {
        return FittedText { font: current, text: text.to_string(), extent };
    }

    let mut chars: Vec<char> = text.chars().collect();
    while chars.pop().is_some() {
        let head: String = chars.iter().collect();
        let candidate = format!("{}{}", head.trim_end(), ELLIPSIS);
        let candidate_extent = measure_text(&current, &candidate);
        if candidate_extent.width <= max_w {
            return FittedText { font: current, text: candidate, extent: candidate_extent };
        }
    }
    let extent = measure_text(&current, ELLIPSIS);
    FittedText { font: current, text: ELLIPSIS.to_string(), extent }
}

/// Where the measured box of `text` goes to sit centered in `cell`.
pub fn place_text(cell: &Rect, extent: &TextExtent) -> Rect {
    let (x, y) = cell.center(extent.width, extent.height);
    Rect::new(x, y, extent.width, extent.height)
}
