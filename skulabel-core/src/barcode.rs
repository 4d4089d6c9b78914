//! Barcode rasterization
//!
//! The compositor only depends on [`BarcodeRasterizer`]. [`Ean13Rasterizer`]
//! is the built-in implementation: 95 modules, guard bars extended below
//! the data bars, optional human-readable digits.

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::ean::Ean13;
use crate::error::{LabelError, LabelResult};
use crate::font::FontHandle;
use crate::layout::fit_text;
use crate::print::PrintSpec;
use crate::raster::{draw_text, fill_rect, measure_text};

/// Turns a 13-digit identifier into a barcode raster.
///
/// Implementations must reject digits that are not a valid EAN-13.
pub trait BarcodeRasterizer {
    fn symbology(&self) -> &'static str;
    fn rasterize(&self, digits: &str) -> LabelResult<RgbImage>;

    /// Raster meant to be placed in a `max_width`×`max_height` region.
    ///
    /// The compositor still fits the result to the region, so implementations
    /// that cannot do better may return their natural size.
    fn rasterize_within(&self, digits: &str, max_width: u32, max_height: u32) -> LabelResult<RgbImage> {
        let _ = (max_width, max_height);
        self.rasterize(digits)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeOptions {
    pub module_width_mm: f64,
    pub bar_height_mm: f64,
    pub quiet_zone_mm: f64,
    /// Gap between bars and digits
    pub text_distance_mm: f64,
    pub font_px: f32,
    pub human_readable: bool,
}

impl Default for BarcodeOptions {
    fn default() -> Self {
        Self {
            module_width_mm: 0.2,
            bar_height_mm: 15.0,
            quiet_zone_mm: 6.5,
            text_distance_mm: 1.5,
            font_px: 40.0,
            human_readable: true,
        }
    }
}

const MODULES: usize = 95;

const L_CODES: [&str; 10] = [
    "0001101", "0011001", "0010011", "0111101", "0100011",
    "0110001", "0101111", "0111011", "0110111", "0001011",
];
const G_CODES: [&str; 10] = [
    "0100111", "0110011", "0011011", "0100001", "0011101",
    "0111001", "0000101", "0010001", "0001001", "0010111",
];
const R_CODES: [&str; 10] = [
    "1110010", "1100110", "1101100", "1000010", "1011100",
    "1001110", "1010000", "1000100", "1001000", "1110100",
];
/// L/G choice for the left half, keyed by the first digit
const PARITY: [&str; 10] = [
    "LLLLLL", "LLGLGG", "LLGGLG", "LLGGGL", "LGLLGG",
    "LGGLLG", "LGGGLL", "LGLGLG", "LGLGGL", "LGGLGL",
];

/// One module of the symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Module {
    pub dark: bool,
    /// Start, centre and end guards
    pub guard: bool,
}

/// Encode a validated identifier into its 95 modules.
pub fn encode_modules(ean: &Ean13) -> Vec<Module> {
    let digits = ean.digits();
    let mut modules = Vec::with_capacity(MODULES);
    let mut push = |pattern: &str, guard: bool| {
        for c in pattern.chars() {
            modules.push(Module { dark: c == '1', guard });
        }
    };

    push("101", true);
    let parity = PARITY[digits[0] as usize].as_bytes();
    for (i, &d) in digits[1..7].iter().enumerate() {
        let table = if parity[i] == b'L' { &L_CODES } else { &G_CODES };
        push(table[d as usize], false);
    }
    push("01010", true);
    for &d in &digits[7..13] {
        push(R_CODES[d as usize], false);
    }
    push("101", true);
    modules
}

pub struct Ean13Rasterizer {
    options: BarcodeOptions,
    print: PrintSpec,
    font: Option<FontHandle>,
}

/// Pixel sizes of one rendered symbol
#[derive(Debug, Clone, Copy)]
struct SymbolMetrics {
    module: u32,
    quiet: u32,
    bar_height: u32,
    text_gap: u32,
}

impl SymbolMetrics {
    fn margin(&self) -> u32 {
        self.module * 4
    }
}

impl Ean13Rasterizer {
    pub fn new(options: BarcodeOptions, print: PrintSpec) -> Self {
        Self { options, print, font: None }
    }

    /// Digits are only drawn when a font is attached and `human_readable` is set.
    pub fn with_font(mut self, font: FontHandle) -> Self {
        self.font = Some(font.with_px(self.options.font_px));
        self
    }

    fn parse(digits: &str) -> LabelResult<Ean13> {
        Ean13::parse(digits).map_err(|e| LabelError::Barcode(e.to_string()))
    }

    /// Quiet zone and text gap expressed in whole modules
    fn quiet_modules(&self) -> u32 {
        (self.options.quiet_zone_mm / self.options.module_width_mm).round() as u32
    }

    fn gap_modules(&self) -> u32 {
        (self.options.text_distance_mm / self.options.module_width_mm).round() as u32
    }

    /// Digit font sized so a six digit group spans its 42 modules
    fn digits_font(&self, module: u32) -> Option<FontHandle> {
        self.font
            .as_ref()
            .filter(|_| self.options.human_readable)
            .map(|f| fit_text(f, "888888", module * 40, u32::MAX, 6.0).font)
    }

    /// Guard extension and total height below the data bars
    fn below_bars(font: Option<&FontHandle>, module: u32, text_gap: u32) -> (u32, u32) {
        match font {
            Some(f) => {
                let text_h = measure_text(f, "0123456789").height;
                (text_gap + text_h / 2, text_gap + text_h)
            }
            None => (module * 5, module * 5),
        }
    }

    /// Symbol at print scale: module width and bar height from the options.
    fn print_metrics(&self) -> SymbolMetrics {
        SymbolMetrics {
            module: self.print.mm_to_px(self.options.module_width_mm).max(1),
            quiet: self.print.mm_to_px(self.options.quiet_zone_mm),
            bar_height: self.print.mm_to_px(self.options.bar_height_mm).max(1),
            text_gap: self.print.mm_to_px(self.options.text_distance_mm),
        }
    }

    /// Largest whole-pixel module that fits `max_width`, with bars filling
    /// the remaining height. `None` when the region is too small for that.
    fn region_metrics(&self, max_width: u32, max_height: u32) -> Option<SymbolMetrics> {
        let quiet_modules = self.quiet_modules();
        let module = max_width / (MODULES as u32 + 2 * quiet_modules);
        if module == 0 {
            return None;
        }
        let text_gap = self.gap_modules() * module;
        let font = self.digits_font(module);
        let (_, below) = Self::below_bars(font.as_ref(), module, text_gap);
        let overhead = module * 8 + below;
        if max_height < overhead + module * 10 {
            return None;
        }
        Some(SymbolMetrics {
            module,
            quiet: quiet_modules * module,
            bar_height: max_height - overhead,
            text_gap,
        })
    }

    fn draw(&self, ean: &Ean13, m: SymbolMetrics) -> RgbImage {
        let modules = encode_modules(ean);
        let module = m.module;
        let margin = m.margin();
        let text_font = self.digits_font(module);
        let text_font = text_font.as_ref();
        let (guard_ext, below) = Self::below_bars(text_font, module, m.text_gap);

        let width = m.quiet * 2 + module * MODULES as u32;
        let height = margin + m.bar_height + below + margin;
        let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
        let black = Rgb([0, 0, 0]);

        for (i, md) in modules.iter().enumerate() {
            if !md.dark {
                continue;
            }
            let x = (m.quiet + module * i as u32) as i32;
            let h = if md.guard { m.bar_height + guard_ext } else { m.bar_height };
            fill_rect(&mut img, x, margin as i32, module, h, black);
        }

        if let Some(font) = text_font {
            let s = ean.as_str();
            let y = (margin + m.bar_height + m.text_gap) as i32;
            let groups = [
                (&s[0..1], 0, m.quiet),
                (&s[1..7], m.quiet + module * 3, module * 42),
                (&s[7..13], m.quiet + module * 50, module * 42),
            ];
            for (text, left, span) in groups {
                let extent = measure_text(font, text);
                let x = left as i32 + (span as i32 - extent.width as i32) / 2;
                draw_text(&mut img, font, x, y, text, black);
            }
        }

        img
    }
}

impl BarcodeRasterizer for Ean13Rasterizer {
    fn symbology(&self) -> &'static str {
        "EAN13"
    }

    fn rasterize(&self, digits: &str) -> LabelResult<RgbImage> {
        let ean = Self::parse(digits)?;
        Ok(self.draw(&ean, self.print_metrics()))
    }

    /// Picks a whole-pixel module width for the region so every bar keeps
    /// its exact width; no resampling is needed afterwards.
    fn rasterize_within(&self, digits: &str, max_width: u32, max_height: u32) -> LabelResult<RgbImage> {
        let ean = Self::parse(digits)?;
        let metrics = self
            .region_metrics(max_width, max_height)
            .unwrap_or_else(|| self.print_metrics());
        Ok(self.draw(&ean, metrics))
    }
}
