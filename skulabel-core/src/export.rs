//! Export encoders
//!
//! PNG carries the print resolution in `pHYs`; PDF gets a single page
//! sized so the raster prints at that same resolution.

use std::io::Write;

use chrono::Utc;
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::LabelResult;
use crate::print::{ColorSpace, PrintSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
        }
    }
}

pub fn default_formats() -> Vec<ExportFormat> {
    vec![ExportFormat::Png, ExportFormat::Pdf]
}

/// Pixel bytes in the requested colour space plus channel count
fn pixel_data(img: &RgbImage, color_space: ColorSpace) -> (Vec<u8>, usize) {
    match color_space {
        ColorSpace::Rgb => (img.as_raw().clone(), 3),
        ColorSpace::Grayscale => {
            let gray = image::DynamicImage::ImageRgb8(img.clone()).to_luma8();
            (gray.into_raw(), 1)
        }
    }
}

pub fn encode_png(img: &RgbImage, print: &PrintSpec) -> LabelResult<Vec<u8>> {
    let (data, channels) = pixel_data(img, print.color_space);
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, img.width(), img.height());
        encoder.set_color(if channels == 1 { png::ColorType::Grayscale } else { png::ColorType::Rgb });
        encoder.set_depth(png::BitDepth::Eight);
        let ppm = print.pixels_per_meter();
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: png::Unit::Meter,
        }));
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&data)?;
        writer.finish()?;
    }
    Ok(out)
}

/// Single-page PDF embedding the raster as an uncompressed image XObject.
pub fn encode_pdf(img: &RgbImage, print: &PrintSpec, title: &str) -> LabelResult<Vec<u8>> {
    let (data, channels) = pixel_data(img, print.color_space);
    let page_w = print.px_to_points(img.width());
    let page_h = print.px_to_points(img.height());
    let device = if channels == 1 { "/DeviceGray" } else { "/DeviceRGB" };
    let content = format!("q\n{:.4} 0 0 {:.4} 0 0 cm\n/Im0 Do\nQ\n", page_w, page_h);
    let created = Utc::now().format("D:%Y%m%d%H%M%SZ");

    let mut out: Vec<u8> = Vec::new();
    let mut offsets = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    offsets.push(out.len());
    out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    offsets.push(out.len());
    out.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");

    offsets.push(out.len());
    write!(
        out,
        "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.4} {:.4}] \
         /Resources << /XObject << /Im0 5 0 R >> >> /Contents 4 0 R >>\nendobj\n",
        page_w, page_h
    )?;

    offsets.push(out.len());
    write!(out, "4 0 obj\n<< /Length {} >>\nstream\n{}endstream\nendobj\n", content.len(), content)?;

    offsets.push(out.len());
    write!(
        out,
        "5 0 obj\n<< /Type /XObject /Subtype /Image /Width {} /Height {} \
         /ColorSpace {} /BitsPerComponent 8 /Length {} >>\nstream\n",
        img.width(),
        img.height(),
        device,
        data.len()
    )?;
    out.extend_from_slice(&data);
    out.extend_from_slice(b"\nendstream\nendobj\n");

    offsets.push(out.len());
    write!(
        out,
        "6 0 obj\n<< /Title ({}) /Producer (skulabel-core {}) /CreationDate ({}) >>\nendobj\n",
        escape_pdf_string(title),
        crate::ENGINE_VERSION,
        created
    )?;

    let xref = out.len();
    write!(out, "xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1)?;
    for offset in &offsets {
        write!(out, "{:010} 00000 n \n", offset)?;
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R /Info 6 0 R >>\nstartxref\n{}\n%%EOF\n",
        offsets.len() + 1,
        xref
    )?;
    Ok(out)
}

fn escape_pdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

pub fn encode(img: &RgbImage, format: ExportFormat, print: &PrintSpec, title: &str) -> LabelResult<Vec<u8>> {
    match format {
        ExportFormat::Png => encode_png(img, print),
        ExportFormat::Pdf => encode_pdf(img, print, title),
    }
}
