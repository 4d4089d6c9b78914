//! Output Namer/Writer
//!
//! `<root>/barcodes/<collection>/<product-name>/<sku>.<ext>`. Directories are
//! created on demand; existing files with the same name are overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LabelError, LabelResult};
use crate::export::{encode, ExportFormat};
use crate::hashing::sha256_hex;
use crate::print::PrintSpec;

pub const BARCODES_DIR: &str = "barcodes";

/// Why `value` cannot be used as a single path component, if it can't.
pub fn path_component_problem(value: &str) -> Option<&'static str> {
    if value.trim().is_empty() {
        Some("is empty")
    } else if value == "." || value == ".." {
        Some("is a relative path marker")
    } else if value.contains(['/', '\\', '\0']) {
        Some("contains a path separator")
    } else {
        None
    }
}

fn check_component(kind: &str, value: &str) -> LabelResult<()> {
    match path_component_problem(value) {
        Some(problem) => Err(LabelError::InvalidInput(format!("{} {:?} {}", kind, value, problem))),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub bytes: usize,
    pub sha256: String,
}

pub struct LabelWriter {
    root: PathBuf,
    formats: Vec<ExportFormat>,
    print: PrintSpec,
}

impl LabelWriter {
    pub fn new(root: impl Into<PathBuf>, formats: Vec<ExportFormat>, print: PrintSpec) -> Self {
        Self {
            root: root.into(),
            formats,
            print,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_dir(&self, collection: &str) -> PathBuf {
        self.root.join(BARCODES_DIR).join(collection)
    }

    pub fn label_dir(&self, collection: &str, product_name: &str) -> PathBuf {
        self.collection_dir(collection).join(product_name)
    }

    pub fn label_path(&self, collection: &str, product_name: &str, sku: &str, format: ExportFormat) -> PathBuf {
        self.label_dir(collection, product_name)
            .join(format!("{}.{}", sku, format.extension()))
    }

    /// Encode and write `raster` in every configured format.
    ///
    /// Collection, product name and SKU must each be a plain path component;
    /// anything else is refused before a directory is created.
    pub fn write_label(
        &self,
        collection: &str,
        product_name: &str,
        sku: &str,
        raster: &RgbImage,
    ) -> LabelResult<Vec<WrittenFile>> {
        check_component("collection", collection)?;
        check_component("product name", product_name)?;
        check_component("SKU", sku)?;

        let dir = self.label_dir(collection, product_name);
        fs::create_dir_all(&dir)?;

        let mut written = Vec::with_capacity(self.formats.len());
        for &format in &self.formats {
            let data = encode(raster, format, &self.print, sku)?;
            let path = self.label_path(collection, product_name, sku, format);
            fs::write(&path, &data)?;
            debug!(path = %path.display(), bytes = data.len(), "label written");
            written.push(WrittenFile {
                path,
                format,
                bytes: data.len(),
                sha256: sha256_hex(&data),
            });
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_paths_follow_layout() {
        let writer = LabelWriter::new("/out", vec![ExportFormat::Png], PrintSpec::default());
        assert_eq!(
            writer.label_path("SS25", "TEE", "TS01-B-M", ExportFormat::Png),
            PathBuf::from("/out/barcodes/SS25/TEE/TS01-B-M.png")
        );
        assert_eq!(
            writer.label_path("SS25", "TEE", "TS01-B-M", ExportFormat::Pdf),
            PathBuf::from("/out/barcodes/SS25/TEE/TS01-B-M.pdf")
        );
    }

    #[test]
    fn test_write_creates_dirs_and_both_formats() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = LabelWriter::new(tmp.path(), vec![ExportFormat::Png, ExportFormat::Pdf], PrintSpec::default());
        let raster = RgbImage::from_pixel(60, 30, Rgb([255, 255, 255]));
        let files = writer.write_label("SS25", "TEE", "TS01-B-M", &raster).unwrap();
        assert_eq!(files.len(), 2);
        for f in &files {
            assert!(f.path.exists());
            assert_eq!(fs::metadata(&f.path).unwrap().len() as usize, f.bytes);
            assert_eq!(f.sha256.len(), 64);
        }
    }

    #[test]
    fn test_components_with_separators_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = LabelWriter::new(tmp.path(), vec![ExportFormat::Png], PrintSpec::default());
        let raster = RgbImage::from_pixel(60, 30, Rgb([255, 255, 255]));

        for (collection, product, sku) in [
            ("SS25", "TEE", "TS01-B-S/M"),
            ("SS25", "TEE", "../../../escaped-B-M"),
            ("SS25", "..", "TS01-B-M"),
            ("a\\b", "TEE", "TS01-B-M"),
        ] {
            let err = writer.write_label(collection, product, sku, &raster).unwrap_err();
            assert!(matches!(err, LabelError::InvalidInput(_)), "{collection}/{product}/{sku}");
        }
        assert!(fs::read_dir(tmp.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_path_component_problems() {
        assert_eq!(path_component_problem("TS01-B-M"), None);
        assert_eq!(path_component_problem("S/M"), Some("contains a path separator"));
        assert_eq!(path_component_problem(".."), Some("is a relative path marker"));
        assert_eq!(path_component_problem("  "), Some("is empty"));
    }

    #[test]
    fn test_rewrite_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = LabelWriter::new(tmp.path(), vec![ExportFormat::Png], PrintSpec::default());
        let first = RgbImage::from_pixel(60, 30, Rgb([255, 255, 255]));
        let second = RgbImage::from_pixel(60, 30, Rgb([0, 0, 0]));
        writer.write_label("SS25", "TEE", "TS01-B-M", &first).unwrap();
        let files = writer.write_label("SS25", "TEE", "TS01-B-M", &second).unwrap();

        let on_disk = fs::read(&files[0].path).unwrap();
        assert_eq!(on_disk, encode(&second, ExportFormat::Png, &PrintSpec::default(), "TS01-B-M").unwrap());
    }
}
