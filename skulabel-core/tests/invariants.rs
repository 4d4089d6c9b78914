//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees.

use std::collections::HashSet;
use std::fs;

use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;

use skulabel_core::{
    barcode::BarcodeRasterizer,
    catalog::{enumerate_variants, CollectionRequest, ColorSelection, Product, SizeSelection},
    compose::LabelCompositor,
    ean::{check_digit, Ean13, IdentifierGenerator},
    export::ExportFormat,
    font::{FontConfig, LabelFonts},
    layout::{fit_within, LabelGeometry},
    output::LabelWriter,
    FailurePolicy, GeneratorConfig, LabelError, LabelPipeline, LabelResult, PrintSpec,
};

fn config_in(root: &std::path::Path) -> GeneratorConfig {
    GeneratorConfig {
        output_root: root.to_path_buf(),
        seed: Some(2024),
        ..GeneratorConfig::default()
    }
}

fn tee_request(sizes: Vec<SizeSelection>, colors: Vec<ColorSelection>) -> CollectionRequest {
    CollectionRequest {
        collection: "SS25".to_string(),
        products: vec![Product::new("TEE", "TS01")],
        sizes,
        colors,
    }
}

#[test]
fn invariant_identifiers_unique_and_valid() {
    let mut gen = IdentifierGenerator::new("703018", 10_000, StdRng::seed_from_u64(99)).unwrap();
    let codes = gen.generate(10_000).unwrap();

    assert_eq!(codes.len(), 10_000);
    let unique: HashSet<_> = codes.iter().map(Ean13::as_str).collect();
    assert_eq!(unique.len(), 10_000);

    for code in &codes {
        let s = code.as_str();
        assert_eq!(s.len(), 13);
        assert!(s.starts_with("703018"));
        let expected = check_digit(&s[..12]).unwrap();
        assert_eq!(s.as_bytes()[12] - b'0', expected);
    }
}

#[test]
fn invariant_variant_count_is_product_of_selections() {
    let products = vec![Product::new("tee", "TS01"), Product::new("polo", "PL02")];
    let size_masks = [[true, false, true, false, true, false], [true; 6], [false; 6]];
    let color_masks = [[true, false, false, false, false], [true, true, true, false, true], [false; 5]];

    for sizes_on in &size_masks {
        for colors_on in &color_masks {
            let sizes: Vec<_> = SizeSelection::standard()
                .into_iter()
                .zip(sizes_on)
                .map(|(s, &on)| SizeSelection { include: on, ..s })
                .collect();
            let colors: Vec<_> = ColorSelection::standard()
                .into_iter()
                .zip(colors_on)
                .map(|(c, &on)| ColorSelection { include: on, ..c })
                .collect();

            let variants = enumerate_variants(&products, &sizes, &colors);
            let n_sizes = sizes_on.iter().filter(|&&b| b).count();
            let n_colors = colors_on.iter().filter(|&&b| b).count();
            assert_eq!(variants.len(), products.len() * n_sizes * n_colors);

            for v in &variants {
                assert!(sizes.iter().any(|s| s.include && s.label == v.size));
                assert!(colors.iter().any(|c| c.include && c.code == v.color_code));
            }
        }
    }
}

#[test]
fn invariant_scaled_barcode_fits_region_maximally() {
    let region = LabelGeometry::default().barcode_region().inset(10);
    let avail = (region.width, region.height);
    for w in (50..=1200).step_by(97) {
        for h in (20..=600).step_by(61) {
            let (sw, sh) = fit_within((w, h), avail);
            assert!(sw <= avail.0 && sh <= avail.1);
            assert!(sw == avail.0 || sh == avail.1, "{w}x{h} -> {sw}x{sh}");
        }
    }
}

#[test]
fn invariant_writer_overwrites() {
    let tmp = tempfile::tempdir().unwrap();
    let writer = LabelWriter::new(tmp.path(), vec![ExportFormat::Png], PrintSpec::default());
    let raster = RgbImage::from_pixel(600, 300, Rgb([255, 255, 255]));

    let first = writer.write_label("SS25", "TEE", "TS01-B-M", &raster).unwrap();
    let second = writer.write_label("SS25", "TEE", "TS01-B-M", &raster).unwrap();
    assert_eq!(first[0].path, second[0].path);
    assert_eq!(fs::read(&second[0].path).unwrap().len(), second[0].bytes);
    assert_eq!(first[0].sha256, second[0].sha256);
}

#[test]
fn scenario_two_sizes_one_color() {
    let tmp = tempfile::tempdir().unwrap();
    let request = tee_request(
        vec![SizeSelection::new("M", true), SizeSelection::new("L", true)],
        vec![ColorSelection::new("Black", "B", true)],
    );

    let variants = request.variants();
    let tuples: Vec<_> = variants
        .iter()
        .map(|v| {
            (
                v.product_code.as_str(),
                v.product_name.as_str(),
                v.size.as_str(),
                v.color_code.as_str(),
                v.color_name.as_str(),
            )
        })
        .collect();
    assert_eq!(
        tuples,
        vec![("TS01", "TEE", "M", "B", "Black"), ("TS01", "TEE", "L", "B", "Black")]
    );

    let pipeline = LabelPipeline::new(config_in(tmp.path())).unwrap();
    let report = pipeline.generate_collection(&request).unwrap();

    assert_eq!(report.labels.len(), 2);
    assert_ne!(report.labels[0].identifier, report.labels[1].identifier);
    for label in &report.labels {
        assert!(label.identifier.as_str().starts_with("703018"));
    }

    let dir = tmp.path().join("barcodes").join("SS25").join("TEE");
    for sku in ["TS01-B-M", "TS01-B-L"] {
        let png = dir.join(format!("{sku}.png"));
        let pdf = dir.join(format!("{sku}.pdf"));
        assert!(png.exists(), "{}", png.display());
        assert!(pdf.exists(), "{}", pdf.display());

        let img = image::open(&png).unwrap();
        assert_eq!((img.width(), img.height()), (600, 300));
    }
    assert_eq!(report.written_paths().len(), 4);
}

#[test]
fn scenario_nothing_enabled() {
    let tmp = tempfile::tempdir().unwrap();
    let off_sizes: Vec<_> = SizeSelection::standard()
        .into_iter()
        .map(|s| SizeSelection { include: false, ..s })
        .collect();
    let off_colors: Vec<_> = ColorSelection::standard()
        .into_iter()
        .map(|c| ColorSelection { include: false, ..c })
        .collect();
    let request = tee_request(off_sizes, off_colors);

    assert!(request.variants().is_empty());

    let pipeline = LabelPipeline::new(config_in(tmp.path())).unwrap();
    let err = pipeline.generate_collection(&request).unwrap_err();
    assert!(matches!(err, LabelError::InvalidInput(_)));
    assert!(fs::read_dir(tmp.path()).unwrap().next().is_none());
}

#[test]
fn scenario_convenience_entry_returns_written_paths() {
    let tmp = tempfile::tempdir().unwrap();
    let request = tee_request(
        vec![SizeSelection::new("M", true), SizeSelection::new("L", true)],
        vec![ColorSelection::new("Black", "B", true)],
    );

    let paths = skulabel_core::generate_collection(config_in(tmp.path()), &request).unwrap();

    let dir = tmp.path().join("barcodes").join("SS25").join("TEE");
    assert_eq!(
        paths,
        vec![
            dir.join("TS01-B-M.png"),
            dir.join("TS01-B-M.pdf"),
            dir.join("TS01-B-L.png"),
            dir.join("TS01-B-L.pdf"),
        ]
    );
    for path in &paths {
        assert!(path.exists(), "{}", path.display());
    }
}

#[test]
fn scenario_size_with_slash_rejected_before_writing() {
    let tmp = tempfile::tempdir().unwrap();
    let request = tee_request(
        vec![SizeSelection::new("M", true), SizeSelection::new("S/M", true)],
        vec![ColorSelection::new("Black", "B", true)],
    );

    let pipeline = LabelPipeline::new(config_in(tmp.path())).unwrap();
    assert!(!pipeline.validate_request(&request).valid);
    let err = pipeline.generate_collection(&request).unwrap_err();
    assert!(matches!(err, LabelError::InvalidInput(_)));
    assert!(fs::read_dir(tmp.path()).unwrap().next().is_none());
}

#[test]
fn scenario_product_code_cannot_escape_output_root() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("out");
    fs::create_dir(&root).unwrap();
    let request = CollectionRequest {
        collection: "SS25".to_string(),
        products: vec![Product::new("TEE", "../../../escaped")],
        sizes: vec![SizeSelection::new("M", true)],
        colors: vec![ColorSelection::new("Black", "B", true)],
    };

    let err = skulabel_core::generate_collection(config_in(&root), &request).unwrap_err();
    assert!(matches!(err, LabelError::InvalidInput(_)));
    assert!(fs::read_dir(&root).unwrap().next().is_none());
    assert!(!tmp.path().join("escaped-B-M.png").exists());
}

/// Rejects identifiers whose body is odd, for exercising batch failure policy
struct PickyRasterizer;

impl BarcodeRasterizer for PickyRasterizer {
    fn symbology(&self) -> &'static str {
        "EAN13"
    }

    fn rasterize(&self, digits: &str) -> LabelResult<RgbImage> {
        let ean = Ean13::parse(digits)?;
        if ean.digits()[11] % 2 == 1 {
            return Err(LabelError::Barcode(format!("rejected {digits}")));
        }
        Ok(RgbImage::from_pixel(95, 60, Rgb([0, 0, 0])))
    }
}

fn picky_pipeline(config: GeneratorConfig) -> LabelPipeline {
    let fonts = LabelFonts::resolve(&FontConfig::default()).unwrap();
    let compositor = LabelCompositor::new(config.geometry.clone(), fonts, Box::new(PickyRasterizer)).unwrap();
    LabelPipeline::with_compositor(config, compositor)
}

#[test]
fn policy_skip_records_failures_and_continues() {
    let tmp = tempfile::tempdir().unwrap();
    let config = GeneratorConfig {
        failure_policy: FailurePolicy::Skip,
        formats: vec![ExportFormat::Png],
        ..config_in(tmp.path())
    };
    let request = tee_request(SizeSelection::standard(), ColorSelection::standard());
    let pipeline = picky_pipeline(config);

    let jobs = pipeline.plan(&request).unwrap();
    let expected_failures = jobs.iter().filter(|j| j.identifier.digits()[11] % 2 == 1).count();

    let report = pipeline.generate_collection(&request).unwrap();
    assert_eq!(report.failures.len(), expected_failures);
    assert_eq!(report.labels.len() + report.failures.len(), 6);
    for failure in &report.failures {
        assert!(failure.error.contains("rejected"));
    }
}

#[test]
fn policy_abort_stops_on_first_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let request = tee_request(SizeSelection::standard(), ColorSelection::standard());
    let pipeline = picky_pipeline(config_in(tmp.path()));

    let jobs = pipeline.plan(&request).unwrap();
    let result = pipeline.generate_collection(&request);
    if jobs.iter().any(|j| j.identifier.digits()[11] % 2 == 1) {
        assert!(matches!(result, Err(LabelError::Barcode(_))));
    } else {
        assert_eq!(result.unwrap().labels.len(), 6);
    }
}

#[cfg(feature = "test-hooks")]
#[test]
fn invariant_generate_always_validates() {
    use skulabel_core::pipeline::{get_validation_call_count, reset_validation_call_count};

    let tmp = tempfile::tempdir().unwrap();
    let pipeline = LabelPipeline::new(config_in(tmp.path())).unwrap();
    reset_validation_call_count();
    let request = tee_request(vec![SizeSelection::new("M", true)], ColorSelection::standard());
    pipeline.generate_collection(&request).unwrap();
    assert!(get_validation_call_count() >= 1);
}
