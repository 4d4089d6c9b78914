//! SKU Label CLI - Bridge interface for the label form
//!
//! Commands: generate, variants, identifiers, render, check
//! Outputs JSON to stdout, logs to stderr
//! Exit 1 on failure, 2 when `generate` skipped labels or `check` got an invalid code

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use skulabel_core::{
    catalog::CollectionRequest,
    ean::{generate_identifiers, Ean13},
    export::encode_png,
    sha256_hex, ColorSpace, FailurePolicy, GenerationReport, GeneratorConfig, LabelError, LabelJob, LabelPipeline,
    LabelResult, PrintSpec, Product, Variant,
};

#[derive(Parser)]
#[command(name = "skulabel-cli")]
#[command(about = "SKU Label CLI - EAN-13 garment labels")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a generator config (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the output root directory
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Override print resolution (72-1200)
    #[arg(long)]
    dpi: Option<u32>,

    /// Seed identifier generation for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Keep going when a single label fails
    #[arg(long)]
    skip_failures: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and write labels for a whole collection
    Generate {
        /// JSON payload (CollectionRequest)
        #[arg(short, long)]
        payload: String,
    },

    /// List the variants a payload expands into
    Variants {
        /// JSON payload (CollectionRequest)
        #[arg(short, long)]
        payload: String,
    },

    /// Generate unique EAN-13 identifiers
    Identifiers {
        #[arg(short, long)]
        count: usize,

        /// 6 digit prefix, defaults to the configured one
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Render one label and return it as base64 PNG
    Render {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        size: String,
        #[arg(long)]
        color_code: String,
        #[arg(long)]
        color_name: String,
        /// Use this identifier instead of a generated one
        #[arg(long)]
        identifier: Option<String>,
    },

    /// Validate a 13 digit code or complete a 12 digit base
    Check {
        digits: String,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skulabel_core=info".into()),
        )
        .init();
}

fn load_config(cli: &Cli) -> Result<GeneratorConfig, String> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::load_from_file(path)
            .map_err(|e| format!("Failed to load config: {}", e))?,
        None => GeneratorConfig::default(),
    };
    if let Some(root) = &cli.output_root {
        config.output_root = root.clone();
    }
    if let Some(dpi) = cli.dpi {
        let color_space: ColorSpace = config.print.color_space;
        config.print = PrintSpec::from_user(dpi, color_space)?;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.skip_failures {
        config.failure_policy = FailurePolicy::Skip;
    }
    Ok(config)
}

fn fail(message: impl std::fmt::Display) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "error": message.to_string(),
    });
    println!("{}", output);
    ExitCode::FAILURE
}

fn print_json(value: &serde_json::Value) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// 0 when every label was written, 2 when some were skipped, 1 on error
fn generate_status(result: &LabelResult<GenerationReport>) -> u8 {
    match result {
        Ok(report) if report.failures.is_empty() => 0,
        Ok(_) => 2,
        Err(_) => 1,
    }
}

fn parse_request(payload: &str) -> Result<CollectionRequest, String> {
    serde_json::from_str(payload).map_err(|e| format!("Invalid payload: {}", e))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    match &cli.command {
        Commands::Generate { payload } => {
            let request = match parse_request(payload) {
                Ok(r) => r,
                Err(e) => return fail(e),
            };
            let pipeline = match LabelPipeline::new(config) {
                Ok(p) => p,
                Err(e) => return fail(e),
            };
            let result = pipeline.generate_collection(&request);
            let status = generate_status(&result);
            match result {
                Ok(report) => {
                    let code = print_json(&serde_json::json!({
                        "success": status == 0,
                        "report": report,
                    }));
                    if status == 0 { code } else { ExitCode::from(status) }
                }
                Err(e) => fail(e),
            }
        }

        Commands::Variants { payload } => {
            let request = match parse_request(payload) {
                Ok(r) => r,
                Err(e) => return fail(e),
            };
            let variants: Vec<_> = request
                .variants()
                .into_iter()
                .map(|v| serde_json::json!({ "sku": v.sku(), "variant": v }))
                .collect();
            print_json(&serde_json::json!({ "success": true, "variants": variants }))
        }

        Commands::Identifiers { count, prefix } => {
            let prefix = prefix.as_deref().unwrap_or(&config.prefix);
            match generate_identifiers(prefix, *count) {
                Ok(ids) => print_json(&serde_json::json!({ "success": true, "identifiers": ids })),
                Err(e) => fail(e),
            }
        }

        Commands::Render { code, name, size, color_code, color_name, identifier } => {
            let product = Product::new(name, code);
            let variant = Variant {
                product_code: product.code,
                product_name: product.name,
                size: size.clone(),
                color_code: color_code.clone(),
                color_name: color_name.clone(),
            };
            let identifier = match identifier {
                Some(digits) => Ean13::parse(digits),
                None => generate_identifiers(&config.prefix, 1)
                    .and_then(|mut ids| ids.pop().ok_or_else(|| {
                        LabelError::InvalidInput("no identifier generated".into())
                    })),
            };
            let identifier = match identifier {
                Ok(i) => i,
                Err(e) => return fail(e),
            };
            let print = config.print.clone();
            let pipeline = match LabelPipeline::new(config) {
                Ok(p) => p,
                Err(e) => return fail(e),
            };
            let job = LabelJob { variant, identifier };
            let png = match pipeline.render_label(&job).and_then(|img| encode_png(&img, &print)) {
                Ok(bytes) => bytes,
                Err(e) => return fail(e),
            };
            print_json(&serde_json::json!({
                "success": true,
                "sku": job.sku(),
                "identifier": job.identifier,
                "format": "png",
                "hash": sha256_hex(&png),
                "data_base64": base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &png),
            }))
        }

        Commands::Check { digits } => {
            let digits = digits.trim();
            if digits.len() == 12 {
                match Ean13::from_base(digits) {
                    Ok(ean) => print_json(&serde_json::json!({
                        "success": true,
                        "valid": true,
                        "check_digit": ean.digits()[12],
                        "ean13": ean,
                    })),
                    Err(e) => fail(e),
                }
            } else {
                match Ean13::parse(digits) {
                    Ok(ean) => print_json(&serde_json::json!({ "success": true, "valid": true, "ean13": ean })),
                    Err(e) => {
                        println!("{}", serde_json::json!({ "success": true, "valid": false, "error": e.to_string() }));
                        ExitCode::from(2)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skulabel_core::pipeline::LabelFailure;
    use skulabel_core::ValidationResult;

    fn report(failures: Vec<LabelFailure>) -> GenerationReport {
        GenerationReport {
            run_id: "run".into(),
            collection: "SS25".into(),
            engine_version: skulabel_core::ENGINE_VERSION.into(),
            created_at: chrono::Utc::now(),
            request_hash: String::new(),
            validation: ValidationResult { valid: true, violations: vec![] },
            labels: vec![],
            failures,
        }
    }

    #[test]
    fn test_generate_status_codes() {
        assert_eq!(generate_status(&Ok(report(vec![]))), 0);

        let skipped = LabelFailure {
            sku: "TS01-B-M".into(),
            identifier: Ean13::parse("7030180000005").unwrap(),
            error: "barcode failed".into(),
        };
        assert_eq!(generate_status(&Ok(report(vec![skipped]))), 2);

        let err = LabelError::InvalidInput("selection: No sizes enabled".into());
        assert_eq!(generate_status(&Err(err)), 1);
    }
}
