//! Validation System - Rule/Policy Separation
//!
//! Rules produce structured violations against a collection request.
//! Errors block generation before anything touches the filesystem;
//! warnings are reported and logged.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::CollectionRequest;
use crate::config::GeneratorConfig;
use crate::ean::{validate_prefix, BODY_SPACE};
use crate::output::path_component_problem;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub remediation: Vec<String>,
}

impl ValidationViolation {
    fn error(rule: &str, message: impl Into<String>, remediation: &str) -> Self {
        Self {
            rule: rule.to_string(),
            severity: ViolationSeverity::Error,
            message: message.into(),
            remediation: vec![remediation.to_string()],
        }
    }

    fn warning(rule: &str, message: impl Into<String>, remediation: &str) -> Self {
        Self {
            severity: ViolationSeverity::Warning,
            ..Self::error(rule, message, remediation)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations.iter().filter(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations.iter().filter(|v| v.severity == ViolationSeverity::Warning)
    }

    /// `rule: message` pairs of every blocking violation
    pub fn error_summary(&self) -> String {
        self.errors()
            .map(|v| format!("{}: {}", v.rule, v.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, request: &CollectionRequest, config: &GeneratorConfig) -> Vec<ValidationViolation>;
}

// --- Concrete Rules ---

pub struct CollectionNameRule;

impl ValidationRule for CollectionNameRule {
    fn name(&self) -> &'static str { "collection_name" }

    fn validate(&self, request: &CollectionRequest, _config: &GeneratorConfig) -> Vec<ValidationViolation> {
        match path_component_problem(&request.collection) {
            Some(problem) => vec![ValidationViolation::error(
                self.name(),
                format!("Collection name {:?} {}", request.collection, problem),
                "Enter a collection name without slashes",
            )],
            None => vec![],
        }
    }
}

pub struct ProductsRule;

impl ValidationRule for ProductsRule {
    fn name(&self) -> &'static str { "products" }

    fn validate(&self, request: &CollectionRequest, _config: &GeneratorConfig) -> Vec<ValidationViolation> {
        if request.products.is_empty() {
            return vec![ValidationViolation::error(
                self.name(),
                "No products added",
                "Add at least one product",
            )];
        }

        let mut violations = vec![];
        let mut codes = HashSet::new();
        for product in &request.products {
            if product.code.is_empty() {
                violations.push(ValidationViolation::error(
                    self.name(),
                    format!("Product {:?} has no code", product.name),
                    "Fill in both name and code",
                ));
            } else if let Some(problem) = path_component_problem(&product.code) {
                violations.push(ValidationViolation::error(
                    self.name(),
                    format!("Product code {:?} {}", product.code, problem),
                    "Use letters and digits in product codes",
                ));
            } else if !codes.insert(product.code.as_str()) {
                violations.push(ValidationViolation::error(
                    self.name(),
                    format!("Product code {:?} is used twice", product.code),
                    "Give every product its own code",
                ));
            }
            if let Some(problem) = path_component_problem(&product.name) {
                violations.push(ValidationViolation::error(
                    self.name(),
                    format!("Product name {:?} {}", product.name, problem),
                    "Fill in both name and code",
                ));
            }
        }
        violations
    }
}

pub struct SelectionRule;

impl ValidationRule for SelectionRule {
    fn name(&self) -> &'static str { "selection" }

    fn validate(&self, request: &CollectionRequest, _config: &GeneratorConfig) -> Vec<ValidationViolation> {
        let mut violations = vec![];
        if request.enabled_sizes().next().is_none() {
            violations.push(ValidationViolation::error(
                self.name(),
                "No sizes enabled",
                "Tick at least one size",
            ));
        }
        if request.enabled_colors().next().is_none() {
            violations.push(ValidationViolation::error(
                self.name(),
                "No colors enabled",
                "Tick at least one color",
            ));
        }

        let mut labels = HashSet::new();
        for size in request.enabled_sizes() {
            if let Some(problem) = path_component_problem(&size.label) {
                violations.push(ValidationViolation::error(
                    self.name(),
                    format!("Size {:?} {}", size.label, problem),
                    "Name sizes without slashes, e.g. S-M",
                ));
            } else if !labels.insert(size.label.as_str()) {
                violations.push(ValidationViolation::error(
                    self.name(),
                    format!("Size {:?} listed twice", size.label),
                    "Remove the duplicate size",
                ));
            }
        }

        let mut color_codes = HashSet::new();
        for color in request.enabled_colors() {
            if color.code.trim().is_empty() {
                violations.push(ValidationViolation::error(
                    self.name(),
                    format!("Color {:?} has no code", color.name),
                    "Give every color a code",
                ));
            } else if let Some(problem) = path_component_problem(&color.code) {
                violations.push(ValidationViolation::error(
                    self.name(),
                    format!("Color code {:?} {}", color.code, problem),
                    "Use letters in color codes",
                ));
            } else if !color_codes.insert(color.code.as_str()) {
                violations.push(ValidationViolation::error(
                    self.name(),
                    format!("Color code {:?} listed twice", color.code),
                    "Give every color its own code",
                ));
            }
        }
        violations
    }
}

pub struct PrefixRule;

impl ValidationRule for PrefixRule {
    fn name(&self) -> &'static str { "prefix" }

    fn validate(&self, _request: &CollectionRequest, config: &GeneratorConfig) -> Vec<ValidationViolation> {
        match validate_prefix(&config.prefix) {
            Ok(()) => vec![],
            Err(e) => vec![ValidationViolation::error(self.name(), e.to_string(), "Use a 6 digit prefix")],
        }
    }
}

/// Variant count against the identifier body space
pub struct CapacityRule;

impl ValidationRule for CapacityRule {
    fn name(&self) -> &'static str { "capacity" }

    fn validate(&self, request: &CollectionRequest, _config: &GeneratorConfig) -> Vec<ValidationViolation> {
        let count = request.products.len()
            * request.enabled_sizes().count()
            * request.enabled_colors().count();
        if count > BODY_SPACE {
            vec![ValidationViolation::error(
                self.name(),
                format!("{} variants exceed the {} identifiers available per prefix", count, BODY_SPACE),
                "Split the collection",
            )]
        } else if count > BODY_SPACE / 10 {
            vec![ValidationViolation::warning(
                self.name(),
                format!("{} variants will make identifier collisions frequent", count),
                "Consider splitting the collection",
            )]
        } else {
            vec![]
        }
    }
}

/// Validator runs every rule; any error makes the result invalid.
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(CollectionNameRule),
                Box::new(ProductsRule),
                Box::new(SelectionRule),
                Box::new(PrefixRule),
                Box::new(CapacityRule),
            ],
        }
    }

    pub fn validate(&self, request: &CollectionRequest, config: &GeneratorConfig) -> ValidationResult {
        let violations: Vec<_> = self
            .rules
            .iter()
            .flat_map(|rule| rule.validate(request, config))
            .collect();
        let valid = !violations.iter().any(|v| v.severity == ViolationSeverity::Error);
        ValidationResult { valid, violations }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColorSelection, Product, SizeSelection};

    fn request() -> CollectionRequest {
        CollectionRequest {
            collection: "SS25".into(),
            products: vec![Product::new("tee", "TS01")],
            sizes: SizeSelection::standard(),
            colors: ColorSelection::standard(),
        }
    }

    fn rules_hit(result: &ValidationResult) -> Vec<&str> {
        result.violations.iter().map(|v| v.rule.as_str()).collect()
    }

    #[test]
    fn test_valid_request_passes() {
        let result = Validator::new().validate(&request(), &GeneratorConfig::default());
        assert!(result.valid);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_missing_collection_and_products() {
        let mut req = request();
        req.collection = "  ".into();
        req.products.clear();
        let result = Validator::new().validate(&req, &GeneratorConfig::default());
        assert!(!result.valid);
        assert_eq!(rules_hit(&result), vec!["collection_name", "products"]);
    }

    #[test]
    fn test_path_escape_rejected() {
        let mut req = request();
        req.collection = "../etc".into();
        req.products.push(Product::new("..", "X1"));
        let result = Validator::new().validate(&req, &GeneratorConfig::default());
        assert_eq!(result.errors().count(), 2);
    }

    #[test]
    fn test_sku_parts_must_be_plain_names() {
        let mut req = request();
        req.sizes = vec![SizeSelection::new("M", true), SizeSelection::new("S/M", true)];
        let result = Validator::new().validate(&req, &GeneratorConfig::default());
        assert!(!result.valid);
        assert!(result.error_summary().contains("\"S/M\" contains a path separator"));

        let mut req = request();
        req.products = vec![Product::new("TEE", "../../../escaped"), Product::new("POLO", "..")];
        req.colors.push(ColorSelection::new("Navy", "N\\V", true));
        let result = Validator::new().validate(&req, &GeneratorConfig::default());
        assert_eq!(result.errors().count(), 3);
        assert_eq!(rules_hit(&result), vec!["products", "products", "selection"]);
    }

    #[test]
    fn test_duplicate_codes_rejected() {
        let mut req = request();
        req.products.push(Product::new("other tee", "TS01"));
        req.sizes.push(SizeSelection::new("M", true));
        let result = Validator::new().validate(&req, &GeneratorConfig::default());
        assert!(!result.valid);
        assert!(result.error_summary().contains("TS01"));
        assert!(result.error_summary().contains("\"M\""));
    }

    #[test]
    fn test_nothing_enabled() {
        let mut req = request();
        for s in &mut req.sizes {
            s.include = false;
        }
        for c in &mut req.colors {
            c.include = false;
        }
        let result = Validator::new().validate(&req, &GeneratorConfig::default());
        assert_eq!(result.errors().count(), 2);
    }

    #[test]
    fn test_disabled_duplicates_ignored() {
        let mut req = request();
        req.colors.push(ColorSelection::new("Jet", "B", false));
        assert!(Validator::new().validate(&req, &GeneratorConfig::default()).valid);
    }

    #[test]
    fn test_capacity_warning_does_not_block() {
        let mut req = request();
        req.products = (0..20_000).map(|i| Product::new("p", &format!("P{i}"))).collect();
        let result = Validator::new().validate(&req, &GeneratorConfig::default());
        assert!(result.valid);
        assert_eq!(result.warnings().count(), 1);
    }

    #[test]
    fn test_bad_prefix() {
        let config = GeneratorConfig { prefix: "70301A".into(), ..GeneratorConfig::default() };
        let result = Validator::new().validate(&request(), &config);
        assert_eq!(rules_hit(&result), vec!["prefix"]);
    }
}
