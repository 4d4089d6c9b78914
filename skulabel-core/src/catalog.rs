//! Catalog Model - products, selections and the variants they expand into

use serde::{Deserialize, Serialize};

use crate::ean::Ean13;
use crate::error::{LabelError, LabelResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawProduct")]
pub struct Product {
    pub name: String,
    pub code: String,
}

#[derive(Deserialize)]
struct RawProduct {
    name: String,
    code: String,
}

impl From<RawProduct> for Product {
    fn from(raw: RawProduct) -> Self {
        Product::new(&raw.name, &raw.code)
    }
}

impl Product {
    /// Names are stored trimmed and upper-cased; codes trimmed.
    pub fn new(name: &str, code: &str) -> Self {
        Self {
            name: name.trim().to_uppercase(),
            code: code.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeSelection {
    pub label: String,
    #[serde(default = "default_true")]
    pub include: bool,
}

fn default_true() -> bool { true }

impl SizeSelection {
    pub fn new(label: &str, include: bool) -> Self {
        Self { label: label.to_string(), include }
    }

    /// XS through XXL, all enabled
    pub fn standard() -> Vec<Self> {
        ["XS", "S", "M", "L", "XL", "XXL"]
            .iter()
            .map(|s| Self::new(s, true))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSelection {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub include: bool,
}

impl ColorSelection {
    pub fn new(name: &str, code: &str, include: bool) -> Self {
        Self {
            name: name.to_string(),
            code: code.to_string(),
            include,
        }
    }

    /// The house palette; only Black is on by default.
    pub fn standard() -> Vec<Self> {
        vec![
            Self::new("Black", "B", true),
            Self::new("White", "W", false),
            Self::new("Blue", "BL", false),
            Self::new("Green", "GN", false),
            Self::new("Gray", "GY", false),
        ]
    }
}

/// One product/size/color combination needing its own label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    pub product_code: String,
    pub product_name: String,
    pub size: String,
    pub color_code: String,
    pub color_name: String,
}

impl Variant {
    /// `{product_code}-{color_code}-{size}`
    pub fn sku(&self) -> String {
        format!("{}-{}-{}", self.product_code, self.color_code, self.size)
    }
}

/// Expand products × enabled sizes × enabled colors.
///
/// Order is product outermost, color innermost. Identifier assignment follows
/// this order, so it must stay stable for identical input.
pub fn enumerate_variants(
    products: &[Product],
    sizes: &[SizeSelection],
    colors: &[ColorSelection],
) -> Vec<Variant> {
    let sizes: Vec<_> = sizes.iter().filter(|s| s.include).collect();
    let colors: Vec<_> = colors.iter().filter(|c| c.include).collect();

    let mut variants = Vec::with_capacity(products.len() * sizes.len() * colors.len());
    for product in products {
        for size in &sizes {
            for color in &colors {
                variants.push(Variant {
                    product_code: product.code.clone(),
                    product_name: product.name.clone(),
                    size: size.label.clone(),
                    color_code: color.code.clone(),
                    color_name: color.name.clone(),
                });
            }
        }
    }
    variants
}

/// A variant bound to the identifier it will be printed with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelJob {
    pub variant: Variant,
    pub identifier: Ean13,
}

impl LabelJob {
    pub fn sku(&self) -> String {
        self.variant.sku()
    }

    /// Zip index-aligned variants and identifiers, refusing mismatched lengths.
    pub fn pair(variants: Vec<Variant>, identifiers: Vec<Ean13>) -> LabelResult<Vec<LabelJob>> {
        if variants.len() != identifiers.len() {
            return Err(LabelError::JobMismatch {
                variants: variants.len(),
                identifiers: identifiers.len(),
            });
        }
        Ok(variants
            .into_iter()
            .zip(identifiers)
            .map(|(variant, identifier)| LabelJob { variant, identifier })
            .collect())
    }
}

/// Everything the form layer collects for one generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRequest {
    pub collection: String,
    pub products: Vec<Product>,
    #[serde(default = "SizeSelection::standard")]
    pub sizes: Vec<SizeSelection>,
    #[serde(default = "ColorSelection::standard")]
    pub colors: Vec<ColorSelection>,
}

impl CollectionRequest {
    pub fn variants(&self) -> Vec<Variant> {
        enumerate_variants(&self.products, &self.sizes, &self.colors)
    }

    pub fn enabled_sizes(&self) -> impl Iterator<Item = &SizeSelection> {
        self.sizes.iter().filter(|s| s.include)
    }

    pub fn enabled_colors(&self) -> impl Iterator<Item = &ColorSelection> {
        self.colors.iter().filter(|c| c.include)
    }
}
