//! Price-list document parser
//!
//! Decodes provider price-list documents of the shape
//! `{product:{attributes:{...}}, terms:{OnDemand:{<term>:{priceDimensions:{<dim>:{pricePerUnit:{USD:"..."}}}}}}}`
//! into flat [`PriceRecord`]s. A bad document or a bad dimension is skipped
//! and counted; it never aborts the batch.

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::{PricingError, PricingResult};
use crate::models::{PriceRecord, ProductAttributes, RegionMap};

#[derive(Debug, Deserialize)]
struct PriceDocument {
    product: Product,
    #[serde(default)]
    terms: Terms,
}

#[derive(Debug, Deserialize)]
struct Product {
    #[serde(rename = "productFamily")]
    product_family: Option<String>,
    #[serde(default)]
    attributes: ProductAttributes,
}

// BTreeMaps keep term/dimension iteration stable, so last-write-wins on
// duplicate usage types is deterministic across runs.
#[derive(Debug, Default, Deserialize)]
struct Terms {
    #[serde(rename = "OnDemand", default)]
    on_demand: BTreeMap<String, Term>,
}

#[derive(Debug, Deserialize)]
struct Term {
    #[serde(rename = "priceDimensions", default)]
    price_dimensions: BTreeMap<String, PriceDimension>,
}

#[derive(Debug, Deserialize)]
struct PriceDimension {
    #[serde(rename = "pricePerUnit", default)]
    price_per_unit: BTreeMap<String, String>,
}

/// A product together with the on-demand prices parsed from its document
#[derive(Debug, Clone, PartialEq)]
pub struct PricedProduct {
    pub product_family: Option<String>,
    pub attributes: ProductAttributes,
    pub records: Vec<PriceRecord>,
}

impl PricedProduct {
    /// Region the product is priced in (empty for global SKUs)
    pub fn region(&self) -> &str {
        self.attributes.region_code.as_deref().unwrap_or_default()
    }

    /// The effective hourly price: the last parsed dimension wins
    pub fn price(&self) -> Option<f64> {
        self.records.last().map(|record| record.unit_price_usd)
    }
}

/// Outcome of parsing one batch of price-list documents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPriceList {
    pub products: Vec<PricedProduct>,
    pub skipped_documents: usize,
    pub skipped_dimensions: usize,
}

impl ParsedPriceList {
    pub fn records(&self) -> impl Iterator<Item = &PriceRecord> {
        self.products.iter().flat_map(|product| product.records.iter())
    }

    /// Flatten into `region -> usage type -> price`; later records overwrite earlier ones
    pub fn flatten(&self) -> RegionMap<String, f64> {
        let mut regions: RegionMap<String, f64> = RegionMap::new();
        for record in self.records() {
            regions
                .entry(record.region.clone())
                .or_default()
                .insert(record.usage_type.clone(), record.unit_price_usd);
        }
        regions
    }
}

/// Parse a single document. Returns the product and the number of dimensions skipped.
pub fn parse_document(document: &str) -> PricingResult<(PricedProduct, usize)> {
    let parsed: PriceDocument = serde_json::from_str(document)
        .map_err(|e| PricingError::InvalidDocument(e.to_string()))?;

    let region = parsed
        .product
        .attributes
        .region_code
        .clone()
        .unwrap_or_default();
    let usage_type = parsed
        .product
        .attributes
        .usage_type
        .clone()
        .unwrap_or_default();

    let mut records = Vec::new();
    let mut skipped = 0;

    for (term_id, term) in &parsed.terms.on_demand {
        for (dimension_id, dimension) in &term.price_dimensions {
            let Some(raw) = dimension.price_per_unit.get("USD") else {
                debug!(term_id = %term_id, dimension_id = %dimension_id, "Price dimension has no USD price");
                skipped += 1;
                continue;
            };

            match raw.trim().parse::<f64>() {
                Ok(price) if price.is_finite() => records.push(PriceRecord {
                    region: region.clone(),
                    usage_type: usage_type.clone(),
                    unit_price_usd: price,
                }),
                _ => {
                    warn!(
                        usage_type = %usage_type,
                        dimension_id = %dimension_id,
                        value = %raw,
                        "Skipping price dimension with unparseable USD price"
                    );
                    skipped += 1;
                }
            }
        }
    }

    Ok((
        PricedProduct {
            product_family: parsed.product.product_family,
            attributes: parsed.product.attributes,
            records,
        },
        skipped,
    ))
}

/// Parse a batch of price-list documents.
///
/// Products without any parseable on-demand price are dropped.
pub fn parse_price_list<I, S>(documents: I) -> ParsedPriceList
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = ParsedPriceList::default();

    for (index, document) in documents.into_iter().enumerate() {
        match parse_document(document.as_ref()) {
            Ok((product, skipped)) => {
                parsed.skipped_dimensions += skipped;
                if !product.records.is_empty() {
                    parsed.products.push(product);
                }
            }
            Err(e) => {
                warn!(index, error = %e, "Skipping unparseable price document");
                parsed.skipped_documents += 1;
            }
        }
    }

    debug!(
        products = parsed.products.len(),
        skipped_documents = parsed.skipped_documents,
        skipped_dimensions = parsed.skipped_dimensions,
        "Parsed price list"
    );

    parsed
}
