//! Static symbol catalog: display names, segments and curated lists.
//!
//! The catalog is a data asset (`data/catalog.json`) embedded at compile time.
//! A caller-supplied asset with the same shape can replace it through
//! [`SymbolCatalog::from_json`] or [`SymbolCatalog::from_path`].

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::{CatalogEntry, CoreError, MarketSegment, Symbol, ValidationError};

const EMBEDDED_CATALOG: &str = include_str!("../data/catalog.json");

/// Upper bound on [`SymbolCatalog::search`] results.
pub const MAX_SEARCH_RESULTS: usize = 20;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogAsset {
    kospi: Vec<AssetEntry>,
    kosdaq: Vec<AssetEntry>,
    #[serde(default)]
    international: Vec<AssetEntry>,
    #[serde(default)]
    indices: Vec<AssetEntry>,
    #[serde(default)]
    popular: PopularLists,
}

#[derive(Debug, Deserialize)]
struct AssetEntry {
    symbol: String,
    name: String,
    #[serde(default)]
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PopularLists {
    #[serde(default)]
    domestic: Vec<String>,
    #[serde(default)]
    international: Vec<String>,
}

/// Immutable symbol-to-name mapping plus the curated popular lists.
#[derive(Debug, Clone)]
pub struct SymbolCatalog {
    kospi: Vec<CatalogEntry>,
    kosdaq: Vec<CatalogEntry>,
    international: Vec<CatalogEntry>,
    indices: Vec<CatalogEntry>,
    by_symbol: HashMap<Symbol, CatalogEntry>,
    popular_domestic: Vec<Symbol>,
    popular_international: Vec<Symbol>,
}

impl SymbolCatalog {
    /// Load the catalog compiled into the crate.
    pub fn embedded() -> Result<Self, ValidationError> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Parse a catalog asset.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCatalog`] for malformed JSON, invalid
    /// symbols, or a symbol listed twice.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let asset: CatalogAsset =
            serde_json::from_str(json).map_err(|error| ValidationError::InvalidCatalog {
                reason: error.to_string(),
            })?;

        let kospi = build_entries(asset.kospi, MarketSegment::Kospi)?;
        let kosdaq = build_entries(asset.kosdaq, MarketSegment::Kosdaq)?;
        let international = build_entries(asset.international, MarketSegment::International)?;
        let indices = build_entries(asset.indices, MarketSegment::Index)?;

        let mut by_symbol = HashMap::new();
        for entry in kospi
            .iter()
            .chain(&kosdaq)
            .chain(&international)
            .chain(&indices)
        {
            if by_symbol
                .insert(entry.symbol.clone(), entry.clone())
                .is_some()
            {
                return Err(ValidationError::InvalidCatalog {
                    reason: format!("symbol '{}' is listed more than once", entry.symbol),
                });
            }
        }

        Ok(Self {
            kospi,
            kosdaq,
            international,
            indices,
            by_symbol,
            popular_domestic: parse_symbols(asset.popular.domestic)?,
            popular_international: parse_symbols(asset.popular.international)?,
        })
    }

    /// Read and parse a catalog asset from disk.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }

    /// Domestic entries, primary exchange first, in catalog order.
    pub fn list_all(&self) -> Vec<CatalogEntry> {
        self.kospi.iter().chain(&self.kosdaq).cloned().collect()
    }

    pub fn list_segment(&self, segment: MarketSegment) -> &[CatalogEntry] {
        match segment {
            MarketSegment::Kospi => &self.kospi,
            MarketSegment::Kosdaq => &self.kosdaq,
            MarketSegment::International => &self.international,
            MarketSegment::Index => &self.indices,
        }
    }

    pub fn international(&self) -> &[CatalogEntry] {
        &self.international
    }

    pub fn entry(&self, symbol: &Symbol) -> Option<&CatalogEntry> {
        self.by_symbol.get(symbol)
    }

    /// Display name for `symbol`, or `"<prefix> <symbol>"` when unmapped.
    pub fn name_for(&self, symbol: &Symbol) -> String {
        match self.entry(symbol) {
            Some(entry) => entry.name.clone(),
            None => format!("{} {}", self.segment_for(symbol).fallback_prefix(), symbol),
        }
    }

    /// Listing segment of `symbol`.
    ///
    /// Unmapped symbols are classified by shape: a leading `^` is an index, a
    /// six-digit code is a primary-exchange listing, anything else is
    /// international.
    pub fn segment_for(&self, symbol: &Symbol) -> MarketSegment {
        if let Some(entry) = self.entry(symbol) {
            return entry.market;
        }
        if symbol.is_index() {
            MarketSegment::Index
        } else if symbol.is_domestic_code() {
            MarketSegment::Kospi
        } else {
            MarketSegment::International
        }
    }

    /// Case-insensitive substring match on name or symbol over
    /// [`list_all`](Self::list_all), capped at [`MAX_SEARCH_RESULTS`].
    pub fn search(&self, keyword: &str) -> Vec<CatalogEntry> {
        let needle = keyword.trim().to_lowercase();
        self.kospi
            .iter()
            .chain(&self.kosdaq)
            .filter(|entry| {
                entry.name.to_lowercase().contains(&needle)
                    || entry.symbol.as_str().to_lowercase().contains(&needle)
            })
            .take(MAX_SEARCH_RESULTS)
            .cloned()
            .collect()
    }

    pub fn popular_domestic(&self) -> &[Symbol] {
        &self.popular_domestic
    }

    pub fn popular_international(&self) -> &[Symbol] {
        &self.popular_international
    }
}

fn build_entries(
    raw: Vec<AssetEntry>,
    market: MarketSegment,
) -> Result<Vec<CatalogEntry>, ValidationError> {
    raw.into_iter()
        .map(|entry| {
            let symbol = Symbol::parse(&entry.symbol).map_err(|error| {
                ValidationError::InvalidCatalog {
                    reason: format!("{market} entry '{}': {error}", entry.symbol),
                }
            })?;
            Ok(CatalogEntry {
                symbol,
                name: entry.name,
                market,
                industry: entry.industry.filter(|value| !value.trim().is_empty()),
            })
        })
        .collect()
}

fn parse_symbols(raw: Vec<String>) -> Result<Vec<Symbol>, ValidationError> {
    raw.iter()
        .map(|value| {
            Symbol::parse(value).map_err(|error| ValidationError::InvalidCatalog {
                reason: format!("popular symbol '{value}': {error}"),
            })
        })
        .collect()
}
