// 🖼️ Presentation helpers - formatting and labels shared by every view
// Keeps display rules out of the transforms: aggregation stays full precision

use crate::model::{CountryId, Dataset, Indicator};
use crate::selection::Selection;
use crate::transform::series_key;
use chrono::{DateTime, Utc};

/// Series colors, cycled by series index
pub const PALETTE: [(u8, u8, u8); 5] = [
    (0x88, 0x84, 0xd8),
    (0x82, 0xca, 0x9d),
    (0xff, 0xc6, 0x58),
    (0xd0, 0xed, 0x57),
    (0xa4, 0xde, 0x6c),
];

pub const DATA_SOURCE: &str = "World Bank";
pub const LAST_UPDATED: &str = "2024";

/// Two decimals, exact ties rounded away from zero.
///
/// `{:.2}` already rounds on the exact binary value but sends ties to even.
/// A double sits exactly halfway between two cents only when `8 * value`
/// is an odd integer; those are rounded here first.
pub fn format_number(value: f64) -> String {
    let eighths = value * 8.0;
    if eighths.is_finite() && eighths.fract() == 0.0 && eighths % 2.0 != 0.0 {
        return format!("{:.2}", (value * 100.0).round() / 100.0);
    }
    format!("{:.2}", value)
}

/// Display name for a country; blank when the id is unknown
pub fn country_label(dataset: &Dataset, id: CountryId) -> String {
    dataset.country_name(id).unwrap_or_default().to_string()
}

pub fn palette_color(index: usize) -> (u8, u8, u8) {
    PALETTE[index % PALETTE.len()]
}

// ============================================================================
// SELECT LABELS
// ============================================================================

pub fn country_select_label(dataset: &Dataset, selection: &Selection) -> String {
    let chosen = selection.countries.values();

    if chosen.is_empty() {
        "Select Countries".to_string()
    } else if chosen.len() == dataset.countries.len() {
        "All selected".to_string()
    } else {
        chosen
            .iter()
            .map(|id| country_label(dataset, *id))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn year_select_label(dataset: &Dataset, selection: &Selection) -> String {
    let chosen = selection.years.values();

    if chosen.is_empty() {
        "Select Years".to_string()
    } else if chosen.len() == dataset.distinct_years().len() {
        "All selected".to_string()
    } else {
        chosen
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ============================================================================
// CHART SERIES
// ============================================================================

/// One plotted line/bar series
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub country: CountryId,
    pub key: String,
    pub name: String,
    pub color: (u8, u8, u8),
}

/// External debt series, one per distinct selected country
pub fn chart_series(dataset: &Dataset, selection: &Selection) -> Vec<ChartSeries> {
    selection
        .countries
        .values()
        .iter()
        .enumerate()
        .map(|(index, &country)| ChartSeries {
            country,
            key: series_key(country, Indicator::ExternalDebt),
            name: format!(
                "{} {}",
                country_label(dataset, country),
                Indicator::ExternalDebt.label()
            ),
            color: palette_color(index),
        })
        .collect()
}

// ============================================================================
// METADATA
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub source: &'static str,
    pub last_updated: &'static str,
    pub data_points: usize,
    pub countries: usize,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Metadata {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            source: DATA_SOURCE,
            last_updated: LAST_UPDATED,
            data_points: dataset.records.len(),
            countries: dataset.countries.len(),
            loaded_at: dataset.loaded_at,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Source: {}", self.source),
            format!("Last Updated: {}", self.last_updated),
            format!("Data Points: {}", self.data_points),
            format!("Countries: {}", self.countries),
        ];
        if let Some(at) = self.loaded_at {
            lines.push(format!("Loaded: {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
        }
        lines
    }
}

// ============================================================================
// TESTS
// ============================================================================
