// 🌍 Data Model - Countries and yearly indicator records
// Read-only snapshots of the two collections served by the backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type Year = i32;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Country identifier as assigned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryId(pub i64);

impl fmt::Display for CountryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CountryId {
    fn from(id: i64) -> Self {
        CountryId(id)
    }
}

// ============================================================================
// COLLECTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
}

/// One (country, year) observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub country: CountryId,
    pub year: Year,

    #[serde(deserialize_with = "de_number")]
    pub external_debt: f64,

    #[serde(deserialize_with = "de_number")]
    pub education_expenditure: f64,
}

impl Record {
    pub fn value(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::ExternalDebt => self.external_debt,
            Indicator::EducationExpenditure => self.education_expenditure,
        }
    }
}

/// Decimal fields arrive either as JSON numbers or as numeric strings
fn de_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid number: {:?}", s))),
    }
}

// ============================================================================
// INDICATORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    ExternalDebt,
    EducationExpenditure,
}

impl Indicator {
    pub const ALL: [Indicator; 2] = [Indicator::ExternalDebt, Indicator::EducationExpenditure];

    /// Suffix used in pivot keys (`<countryId>_<suffix>`)
    pub fn key_suffix(&self) -> &'static str {
        match self {
            Indicator::ExternalDebt => "external_debt",
            Indicator::EducationExpenditure => "education_expenditure",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Indicator::ExternalDebt => "External Debt",
            Indicator::EducationExpenditure => "Education Expenditure",
        }
    }
}

// ============================================================================
// DATASET
// ============================================================================

/// Both fetched collections plus the time they were last refreshed
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub countries: Vec<Country>,
    pub records: Vec<Record>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Dataset {
    pub fn new(countries: Vec<Country>, records: Vec<Record>) -> Self {
        Self {
            countries,
            records,
            loaded_at: None,
        }
    }

    /// Every known country id, in source order
    pub fn country_ids(&self) -> Vec<CountryId> {
        self.countries.iter().map(|c| c.id).collect()
    }

    /// Distinct years in order of first appearance
    pub fn distinct_years(&self) -> Vec<Year> {
        let mut years: Vec<Year> = Vec::new();
        for record in &self.records {
            if !years.contains(&record.year) {
                years.push(record.year);
            }
        }
        years
    }

    pub fn country_name(&self, id: CountryId) -> Option<&str> {
        self.countries
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }

    /// (country, year) pairs that occur more than once, sorted
    pub fn duplicate_pairs(&self) -> Vec<(CountryId, Year)> {
        let mut counts: HashMap<(CountryId, Year), usize> = HashMap::new();
        for record in &self.records {
            *counts.entry((record.country, record.year)).or_insert(0) += 1;
        }

        let mut duplicates: Vec<_> = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(pair, _)| pair)
            .collect();
        duplicates.sort();
        duplicates
    }
}

// ============================================================================
// TESTS
// ============================================================================
