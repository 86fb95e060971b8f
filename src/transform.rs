// 🔀 View Transform - derived projections of the records
// Pure functions over (records, selection); safe to recompute on every frame

use crate::model::{CountryId, Indicator, Record, Year};
use crate::selection::Selection;
use serde_json::{json, Map, Value};

/// Key of one series value in a pivot row: `<countryId>_<indicator>`
pub fn series_key(country: CountryId, indicator: Indicator) -> String {
    format!("{}_{}", country, indicator.key_suffix())
}

// ============================================================================
// FILTERED ROWS
// ============================================================================

/// Records whose country and year are both selected, in source order
pub fn filtered_rows<'a>(records: &'a [Record], selection: &Selection) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|r| selection.countries.contains(&r.country) && selection.years.contains(&r.year))
        .collect()
}

// ============================================================================
// PIVOT BY YEAR
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PivotCell {
    pub country: CountryId,
    pub external_debt: f64,
    pub education_expenditure: f64,
}

impl PivotCell {
    pub fn value(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::ExternalDebt => self.external_debt,
            Indicator::EducationExpenditure => self.education_expenditure,
        }
    }
}

/// One x-axis point of the line/bar charts.
/// Countries without a record for `year` have no cell (not zero).
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub year: Year,
    pub cells: Vec<PivotCell>,
}

impl PivotRow {
    pub fn cell(&self, country: CountryId) -> Option<&PivotCell> {
        self.cells.iter().find(|c| c.country == country)
    }

    /// Look up a value by its series key, e.g. `"1_external_debt"`
    pub fn value(&self, key: &str) -> Option<f64> {
        self.cells.iter().find_map(|cell| {
            Indicator::ALL
                .iter()
                .find(|ind| series_key(cell.country, **ind) == key)
                .map(|ind| cell.value(*ind))
        })
    }

    /// Flat keyed object: `{year, "<id>_external_debt": v, "<id>_education_expenditure": v}`
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("year".to_string(), json!(self.year));
        for cell in &self.cells {
            for indicator in Indicator::ALL {
                map.insert(series_key(cell.country, indicator), json!(cell.value(indicator)));
            }
        }
        Value::Object(map)
    }
}

/// One row per selected year, in selection order.
/// A duplicated (country, year) pair resolves to its last record.
pub fn pivot_by_year(records: &[Record], selection: &Selection) -> Vec<PivotRow> {
    selection
        .years
        .values()
        .iter()
        .map(|&year| {
            let cells = selection
                .countries
                .values()
                .iter()
                .filter_map(|&country| {
                    records
                        .iter()
                        .rev()
                        .find(|r| r.country == country && r.year == year)
                        .map(|r| PivotCell {
                            country,
                            external_debt: r.external_debt,
                            education_expenditure: r.education_expenditure,
                        })
                })
                .collect();

            PivotRow { year, cells }
        })
        .collect()
}

// ============================================================================
// AGGREGATE BY COUNTRY
// ============================================================================

/// Totals across all selected years (a sum, not a per-year mean)
#[derive(Debug, Clone, PartialEq)]
pub struct CountryTotals {
    pub country: CountryId,
    pub external_debt: f64,
    pub education_expenditure: f64,
}

impl CountryTotals {
    pub fn value(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::ExternalDebt => self.external_debt,
            Indicator::EducationExpenditure => self.education_expenditure,
        }
    }
}

/// One entry per selected country, in selection order.
/// Countries with no matching records total zero; duplicate pairs add up.
pub fn aggregate_by_country(records: &[Record], selection: &Selection) -> Vec<CountryTotals> {
    selection
        .countries
        .values()
        .iter()
        .map(|&country| {
            records
                .iter()
                .filter(|r| r.country == country && selection.years.contains(&r.year))
                .fold(
                    CountryTotals {
                        country,
                        external_debt: 0.0,
                        education_expenditure: 0.0,
                    },
                    |mut acc, r| {
                        acc.external_debt += r.external_debt;
                        acc.education_expenditure += r.education_expenditure;
                        acc
                    },
                )
        })
        .collect()
}

/// Fraction of the grand total held by each country, for the pie breakdown
pub fn shares(totals: &[CountryTotals], indicator: Indicator) -> Vec<(CountryId, f64)> {
    let grand_total: f64 = totals.iter().map(|t| t.value(indicator)).sum();

    totals
        .iter()
        .map(|t| {
            let share = if grand_total == 0.0 {
                0.0
            } else {
                t.value(indicator) / grand_total
            };
            (t.country, share)
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Pick;

    fn record(country: i64, year: Year, debt: f64, edu: f64) -> Record {
        Record {
            country: CountryId(country),
            year,
            external_debt: debt,
            education_expenditure: edu,
        }
    }

    fn select(countries: &[i64], years: &[Year]) -> Selection {
        let mut selection = Selection::new();
        let country_ids: Vec<CountryId> = countries.iter().map(|c| CountryId(*c)).collect();
        selection.toggle_country_selection(country_ids.iter().map(|c| Pick::One(*c)), &country_ids);
        selection.toggle_year_selection(years.iter().map(|y| Pick::One(*y)), years);
        selection
    }

    fn sample_records() -> Vec<Record> {
        vec![
            record(1, 2020, 100.0, 10.0),
            record(1, 2021, 200.0, 20.0),
        ]
    }

    #[test]
    fn test_empty_selection_yields_no_rows() {
        let records = sample_records();

        assert!(filtered_rows(&records, &select(&[], &[2020, 2021])).is_empty());
        assert!(filtered_rows(&records, &select(&[1], &[])).is_empty());
    }

    #[test]
    fn test_filtered_rows_keep_source_order() {
        let records = vec![
            record(2, 2021, 1.0, 1.0),
            record(1, 2020, 2.0, 2.0),
            record(3, 2020, 3.0, 3.0),
            record(1, 2021, 4.0, 4.0),
            record(2, 2019, 5.0, 5.0),
        ];

        let rows = filtered_rows(&records, &select(&[1, 2], &[2021, 2020]));

        assert_eq!(rows, vec![&records[0], &records[1], &records[3]]);
        for row in rows {
            assert!([CountryId(1), CountryId(2)].contains(&row.country));
            assert!([2020, 2021].contains(&row.year));
        }
    }

    #[test]
    fn test_aggregate_sums_selected_years() {
        let records = sample_records();
        let totals = aggregate_by_country(&records, &select(&[1], &[2020, 2021]));

        assert_eq!(
            totals,
            vec![CountryTotals {
                country: CountryId(1),
                external_debt: 300.0,
                education_expenditure: 30.0,
            }]
        );
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let records = vec![
            record(1, 2020, 100.0, 10.0),
            record(2, 2020, 50.0, 5.0),
            record(1, 2021, 200.0, 20.0),
            record(2, 2021, 25.0, 2.5),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let selection = select(&[2, 1], &[2020, 2021]);

        let totals = aggregate_by_country(&records, &selection);
        assert_eq!(totals, aggregate_by_country(&reversed, &selection));

        // Output follows selection order, not record order
        let order: Vec<CountryId> = totals.iter().map(|t| t.country).collect();
        assert_eq!(order, vec![CountryId(2), CountryId(1)]);
        assert_eq!(totals[0].external_debt, 75.0);
        assert_eq!(totals[1].external_debt, 300.0);
    }

    #[test]
    fn test_aggregate_zero_for_country_without_records() {
        let records = sample_records();
        let totals = aggregate_by_country(&records, &select(&[7], &[2020]));

        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].external_debt, 0.0);
        assert_eq!(totals[0].education_expenditure, 0.0);
    }

    #[test]
    fn test_aggregate_counts_duplicate_pairs_twice() {
        let records = vec![record(1, 2020, 100.0, 10.0), record(1, 2020, 100.0, 10.0)];
        let totals = aggregate_by_country(&records, &select(&[1], &[2020]));

        assert_eq!(totals[0].external_debt, 200.0);
    }

    #[test]
    fn test_pivot_only_selected_years() {
        let records = sample_records();
        let rows = pivot_by_year(&records, &select(&[1], &[2020]));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year, 2020);
        assert_eq!(rows[0].value("1_external_debt"), Some(100.0));
        assert_eq!(rows[0].value("1_education_expenditure"), Some(10.0));
        assert_eq!(
            rows[0].to_json(),
            json!({"year": 2020, "1_external_debt": 100.0, "1_education_expenditure": 10.0})
        );
    }

    #[test]
    fn test_pivot_missing_country_has_no_keys() {
        let records = vec![record(1, 2020, 100.0, 10.0), record(2, 2021, 50.0, 5.0)];
        let rows = pivot_by_year(&records, &select(&[1, 2], &[2021, 2020]));

        assert_eq!(rows.iter().map(|r| r.year).collect::<Vec<_>>(), vec![2021, 2020]);
        assert!(rows[0].cell(CountryId(1)).is_none());
        assert_eq!(rows[0].value("2_external_debt"), Some(50.0));
        assert_eq!(rows[0].value("1_external_debt"), None);
        assert!(rows[0].to_json().get("1_external_debt").is_none());
    }

    #[test]
    fn test_pivot_duplicate_pair_keeps_last() {
        let records = vec![record(1, 2020, 100.0, 10.0), record(1, 2020, 150.0, 15.0)];
        let rows = pivot_by_year(&records, &select(&[1], &[2020]));

        assert_eq!(rows[0].value("1_external_debt"), Some(150.0));
    }

    #[test]
    fn test_shares() {
        let totals = vec![
            CountryTotals {
                country: CountryId(1),
                external_debt: 300.0,
                education_expenditure: 0.0,
            },
            CountryTotals {
                country: CountryId(2),
                external_debt: 100.0,
                education_expenditure: 0.0,
            },
        ];

        assert_eq!(
            shares(&totals, Indicator::ExternalDebt),
            vec![(CountryId(1), 0.75), (CountryId(2), 0.25)]
        );
        assert_eq!(
            shares(&totals, Indicator::EducationExpenditure),
            vec![(CountryId(1), 0.0), (CountryId(2), 0.0)]
        );
    }
}
