// 📊 Dashboard - session state owned in one place
// Fetched collections + current selection; every view is derived on demand

use crate::model::{Country, CountryId, Dataset, Record, Year};
use crate::presentation::Metadata;
use crate::selection::{ChartType, Pick, Selection, Tab};
use crate::source::{Collection, FetchError, LoadEvent};
use crate::transform::{self, CountryTotals, PivotRow};
use chrono::Utc;

/// A fetch that failed, kept for display
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub collection: Collection,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub dataset: Dataset,
    pub selection: Selection,
    failures: Vec<FetchFailure>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            dataset,
            ..Self::default()
        }
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    /// On failure the previous collection stays in place
    pub fn apply_countries(&mut self, result: Result<Vec<Country>, FetchError>) {
        match result {
            Ok(countries) => {
                tracing::info!("loaded {} countries", countries.len());
                self.dataset.countries = countries;
                self.dataset.loaded_at = Some(Utc::now());
                self.clear_failure(Collection::Countries);
            }
            Err(e) => {
                tracing::error!("Error fetching countries: {}", e);
                self.record_failure(&e);
            }
        }
    }

    pub fn apply_records(&mut self, result: Result<Vec<Record>, FetchError>) {
        match result {
            Ok(records) => {
                tracing::info!("loaded {} records", records.len());
                self.dataset.records = records;
                self.dataset.loaded_at = Some(Utc::now());
                self.clear_failure(Collection::Records);

                for (country, year) in self.dataset.duplicate_pairs() {
                    tracing::warn!(
                        "duplicate record for country {} year {}; totals will include both",
                        country,
                        year
                    );
                }
            }
            Err(e) => {
                tracing::error!("Error fetching data: {}", e);
                self.record_failure(&e);
            }
        }
    }

    pub fn apply_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Countries(result) => self.apply_countries(result),
            LoadEvent::Records(result) => self.apply_records(result),
        }
    }

    pub fn fetch_failures(&self) -> &[FetchFailure] {
        &self.failures
    }

    fn record_failure(&mut self, error: &FetchError) {
        let collection = error.collection();
        self.clear_failure(collection);
        self.failures.push(FetchFailure {
            collection,
            message: error.to_string(),
        });
    }

    fn clear_failure(&mut self, collection: Collection) {
        self.failures.retain(|f| f.collection != collection);
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    pub fn toggle_country_selection<I>(&mut self, picks: I)
    where
        I: IntoIterator<Item = Pick<CountryId>>,
    {
        let known = self.dataset.country_ids();
        self.selection.toggle_country_selection(picks, &known);
    }

    pub fn toggle_year_selection<I>(&mut self, picks: I)
    where
        I: IntoIterator<Item = Pick<Year>>,
    {
        let known = self.dataset.distinct_years();
        self.selection.toggle_year_selection(picks, &known);
    }

    /// Single click on a picker row, as a multi-select control reports it
    pub fn click_country(&mut self, item: Pick<CountryId>) {
        let picks = self.selection.countries.picks_after_click(item);
        self.toggle_country_selection(picks);
    }

    pub fn click_year(&mut self, item: Pick<Year>) {
        let picks = self.selection.years.picks_after_click(item);
        self.toggle_year_selection(picks);
    }

    pub fn set_chart_type(&mut self, kind: ChartType) {
        self.selection.set_chart_type(kind);
    }

    pub fn set_active_tab(&mut self, tab: Tab) {
        self.selection.set_active_tab(tab);
    }

    // ========================================================================
    // VIEWS
    // ========================================================================

    pub fn filtered_rows(&self) -> Vec<&Record> {
        transform::filtered_rows(&self.dataset.records, &self.selection)
    }

    pub fn pivot_by_year(&self) -> Vec<PivotRow> {
        transform::pivot_by_year(&self.dataset.records, &self.selection)
    }

    pub fn aggregate_by_country(&self) -> Vec<CountryTotals> {
        transform::aggregate_by_country(&self.dataset.records, &self.selection)
    }

    pub fn metadata(&self) -> Metadata {
        Metadata::from_dataset(&self.dataset)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn countries() -> Vec<Country> {
        vec![
            Country { id: CountryId(1), name: "Kenya".to_string() },
            Country { id: CountryId(2), name: "Peru".to_string() },
        ]
    }

    fn records() -> Vec<Record> {
        vec![
            Record { country: CountryId(1), year: 2020, external_debt: 100.0, education_expenditure: 10.0 },
            Record { country: CountryId(1), year: 2021, external_debt: 200.0, education_expenditure: 20.0 },
            Record { country: CountryId(2), year: 2021, external_debt: 50.0, education_expenditure: 5.0 },
        ]
    }

    fn decode_error() -> FetchError {
        FetchError::Decode {
            collection: Collection::Records,
            source: serde_json::from_str::<Vec<Record>>("nope").unwrap_err(),
        }
    }

    #[test]
    fn test_apply_results() {
        let mut dashboard = Dashboard::new();
        assert!(dashboard.dataset.loaded_at.is_none());

        dashboard.apply_countries(Ok(countries()));
        dashboard.apply_records(Ok(records()));

        assert_eq!(dashboard.dataset.countries.len(), 2);
        assert_eq!(dashboard.dataset.records.len(), 3);
        assert!(dashboard.dataset.loaded_at.is_some());
        assert!(dashboard.fetch_failures().is_empty());
    }

    #[test]
    fn test_failed_fetch_keeps_previous_collection() {
        let mut dashboard = Dashboard::new();
        dashboard.apply_records(Ok(records()));

        dashboard.apply_records(Err(decode_error()));

        assert_eq!(dashboard.dataset.records.len(), 3);
        assert_eq!(dashboard.fetch_failures().len(), 1);
        assert_eq!(dashboard.fetch_failures()[0].collection, Collection::Records);
    }

    #[test]
    fn test_failure_is_filed_under_the_errors_collection() {
        let mut dashboard = Dashboard::new();
        let csv_error = csv::Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));

        dashboard.apply_countries(Err(FetchError::Csv {
            collection: Collection::Countries,
            path: "countries.csv".into(),
            source: csv_error,
        }));
        dashboard.apply_records(Err(decode_error()));

        let failures = dashboard.fetch_failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].collection, Collection::Countries);
        assert!(failures[0].message.contains("countries"));
        assert_eq!(failures[1].collection, Collection::Records);

        // Success for countries clears only the countries failure
        dashboard.apply_countries(Ok(countries()));
        assert_eq!(dashboard.fetch_failures().len(), 1);
        assert_eq!(dashboard.fetch_failures()[0].collection, Collection::Records);
    }

    #[test]
    fn test_failed_initial_fetch_leaves_empty_dataset() {
        let mut dashboard = Dashboard::new();
        dashboard.apply_event(LoadEvent::Records(Err(decode_error())));

        assert!(dashboard.dataset.records.is_empty());
        assert!(dashboard.filtered_rows().is_empty());

        // A later success clears the failure
        dashboard.apply_event(LoadEvent::Records(Ok(records())));
        assert!(dashboard.fetch_failures().is_empty());
    }

    #[test]
    fn test_select_all_uses_fetched_universes() {
        let mut dashboard = Dashboard::with_dataset(Dataset::new(countries(), records()));

        dashboard.toggle_country_selection(vec![Pick::SelectAll]);
        dashboard.toggle_year_selection(vec![Pick::SelectAll]);

        assert_eq!(dashboard.selection.countries.values(), &[CountryId(1), CountryId(2)]);
        assert_eq!(dashboard.selection.years.values(), &[2020, 2021]);
        assert_eq!(dashboard.filtered_rows().len(), 3);

        let totals = dashboard.aggregate_by_country();
        assert_eq!(totals[0].external_debt, 300.0);
        assert_eq!(totals[1].education_expenditure, 5.0);
    }

    #[test]
    fn test_click_sequence() {
        let mut dashboard = Dashboard::with_dataset(Dataset::new(countries(), records()));

        dashboard.click_country(Pick::One(CountryId(2)));
        dashboard.click_year(Pick::One(2021));
        assert_eq!(dashboard.filtered_rows().len(), 1);

        // Select All with partial coverage selects everything
        dashboard.click_country(Pick::SelectAll);
        assert_eq!(dashboard.selection.countries.len(), 2);

        // ...and with full coverage clears
        dashboard.click_country(Pick::SelectAll);
        assert!(dashboard.selection.countries.is_empty());

        dashboard.click_year(Pick::One(2021));
        assert!(dashboard.selection.years.is_empty());
    }

    #[test]
    fn test_pivot_view() {
        let mut dashboard = Dashboard::with_dataset(Dataset::new(countries(), records()));
        dashboard.toggle_country_selection(vec![Pick::SelectAll]);
        dashboard.toggle_year_selection(vec![Pick::One(2021)]);

        let rows = dashboard.pivot_by_year();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value("1_external_debt"), Some(200.0));
        assert_eq!(rows[0].value("2_education_expenditure"), Some(5.0));
    }

    #[test]
    fn test_chart_type_and_tab() {
        let mut dashboard = Dashboard::new();
        dashboard.set_chart_type(ChartType::Bar);
        dashboard.set_active_tab(Tab::Chart);

        assert_eq!(dashboard.selection.chart_type, ChartType::Bar);
        assert_eq!(dashboard.selection.active_tab, Tab::Chart);
        assert_eq!(dashboard.metadata().data_points, 0);
    }
}
