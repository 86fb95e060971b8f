// Economic Indicators Dashboard - Core Library
// Data model, selection state and view transforms, plus the data sources that feed them

pub mod model;
pub mod selection;
pub mod transform;
pub mod presentation;
pub mod source;
pub mod dashboard;
pub mod config;

// Re-export commonly used types
pub use model::{Country, CountryId, Dataset, Indicator, Record, Year};
pub use selection::{ChartType, MultiSelect, Pick, Selection, Tab};
pub use transform::{
    aggregate_by_country, filtered_rows, pivot_by_year, series_key, shares,
    CountryTotals, PivotCell, PivotRow,
};
pub use presentation::{format_number, ChartSeries, Metadata};
pub use source::{
    load_all, spawn_load, Collection, CsvSource, DataSource, FetchError, HttpSource, LoadEvent,
};
pub use dashboard::{Dashboard, FetchFailure};
pub use config::{Config, Mode};
