// ☑️ Selection State - what the user is currently looking at
// Country/year multi-selects with a "Select All" sentinel, chart type and active tab

use crate::model::{CountryId, Year};

// ============================================================================
// MULTI-SELECT
// ============================================================================

/// A value reported by a multi-select control.
/// `SelectAll` is the sentinel row at the top of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick<T> {
    SelectAll,
    One(T),
}

/// Ordered set of chosen values (insertion order, no duplicates)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSelect<T> {
    chosen: Vec<T>,
}

impl<T> Default for MultiSelect<T> {
    fn default() -> Self {
        Self { chosen: Vec::new() }
    }
}

impl<T: Copy + PartialEq> MultiSelect<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &[T] {
        &self.chosen
    }

    pub fn contains(&self, value: &T) -> bool {
        self.chosen.contains(value)
    }

    pub fn len(&self) -> usize {
        self.chosen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chosen.is_empty()
    }

    /// True when every value of `universe` is chosen
    pub fn covers(&self, universe: &[T]) -> bool {
        universe.iter().all(|v| self.chosen.contains(v))
    }

    /// Apply the control's new value.
    ///
    /// With the sentinel present the selection flips between "everything in
    /// `universe`" and "nothing", depending on whether it already covers the
    /// universe. Without it the selection becomes exactly the given values.
    pub fn apply<I>(&mut self, picks: I, universe: &[T])
    where
        I: IntoIterator<Item = Pick<T>>,
    {
        let mut select_all = false;
        let mut values = Vec::new();

        for pick in picks {
            match pick {
                Pick::SelectAll => select_all = true,
                Pick::One(v) => {
                    if !values.contains(&v) {
                        values.push(v);
                    }
                }
            }
        }

        if select_all {
            if self.covers(universe) {
                self.chosen.clear();
            } else {
                self.chosen = universe.to_vec();
            }
        } else {
            self.chosen = values;
        }
    }

    /// The value a multi-select control reports after `item` is clicked
    pub fn picks_after_click(&self, item: Pick<T>) -> Vec<Pick<T>> {
        let mut picks: Vec<Pick<T>> = self.chosen.iter().map(|v| Pick::One(*v)).collect();

        match item {
            Pick::SelectAll => picks.push(Pick::SelectAll),
            Pick::One(v) => {
                if self.contains(&v) {
                    picks.retain(|p| *p != Pick::One(v));
                } else {
                    picks.push(Pick::One(v));
                }
            }
        }

        picks
    }
}

// ============================================================================
// CHART TYPE & TABS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartType {
    #[default]
    Line,
    Bar,
    Pie,
}

impl ChartType {
    pub const ALL: [ChartType; 3] = [ChartType::Line, ChartType::Bar, ChartType::Pie];

    pub fn title(&self) -> &str {
        match self {
            ChartType::Line => "Line Chart",
            ChartType::Bar => "Bar Chart",
            ChartType::Pie => "Pie Chart",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Table,
    Chart,
    Metadata,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Table, Tab::Chart, Tab::Metadata];

    pub fn next(&self) -> Self {
        match self {
            Tab::Table => Tab::Chart,
            Tab::Chart => Tab::Metadata,
            Tab::Metadata => Tab::Table,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Tab::Table => Tab::Metadata,
            Tab::Chart => Tab::Table,
            Tab::Metadata => Tab::Chart,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Tab::Table => "Table",
            Tab::Chart => "Dashboard",
            Tab::Metadata => "Metadata",
        }
    }
}

// ============================================================================
// SELECTION
// ============================================================================

/// Current filter choices for one session.
/// Starts empty, on the line chart and the table tab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub countries: MultiSelect<CountryId>,
    pub years: MultiSelect<Year>,
    pub chart_type: ChartType,
    pub active_tab: Tab,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// `known` is every country id in the fetched collection
    pub fn toggle_country_selection<I>(&mut self, picks: I, known: &[CountryId])
    where
        I: IntoIterator<Item = Pick<CountryId>>,
    {
        self.countries.apply(picks, known);
    }

    /// `known` is every distinct year present in the records
    pub fn toggle_year_selection<I>(&mut self, picks: I, known: &[Year])
    where
        I: IntoIterator<Item = Pick<Year>>,
    {
        self.years.apply(picks, known);
    }

    pub fn set_chart_type(&mut self, kind: ChartType) {
        self.chart_type = kind;
    }

    pub fn set_active_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }
}

// ============================================================================
// TESTS
// ============================================================================
