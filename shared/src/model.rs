use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::region::Region;

pub const COMPARE_TIME_OPTIONS: &[&str] = &[
    "2007", "2008", "2009", "2010", "2011", "2012", "2013", "2014", "2015", "2016", "now",
];
pub const INITIAL_TIMES: [&str; 2] = ["2011", "now"];

pub const STANDARD_FILTERS: &[&str] = &["buildings", "highways"];
pub const GAPS_FILTERS: &[&str] = &["buildings-vs-ghs"];

pub const DEFAULT_THEME: &str = "default";
pub const NO_FILTERS: &str = "none";
pub const TIMES_SEPARATOR: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    /// Placeholder until the first region is chosen.
    #[default]
    Default,
    Show,
    Compare,
    Gaps,
    GapsRegion,
    Country,
}

/// Which option segments follow the region in a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsShape {
    /// `<filters>/<overlay>`
    FiltersOverlay,
    /// `<times>/<filters>`
    TimesFilters,
    /// `<filters>`
    FiltersOnly,
}

impl ViewMode {
    pub const ALL: [ViewMode; 6] = [
        ViewMode::Default,
        ViewMode::Show,
        ViewMode::Compare,
        ViewMode::Gaps,
        ViewMode::GapsRegion,
        ViewMode::Country,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Show => "show",
            Self::Compare => "compare",
            Self::Gaps => "gaps",
            Self::GapsRegion => "gaps-region",
            Self::Country => "country",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|view| view.as_str() == s)
    }

    /// The view name written to URLs.
    #[must_use]
    pub const fn url_view(self) -> Self {
        match self {
            Self::GapsRegion => Self::Gaps,
            Self::Country => Self::Show,
            other => other,
        }
    }

    #[must_use]
    pub const fn options_shape(self) -> OptionsShape {
        match self.url_view() {
            Self::Compare => OptionsShape::TimesFilters,
            Self::Gaps => OptionsShape::FiltersOnly,
            _ => OptionsShape::FiltersOverlay,
        }
    }

    #[must_use]
    pub const fn uses_gaps_filters(self) -> bool {
        matches!(self, Self::Gaps | Self::GapsRegion)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Overlay {
    #[default]
    Recency,
    Experience,
    Osm,
}

impl Overlay {
    pub const ALL: [Overlay; 3] = [Overlay::Recency, Overlay::Experience, Overlay::Osm];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recency => "recency",
            Self::Experience => "experience",
            Self::Osm => "osm",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|overlay| overlay.as_str() == s)
    }
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time id from [`COMPARE_TIME_OPTIONS`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CompareTime(String);

impl CompareTime {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        COMPARE_TIME_OPTIONS
            .contains(&s)
            .then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CompareTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown compare time '{value}'"))
    }
}

impl From<CompareTime> for String {
    fn from(time: CompareTime) -> Self {
        time.0
    }
}

impl fmt::Display for CompareTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type CompareTimes = [CompareTime; 2];

/// Parses `<time>...<time>`; both ids must be known and there must be
/// exactly two.
#[must_use]
pub fn parse_times(s: &str) -> Option<CompareTimes> {
    let (first, second) = s.split_once(TIMES_SEPARATOR)?;
    Some([CompareTime::parse(first)?, CompareTime::parse(second)?])
}

#[must_use]
pub fn format_times(times: &CompareTimes) -> String {
    format!("{}{TIMES_SEPARATOR}{}", times[0], times[1])
}

fn initial_times() -> CompareTimes {
    INITIAL_TIMES.map(|t| CompareTime(t.to_string()))
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct FilterId(String);

impl FilterId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, so serialization is sorted and duplicate-free by construction.
pub type FilterSet = BTreeSet<FilterId>;

/// The filter set a view starts with. Views that share a default set keep
/// the user's filters when switching between them.
#[must_use]
pub fn default_filters(view: ViewMode) -> FilterSet {
    let ids = if view.uses_gaps_filters() {
        GAPS_FILTERS
    } else {
        STANDARD_FILTERS
    };
    ids.iter().map(|id| FilterId::new(*id)).collect()
}

/// `none` for the empty set, otherwise the sorted ids joined by commas.
#[must_use]
pub fn format_filters(filters: &FilterSet) -> String {
    if filters.is_empty() {
        return NO_FILTERS.to_string();
    }
    filters
        .iter()
        .map(FilterId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[must_use]
pub fn parse_filters(s: &str) -> FilterSet {
    if s == NO_FILTERS {
        return FilterSet::new();
    }
    s.split(',')
        .filter(|id| !id.is_empty())
        .map(FilterId::new)
        .collect()
}

/// Everything the URL reflects. Each transition produces a fresh value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ViewState {
    pub view: ViewMode,
    pub times: CompareTimes,
    pub region: Option<Region>,
    pub filters: FilterSet,
    pub overlay: Overlay,
    pub theme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<bool>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            view: ViewMode::Default,
            times: initial_times(),
            region: None,
            filters: default_filters(ViewMode::Default),
            overlay: Overlay::default(),
            theme: DEFAULT_THEME.to_string(),
            embed: None,
        }
    }
}

impl ViewState {
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.embed.unwrap_or(false)
    }
}
