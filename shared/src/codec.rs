//! Whole-path URL codec.
//!
//! ```text
//! /<view>[/<type>:<payload>]/<options>[/embed][/<theme>]
//! ```
//!
//! `options` is `<filters>/<overlay>`, `<times>/<filters>` for compare, or
//! `<filters>` for the gaps views.

use crate::model::{
    format_filters, format_times, OptionsShape, ViewMode, ViewState, DEFAULT_THEME,
};
use crate::reducer::Action;
use crate::region::encode_region;
use crate::RegionResult;

pub const EMBED_SEGMENT: &str = "embed";

/// Serializes the URL-relevant part of `state`.
///
/// Fails only when the region cannot be encoded (a polygon with
/// non-finite points).
pub fn encode(state: &ViewState) -> RegionResult<String> {
    let view = state.view.url_view();
    let mut path = format!("/{view}");

    if let Some(region) = &state.region {
        path.push('/');
        path.push_str(&encode_region(region)?);
    }

    let filters = format_filters(&state.filters);
    let options = match view.options_shape() {
        OptionsShape::TimesFilters => format!("{}/{filters}", format_times(&state.times)),
        OptionsShape::FiltersOnly => filters,
        OptionsShape::FiltersOverlay => format!("{filters}/{}", state.overlay),
    };
    path.push('/');
    path.push_str(&options);

    if state.is_embedded() {
        path.push('/');
        path.push_str(EMBED_SEGMENT);
    }

    if !state.theme.is_empty() && state.theme != DEFAULT_THEME {
        path.push('/');
        path.push_str(&state.theme);
    }

    Ok(path)
}

/// Raw path segments, before any validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlParams {
    pub view: Option<String>,
    pub region: Option<String>,
    pub times: Option<String>,
    pub filters: Option<String>,
    pub overlay: Option<String>,
    pub embed: bool,
    pub theme: Option<String>,
}

impl UrlParams {
    /// The "from url" actions for this path, in the order they must be
    /// applied: the view goes first so explicit filters are not reset by
    /// a later view switch.
    #[must_use]
    pub fn into_actions(self) -> Vec<Action> {
        vec![
            Action::SetViewFromUrl(self.view),
            Action::SetRegionFromUrl(Some(self.region.unwrap_or_default())),
            Action::SetTimesFromUrl(self.times),
            Action::SetFiltersFromUrl(self.filters),
            Action::SetOverlayFromUrl(self.overlay),
            Action::SetEmbedFromUrl(Some(self.embed)),
            Action::SetThemeFromUrl(Some(
                self.theme.unwrap_or_else(|| DEFAULT_THEME.to_string()),
            )),
        ]
    }
}

/// Splits a location path (a leading `#` is ignored) into its segments.
///
/// A segment right after the view counts as the region when it contains
/// `:`. Unknown views are read with the default options shape.
#[must_use]
pub fn parse_path(path: &str) -> UrlParams {
    let mut segments = path
        .trim_start_matches('#')
        .split('/')
        .filter(|s| !s.is_empty())
        .peekable();
    let mut params = UrlParams::default();

    let Some(view) = segments.next() else {
        return params;
    };
    params.view = Some(view.to_string());

    if segments.peek().is_some_and(|s| s.contains(':')) {
        params.region = segments.next().map(str::to_string);
    }

    let mut next = || segments.next().map(str::to_string);
    match ViewMode::parse(view).map_or(OptionsShape::FiltersOverlay, ViewMode::options_shape) {
        OptionsShape::TimesFilters => {
            params.times = next();
            params.filters = next();
        }
        OptionsShape::FiltersOnly => {
            params.filters = next();
        }
        OptionsShape::FiltersOverlay => {
            params.filters = next();
            params.overlay = next();
        }
    }

    if segments.peek() == Some(&EMBED_SEGMENT) {
        segments.next();
        params.embed = true;
    }
    params.theme = segments.next().map(str::to_string);

    params
}
