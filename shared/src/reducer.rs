//! View state machine.
//!
//! `reduce` is pure: it takes the current snapshot and an action and
//! returns the next snapshot together with the path the shell should
//! switch to. User-driven actions always produce a path. Actions read
//! from the URL never do, so applying a URL cannot loop back into
//! another URL change.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::codec;
use crate::model::{
    default_filters, parse_filters, parse_times, CompareTimes, FilterId, Overlay, ViewMode,
    ViewState,
};
use crate::region::{decode_region, Region};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Action {
    SetRegion(Option<Region>),
    EnableFilter(FilterId),
    DisableFilter(FilterId),
    SetOverlay(Overlay),
    SetView(ViewMode),
    SetTimes(CompareTimes),

    SetRegionFromUrl(Option<String>),
    SetFiltersFromUrl(Option<String>),
    SetOverlayFromUrl(Option<String>),
    SetViewFromUrl(Option<String>),
    SetTimesFromUrl(Option<String>),
    SetEmbedFromUrl(Option<bool>),
    SetThemeFromUrl(Option<String>),
}

impl Action {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetRegion(_) => "set_region",
            Self::EnableFilter(_) => "enable_filter",
            Self::DisableFilter(_) => "disable_filter",
            Self::SetOverlay(_) => "set_overlay",
            Self::SetView(_) => "set_view",
            Self::SetTimes(_) => "set_times",
            Self::SetRegionFromUrl(_) => "set_region_from_url",
            Self::SetFiltersFromUrl(_) => "set_filters_from_url",
            Self::SetOverlayFromUrl(_) => "set_overlay_from_url",
            Self::SetViewFromUrl(_) => "set_view_from_url",
            Self::SetTimesFromUrl(_) => "set_times_from_url",
            Self::SetEmbedFromUrl(_) => "set_embed_from_url",
            Self::SetThemeFromUrl(_) => "set_theme_from_url",
        }
    }

    /// True for actions that mirror the URL into the state.
    #[must_use]
    pub const fn is_url_driven(&self) -> bool {
        matches!(
            self,
            Self::SetRegionFromUrl(_)
                | Self::SetFiltersFromUrl(_)
                | Self::SetOverlayFromUrl(_)
                | Self::SetViewFromUrl(_)
                | Self::SetTimesFromUrl(_)
                | Self::SetEmbedFromUrl(_)
                | Self::SetThemeFromUrl(_)
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: ViewState,
    /// Path to replace the current location with, if any.
    pub url: Option<String>,
}

pub fn reduce(state: &ViewState, action: Action) -> Transition {
    debug!(action = action.name(), "applying view transition");

    if action.is_url_driven() {
        return Transition {
            state: apply_from_url(state, action),
            url: None,
        };
    }

    let next = apply_user(state, action);
    let url = match codec::encode(&next) {
        Ok(path) => Some(path),
        Err(err) => {
            warn!(error = %err, code = err.code(), "state cannot be written to the url");
            None
        }
    };

    Transition { state: next, url }
}

fn apply_user(state: &ViewState, action: Action) -> ViewState {
    match action {
        Action::SetRegion(region) => with_region(state, region),
        Action::EnableFilter(filter) => {
            if state.filters.contains(&filter) {
                return state.clone();
            }
            let mut next = state.clone();
            next.filters.insert(filter);
            next
        }
        Action::DisableFilter(filter) => {
            let mut next = state.clone();
            next.filters.remove(&filter);
            next
        }
        Action::SetOverlay(overlay) => ViewState {
            overlay,
            ..state.clone()
        },
        Action::SetView(view) => with_view(state, view),
        Action::SetTimes(times) => ViewState {
            times,
            ..state.clone()
        },
        url_driven => apply_from_url(state, url_driven),
    }
}

fn apply_from_url(state: &ViewState, action: Action) -> ViewState {
    match action {
        Action::SetRegionFromUrl(Some(fragment)) => match decode_region(&fragment) {
            Ok(Some(region)) => with_region(state, Some(region)),
            Ok(None) => ViewState {
                region: None,
                ..state.clone()
            },
            Err(err) => {
                warn!(error = %err, fragment = %fragment, "ignoring region from url");
                state.clone()
            }
        },
        Action::SetFiltersFromUrl(Some(text)) => ViewState {
            filters: parse_filters(&text),
            ..state.clone()
        },
        Action::SetOverlayFromUrl(Some(text)) => match Overlay::parse(&text) {
            Some(overlay) => ViewState {
                overlay,
                ..state.clone()
            },
            None => {
                warn!(overlay = %text, "ignoring unknown overlay from url");
                state.clone()
            }
        },
        Action::SetViewFromUrl(Some(text)) => match ViewMode::parse(&text) {
            Some(view) => with_view(state, view),
            None => {
                warn!(view = %text, "ignoring unknown view from url");
                state.clone()
            }
        },
        Action::SetTimesFromUrl(Some(text)) => match parse_times(&text) {
            Some(times) => ViewState {
                times,
                ..state.clone()
            },
            None => {
                warn!(times = %text, "ignoring malformed times from url");
                state.clone()
            }
        },
        Action::SetEmbedFromUrl(Some(embed)) => ViewState {
            embed: Some(embed),
            ..state.clone()
        },
        Action::SetThemeFromUrl(Some(theme)) => ViewState {
            theme,
            ..state.clone()
        },
        _ => state.clone(),
    }
}

/// Choosing a region moves a fresh session off the placeholder view.
fn with_region(state: &ViewState, region: Option<Region>) -> ViewState {
    let view = match state.view {
        ViewMode::Default => ViewMode::Show,
        view => view,
    };
    ViewState {
        view,
        region,
        ..state.clone()
    }
}

/// Filters survive a view switch only when both views share a default set.
fn with_view(state: &ViewState, view: ViewMode) -> ViewState {
    let filters = if default_filters(state.view) == default_filters(view) {
        state.filters.clone()
    } else {
        default_filters(view)
    };
    ViewState {
        view,
        filters,
        ..state.clone()
    }
}
