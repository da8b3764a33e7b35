use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::reducer::Action;
use crate::region::Region;
use crate::resolver::{CoordinateOrder, FetchReply, FetchStage};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    Noop,

    /// A view transition requested by the shell UI.
    Action(Action),

    /// The location changed outside the core (first load, back button,
    /// pasted link). Carries the path or hash fragment.
    UrlChanged { path: String },

    // Map convenience
    RegionSelected { region: Region },
    RegionCleared,

    // Stats chart brush, times in ms since epoch
    BrushStarted { time_ms: i64 },
    BrushEnded { time_ms: i64 },

    /// Replaces the reference endpoints; invalid settings are ignored.
    Configure { settings: Settings },

    /// (Re)resolve the current region, e.g. after a transport error or when
    /// the map wants lat/lon order.
    ResolveRegion { order: CoordinateOrder },

    // Internal: reply to a region request made through `http`
    RegionFetched {
        region: Region,
        stage: FetchStage,
        reply: FetchReply,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Action(action) => action.name(),
            Self::UrlChanged { .. } => "url_changed",
            Self::RegionSelected { .. } => "region_selected",
            Self::RegionCleared => "region_cleared",
            Self::BrushStarted { .. } => "brush_started",
            Self::BrushEnded { .. } => "brush_ended",
            Self::Configure { .. } => "configure",
            Self::ResolveRegion { .. } => "resolve_region",
            Self::RegionFetched { .. } => "region_fetched",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        match self {
            Self::Action(action) => !action.is_url_driven(),
            Self::RegionSelected { .. }
            | Self::RegionCleared
            | Self::BrushStarted { .. }
            | Self::BrushEnded { .. }
            | Self::ResolveRegion { .. } => true,
            Self::Noop
            | Self::UrlChanged { .. }
            | Self::Configure { .. }
            | Self::RegionFetched { .. } => false,
        }
    }
}

impl From<Action> for Event {
    fn from(action: Action) -> Self {
        Self::Action(action)
    }
}
