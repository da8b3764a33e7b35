// lib.rs - Region view core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod capabilities;
pub mod codec;
pub mod config;
pub mod event;
pub mod geometry;
pub mod model;
pub mod polyline;
pub mod reducer;
pub mod region;
pub mod resolver;
pub mod stats;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use app::{App, Model, ViewModel};
pub use capabilities::{Capabilities, Effect, LocationOperation};
pub use codec::{encode, parse_path, UrlParams};
pub use config::Settings;
pub use event::Event;
pub use model::{default_filters, CompareTime, FilterId, FilterSet, Overlay, ViewMode, ViewState};
pub use reducer::{reduce, Action, Transition};
pub use region::{decode_region, encode_region, GistId, ProjectId, Region};
pub use resolver::{
    CoordinateOrder, FetchReply, FetchStage, ResolveFailure, ResolvedRegion, Step,
};
pub use crux_core::{render::Render, App as CruxApp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidRegionType,
    InvalidRegionPayload,
    UnknownReference,
    IncompatibleReference,
    Transport,
    MalformedGeometry,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidRegionType => "INVALID_REGION_TYPE",
            Self::InvalidRegionPayload => "INVALID_REGION_PAYLOAD",
            Self::UnknownReference => "UNKNOWN_REFERENCE",
            Self::IncompatibleReference => "INCOMPATIBLE_REFERENCE",
            Self::Transport => "TRANSPORT_ERROR",
            Self::MalformedGeometry => "MALFORMED_GEOMETRY",
        }
    }

    /// Only transport failures may succeed on a later attempt; the resolver
    /// itself never retries.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transport)
    }
}

/// Which external service a reference region points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Hot,
    Gist,
}

impl ReferenceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hot => "hot project",
            Self::Gist => "gist",
        }
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    #[error("unknown region type '{0}'")]
    InvalidRegionType(String),

    #[error("invalid {region_type} payload: {reason}")]
    InvalidRegionPayload {
        region_type: &'static str,
        reason: String,
    },

    #[error("unknown {kind} '{id}'")]
    UnknownReference { kind: ReferenceKind, id: String },

    #[error("incompatible gist '{id}': no polygon.geojson or map.geojson file")]
    IncompatibleReference { id: String },

    /// `status` is set when the server answered with a non-2xx code.
    #[error("transport error: {reason}")]
    Transport { status: Option<u16>, reason: String },

    #[error("malformed geometry: {reason}")]
    MalformedGeometry { reason: String },
}

impl RegionError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRegionType(_) => ErrorKind::InvalidRegionType,
            Self::InvalidRegionPayload { .. } => ErrorKind::InvalidRegionPayload,
            Self::UnknownReference { .. } => ErrorKind::UnknownReference,
            Self::IncompatibleReference { .. } => ErrorKind::IncompatibleReference,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::MalformedGeometry { .. } => ErrorKind::MalformedGeometry,
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub(crate) fn payload(region_type: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRegionPayload {
            region_type,
            reason: reason.into(),
        }
    }

    pub(crate) fn transport(status: Option<u16>, reason: impl Into<String>) -> Self {
        Self::Transport {
            status,
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedGeometry {
            reason: reason.into(),
        }
    }
}

pub type RegionResult<T> = Result<T, RegionError>;
