mod location;

pub use self::location::{Location, LocationOperation};

pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::event::Event;

/// Shell-facing capabilities. `http` fetches reference regions (task
/// manager AOIs and gists).
#[derive(crux_core::macros::Effect)]
#[effect(app = "crate::app::App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub location: Location<Event>,
}
