use geojson::Feature;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capabilities::Capabilities;
use crate::codec::{self, parse_path};
use crate::config::Settings;
use crate::event::Event;
use crate::model::{ViewMode, ViewState, COMPARE_TIME_OPTIONS};
use crate::reducer::{reduce, Action, Transition};
use crate::region::Region;
use crate::resolver::{
    self, CoordinateOrder, FetchReply, FetchStage, ResolveFailure, ResolvedRegion, Step,
};
use crate::stats::{Brush, TimeRange};
use crate::RegionError;

#[derive(Default)]
pub struct App;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub state: ViewState,
    pub brush: Brush,
    /// Chart selection; local to the session, never written to the URL.
    pub time_filter: Option<TimeRange>,
    /// Last path handed to the shell.
    pub last_path: Option<String>,

    pub settings: Settings,
    pub coordinate_order: CoordinateOrder,
    /// Region with a request in flight. Replies for any other region are stale.
    pub resolving: Option<Region>,
    pub resolved: Option<ResolvedRegion>,
    pub resolve_error: Option<ResolveFailure>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub state: ViewState,
    /// Encoded form of `state`; `None` if the region cannot be encoded.
    pub path: Option<String>,
    pub time_filter: Option<TimeRange>,
    pub is_embedded: bool,
    pub has_region: bool,
    pub compare_time_options: Vec<String>,
    /// Geometry of the current region, once resolved.
    pub feature: Option<Feature>,
    pub resolving: bool,
    pub resolve_error: Option<ResolveFailure>,
}

impl App {
    fn apply(action: Action, model: &mut Model, caps: &Capabilities) {
        let Transition { state, url } = reduce(&model.state, action);
        model.state = state;

        if let Some(path) = url {
            caps.location.replace(path.clone());
            model.last_path = Some(path);
        }
    }

    fn start_resolution(model: &mut Model, caps: &Capabilities) {
        model.resolving = None;
        model.resolved = None;
        model.resolve_error = None;

        let Some(region) = model.state.region.clone() else {
            return;
        };
        match resolver::start(&region, &model.settings) {
            Ok(step) => Self::follow(region, step, model, caps),
            Err(err) => Self::fail(&err, model),
        }
    }

    fn continue_resolution(
        region: Region,
        stage: FetchStage,
        reply: FetchReply,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        if model.resolving.as_ref() != Some(&region) {
            debug!(%stage, region_type = region.type_name(), "dropping stale reply");
            return;
        }
        match resolver::advance(&region, stage, reply) {
            Ok(step) => Self::follow(region, step, model, caps),
            Err(err) => Self::fail(&err, model),
        }
    }

    fn follow(region: Region, step: Step, model: &mut Model, caps: &Capabilities) {
        match step {
            Step::Done(feature) => {
                model.resolving = None;
                model.resolved = Some(ResolvedRegion {
                    feature: resolver::finish(feature, model.coordinate_order),
                    region,
                });
            }
            Step::Fetch { url, stage } => {
                debug!(%url, %stage, "fetching region");
                model.resolving = Some(region.clone());
                caps.http.get(&url).send(move |result| Event::RegionFetched {
                    region,
                    stage,
                    reply: FetchReply::from(result),
                });
            }
        }
    }

    fn fail(err: &RegionError, model: &mut Model) {
        warn!(code = err.code(), %err, "region resolution failed");
        model.resolving = None;
        model.resolve_error = Some(ResolveFailure::from(err));
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(
            event = event.name(),
            user_initiated = event.is_user_initiated(),
            "update"
        );
        let previous_region = model.state.region.clone();

        match event {
            Event::Noop => return,

            Event::Action(action) => Self::apply(action, model, caps),

            Event::RegionSelected { region } => {
                Self::apply(Action::SetRegion(Some(region)), model, caps);
            }
            Event::RegionCleared => Self::apply(Action::SetRegion(None), model, caps),

            Event::UrlChanged { path } => {
                for action in parse_path(&path).into_actions() {
                    Self::apply(action, model, caps);
                }
            }

            Event::BrushStarted { time_ms } => model.brush.start(time_ms),
            Event::BrushEnded { time_ms } => {
                model.time_filter = model.brush.end(time_ms);
                debug!(filter = ?model.time_filter, "time filter changed");
            }

            Event::Configure { settings } => match settings.validate() {
                Ok(()) => model.settings = settings,
                Err(err) => warn!(%err, "ignoring settings"),
            },
            Event::ResolveRegion { order } => {
                model.coordinate_order = order;
                Self::start_resolution(model, caps);
            }
            Event::RegionFetched {
                region,
                stage,
                reply,
            } => Self::continue_resolution(region, stage, reply, model, caps),
        }

        if model.state.region != previous_region {
            Self::start_resolution(model, caps);
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        let feature = model
            .resolved
            .as_ref()
            .filter(|resolved| resolved.is_current(model.state.region.as_ref()))
            .map(|resolved| resolved.feature.clone());

        ViewModel {
            state: model.state.clone(),
            path: codec::encode(&model.state).ok(),
            time_filter: model.time_filter,
            is_embedded: model.state.is_embedded(),
            has_region: model.state.region.is_some() && model.state.view != ViewMode::Default,
            compare_time_options: COMPARE_TIME_OPTIONS.iter().map(ToString::to_string).collect(),
            feature,
            resolving: model.resolving.is_some(),
            resolve_error: model.resolve_error.clone(),
        }
    }
}
