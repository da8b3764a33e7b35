use crux_core::testing::AppTester;
use shared::{Action, Effect, Event, FilterId, Model, Overlay, Region, ViewMode};

fn replaced_paths(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Location(request) => Some(request.operation.path().to_string()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_user_session_keeps_url_in_sync() {
    let app = AppTester::<shared::App, Effect>::default();
    let mut model = Model::default();

    // 1. Pick a region on a fresh session
    let update = app.update(
        Event::RegionSelected {
            region: Region::bbox(1.0, 2.0, 3.0, 4.0),
        },
        &mut model,
    );
    assert_eq!(model.state.view, ViewMode::Show);
    assert_eq!(
        replaced_paths(&update.effects),
        vec!["/show/bbox:1.00000,2.00000,3.00000,4.00000/buildings,highways/recency"]
    );

    // 2. Clear filters one by one and switch overlay
    for id in ["buildings", "highways"] {
        app.update(
            Event::Action(Action::DisableFilter(FilterId::new(id))),
            &mut model,
        );
    }
    let update = app.update(Event::Action(Action::SetOverlay(Overlay::Osm)), &mut model);
    assert_eq!(
        replaced_paths(&update.effects),
        vec!["/show/bbox:1.00000,2.00000,3.00000,4.00000/none/osm"]
    );

    // 3. Compare keeps the (empty) filters, gaps resets them
    let update = app.update(Event::Action(Action::SetView(ViewMode::Compare)), &mut model);
    assert_eq!(
        replaced_paths(&update.effects),
        vec!["/compare/bbox:1.00000,2.00000,3.00000,4.00000/2011...now/none"]
    );
    let update = app.update(Event::Action(Action::SetView(ViewMode::Gaps)), &mut model);
    assert_eq!(
        replaced_paths(&update.effects),
        vec!["/gaps/bbox:1.00000,2.00000,3.00000,4.00000/buildings-vs-ghs"]
    );

    // 4. gaps -> gaps-region shares the default set
    app.update(
        Event::Action(Action::EnableFilter(FilterId::new("extra"))),
        &mut model,
    );
    let update = app.update(
        Event::Action(Action::SetView(ViewMode::GapsRegion)),
        &mut model,
    );
    assert_eq!(
        replaced_paths(&update.effects),
        vec!["/gaps/bbox:1.00000,2.00000,3.00000,4.00000/buildings-vs-ghs,extra"]
    );
}

#[test]
fn test_shared_link_restores_session() {
    let app = AppTester::<shared::App, Effect>::default();

    // A session produces a link...
    let mut sender = Model::default();
    app.update(
        Event::RegionSelected {
            region: Region::hot(981),
        },
        &mut sender,
    );
    app.update(Event::Action(Action::SetOverlay(Overlay::Experience)), &mut sender);
    app.update(
        Event::Action(Action::EnableFilter(FilterId::new("waterways"))),
        &mut sender,
    );
    let link = sender.last_path.clone().expect("a path was written");

    // ...which a fresh session opens.
    let mut restored = Model::default();
    let update = app.update(Event::UrlChanged { path: format!("#{link}") }, &mut restored);

    assert!(replaced_paths(&update.effects).is_empty());
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Render(_))));
    assert_eq!(restored.state.view, sender.state.view);
    assert_eq!(restored.state.region, sender.state.region);
    assert_eq!(restored.state.filters, sender.state.filters);
    assert_eq!(restored.state.overlay, sender.state.overlay);
    assert_eq!(app.view(&restored).path.as_deref(), Some(link.as_str()));
}

#[test]
fn test_bad_url_segments_are_ignored() {
    let app = AppTester::<shared::App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::UrlChanged {
            path: "/show/hot:5/buildings/osm".into(),
        },
        &mut model,
    );
    let before = model.state.clone();

    // Unknown region type, overlay, and view all leave the state alone.
    app.update(
        Event::UrlChanged {
            path: "/satellite/circle:1,2/buildings/heatmap".into(),
        },
        &mut model,
    );
    assert_eq!(model.state.region, before.region);
    assert_eq!(model.state.overlay, before.overlay);
    assert_eq!(model.state.view, before.view);
}

#[test]
fn test_embed_and_theme_from_url() {
    let app = AppTester::<shared::App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::UrlChanged {
            path: "/show/gist:abc/none/recency/embed/dark".into(),
        },
        &mut model,
    );
    assert_eq!(model.state.embed, Some(true));
    assert_eq!(model.state.theme, "dark");

    // A later user action writes both back.
    let update = app.update(Event::Action(Action::SetOverlay(Overlay::Osm)), &mut model);
    assert_eq!(
        replaced_paths(&update.effects),
        vec!["/show/gist:abc/none/osm/embed/dark"]
    );

    // A link without them resets to defaults.
    app.update(
        Event::UrlChanged {
            path: "/show/gist:abc/none/osm".into(),
        },
        &mut model,
    );
    assert_eq!(model.state.embed, Some(false));
    assert_eq!(model.state.theme, "default");
}

#[test]
fn test_hostile_polygon_link_is_ignored() {
    let app = AppTester::<shared::App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::UrlChanged {
            path: "/show/bbox:1,2,3,4/buildings/osm".into(),
        },
        &mut model,
    );
    let before = model.state.clone();

    // Every delta maxes out the varint; accumulating them must not wrap.
    let payload = format!("{}F", "~".repeat(12)).repeat(8);
    let update = app.update(
        Event::UrlChanged {
            path: format!("/show/polygon:{payload}/buildings/osm"),
        },
        &mut model,
    );

    assert_eq!(model.state.region, before.region);
    assert!(replaced_paths(&update.effects).is_empty());
}

#[test]
fn test_out_of_range_polygon_writes_no_url() {
    let app = AppTester::<shared::App, Effect>::default();
    let mut model = Model::default();

    let region = Region::Polygon {
        coords: vec![[-1e300, 0.0], [1e300, 0.0], [0.0, 1.0]],
    };
    let update = app.update(Event::RegionSelected { region: region.clone() }, &mut model);

    assert_eq!(model.state.region, Some(region));
    assert!(replaced_paths(&update.effects).is_empty());
    assert_eq!(app.view(&model).path, None);
}
