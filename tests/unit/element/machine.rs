use super::*;
use crate::element::{
    attrs::{BLURHASH, DEBUG, DEBUG_DELAY, SRC, SRC_HEIGHT, SRC_WIDTH},
    host::{HostCall, RecordingHost},
};

const HASH: &str = "LGF5?]00~q%M-;%M%M9Fxu-;tRof";

fn placeholder_attrs(extra: &[(&str, &str)]) -> ElementAttrs {
    let mut attrs = ElementAttrs::from_pairs([
        (SRC, "img/a.jpg"),
        (SRC_WIDTH, "400"),
        (SRC_HEIGHT, "300"),
        (BLURHASH, HASH),
    ]);
    for (k, v) in extra {
        attrs.set(k, Some(*v));
    }
    attrs
}

fn attached(extra: &[(&str, &str)]) -> (ProgressiveImage, RecordingHost) {
    let mut host = RecordingHost::new();
    let mut el = ProgressiveImage::new(placeholder_attrs(extra), ElementConfig::default())
        .expect("default config is valid");
    el.on_attach(&mut host);
    (el, host)
}

fn enter_view(el: &mut ProgressiveImage, host: &mut RecordingHost) {
    let observer = el.observer().expect("placeholder mode observes");
    el.on_visibility_change(host, observer, true);
}

fn only_fetch(host: &RecordingHost) -> FetchTicket {
    let fetches = host.live_fetches();
    assert_eq!(fetches.len(), 1, "expected exactly one live fetch");
    fetches[0].0
}

#[test]
fn attach_renders_then_observes() {
    let (el, host) = attached(&[]);
    assert_eq!(el.phase(), &Phase::Unloaded);
    assert!(matches!(host.calls()[0], HostCall::Render(_)));
    let HostCall::Observe(handle, options) = &host.calls()[1] else {
        panic!("expected observe after render");
    };
    assert_eq!(Some(*handle), el.observer());
    assert_eq!(options.threshold, 0.1);
    assert_eq!(options.root_margin(), "50px");
    assert_eq!(host.fetch_count(), 0);
}

#[test]
fn entering_view_fetches_immediately_without_debug() {
    let (mut el, mut host) = attached(&[]);
    enter_view(&mut el, &mut host);
    assert!(el.is_in_viewport());
    assert!(matches!(el.phase(), Phase::Loading { .. }));
    assert_eq!(host.live_fetches()[0].1, "img/a.jpg");
    assert_eq!(el.layers().image, ImageLayer::Fetching);
}

#[test]
fn fast_load_reveals_instantly() {
    let (mut el, mut host) = attached(&[]);
    enter_view(&mut el, &mut host);
    let ticket = only_fetch(&host);
    host.advance(Duration::from_millis(50));
    host.complete_fetch(ticket);
    el.on_image_load(&mut host, ticket);

    assert!(el.is_loaded());
    assert_eq!(el.transition(), Some(TransitionMode::Instant));
    assert_eq!(el.layers().placeholder, PlaceholderLayer::FadingOut);
    let events = host.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::ImageLoaded);
    assert_eq!(events[0].detail.src, "img/a.jpg");
    assert!(events[0].bubbles && events[0].composed);
}

#[test]
fn slow_load_cross_fades() {
    let (mut el, mut host) = attached(&[]);
    enter_view(&mut el, &mut host);
    let ticket = only_fetch(&host);
    host.advance(Duration::from_millis(200));
    el.on_image_load(&mut host, ticket);
    assert_eq!(el.transition(), Some(TransitionMode::Animated));
    assert_eq!(
        host.last_layers().map(|l| l.image),
        Some(ImageLayer::Revealed(TransitionMode::Animated))
    );
}

#[test]
fn failed_fetch_shows_error_layer_and_emits_once() {
    let (mut el, mut host) = attached(&[]);
    enter_view(&mut el, &mut host);
    let ticket = only_fetch(&host);
    el.on_image_error(&mut host, ticket, "404");

    assert_eq!(
        el.phase(),
        &Phase::Errored {
            reason: "404".to_string()
        }
    );
    assert!(el.layers().error_visible);
    assert_eq!(el.layers().image, ImageLayer::Withheld);
    assert_eq!(host.events().len(), 1);
    assert_eq!(host.events()[0].kind, EventKind::ImageError);

    // Leaving and re-entering view does not retry.
    let observer = el.observer().expect("still observing");
    el.on_visibility_change(&mut host, observer, false);
    el.on_visibility_change(&mut host, observer, true);
    assert_eq!(host.fetch_count(), 1);
    assert_eq!(host.events().len(), 1);
}

#[test]
fn debug_mode_leaving_view_cancels_pending_load() {
    let (mut el, mut host) = attached(&[(DEBUG, "")]);
    enter_view(&mut el, &mut host);
    let Phase::PendingLoad { timer } = *el.phase() else {
        panic!("expected pending load");
    };
    assert!(el.layers().pending_indicator);
    assert_eq!(host.live_timers(), vec![timer]);

    let observer = el.observer().expect("observing");
    el.on_visibility_change(&mut host, observer, false);
    assert_eq!(el.phase(), &Phase::Unloaded);
    assert!(host.live_timers().is_empty());
    assert!(!el.layers().pending_indicator);

    host.advance(Duration::from_secs(10));
    el.on_timer(&mut host, timer);
    assert_eq!(host.fetch_count(), 0);
    assert!(host.events().is_empty());
}

#[test]
fn debug_delay_defaults_to_three_seconds_and_can_be_overridden() {
    let (mut el, mut host) = attached(&[(DEBUG, "")]);
    enter_view(&mut el, &mut host);
    let Phase::PendingLoad { timer } = *el.phase() else {
        panic!("expected pending load");
    };
    assert!(
        host.calls()
            .contains(&HostCall::SetTimeout(timer, Duration::from_millis(3000)))
    );

    let (mut el, mut host) = attached(&[(DEBUG, ""), (DEBUG_DELAY, "750")]);
    enter_view(&mut el, &mut host);
    host.advance(Duration::from_millis(749));
    assert!(host.take_due_timers().is_empty());
    host.advance(Duration::from_millis(1));
    let due = host.take_due_timers();
    assert_eq!(due.len(), 1);
    el.on_timer(&mut host, due[0]);
    assert!(matches!(el.phase(), Phase::Loading { .. }));
    assert!(!el.layers().pending_indicator);
    assert_eq!(host.fetch_count(), 1);
}

#[test]
fn attribute_change_resets_and_recreates_observer() {
    let (mut el, mut host) = attached(&[(DEBUG, "")]);
    let first = el.observer().expect("observing");
    enter_view(&mut el, &mut host);
    let Phase::PendingLoad { timer } = *el.phase() else {
        panic!("expected pending load");
    };

    el.on_attribute_change(&mut host, SRC, Some("img/b.jpg"));
    assert_eq!(el.phase(), &Phase::Unloaded);
    assert!(host.calls().contains(&HostCall::ClearTimeout(timer)));
    assert!(host.calls().contains(&HostCall::Disconnect(first)));
    let second = el.observer().expect("observing again");
    assert_ne!(first, second);
    assert_eq!(host.live_observers(), vec![second]);
    assert_eq!(host.render_count(), 2);

    // Callbacks from the old observer and timer are ignored.
    el.on_visibility_change(&mut host, first, true);
    el.on_timer(&mut host, timer);
    assert_eq!(el.phase(), &Phase::Unloaded);
    assert_eq!(host.fetch_count(), 0);
}

#[test]
fn same_value_and_unwatched_attributes_do_not_reset() {
    let (mut el, mut host) = attached(&[]);
    el.on_attribute_change(&mut host, SRC, Some("img/a.jpg"));
    el.on_attribute_change(&mut host, "data-note", Some("x"));
    assert_eq!(host.render_count(), 1);
    assert_eq!(el.attrs().get("data-note"), Some("x"));
}

#[test]
fn change_during_loading_abandons_and_ignores_stale_completion() {
    let (mut el, mut host) = attached(&[]);
    enter_view(&mut el, &mut host);
    let stale = only_fetch(&host);

    el.on_attribute_change(&mut host, BLURHASH, Some("00AQtR"));
    assert!(host.calls().contains(&HostCall::AbandonFetch(stale)));
    assert!(host.live_fetches().is_empty());

    enter_view(&mut el, &mut host);
    let fresh = only_fetch(&host);
    assert_ne!(stale, fresh);

    el.on_image_load(&mut host, stale);
    el.on_image_error(&mut host, stale, "late");
    assert!(matches!(el.phase(), Phase::Loading { .. }));
    assert!(host.events().is_empty());

    el.on_image_load(&mut host, fresh);
    assert!(el.is_loaded());
    assert_eq!(host.events().len(), 1);
}

#[test]
fn fallback_mode_neither_observes_nor_fetches() {
    let mut host = RecordingHost::new();
    let attrs = ElementAttrs::from_pairs([(SRC, "a.jpg"), (SRC_WIDTH, "400"), (SRC_HEIGHT, "300")]);
    let mut el = ProgressiveImage::new(attrs, ElementConfig::default()).expect("valid config");
    el.on_attach(&mut host);

    assert!(el.observer().is_none());
    assert!(host.live_observers().is_empty());
    assert!(!el.plan().expect("rendered").is_placeholder());
    let html = el.to_html().expect("rendered");
    assert!(!html.contains("blurest-backdrop"));
    assert!(html.contains(r#"loading="lazy""#));
    assert_eq!(host.fetch_count(), 0);
    assert!(host.events().is_empty());
}

#[test]
fn placeholder_without_src_never_fetches() {
    let mut host = RecordingHost::new();
    let attrs = ElementAttrs::from_pairs([(SRC_WIDTH, "4"), (SRC_HEIGHT, "3"), (BLURHASH, HASH)]);
    let mut el = ProgressiveImage::new(attrs, ElementConfig::default()).expect("valid config");
    el.on_attach(&mut host);
    enter_view(&mut el, &mut host);
    assert_eq!(el.phase(), &Phase::Unloaded);
    assert_eq!(host.fetch_count(), 0);
}

#[test]
fn detach_before_view_leaves_nothing_behind() {
    let mut host = RecordingHost::new();
    let mut a = ProgressiveImage::new(placeholder_attrs(&[]), ElementConfig::default())
        .expect("valid config");
    let mut b = ProgressiveImage::new(placeholder_attrs(&[(DEBUG, "")]), ElementConfig::default())
        .expect("valid config");
    a.on_attach(&mut host);
    b.on_attach(&mut host);
    assert_eq!(host.live_observers().len(), 2);

    a.on_detach(&mut host);
    b.on_detach(&mut host);
    assert!(host.live_observers().is_empty());
    assert!(a.to_html().is_none());
    assert!(!b.is_attached());
    assert_eq!(host.fetch_count(), 0);
    assert!(host.events().is_empty());
}

#[test]
fn detached_attribute_change_only_records_value() {
    let mut host = RecordingHost::new();
    let mut el = ProgressiveImage::new(placeholder_attrs(&[]), ElementConfig::default())
        .expect("valid config");
    el.on_attribute_change(&mut host, SRC, Some("img/c.jpg"));
    assert!(host.calls().is_empty());
    el.on_attach(&mut host);
    assert_eq!(el.plan().and_then(RenderPlan::src), Some("img/c.jpg"));
}

#[test]
fn invalid_config_is_rejected() {
    let config = ElementConfig {
        visibility_threshold: 2.0,
        ..ElementConfig::default()
    };
    assert!(ProgressiveImage::new(placeholder_attrs(&[]), config).is_err());
}
