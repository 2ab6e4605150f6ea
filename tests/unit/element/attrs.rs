use super::*;

const HASH: &str = "LGF5?]00~q%M-;%M%M9Fxu-;tRof";

#[test]
fn placeholder_source_needs_all_three_inputs() {
    let full = ElementAttrs::from_pairs([
        (SRC_WIDTH, "400"),
        (SRC_HEIGHT, "300"),
        (BLURHASH, HASH),
    ]);
    assert_eq!(
        full.placeholder_source(),
        Some(PlaceholderSource {
            width: 400,
            height: 300,
            blurhash: HASH
        })
    );

    let no_hash = ElementAttrs::from_pairs([(SRC_WIDTH, "400"), (SRC_HEIGHT, "300")]);
    assert_eq!(no_hash.placeholder_source(), None);

    let zero = ElementAttrs::from_pairs([(SRC_WIDTH, "0"), (SRC_HEIGHT, "300"), (BLURHASH, HASH)]);
    assert_eq!(zero.placeholder_source(), None);

    let junk = ElementAttrs::from_pairs([(SRC_WIDTH, "wide"), (SRC_HEIGHT, "300"), (BLURHASH, HASH)]);
    assert_eq!(junk.placeholder_source(), None);
}

#[test]
fn set_reports_changes_only() {
    let mut attrs = ElementAttrs::new();
    assert!(attrs.set(SRC, Some("a.jpg")));
    assert!(!attrs.set(SRC, Some("a.jpg")));
    assert!(attrs.set(SRC, Some("b.jpg")));
    assert!(attrs.set(SRC, None));
    assert!(!attrs.set(SRC, None));
}

#[test]
fn empty_values_count_as_absent() {
    let attrs = ElementAttrs::from_pairs([(SRC, "  "), (BLURHASH, "")]);
    assert_eq!(attrs.src(), None);
    assert_eq!(attrs.blurhash(), None);
    assert_eq!(attrs.alt(), "");
}

#[test]
fn render_width_adds_px_to_bare_numbers() {
    let attrs = ElementAttrs::from_pairs([(RENDER_WIDTH, "320")]);
    assert_eq!(attrs.render_width().as_deref(), Some("320px"));
    let attrs = ElementAttrs::from_pairs([(RENDER_WIDTH, "50%")]);
    assert_eq!(attrs.render_width().as_deref(), Some("50%"));
    assert_eq!(ElementAttrs::new().render_width(), None);
    let attrs = ElementAttrs::from_pairs([(RENDER_WIDTH, "12.5rem")]);
    assert_eq!(attrs.render_width().as_deref(), Some("12.5rem"));
}

#[test]
fn render_width_rejects_anything_but_a_length() {
    for junk in [
        r#"10px" onerror="alert(1)"#,
        "calc(100% - 2px)",
        "-5px",
        "10 px",
        "wide",
        "px",
    ] {
        let attrs = ElementAttrs::from_pairs([(RENDER_WIDTH, junk)]);
        assert_eq!(attrs.render_width(), None, "{junk}");
    }
}

#[test]
fn debug_flag_and_delay() {
    let default = Duration::from_millis(3000);
    let attrs = ElementAttrs::from_pairs([(DEBUG, "")]);
    assert!(attrs.debug());
    assert_eq!(attrs.debug_delay(default), default);

    let attrs = ElementAttrs::from_pairs([(DEBUG, ""), (DEBUG_DELAY, "750")]);
    assert_eq!(attrs.debug_delay(default), Duration::from_millis(750));

    let attrs = ElementAttrs::from_pairs([(DEBUG_DELAY, "soon")]);
    assert!(!attrs.debug());
    assert_eq!(attrs.debug_delay(default), default);
}

#[test]
fn display_flag_precedence() {
    assert_eq!(ElementAttrs::new().display(), DisplayMode::Block);
    let attrs = ElementAttrs::from_pairs([("grid", ""), ("inline-flex", "")]);
    assert_eq!(attrs.display(), DisplayMode::InlineFlex);
    assert_eq!(DisplayMode::InlineGrid.as_str(), "inline-grid");
}

#[test]
fn watched_attributes() {
    assert!(is_watched(BLURHASH));
    assert!(is_watched("inline-block"));
    assert!(!is_watched("class"));
}

#[test]
fn lookup_reply_deserializes_both_shapes() {
    let found: PlaceholderLookup = serde_json::from_str(&format!(
        r#"{{ "success": true, "blurhash": "{HASH}", "width": 640, "height": 480 }}"#
    ))
    .unwrap();
    assert_eq!(
        found,
        PlaceholderLookup::Found {
            blurhash: HASH.to_string(),
            width: 640,
            height: 480
        }
    );

    let failed: PlaceholderLookup =
        serde_json::from_str(r#"{ "success": false, "error": "not an image" }"#).unwrap();
    assert_eq!(
        failed,
        PlaceholderLookup::Failed {
            error: "not an image".to_string()
        }
    );

    let broken = serde_json::from_str::<PlaceholderLookup>(r#"{ "success": true }"#);
    assert!(broken.is_err());
}

#[test]
fn from_lookup_maps_success_and_falls_back_otherwise() {
    let found = PlaceholderLookup::Found {
        blurhash: HASH.to_string(),
        width: 640,
        height: 480,
    };
    let attrs = ElementAttrs::from_lookup("img/a.png", Some("A"), Some(&found));
    assert_eq!(attrs.src(), Some("img/a.png"));
    assert_eq!(attrs.alt(), "A");
    assert!(attrs.placeholder_source().is_some());

    let failed = PlaceholderLookup::Failed {
        error: "boom".to_string(),
    };
    let attrs = ElementAttrs::from_lookup("img/a.png", None, Some(&failed));
    assert_eq!(attrs.placeholder_source(), None);
    assert_eq!(attrs.src(), Some("img/a.png"));

    let attrs = ElementAttrs::from_lookup("https://example.com/a.png", None, None);
    assert_eq!(attrs.placeholder_source(), None);
    assert_eq!(attrs.iter().count(), 1);
}
