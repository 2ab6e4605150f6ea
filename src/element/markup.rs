use std::fmt::Write as _;

use crate::element::{
    config::ElementConfig,
    render::{
        Backdrop, FallbackRender, ImageLayer, LayerState, PlaceholderLayer, PlaceholderRender,
        RenderPlan, TransitionMode,
    },
};

const NEUTRAL_BACKDROP: &str = "background-image: linear-gradient(90deg, #e2e2e2 25%, #f0f0f0 50%, #e2e2e2 75%); background-size: 200% 100%; animation: blurest-shimmer 1.5s ease-in-out infinite;";

const NEUTRAL_KEYFRAMES: &str = "<style>@keyframes blurest-shimmer { from { background-position: 200% 0; } to { background-position: -200% 0; } }</style>";

const LAYER: &str = "position: absolute; inset: 0;";

impl RenderPlan {
    /// Serialize the element's subtree in its current layer state.
    pub fn to_html(&self, layers: &LayerState, config: &ElementConfig) -> String {
        match self {
            Self::Fallback(f) => fallback_html(f),
            Self::Placeholder(p) => placeholder_html(p, layers, config),
        }
    }
}

/// Escaped for use inside a `style` attribute.
fn host_style(display: &str, render_width: Option<&str>) -> String {
    escape(&format!(
        "display: {display}; width: {};",
        render_width.unwrap_or("100%")
    ))
}

fn fallback_html(f: &FallbackRender) -> String {
    let mut out = format!(
        r#"<div class="blurest blurest-fallback" style="{}">"#,
        host_style(f.display.as_str(), f.render_width.as_deref())
    );
    if let Some(src) = &f.src {
        let _ = write!(
            out,
            r#"<img src="{}" alt="{}" loading="lazy" decoding="async" style="display: block; width: 100%; height: auto;">"#,
            escape(src),
            escape(&f.alt)
        );
    }
    out.push_str("</div>");
    out
}

fn placeholder_html(p: &PlaceholderRender, layers: &LayerState, config: &ElementConfig) -> String {
    let mut class = String::from("blurest");
    if layers.pending_indicator {
        class.push_str(" blurest-pending");
    }
    if matches!(layers.image, ImageLayer::Revealed(_)) {
        class.push_str(" blurest-loaded");
    }
    if layers.error_visible {
        class.push_str(" blurest-errored");
    }

    let mut out = String::new();
    if p.backdrop == Backdrop::Neutral {
        out.push_str(NEUTRAL_KEYFRAMES);
    }
    let _ = write!(
        out,
        r#"<div class="{class}" style="{} position: relative; overflow: hidden; aspect-ratio: {} / {};">"#,
        host_style(p.display.as_str(), p.render_width.as_deref()),
        p.src_width,
        p.src_height
    );

    let backdrop = match &p.backdrop {
        Backdrop::Approximation(css) => escape(&css.to_declarations()),
        Backdrop::Neutral => NEUTRAL_BACKDROP.to_string(),
    };
    let fade = config.fade_duration().as_millis();

    let _ = write!(
        out,
        r#"<div class="blurest-backdrop" aria-hidden="true" style="{LAYER} {backdrop}"></div>"#
    );

    let opacity = match layers.placeholder {
        PlaceholderLayer::Visible => 1,
        PlaceholderLayer::FadingOut => 0,
    };
    let _ = write!(
        out,
        r#"<div class="blurest-placeholder" aria-hidden="true" style="{LAYER} {backdrop} opacity: {opacity}; transition: opacity {fade}ms ease-out;"></div>"#
    );

    if let Some(src) = &p.src {
        let src_attr = match layers.image {
            ImageLayer::Withheld => String::new(),
            ImageLayer::Fetching | ImageLayer::Revealed(_) => format!(r#" src="{}""#, escape(src)),
        };
        let _ = write!(
            out,
            r#"<img class="blurest-image"{src_attr} alt="{}" decoding="async" style="{LAYER} width: 100%; height: 100%; object-fit: cover; {}">"#,
            escape(&p.alt),
            image_style(layers.image, config)
        );
    }

    let error_display = if layers.error_visible { "flex" } else { "none" };
    let _ = write!(
        out,
        r#"<div class="blurest-error" role="img" aria-label="{}" style="{LAYER} display: {error_display}; align-items: center; justify-content: center;">Image failed to load</div>"#,
        escape(&p.alt)
    );

    if layers.pending_indicator {
        let _ = write!(
            out,
            r#"<div class="blurest-pending-indicator" aria-hidden="true" style="{LAYER}"></div>"#
        );
    }

    out.push_str("</div>");
    out
}

fn image_style(image: ImageLayer, config: &ElementConfig) -> String {
    match image {
        ImageLayer::Withheld => "opacity: 0;".to_string(),
        ImageLayer::Fetching => format!(
            "opacity: 0; filter: blur({}px); transform: scale({});",
            config.blur_radius, config.scale_factor
        ),
        ImageLayer::Revealed(TransitionMode::Animated) => {
            let ms = config.fade_duration().as_millis();
            format!(
                "opacity: 1; filter: blur(0); transform: scale(1); transition: opacity {ms}ms ease-out, filter {ms}ms ease-out, transform {ms}ms ease-out;"
            )
        }
        ImageLayer::Revealed(TransitionMode::Instant) => {
            "opacity: 1; filter: none; transform: none; transition: none;".to_string()
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/element/markup.rs"]
mod tests;
