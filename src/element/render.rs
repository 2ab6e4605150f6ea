use crate::{
    css::generate::{CssApproximation, to_css},
    element::attrs::{DisplayMode, ElementAttrs},
    element::config::ElementConfig,
};

/// What the element draws for its current attributes.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderPlan {
    /// Placeholder inputs are missing: a plain lazily loaded image.
    Fallback(FallbackRender),
    /// Backdrop, placeholder, image and error layers.
    Placeholder(PlaceholderRender),
}

/// Plain image, no backdrop and no decoding.
#[derive(Clone, Debug, PartialEq)]
pub struct FallbackRender {
    /// Image reference; `None` renders nothing.
    pub src: Option<String>,
    /// Accessibility text.
    pub alt: String,
    /// Fixed CSS width, if any.
    pub render_width: Option<String>,
    /// Outer layout mode.
    pub display: DisplayMode,
}

/// Layered placeholder view.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceholderRender {
    /// Image reference; `None` means the image layer is never populated.
    pub src: Option<String>,
    /// Accessibility text.
    pub alt: String,
    /// Fixed CSS width, if any.
    pub render_width: Option<String>,
    /// Outer layout mode.
    pub display: DisplayMode,
    /// Original pixel width.
    pub src_width: u32,
    /// Original pixel height.
    pub src_height: u32,
    /// Size of the decoded placeholder raster.
    pub raster_width: u32,
    /// Size of the decoded placeholder raster.
    pub raster_height: u32,
    /// Content of the backdrop and placeholder layers.
    pub backdrop: Backdrop,
}

impl PlaceholderRender {
    /// `src_width / src_height`.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.src_width) / f64::from(self.src_height)
    }
}

/// Backdrop content.
#[derive(Clone, Debug, PartialEq)]
pub enum Backdrop {
    /// Decoded placeholder as CSS.
    Approximation(CssApproximation),
    /// Animated neutral gradient used when the placeholder string cannot be decoded.
    Neutral,
}

/// How the real image replaces the placeholder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionMode {
    /// Timed opacity, blur-to-sharp and scale-to-one cross-fade.
    Animated,
    /// The image appears at once. Used for near-instant loads.
    Instant,
}

/// Foreground placeholder layer state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaceholderLayer {
    /// Covering the image layer.
    #[default]
    Visible,
    /// Fading out after a load outcome.
    FadingOut,
}

/// Image layer state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageLayer {
    /// Source not set, nothing fetched.
    #[default]
    Withheld,
    /// Source set, waiting for the fetch.
    Fetching,
    /// Fetched and shown.
    Revealed(TransitionMode),
}

/// Per-layer visual state that changes without a full re-render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayerState {
    /// Foreground placeholder.
    pub placeholder: PlaceholderLayer,
    /// Real image.
    pub image: ImageLayer,
    /// Debug-mode "pending" indicator.
    pub pending_indicator: bool,
    /// Error layer.
    pub error_visible: bool,
}

impl RenderPlan {
    /// Choose fallback or placeholder mode and compute the backdrop.
    ///
    /// Never fails: an undecodable placeholder string yields [`Backdrop::Neutral`].
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn build(attrs: &ElementAttrs, config: &ElementConfig) -> Self {
        let src = attrs.src().map(str::to_string);
        let alt = attrs.alt().to_string();
        let render_width = attrs.render_width();
        let display = attrs.display();

        let Some(source) = attrs.placeholder_source() else {
            tracing::debug!("placeholder inputs missing, rendering fallback");
            return Self::Fallback(FallbackRender {
                src,
                alt,
                render_width,
                display,
            });
        };

        let (raster_width, raster_height) =
            placeholder_raster_size(source.width, source.height, config.placeholder_long_edge);
        let opts = config.css_options(raster_width, raster_height);
        let backdrop = match to_css(source.blurhash, &opts) {
            Ok(css) => Backdrop::Approximation(css),
            Err(e) => {
                tracing::warn!(error = %e, "placeholder css generation failed, using neutral backdrop");
                Backdrop::Neutral
            }
        };

        Self::Placeholder(PlaceholderRender {
            src,
            alt,
            render_width,
            display,
            src_width: source.width,
            src_height: source.height,
            raster_width,
            raster_height,
            backdrop,
        })
    }

    /// Whether this is placeholder mode.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    /// Image reference of either mode.
    pub fn src(&self) -> Option<&str> {
        match self {
            Self::Fallback(f) => f.src.as_deref(),
            Self::Placeholder(p) => p.src.as_deref(),
        }
    }
}

/// Placeholder raster size: `long_edge` on the long axis, the other axis from the aspect ratio.
pub fn placeholder_raster_size(src_width: u32, src_height: u32, long_edge: u32) -> (u32, u32) {
    let aspect = f64::from(src_width) / f64::from(src_height);
    let long = f64::from(long_edge);
    if aspect >= 1.0 {
        (long_edge, ((long / aspect).round() as u32).max(1))
    } else {
        (((long * aspect).round() as u32).max(1), long_edge)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/element/render.rs"]
mod tests;
