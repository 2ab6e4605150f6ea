use std::time::Duration;

use crate::{
    css::generate::CssOptions,
    element::host::ObserverOptions,
    foundation::error::{BlurestError, BlurestResult},
};

/// Tunable constants of the loading element.
///
/// Every field has a default, so a JSON document only needs the keys it overrides.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ElementConfig {
    /// Long axis of the decoded placeholder raster, in pixels.
    pub placeholder_long_edge: u32,
    /// Blur applied to the placeholder layers, in CSS pixels.
    pub blur_radius: f64,
    /// Scale applied to the placeholder layers.
    pub scale_factor: f64,
    /// AC contrast multiplier used when decoding placeholders.
    pub punch: f64,
    /// Visible fraction that counts as "in view".
    pub visibility_threshold: f64,
    /// Pre-load margin around the viewport.
    pub root_margin_px: u32,
    /// Loads finishing sooner than this skip the cross-fade.
    pub fast_load_threshold_ms: u64,
    /// Pending delay in debug mode when `debug-delay` is absent or unparsable.
    pub debug_delay_ms: u64,
    /// Cross-fade duration.
    pub fade_duration_ms: u64,
}

impl Default for ElementConfig {
    fn default() -> Self {
        Self {
            placeholder_long_edge: 32,
            blur_radius: 16.0,
            scale_factor: 1.1,
            punch: 1.2,
            visibility_threshold: 0.1,
            root_margin_px: 50,
            fast_load_threshold_ms: 200,
            debug_delay_ms: 3000,
            fade_duration_ms: 400,
        }
    }
}

impl ElementConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> BlurestResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BlurestError::serde(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> BlurestResult<()> {
        if self.placeholder_long_edge == 0 {
            return Err(BlurestError::validation(
                "placeholder_long_edge must be > 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(BlurestError::validation(
                "visibility_threshold must be in [0, 1]",
            ));
        }
        self.css_options(1, 1).validate()
    }

    /// Generator options for a `width x height` placeholder raster.
    pub fn css_options(&self, width: u32, height: u32) -> CssOptions {
        CssOptions {
            width,
            height,
            blur_radius: self.blur_radius,
            scale_factor: self.scale_factor,
            punch: self.punch,
        }
    }

    /// Visibility observer settings.
    pub fn observer_options(&self) -> ObserverOptions {
        ObserverOptions {
            threshold: self.visibility_threshold,
            root_margin_px: self.root_margin_px,
        }
    }

    /// See [`ElementConfig::fast_load_threshold_ms`].
    pub fn fast_load_threshold(&self) -> Duration {
        Duration::from_millis(self.fast_load_threshold_ms)
    }

    /// See [`ElementConfig::debug_delay_ms`].
    pub fn default_debug_delay(&self) -> Duration {
        Duration::from_millis(self.debug_delay_ms)
    }

    /// See [`ElementConfig::fade_duration_ms`].
    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/element/config.rs"]
mod tests;
