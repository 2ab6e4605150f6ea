use std::fmt::Write as _;

use crate::{
    codec::decode::{Raster, decode, validate},
    foundation::error::{BlurestError, BlurestResult},
};

/// Parameters for [`to_css`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CssOptions {
    /// Decoded raster width; one colour stop per column.
    pub width: u32,
    /// Decoded raster height; one gradient per row.
    pub height: u32,
    /// `filter: blur(..)` radius in CSS pixels.
    pub blur_radius: f64,
    /// `transform: scale(..)` factor that pushes the blurred edges out of frame.
    pub scale_factor: f64,
    /// AC contrast multiplier passed to the decoder.
    pub punch: f64,
}

impl Default for CssOptions {
    fn default() -> Self {
        Self {
            width: 32,
            height: 32,
            blur_radius: 24.0,
            scale_factor: 1.2,
            punch: 1.0,
        }
    }
}

impl CssOptions {
    /// Default blur, scale and punch at the given raster size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Check the numeric parameters. Raster size is checked by [`to_css`].
    pub fn validate(&self) -> BlurestResult<()> {
        if !self.blur_radius.is_finite() || self.blur_radius < 0.0 {
            return Err(BlurestError::validation("blur_radius must be finite and >= 0"));
        }
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(BlurestError::validation("scale_factor must be finite and > 0"));
        }
        if !self.punch.is_finite() || self.punch < 0.0 {
            return Err(BlurestError::validation("punch must be finite and >= 0"));
        }
        Ok(())
    }
}

/// CSS properties that approximate a decoded placeholder without an image resource.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CssApproximation {
    /// One `linear-gradient(90deg, ..)` per raster row.
    pub background_image: String,
    /// One vertical offset per row.
    pub background_position: String,
    /// Always `no-repeat`.
    pub background_repeat: String,
    /// Full width, `100 / height` percent tall.
    pub background_size: String,
    /// `blur(..px)`.
    pub filter: String,
    /// `scale(..)`.
    pub transform: String,
}

impl CssApproximation {
    /// `(property, value)` pairs in a fixed order.
    pub fn properties(&self) -> [(&'static str, &str); 6] {
        [
            ("background-image", self.background_image.as_str()),
            ("background-position", self.background_position.as_str()),
            ("background-repeat", self.background_repeat.as_str()),
            ("background-size", self.background_size.as_str()),
            ("filter", self.filter.as_str()),
            ("transform", self.transform.as_str()),
        ]
    }

    /// Render as an inline style declaration list.
    pub fn to_declarations(&self) -> String {
        let mut out = String::new();
        for (name, value) in self.properties() {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{name}: {value};");
        }
        out
    }
}

/// Result of [`is_valid`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Validity {
    /// Whether the hash passed structural validation.
    pub valid: bool,
    /// Why it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Structural check only; no colours are decoded.
pub fn is_valid(hash: &str) -> Validity {
    match validate(hash) {
        Ok(_) => Validity {
            valid: true,
            reason: None,
        },
        Err(e) => Validity {
            valid: false,
            reason: Some(e.to_string()),
        },
    }
}

/// Decode `hash` at `opts.width x opts.height` and build its CSS approximation.
#[tracing::instrument(level = "debug", skip(opts))]
pub fn to_css(hash: &str, opts: &CssOptions) -> BlurestResult<CssApproximation> {
    generate(hash, opts).map_err(|e| BlurestError::generation("css approximation", e))
}

/// [`to_css`] over many hashes. Fails on the first invalid member with its index; no partial
/// results.
pub fn to_css_batch<S: AsRef<str>>(
    hashes: &[S],
    opts: &CssOptions,
) -> BlurestResult<Vec<CssApproximation>> {
    hashes
        .iter()
        .enumerate()
        .map(|(i, hash)| {
            generate(hash.as_ref(), opts)
                .map_err(|e| BlurestError::generation(format!("css approximation of item {i}"), e))
        })
        .collect()
}

fn generate(hash: &str, opts: &CssOptions) -> BlurestResult<CssApproximation> {
    if opts.width == 0 || opts.height == 0 {
        return Err(BlurestError::validation(format!(
            "css raster dimensions must be > 0, got {}x{}",
            opts.width, opts.height
        )));
    }
    opts.validate()?;
    let raster = decode(hash, opts.width, opts.height, opts.punch)?;
    Ok(from_raster(&raster, opts.blur_radius, opts.scale_factor))
}

/// Build the approximation of an already decoded raster.
pub fn from_raster(raster: &Raster, blur_radius: f64, scale_factor: f64) -> CssApproximation {
    let height = raster.height();

    let rows: Vec<String> = (0..height).map(|y| row_gradient(raster, y)).collect();
    let positions: Vec<String> = (0..height).map(|y| row_position(y, height)).collect();
    tracing::trace!(width = raster.width(), height, "css approximation built");

    CssApproximation {
        background_image: rows.join(", "),
        background_position: positions.join(", "),
        background_repeat: "no-repeat".to_string(),
        background_size: format!("100% {}%", 100.0 / f64::from(height)),
        filter: format!("blur({blur_radius}px)"),
        transform: format!("scale({scale_factor})"),
    }
}

/// Hard-edged bands: each pixel owns `[100x/w, 100(x+1)/w]`.
fn row_gradient(raster: &Raster, y: u32) -> String {
    let width = raster.width();
    let mut out = String::from("linear-gradient(90deg");
    for x in 0..width {
        let [r, g, b, _] = raster.pixel(x, y).unwrap_or([0, 0, 0, 255]);
        let _ = write!(out, ", rgb({r},{g},{b})");
        if x > 0 {
            let _ = write!(out, " {}%", percent(x, width));
        }
        if x + 1 < width {
            let _ = write!(out, " {}%", percent(x + 1, width));
        }
    }
    out.push(')');
    out
}

fn row_position(y: u32, height: u32) -> String {
    if y == 0 {
        return "0 0".to_string();
    }
    format!("0 {}%", percent(y, height - 1))
}

fn percent(n: u32, d: u32) -> u32 {
    (100.0 * f64::from(n) / f64::from(d)).round() as u32
}

#[cfg(test)]
#[path = "../../tests/unit/css/generate.rs"]
mod tests;
