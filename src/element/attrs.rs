use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};

/// Image reference. Absent means no image layer at all.
pub const SRC: &str = "src";
/// Original pixel width.
pub const SRC_WIDTH: &str = "src-width";
/// Original pixel height.
pub const SRC_HEIGHT: &str = "src-height";
/// Placeholder string.
pub const BLURHASH: &str = "blurhash";
/// Fixed display width; the container's full width when absent.
pub const RENDER_WIDTH: &str = "render-width";
/// Accessibility text.
pub const ALT: &str = "alt";
/// Presence flag enabling the artificial pre-load delay.
pub const DEBUG: &str = "debug";
/// Debug delay in milliseconds.
pub const DEBUG_DELAY: &str = "debug-delay";

/// Attributes whose change resets the element.
pub const WATCHED: [&str; 14] = [
    SRC,
    SRC_WIDTH,
    SRC_HEIGHT,
    BLURHASH,
    RENDER_WIDTH,
    ALT,
    DEBUG,
    DEBUG_DELAY,
    "block",
    "inline-block",
    "flex",
    "inline-flex",
    "grid",
    "inline-grid",
];

/// Units accepted in `render-width`.
const LENGTH_UNITS: [&str; 15] = [
    "px", "%", "em", "rem", "vw", "vh", "vmin", "vmax", "ch", "ex", "cm", "mm", "in", "pt", "pc",
];

/// Whether a change of `name` resets the element.
pub fn is_watched(name: &str) -> bool {
    WATCHED.contains(&name)
}

/// Outer layout mode of the element. Has no effect on loading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    /// `display: block`.
    #[default]
    Block,
    /// `display: inline-block`.
    InlineBlock,
    /// `display: flex`.
    Flex,
    /// `display: inline-flex`.
    InlineFlex,
    /// `display: grid`.
    Grid,
    /// `display: inline-grid`.
    InlineGrid,
}

impl DisplayMode {
    /// Flag precedence when several are present.
    pub const ALL: [Self; 6] = [
        Self::Block,
        Self::InlineBlock,
        Self::Flex,
        Self::InlineFlex,
        Self::Grid,
        Self::InlineGrid,
    ];

    /// Attribute flag name, also the CSS `display` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::InlineBlock => "inline-block",
            Self::Flex => "flex",
            Self::InlineFlex => "inline-flex",
            Self::Grid => "grid",
            Self::InlineGrid => "inline-grid",
        }
    }
}

/// The three inputs placeholder mode needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaceholderSource<'a> {
    /// Original pixel width, > 0.
    pub width: u32,
    /// Original pixel height, > 0.
    pub height: u32,
    /// Placeholder string (not yet validated).
    pub blurhash: &'a str,
}

/// Reply of the image-hashing backend for one local file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaceholderLookup {
    /// The backend produced a placeholder.
    Found {
        /// Placeholder string.
        blurhash: String,
        /// Original pixel width.
        width: u32,
        /// Original pixel height.
        height: u32,
    },
    /// The backend failed for this file.
    Failed {
        /// Backend error message.
        error: String,
    },
}

impl<'de> Deserialize<'de> for PlaceholderLookup {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Repr {
            success: bool,
            blurhash: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
            error: Option<String>,
        }

        let repr = Repr::deserialize(deserializer)?;
        if !repr.success {
            return Ok(Self::Failed {
                error: repr.error.unwrap_or_default(),
            });
        }
        match (repr.blurhash, repr.width, repr.height) {
            (Some(blurhash), Some(width), Some(height)) => Ok(Self::Found {
                blurhash,
                width,
                height,
            }),
            _ => Err(serde::de::Error::custom(
                "successful lookup requires blurhash, width and height",
            )),
        }
    }
}

/// Raw attribute set of one element, with typed accessors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementAttrs {
    raw: BTreeMap<String, String>,
}

impl ElementAttrs {
    /// Empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs. Later pairs win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            raw: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Attributes for `src` given the hashing backend's reply.
    ///
    /// A failed or skipped (`None`) lookup yields plain attributes, which render in fallback
    /// mode.
    pub fn from_lookup(src: &str, alt: Option<&str>, lookup: Option<&PlaceholderLookup>) -> Self {
        let mut attrs = Self::new();
        attrs.set(SRC, Some(src));
        if let Some(alt) = alt {
            attrs.set(ALT, Some(alt));
        }
        match lookup {
            Some(PlaceholderLookup::Found {
                blurhash,
                width,
                height,
            }) => {
                attrs.set(SRC_WIDTH, Some(width.to_string().as_str()));
                attrs.set(SRC_HEIGHT, Some(height.to_string().as_str()));
                attrs.set(BLURHASH, Some(blurhash.as_str()));
            }
            Some(PlaceholderLookup::Failed { error }) => {
                tracing::warn!(src, error = %error, "placeholder lookup failed, using plain image");
            }
            None => {}
        }
        attrs
    }

    /// Set (`Some`) or remove (`None`) an attribute. Returns whether the value changed.
    pub fn set(&mut self, name: &str, value: Option<&str>) -> bool {
        match value {
            Some(v) => {
                if self.raw.get(name).map(String::as_str) == Some(v) {
                    return false;
                }
                self.raw.insert(name.to_string(), v.to_string());
                true
            }
            None => self.raw.remove(name).is_some(),
        }
    }

    /// Raw attribute value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.raw.get(name).map(String::as_str)
    }

    /// Whether the attribute is present (boolean flags).
    pub fn has(&self, name: &str) -> bool {
        self.raw.contains_key(name)
    }

    /// All attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.raw.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    fn positive(&self, name: &str) -> Option<u32> {
        self.non_empty(name)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&v| v > 0)
    }

    /// Image reference, if non-empty.
    pub fn src(&self) -> Option<&str> {
        self.non_empty(SRC)
    }

    /// Original width, if a positive integer.
    pub fn src_width(&self) -> Option<u32> {
        self.positive(SRC_WIDTH)
    }

    /// Original height, if a positive integer.
    pub fn src_height(&self) -> Option<u32> {
        self.positive(SRC_HEIGHT)
    }

    /// Placeholder string, if non-empty.
    pub fn blurhash(&self) -> Option<&str> {
        self.non_empty(BLURHASH)
    }

    /// Display width as a CSS length. Bare numbers are pixels; anything that is not a plain
    /// non-negative length is ignored.
    pub fn render_width(&self) -> Option<String> {
        let v = self.non_empty(RENDER_WIDTH)?;
        let split = v
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(v.len());
        let (number, unit) = v.split_at(split);
        let valid_number = number.parse::<f64>().is_ok_and(f64::is_finite);
        match unit {
            "" if valid_number => Some(format!("{number}px")),
            _ if valid_number && LENGTH_UNITS.contains(&unit) => Some(v.to_string()),
            _ => {
                tracing::debug!(value = v, "ignoring render-width that is not a css length");
                None
            }
        }
    }

    /// Accessibility text, empty by default.
    pub fn alt(&self) -> &str {
        self.get(ALT).unwrap_or("")
    }

    /// Debug mode flag.
    pub fn debug(&self) -> bool {
        self.has(DEBUG)
    }

    /// `debug-delay` in milliseconds, or `default` when absent or unparsable.
    pub fn debug_delay(&self, default: Duration) -> Duration {
        self.non_empty(DEBUG_DELAY)
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(default)
    }

    /// First display flag present, [`DisplayMode::Block`] when none.
    pub fn display(&self) -> DisplayMode {
        DisplayMode::ALL
            .into_iter()
            .find(|m| self.has(m.as_str()))
            .unwrap_or_default()
    }

    /// All three placeholder inputs, or `None` for fallback mode.
    pub fn placeholder_source(&self) -> Option<PlaceholderSource<'_>> {
        Some(PlaceholderSource {
            width: self.src_width()?,
            height: self.src_height()?,
            blurhash: self.blurhash()?,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/element/attrs.rs"]
mod tests;
