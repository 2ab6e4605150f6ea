//! Blurest turns compact blurhash placeholder strings into something a page can show before the
//! real image arrives.
//!
//! - [`decode`] a placeholder string into a small RGBA8 [`Raster`]
//! - [`to_css`] approximate it with stacked CSS gradients, no canvas required
//! - drive a [`ProgressiveImage`] that shows the placeholder, waits for the element to come into
//!   view, fetches the real image and cross-fades to it
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod foundation;

pub mod codec;
/// CSS approximation of decoded placeholders.
pub mod css;
pub mod element;

pub use crate::foundation::error::{BlurestError, BlurestResult, DecodeError};

pub use crate::codec::decode::{Components, Header, Raster, components, decode, validate};
pub use crate::css::generate::{
    CssApproximation, CssOptions, Validity, is_valid, to_css, to_css_batch,
};
pub use crate::element::attrs::{DisplayMode, ElementAttrs, PlaceholderLookup};
pub use crate::element::config::ElementConfig;
pub use crate::element::host::{
    ElementEvent, EventKind, FetchTicket, Host, HostCall, ObserverHandle, ObserverOptions,
    RecordingHost, TimerHandle,
};
pub use crate::element::machine::{Phase, ProgressiveImage};
pub use crate::element::render::{
    Backdrop, ImageLayer, LayerState, PlaceholderLayer, RenderPlan, TransitionMode,
};
