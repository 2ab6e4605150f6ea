//! The progressive-loading image element.
//!
//! [`ProgressiveImage`](machine::ProgressiveImage) is a host-agnostic state machine. It reads
//! its inputs from [`ElementAttrs`](attrs::ElementAttrs), picks a
//! [`RenderPlan`](render::RenderPlan), and asks a [`Host`](host::Host) for every side effect:
//! rendering, visibility observation, timers, fetches and events.

/// Attribute names and typed accessors.
pub mod attrs;
/// Tunable element constants.
pub mod config;
/// The side-effect boundary and an in-memory recording host.
pub mod host;
/// Loading state machine.
pub mod machine;
/// HTML serialization of a render plan.
pub mod markup;
/// Render plans and per-layer visual state.
pub mod render;
