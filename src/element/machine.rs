use std::time::Duration;

use crate::{
    element::{
        attrs::{ElementAttrs, is_watched},
        config::ElementConfig,
        host::{ElementEvent, EventKind, FetchTicket, Host, ObserverHandle, TimerHandle},
        render::{ImageLayer, LayerState, PlaceholderLayer, RenderPlan, TransitionMode},
    },
    foundation::error::{BlurestError, BlurestResult},
};

/// Loading phase of one element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Nothing requested yet.
    Unloaded,
    /// Debug mode only: in view, waiting for the artificial delay.
    PendingLoad {
        /// Timer that starts the fetch.
        timer: TimerHandle,
    },
    /// Fetch in flight.
    Loading {
        /// Ticket the completion must carry.
        ticket: FetchTicket,
        /// Host clock when the fetch started.
        started_at: Duration,
    },
    /// The real image is shown.
    Loaded {
        /// How it was revealed.
        transition: TransitionMode,
    },
    /// The fetch failed. Not retried.
    Errored {
        /// Host-provided failure description.
        reason: String,
    },
}

/// Progressive-loading image element.
///
/// Drive it with [`on_attach`](Self::on_attach), [`on_detach`](Self::on_detach) and
/// [`on_attribute_change`](Self::on_attribute_change), and forward the host's visibility, timer
/// and fetch callbacks. Every entry point is synchronous; the host's event loop provides the
/// suspension points.
#[derive(Debug)]
pub struct ProgressiveImage {
    config: ElementConfig,
    attrs: ElementAttrs,
    attached: bool,
    in_viewport: bool,
    phase: Phase,
    observer: Option<ObserverHandle>,
    plan: Option<RenderPlan>,
    layers: LayerState,
}

impl ProgressiveImage {
    /// A detached element with the given attributes.
    pub fn new(attrs: ElementAttrs, config: ElementConfig) -> BlurestResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            attrs,
            attached: false,
            in_viewport: false,
            phase: Phase::Unloaded,
            observer: None,
            plan: None,
            layers: LayerState::default(),
        })
    }

    /// Current attributes.
    pub fn attrs(&self) -> &ElementAttrs {
        &self.attrs
    }

    /// Element configuration.
    pub fn config(&self) -> &ElementConfig {
        &self.config
    }

    /// Current loading phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Whether the element is attached to its host tree.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Whether the last visibility report was "in view".
    pub fn is_in_viewport(&self) -> bool {
        self.in_viewport
    }

    /// Whether the real image loaded.
    pub fn is_loaded(&self) -> bool {
        matches!(self.phase, Phase::Loaded { .. })
    }

    /// Whether the real image failed.
    pub fn is_errored(&self) -> bool {
        matches!(self.phase, Phase::Errored { .. })
    }

    /// Reveal mode once loaded.
    pub fn transition(&self) -> Option<TransitionMode> {
        match self.phase {
            Phase::Loaded { transition } => Some(transition),
            _ => None,
        }
    }

    /// Active visibility observer.
    pub fn observer(&self) -> Option<ObserverHandle> {
        self.observer
    }

    /// Last rendered plan, `None` while detached.
    pub fn plan(&self) -> Option<&RenderPlan> {
        self.plan.as_ref()
    }

    /// Current layer state.
    pub fn layers(&self) -> &LayerState {
        &self.layers
    }

    /// Markup of the current view, `None` while detached.
    pub fn to_html(&self) -> Option<String> {
        self.plan
            .as_ref()
            .map(|plan| plan.to_html(&self.layers, &self.config))
    }

    /// The element joined the host tree: render, then observe.
    pub fn on_attach(&mut self, host: &mut impl Host) {
        self.attached = true;
        self.restart(host);
    }

    /// The element left the host tree: cancel everything it armed.
    pub fn on_detach(&mut self, host: &mut impl Host) {
        self.attached = false;
        self.reset(host);
        self.plan = None;
    }

    /// An attribute was set (`Some`) or removed (`None`).
    ///
    /// A real change of a watched attribute on an attached element resets it to
    /// [`Phase::Unloaded`] and renders again.
    pub fn on_attribute_change(&mut self, host: &mut impl Host, name: &str, value: Option<&str>) {
        if !self.attrs.set(name, value) || !is_watched(name) {
            return;
        }
        tracing::debug!(name, ?value, "watched attribute changed");
        if self.attached {
            self.restart(host);
        }
    }

    /// Visibility report from `observer`.
    pub fn on_visibility_change(
        &mut self,
        host: &mut impl Host,
        observer: ObserverHandle,
        is_intersecting: bool,
    ) {
        if self.observer != Some(observer) {
            tracing::debug!(?observer, "ignoring stale observer callback");
            return;
        }
        self.in_viewport = is_intersecting;
        if is_intersecting {
            self.enter_view(host);
        } else {
            self.leave_view(host);
        }
    }

    /// A timer armed by this element expired.
    pub fn on_timer(&mut self, host: &mut impl Host, timer: TimerHandle) {
        match self.phase {
            Phase::PendingLoad { timer: pending } if pending == timer => self.begin_load(host),
            _ => tracing::debug!(?timer, "ignoring stale timer"),
        }
    }

    /// The fetch identified by `ticket` succeeded.
    pub fn on_image_load(&mut self, host: &mut impl Host, ticket: FetchTicket) {
        let Phase::Loading {
            ticket: current,
            started_at,
        } = self.phase
        else {
            tracing::debug!(?ticket, "ignoring load outside of loading phase");
            return;
        };
        if current != ticket {
            tracing::debug!(?ticket, "ignoring stale load");
            return;
        }

        let elapsed = host.now().saturating_sub(started_at);
        let transition = if elapsed < self.config.fast_load_threshold() {
            TransitionMode::Instant
        } else {
            TransitionMode::Animated
        };
        tracing::debug!(?elapsed, ?transition, "image loaded");

        self.phase = Phase::Loaded { transition };
        self.layers.image = ImageLayer::Revealed(transition);
        self.layers.placeholder = PlaceholderLayer::FadingOut;
        host.update_layers(&self.layers);
        self.emit(host, EventKind::ImageLoaded);
    }

    /// The fetch identified by `ticket` failed.
    pub fn on_image_error(&mut self, host: &mut impl Host, ticket: FetchTicket, reason: &str) {
        if !matches!(self.phase, Phase::Loading { ticket: current, .. } if current == ticket) {
            tracing::debug!(?ticket, "ignoring stale load error");
            return;
        }

        let err = BlurestError::load(reason);
        tracing::warn!(src = self.src().unwrap_or_default(), error = %err, "image failed to load");

        self.phase = Phase::Errored {
            reason: reason.to_string(),
        };
        self.layers.image = ImageLayer::Withheld;
        self.layers.placeholder = PlaceholderLayer::FadingOut;
        self.layers.error_visible = true;
        host.update_layers(&self.layers);
        self.emit(host, EventKind::ImageError);
    }

    fn src(&self) -> Option<&str> {
        self.plan.as_ref().and_then(RenderPlan::src)
    }

    /// Reset, render, observe.
    fn restart(&mut self, host: &mut impl Host) {
        self.reset(host);

        let plan = RenderPlan::build(&self.attrs, &self.config);
        host.render(&plan, &self.layers);
        let placeholder_mode = plan.is_placeholder();
        self.plan = Some(plan);

        // Fallback mode relies on the image's own lazy loading.
        if placeholder_mode {
            self.observer = Some(host.observe(self.config.observer_options()));
        }
    }

    fn reset(&mut self, host: &mut impl Host) {
        match self.phase {
            Phase::PendingLoad { timer } => host.clear_timeout(timer),
            Phase::Loading { ticket, .. } => host.abandon_fetch(ticket),
            Phase::Unloaded | Phase::Loaded { .. } | Phase::Errored { .. } => {}
        }
        if let Some(observer) = self.observer.take() {
            host.disconnect(observer);
        }
        self.phase = Phase::Unloaded;
        self.in_viewport = false;
        self.layers = LayerState::default();
    }

    fn enter_view(&mut self, host: &mut impl Host) {
        if self.phase != Phase::Unloaded {
            return;
        }
        if self.src().is_none() {
            tracing::debug!("in view without src, nothing to load");
            return;
        }

        if self.attrs.debug() {
            let delay = self.attrs.debug_delay(self.config.default_debug_delay());
            let timer = host.set_timeout(delay);
            tracing::debug!(?delay, ?timer, "debug delay armed");
            self.phase = Phase::PendingLoad { timer };
            self.layers.pending_indicator = true;
            host.update_layers(&self.layers);
        } else {
            self.begin_load(host);
        }
    }

    fn leave_view(&mut self, host: &mut impl Host) {
        let Phase::PendingLoad { timer } = self.phase else {
            return;
        };
        tracing::debug!(?timer, "left view before load, cancelling");
        host.clear_timeout(timer);
        self.phase = Phase::Unloaded;
        self.layers.pending_indicator = false;
        host.update_layers(&self.layers);
    }

    fn begin_load(&mut self, host: &mut impl Host) {
        let Some(src) = self.src().map(str::to_string) else {
            return;
        };
        let started_at = host.now();
        let ticket = host.start_fetch(&src);
        tracing::debug!(?ticket, src = %src, "fetch started");

        self.phase = Phase::Loading { ticket, started_at };
        self.layers.pending_indicator = false;
        self.layers.image = ImageLayer::Fetching;
        host.update_layers(&self.layers);
    }

    fn emit(&self, host: &mut impl Host, kind: EventKind) {
        if let Some(src) = self.src() {
            host.dispatch(ElementEvent::new(kind, src));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/element/machine.rs"]
mod tests;
