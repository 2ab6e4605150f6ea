use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use crate::element::render::{LayerState, RenderPlan};

/// Identifies a visibility observer created by [`Host::observe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverHandle(pub u64);

/// Identifies a timer armed by [`Host::set_timeout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// Identifies one image fetch started by [`Host::start_fetch`]. A completion carrying an older
/// ticket is ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchTicket(pub u64);

/// Visibility observer configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserverOptions {
    /// Fraction of the element that must be visible, `[0, 1]`.
    pub threshold: f64,
    /// Margin grown around the viewport so loading starts slightly early.
    pub root_margin_px: u32,
}

impl ObserverOptions {
    /// Root margin as a CSS length.
    pub fn root_margin(&self) -> String {
        format!("{}px", self.root_margin_px)
    }
}

/// Lifecycle event kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// The real image finished loading.
    ImageLoaded,
    /// The real image failed to load.
    ImageError,
}

impl EventKind {
    /// DOM event name.
    pub fn name(self) -> &'static str {
        match self {
            Self::ImageLoaded => "image-loaded",
            Self::ImageError => "image-error",
        }
    }
}

/// Payload of an [`ElementEvent`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct EventDetail {
    /// The image reference that was fetched.
    pub src: String,
}

/// A bubbling, composed event emitted by the element.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ElementEvent {
    /// Event name.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Event payload.
    pub detail: EventDetail,
    /// Whether the event bubbles. Always true.
    pub bubbles: bool,
    /// Whether the event crosses shadow boundaries. Always true.
    pub composed: bool,
}

impl ElementEvent {
    pub(crate) fn new(kind: EventKind, src: &str) -> Self {
        Self {
            kind,
            detail: EventDetail {
                src: src.to_string(),
            },
            bubbles: true,
            composed: true,
        }
    }
}

/// Side effects the loading element asks of its host environment.
///
/// The host owns the event loop. It calls back into
/// [`ProgressiveImage`](crate::ProgressiveImage) when an observer reports a visibility change,
/// a timer expires, or a fetch completes, passing back the handle or ticket it was given.
pub trait Host {
    /// Monotonic clock.
    fn now(&self) -> Duration;

    /// Start observing the element's visibility.
    fn observe(&mut self, options: ObserverOptions) -> ObserverHandle;

    /// Stop an observer. No further callbacks for `observer` are expected.
    fn disconnect(&mut self, observer: ObserverHandle);

    /// Arm a one-shot timer.
    fn set_timeout(&mut self, delay: Duration) -> TimerHandle;

    /// Cancel a timer armed by [`Host::set_timeout`].
    fn clear_timeout(&mut self, timer: TimerHandle);

    /// Begin fetching `src` into the image layer. The returned ticket must be unique for the
    /// host's lifetime.
    fn start_fetch(&mut self, src: &str) -> FetchTicket;

    /// The fetch identified by `ticket` is no longer wanted.
    fn abandon_fetch(&mut self, _ticket: FetchTicket) {}

    /// Replace the element's whole visual subtree.
    fn render(&mut self, plan: &RenderPlan, layers: &LayerState);

    /// Apply new per-layer visual state to the current subtree.
    fn update_layers(&mut self, layers: &LayerState);

    /// Emit a lifecycle event.
    fn dispatch(&mut self, event: ElementEvent);
}

/// One side effect recorded by [`RecordingHost`].
#[derive(Clone, Debug, PartialEq)]
pub enum HostCall {
    /// [`Host::observe`].
    Observe(ObserverHandle, ObserverOptions),
    /// [`Host::disconnect`].
    Disconnect(ObserverHandle),
    /// [`Host::set_timeout`].
    SetTimeout(TimerHandle, Duration),
    /// [`Host::clear_timeout`].
    ClearTimeout(TimerHandle),
    /// [`Host::start_fetch`].
    StartFetch(FetchTicket, String),
    /// [`Host::abandon_fetch`].
    AbandonFetch(FetchTicket),
    /// [`Host::render`].
    Render(LayerState),
    /// [`Host::update_layers`].
    UpdateLayers(LayerState),
    /// [`Host::dispatch`].
    Dispatch(ElementEvent),
}

/// In-memory host for tests and debugging.
///
/// Records every call, keeps a manual clock, and tracks which observers, timers and fetches are
/// still live so a driver can fire them back into the element.
#[derive(Debug, Default)]
pub struct RecordingHost {
    now: Duration,
    next_id: u64,
    calls: Vec<HostCall>,
    observers: BTreeSet<ObserverHandle>,
    timers: BTreeMap<TimerHandle, Duration>,
    fetches: BTreeMap<FetchTicket, String>,
}

impl RecordingHost {
    /// Create a host with its clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    /// Events dispatched so far.
    pub fn events(&self) -> Vec<&ElementEvent> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HostCall::Dispatch(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    /// Number of fetches ever started.
    pub fn fetch_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HostCall::StartFetch(..)))
            .count()
    }

    /// Number of full renders.
    pub fn render_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HostCall::Render(_)))
            .count()
    }

    /// Observers not yet disconnected.
    pub fn live_observers(&self) -> Vec<ObserverHandle> {
        self.observers.iter().copied().collect()
    }

    /// Timers armed and neither cleared nor fired.
    pub fn live_timers(&self) -> Vec<TimerHandle> {
        self.timers.keys().copied().collect()
    }

    /// Remove and return the timers whose deadline has passed.
    pub fn take_due_timers(&mut self) -> Vec<TimerHandle> {
        let now = self.now;
        let due: Vec<TimerHandle> = self
            .timers
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(t, _)| *t)
            .collect();
        for t in &due {
            self.timers.remove(t);
        }
        due
    }

    /// Fetches started and not yet completed or abandoned.
    pub fn live_fetches(&self) -> Vec<(FetchTicket, &str)> {
        self.fetches
            .iter()
            .map(|(t, src)| (*t, src.as_str()))
            .collect()
    }

    /// Mark a fetch as completed so it is no longer live. Returns its source.
    pub fn complete_fetch(&mut self, ticket: FetchTicket) -> Option<String> {
        self.fetches.remove(&ticket)
    }

    /// Layer state of the most recent render or update.
    pub fn last_layers(&self) -> Option<LayerState> {
        self.calls.iter().rev().find_map(|c| match c {
            HostCall::Render(l) | HostCall::UpdateLayers(l) => Some(*l),
            _ => None,
        })
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Host for RecordingHost {
    fn now(&self) -> Duration {
        self.now
    }

    fn observe(&mut self, options: ObserverOptions) -> ObserverHandle {
        let handle = ObserverHandle(self.next_id());
        self.observers.insert(handle);
        self.calls.push(HostCall::Observe(handle, options));
        handle
    }

    fn disconnect(&mut self, observer: ObserverHandle) {
        self.observers.remove(&observer);
        self.calls.push(HostCall::Disconnect(observer));
    }

    fn set_timeout(&mut self, delay: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_id());
        self.timers.insert(handle, self.now + delay);
        self.calls.push(HostCall::SetTimeout(handle, delay));
        handle
    }

    fn clear_timeout(&mut self, timer: TimerHandle) {
        self.timers.remove(&timer);
        self.calls.push(HostCall::ClearTimeout(timer));
    }

    fn start_fetch(&mut self, src: &str) -> FetchTicket {
        let ticket = FetchTicket(self.next_id());
        self.fetches.insert(ticket, src.to_string());
        self.calls.push(HostCall::StartFetch(ticket, src.to_string()));
        ticket
    }

    fn abandon_fetch(&mut self, ticket: FetchTicket) {
        self.fetches.remove(&ticket);
        self.calls.push(HostCall::AbandonFetch(ticket));
    }

    fn render(&mut self, _plan: &RenderPlan, layers: &LayerState) {
        self.calls.push(HostCall::Render(*layers));
    }

    fn update_layers(&mut self, layers: &LayerState) {
        self.calls.push(HostCall::UpdateLayers(*layers));
    }

    fn dispatch(&mut self, event: ElementEvent) {
        self.calls.push(HostCall::Dispatch(event));
    }
}
