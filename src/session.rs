//! Map rendering session lifecycle.
//!
//! A session owns one marker set and one image surface from the moment the
//! map is shown until it is cleared or replaced. It drives the surface
//! through `Unloaded -> Loading -> Ready` (or `Failed`), projects the
//! markers once the surface is measurable, and re-projects on every
//! debounced resize. Starting a new session always tears the previous one
//! down first, so no observation task or pending timer leaks across
//! sessions.
//!
//! The platform (a browser via WASM bindings, a test harness, an embedded
//! webview) is abstracted behind three small traits; this crate supplies
//! the lifecycle logic only. Requires a spawning runtime, so the module is
//! native-only.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::{
    geometry::{self, Marker, PositionedMarker, RenderSurface},
    CampusCardError,
};

/// Readiness of the image surface backing the map.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImagePhase {
    /// Surface reference exists, dimensions unconfirmed.
    Unloaded,
    /// Load requested; a bounded wait is in progress.
    Loading,
    /// Dimensions confirmed non-zero; markers may be projected.
    Ready,
    /// Load failed or timed out. Terminal for this surface instance.
    Failed,
}

/// The image element the map is rendered onto.
#[async_trait]
pub trait ImageSurface: Send + Sync {
    /// Current natural and displayed dimensions. Axes read zero until the
    /// image has loaded and laid out.
    fn measure(&self) -> RenderSurface;

    /// Whether the underlying image reports its load as complete.
    fn is_complete(&self) -> bool;

    /// Resolves when the load event fires, or with the platform's message
    /// when the error event fires instead.
    async fn loaded(&self) -> Result<(), String>;

    /// One animation-frame tick. Two of these are awaited after the load
    /// event so layout settles before the surface is measured.
    async fn layout_tick(&self);

    /// Re-requests the image, bypassing caches. Used when a surface claims
    /// a completed load but still reports zero dimensions.
    fn request_reload(&self);
}

/// Rendering callback for positioned markers.
pub trait MarkerRenderer: Send + Sync {
    fn render(&self, markers: &[PositionedMarker]);
    fn clear(&self);
    /// Replaces the map region with an inline error placeholder.
    fn show_error(&self, message: &str);
}

/// Stream of displayed-size changes for the observed surface.
#[async_trait]
pub trait ResizeEvents: Send {
    /// Next size-change event; `None` once the source is closed.
    async fn changed(&mut self) -> Option<()>;
}

/// Per-element size observation, for platforms that can watch a single
/// element. The platform feeds the sender returned by [`channel`].
///
/// [`channel`]: ElementResizeEvents::channel
pub struct ElementResizeEvents {
    rx: mpsc::Receiver<()>,
}

impl ElementResizeEvents {
    pub fn channel(capacity: usize) -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { rx })
    }
}

#[async_trait]
impl ResizeEvents for ElementResizeEvents {
    async fn changed(&mut self) -> Option<()> {
        self.rx.recv().await
    }
}

/// Fallback observation through global window-resize events. Coarser than
/// element observation (fires for any window change), which is acceptable:
/// re-projection is idempotent.
pub struct WindowResizeEvents {
    rx: broadcast::Receiver<()>,
}

impl WindowResizeEvents {
    pub fn subscribe(window_events: &broadcast::Sender<()>) -> Self {
        Self {
            rx: window_events.subscribe(),
        }
    }
}

#[async_trait]
impl ResizeEvents for WindowResizeEvents {
    async fn changed(&mut self) -> Option<()> {
        match self.rx.recv().await {
            // Missed events collapse into the one we deliver.
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => Some(()),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

/// Resize-event sources the platform offers at session construction.
pub struct PlatformEvents {
    /// Per-element size events, when the platform supports observing a
    /// single element. `None` on platforms without that capability.
    pub element: Option<mpsc::Receiver<()>>,
    /// Global window-resize events, always available.
    pub window: broadcast::Sender<()>,
}

/// Picks the observation strategy the platform supports: per-element
/// observation when available, otherwise the window-resize fallback.
pub fn select_resize_events(platform: PlatformEvents) -> Box<dyn ResizeEvents> {
    match platform.element {
        Some(rx) => Box::new(ElementResizeEvents { rx }),
        None => Box::new(WindowResizeEvents::subscribe(&platform.window)),
    }
}

/// Bounds on the session's waits.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionOptions {
    /// Maximum wait for the image load event, in milliseconds.
    pub load_timeout_ms: u64,
    /// Quiet period after a resize burst before re-projecting.
    pub debounce_ms: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            load_timeout_ms: 10_000,
            debounce_ms: 100,
        }
    }
}

struct Session {
    task: JoinHandle<()>,
    phase: watch::Receiver<ImagePhase>,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Owner of the active map rendering session.
///
/// At most one session is live at a time; [`begin_session`] replaces the
/// previous one, releasing its observation task and timers before anything
/// else happens.
///
/// [`begin_session`]: MapView::begin_session
#[derive(Default)]
pub struct MapView {
    active: Option<Session>,
}

impl MapView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts rendering `markers` onto `surface`.
    ///
    /// The marker list is cached in native space for the session's lifetime
    /// and re-projected (never mutated) on every debounced resize event.
    pub fn begin_session(
        &mut self,
        markers: Vec<Marker>,
        surface: Arc<dyn ImageSurface>,
        renderer: Arc<dyn MarkerRenderer>,
        resize: Box<dyn ResizeEvents>,
        options: SessionOptions,
    ) {
        self.end_session();

        let (phase_tx, phase_rx) = watch::channel(ImagePhase::Unloaded);
        let task = tokio::spawn(drive_session(
            markers, surface, renderer, resize, options, phase_tx,
        ));
        self.active = Some(Session {
            task,
            phase: phase_rx,
        });
    }

    /// Tears the active session down: aborts the observation task and drops
    /// its timers. Safe to call with no session active.
    pub fn end_session(&mut self) {
        self.active = None;
    }

    /// Readiness of the active session's surface;
    /// [`ImagePhase::Unloaded`] when no session is active.
    pub fn phase(&self) -> ImagePhase {
        self.active
            .as_ref()
            .map_or(ImagePhase::Unloaded, |session| *session.phase.borrow())
    }
}

async fn drive_session(
    markers: Vec<Marker>,
    surface: Arc<dyn ImageSurface>,
    renderer: Arc<dyn MarkerRenderer>,
    mut resize: Box<dyn ResizeEvents>,
    options: SessionOptions,
    phase: watch::Sender<ImagePhase>,
) {
    renderer.clear();
    let _ = phase.send(ImagePhase::Loading);

    if let Err(err) = wait_until_ready(&*surface, options.load_timeout_ms).await {
        let _ = phase.send(ImagePhase::Failed);
        let placeholder = match &err {
            CampusCardError::LoadTimeout { .. } => {
                "map loading timed out, refresh the page to retry"
            }
            _ => "map failed to load, check your network connection and refresh",
        };
        renderer.show_error(placeholder);
        return;
    }

    let _ = phase.send(ImagePhase::Ready);
    render_markers(&markers, &*surface, &*renderer);

    while resize.changed().await.is_some() {
        absorb_resize_burst(&mut resize, options.debounce_ms).await;

        #[cfg(feature = "tracing")]
        tracing::debug!("surface size changed, re-projecting markers");

        renderer.clear();
        render_markers(&markers, &*surface, &*renderer);
    }
}

/// Drives `Loading` to completion: waits (bounded) for the load event,
/// then lets layout settle across two frame ticks.
async fn wait_until_ready(
    surface: &dyn ImageSurface,
    load_timeout_ms: u64,
) -> Result<(), CampusCardError> {
    if surface.is_complete() && surface.measure().is_measurable() {
        // Cached image, already laid out.
        return Ok(());
    }

    if surface.is_complete() {
        // Completed but zero-size: a stale cache entry. Force a fresh
        // request before waiting on the load event.
        surface.request_reload();
    }

    let load = timeout(Duration::from_millis(load_timeout_ms), surface.loaded()).await;
    match load {
        Err(_elapsed) => {
            #[cfg(feature = "tracing")]
            tracing::error!(load_timeout_ms, "map image load timed out");
            Err(CampusCardError::LoadTimeout {
                timeout_ms: load_timeout_ms,
            })
        }
        Ok(Err(cause)) => {
            #[cfg(feature = "tracing")]
            tracing::error!(%cause, "map image failed to load");
            Err(CampusCardError::ImageLoad(cause))
        }
        Ok(Ok(())) => {
            surface.layout_tick().await;
            surface.layout_tick().await;
            Ok(())
        }
    }
}

/// Absorbs a burst of resize events: keeps draining until the stream stays
/// quiet for `debounce_ms`.
async fn absorb_resize_burst(resize: &mut Box<dyn ResizeEvents>, debounce_ms: u64) {
    loop {
        match timeout(Duration::from_millis(debounce_ms), resize.changed()).await {
            // Another event inside the quiet window resets the timer.
            Ok(Some(())) => continue,
            // Source closed; render with what we have.
            Ok(None) => return,
            // Quiet period elapsed.
            Err(_elapsed) => return,
        }
    }
}

fn render_markers(markers: &[Marker], surface: &dyn ImageSurface, renderer: &dyn MarkerRenderer) {
    // A deferred projection (unmeasurable surface) is skipped, not failed;
    // the next resize event retries it.
    if let Some(positioned) = geometry::project(markers, surface.measure()) {
        renderer.render(&positioned);
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::{broadcast, mpsc};

    use super::{select_resize_events, PlatformEvents, ResizeEvents};

    #[tokio::test]
    async fn element_observation_is_preferred_when_available() {
        let (window, _) = broadcast::channel(4);
        let (element_tx, element_rx) = mpsc::channel(4);

        let mut events = select_resize_events(PlatformEvents {
            element: Some(element_rx),
            window: window.clone(),
        });

        element_tx.send(()).await.expect("receiver alive");
        // Window events must not reach an element-observed session.
        let _ = window.send(());
        drop(element_tx);

        assert_eq!(events.changed().await, Some(()));
        assert_eq!(events.changed().await, None);
    }

    #[tokio::test]
    async fn window_fallback_delivers_global_events() {
        let (window, _) = broadcast::channel(4);
        let mut events = select_resize_events(PlatformEvents {
            element: None,
            window: window.clone(),
        });

        window.send(()).expect("subscriber alive");
        assert_eq!(events.changed().await, Some(()));

        drop(window);
        assert_eq!(events.changed().await, None);
    }
}
