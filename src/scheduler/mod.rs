//! # Scheduler Module
//!
//! Runs one [`Presenter`] per button. Each button gets its own tokio task
//! that owns the presenter, a queue of host events and the refresh, cycle
//! and scroll intervals. Buttons share nothing mutable with each other; the
//! feed source and display surface are shared read-only.
//!
//! A task handles one event at a time. A fetch is awaited inside the task, so
//! a slow board delays only the button that asked for it.
//!
//! Removing a button signals its task, which cancels the intervals, tears
//! the presenter down and exits. [`Scheduler::disappear`] waits for that, so
//! no tick can reach a discarded button.

mod presenter;
mod timer;

pub use presenter::{Effect, Event, Phase, Presenter};
pub use timer::{SCROLL_TICK, TimerPlan, TimerSlot};

use crate::compose::Image;
use crate::service::{self, FeedSource};
use crate::settings::Settings;
use log::{debug, error, info, trace};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use timer::Ticker;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Where rendered images go, e.g. a Stream Deck key.
pub trait DisplaySurface: Send + Sync + 'static {
    fn show(&self, instance: &InstanceId, image: &Image);
}

/// Opaque identity of one button instance, as assigned by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct InstanceHandle {
    events: mpsc::UnboundedSender<Event>,
    closing: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Registry of live button instances.
pub struct Scheduler<S, D> {
    source: Arc<S>,
    surface: Arc<D>,
    instances: HashMap<InstanceId, InstanceHandle>,
}

impl<S: FeedSource, D: DisplaySurface> Scheduler<S, D> {
    pub fn new(source: S, surface: D) -> Self {
        Self::with_shared(Arc::new(source), Arc::new(surface))
    }

    pub fn with_shared(source: Arc<S>, surface: Arc<D>) -> Self {
        Self {
            source,
            surface,
            instances: HashMap::new(),
        }
    }

    /// Starts presenting departures on `id`, fetching right away.
    ///
    /// An instance that already exists under `id` is torn down first.
    pub async fn appear(&mut self, id: InstanceId, settings: Settings) {
        if self.instances.contains_key(&id) {
            self.disappear(&id).await;
        }

        info!("instance {id} appeared for station {}", settings.station_id);
        let (events, receiver) = mpsc::unbounded_channel();
        let (closing, closing_rx) = watch::channel(false);
        // The receiver is alive, so this cannot fail.
        let _ = events.send(Event::Refresh);

        let task = tokio::spawn(run_instance(
            id.clone(),
            Presenter::new(settings),
            Arc::clone(&self.source),
            Arc::clone(&self.surface),
            receiver,
            closing_rx,
        ));
        self.instances.insert(id, InstanceHandle { events, closing, task });
    }

    /// Stops `id` and waits until its timers are cancelled and its state is
    /// gone. Returns `false` for unknown instances.
    pub async fn disappear(&mut self, id: &InstanceId) -> bool {
        let Some(handle) = self.instances.remove(id) else {
            return false;
        };
        let _ = handle.closing.send(true);
        if let Err(e) = handle.task.await {
            error!("instance {id} did not shut down cleanly: {e}");
        }
        info!("instance {id} disappeared");
        true
    }

    /// Applies new settings to `id`: refreshes now and re-arms the refresh timer.
    pub fn settings_changed(&self, id: &InstanceId, settings: Settings) -> bool {
        self.send(id, Event::SettingsChanged(settings))
    }

    /// The button was pressed.
    pub fn manual_advance(&self, id: &InstanceId) -> bool {
        self.send(id, Event::ManualAdvance)
    }

    /// Refreshes `id` now, keeping its refresh timer as it is.
    pub fn request_refresh(&self, id: &InstanceId) -> bool {
        self.send(id, Event::Refresh)
    }

    pub fn contains(&self, id: &InstanceId) -> bool {
        self.instances.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Tears down every instance.
    pub async fn shutdown(&mut self) {
        let ids: Vec<InstanceId> = self.instances.keys().cloned().collect();
        for id in ids {
            self.disappear(&id).await;
        }
    }

    fn send(&self, id: &InstanceId, event: Event) -> bool {
        match self.instances.get(id) {
            Some(handle) => handle.events.send(event).is_ok(),
            None => {
                debug!("dropping {event:?} for unknown instance {id}");
                false
            }
        }
    }
}

/// Event loop of one instance.
async fn run_instance<S: FeedSource, D: DisplaySurface>(
    id: InstanceId,
    mut presenter: Presenter,
    source: Arc<S>,
    surface: Arc<D>,
    mut events: mpsc::UnboundedReceiver<Event>,
    mut closing: watch::Receiver<bool>,
) {
    let mut refresh = Ticker::default();
    let mut cycle = Ticker::default();
    let mut scroll = Ticker::default();
    let mut pending = VecDeque::new();

    loop {
        refresh.sync(&presenter.timers().refresh);
        cycle.sync(&presenter.timers().cycle);
        scroll.sync(&presenter.timers().scroll);

        let event = match pending.pop_front() {
            Some(event) => event,
            None => tokio::select! {
                biased;
                _ = closing.changed() => Event::Teardown,
                event = events.recv() => event.unwrap_or(Event::Teardown),
                _ = refresh.tick() => Event::Refresh,
                _ = cycle.tick() => Event::Cycle,
                _ = scroll.tick() => Event::ScrollTick,
            },
        };

        if matches!(event, Event::Teardown) {
            refresh.cancel();
            cycle.cancel();
            scroll.cancel();
        }

        for effect in presenter.handle(event) {
            match effect {
                Effect::Render(image) => surface.show(&id, &image),
                Effect::Fetch(request) => {
                    debug!("instance {id}: fetching {} journeys for {}", request.count, request.station_id);
                    let loaded = tokio::select! {
                        biased;
                        _ = closing.changed() => Event::Teardown,
                        result = service::load_departures(source.as_ref(), &request) => Event::FeedLoaded(result),
                    };
                    pending.push_back(loaded);
                }
            }
        }

        if presenter.is_closed() {
            break;
        }
        trace!(
            "instance {id}: {:?}, departure {} of {}, frame {}",
            presenter.phase(),
            presenter.index() + 1,
            presenter.departures().len(),
            presenter.frame()
        );
    }

    debug!("instance {id}: stopped showing station {}", presenter.settings().station_id);
    drop(presenter);
}
