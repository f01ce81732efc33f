//! The per-button presentation state machine.
//!
//! A [`Presenter`] owns everything one button shows: the filtered departures,
//! which of them is on screen, the scroll frame counter and the plan of which
//! timers should run. It performs no I/O. Every input arrives as an
//! [`Event`] and every output leaves as an [`Effect`], so the whole
//! behaviour can be driven synchronously in tests.

use super::timer::{SCROLL_TICK, TimerPlan};
use crate::compose::{self, Image, Position};
use crate::constants::{FETCH_ERROR, NO_DEPARTURES};
use crate::departure::Departure;
use crate::error::FetchError;
use crate::field::{self, Field};
use crate::filter;
use crate::scroll;
use crate::service::FeedRequest;
use crate::settings::Settings;
use log::{debug, warn};

/// Inputs of the state machine, processed strictly in arrival order.
#[derive(Debug)]
pub enum Event {
    /// The refresh timer fired or a refresh was requested.
    Refresh,
    /// A fetch requested through [`Effect::Fetch`] finished.
    FeedLoaded(Result<Vec<Departure>, FetchError>),
    /// The rotation timer fired.
    Cycle,
    /// The scroll animation timer fired.
    ScrollTick,
    /// The user pressed the button.
    ManualAdvance,
    SettingsChanged(Settings),
    /// The button went away; nothing may happen afterwards.
    Teardown,
}

/// Outputs the event loop has to carry out.
#[derive(Debug)]
pub enum Effect {
    /// Fetch the board and answer with [`Event::FeedLoaded`].
    Fetch(FeedRequest),
    /// Show this image on the button.
    Render(Image),
}

/// How many departures are being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing to show: before the first load, after an empty board or a
    /// failed fetch.
    Empty,
    Single,
    /// Several departures rotate on the cycle timer.
    Cycling,
}

#[derive(Debug)]
pub struct Presenter {
    settings: Settings,
    departures: Vec<Departure>,
    index: usize,
    frame: u32,
    phase: Phase,
    timers: TimerPlan,
    closed: bool,
}

impl Presenter {
    /// A presenter with no departures yet and the refresh timer armed.
    pub fn new(settings: Settings) -> Self {
        let mut timers = TimerPlan::default();
        timers.refresh.arm(settings.refresh_period());
        Self {
            settings,
            departures: Vec::new(),
            index: 0,
            frame: 0,
            phase: Phase::Empty,
            timers,
            closed: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn departures(&self) -> &[Departure] {
        &self.departures
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Scroll frame counter of the departure on screen.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn timers(&self) -> &TimerPlan {
        &self.timers
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn current(&self) -> Option<&Departure> {
        self.departures.get(self.index)
    }

    /// Applies one event and returns what has to happen as a result.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        if self.closed {
            debug!("ignoring {event:?} after teardown");
            return Vec::new();
        }

        match event {
            Event::Refresh => vec![Effect::Fetch(self.request())],
            Event::FeedLoaded(Ok(departures)) => vec![self.show(departures)],
            Event::FeedLoaded(Err(e)) => {
                warn!("Error updating departures for station {}: {e}", self.settings.station_id);
                self.clear();
                vec![Effect::Render(compose::message_image(FETCH_ERROR))]
            }
            Event::Cycle => {
                if self.phase != Phase::Cycling {
                    return Vec::new();
                }
                self.advance();
                vec![Effect::Render(self.render())]
            }
            Event::ScrollTick => {
                if !self.timers.scroll.is_armed() || self.current().is_none() {
                    return Vec::new();
                }
                self.frame = self.frame.saturating_add(scroll::FRAME_STEP);
                vec![Effect::Render(self.render())]
            }
            Event::ManualAdvance => {
                if self.phase != Phase::Cycling {
                    return vec![Effect::Fetch(self.request())];
                }
                self.advance();
                self.timers.cycle.arm(self.settings.cycle_period());
                vec![Effect::Render(self.render())]
            }
            Event::SettingsChanged(settings) => {
                self.settings = settings;
                self.timers.refresh.arm(self.settings.refresh_period());
                vec![Effect::Fetch(self.request())]
            }
            Event::Teardown => {
                self.timers.disarm_all();
                self.departures.clear();
                self.closed = true;
                Vec::new()
            }
        }
    }

    fn request(&self) -> FeedRequest {
        FeedRequest {
            station_id: self.settings.station_id.clone(),
            count: self.settings.fetch_count(),
        }
    }

    /// Replaces the departure list with a freshly loaded board.
    fn show(&mut self, departures: Vec<Departure>) -> Effect {
        self.departures = filter::select(
            departures,
            self.settings.train_filter.as_deref(),
            self.settings.departure_count,
        );
        self.index = 0;
        self.frame = 0;
        self.phase = match self.departures.len() {
            0 => Phase::Empty,
            1 => Phase::Single,
            _ => Phase::Cycling,
        };
        debug!(
            "station {}: {} departures, {:?}",
            self.settings.station_id,
            self.departures.len(),
            self.phase
        );

        if self.phase == Phase::Cycling {
            self.timers.cycle.arm(self.settings.cycle_period());
        } else {
            self.timers.cycle.disarm();
        }
        self.rearm_scroll();

        if self.departures.is_empty() {
            Effect::Render(compose::message_image(NO_DEPARTURES))
        } else {
            Effect::Render(self.render())
        }
    }

    fn clear(&mut self) {
        self.departures.clear();
        self.index = 0;
        self.frame = 0;
        self.phase = Phase::Empty;
        self.timers.cycle.disarm();
        self.timers.scroll.disarm();
    }

    fn advance(&mut self) {
        self.index = (self.index + 1) % self.departures.len();
        self.frame = 0;
        self.rearm_scroll();
    }

    /// Re-evaluates the scroll timer for the departure on screen.
    fn rearm_scroll(&mut self) {
        if self.wants_scroll() {
            self.timers.scroll.arm(SCROLL_TICK);
        } else {
            self.timers.scroll.disarm();
        }
    }

    fn wants_scroll(&self) -> bool {
        self.settings.enable_scrolling
            && self.settings.shows(&Field::Destination)
            && self
                .current()
                .is_some_and(|d| scroll::needs_scroll(field::clean_destination(d.destination())))
    }

    fn render(&self) -> Image {
        match self.current() {
            Some(departure) => compose::departure_image(
                departure,
                &self.settings.fields(),
                self.frame,
                Position {
                    current: self.index + 1,
                    total: self.departures.len(),
                },
            ),
            None => compose::message_image(NO_DEPARTURES),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::Content;
    use std::time::Duration;

    fn departure(train: &str, destination: &str) -> Departure {
        Departure::new(
            train.to_string(),
            destination.to_string(),
            "14:05".to_string(),
            "14:05".to_string(),
            "1".to_string(),
            "0".to_string(),
            false,
        )
    }

    fn settings(count: usize) -> Settings {
        Settings {
            departure_count: count,
            ..Settings::default()
        }
    }

    fn rendered(effects: &[Effect]) -> &Image {
        match effects {
            [Effect::Render(image)] => image,
            other => panic!("expected a single render, got {other:?}"),
        }
    }

    fn counter(image: &Image) -> Option<&str> {
        match image.content() {
            Content::Departure { counter, .. } => counter.as_deref(),
            Content::Message(_) => None,
        }
    }

    fn loaded(presenter: &mut Presenter, departures: Vec<Departure>) -> Vec<Effect> {
        presenter.handle(Event::FeedLoaded(Ok(departures)))
    }

    #[test]
    fn starts_empty_with_refresh_armed() {
        let presenter = Presenter::new(Settings::default());
        assert_eq!(presenter.phase(), Phase::Empty);
        assert_eq!(presenter.timers().refresh.period(), Some(Duration::from_secs(120)));
        assert!(!presenter.timers().cycle.is_armed());
        assert!(!presenter.timers().scroll.is_armed());
    }

    #[test]
    fn refresh_requests_fetch() {
        let mut presenter = Presenter::new(settings(2));
        let effects = presenter.handle(Event::Refresh);
        match effects.as_slice() {
            [Effect::Fetch(request)] => {
                assert_eq!(request.station_id, "1290401");
                assert_eq!(request.count, 50);
            }
            other => panic!("expected a fetch, got {other:?}"),
        }
    }

    #[test]
    fn empty_board_shows_placeholder() {
        let mut presenter = Presenter::new(settings(1));
        let effects = loaded(&mut presenter, Vec::new());
        assert_eq!(rendered(&effects).message(), Some("No departures"));
        assert_eq!(presenter.phase(), Phase::Empty);
    }

    #[test]
    fn fetch_failure_shows_error_and_keeps_refreshing() {
        let mut presenter = Presenter::new(settings(2));
        loaded(&mut presenter, vec![departure("S 1", "Wels"), departure("S 2", "Linz")]);
        assert!(presenter.timers().cycle.is_armed());

        let effects = presenter.handle(Event::FeedLoaded(Err(FetchError::Unavailable("timeout".into()))));
        assert_eq!(rendered(&effects).message(), Some("Error"));
        assert_eq!(presenter.phase(), Phase::Empty);
        assert!(presenter.departures().is_empty());
        assert!(presenter.timers().refresh.is_armed());
        assert!(!presenter.timers().cycle.is_armed());
    }

    #[test]
    fn single_departure_does_not_cycle() {
        let mut presenter = Presenter::new(settings(1));
        let effects = loaded(&mut presenter, vec![departure("S 1", "Wels"), departure("S 2", "Linz")]);
        assert_eq!(presenter.phase(), Phase::Single);
        assert_eq!(presenter.departures().len(), 1);
        assert_eq!(counter(rendered(&effects)), None);
        assert!(!presenter.timers().cycle.is_armed());
        assert!(presenter.handle(Event::Cycle).is_empty());
    }

    #[test]
    fn cycle_moves_to_next_departure_and_resets_frame() {
        let mut presenter = Presenter::new(settings(2));
        loaded(
            &mut presenter,
            vec![departure("S 1", "Flughafen Wien Bahnhof"), departure("S 2", "Linz")],
        );
        assert_eq!(presenter.phase(), Phase::Cycling);
        assert_eq!(presenter.timers().cycle.period(), Some(Duration::from_secs(10)));

        presenter.handle(Event::ScrollTick);
        presenter.handle(Event::ScrollTick);
        assert_eq!(presenter.frame(), 4);

        let effects = presenter.handle(Event::Cycle);
        assert_eq!(presenter.index(), 1);
        assert_eq!(presenter.frame(), 0);
        assert_eq!(counter(rendered(&effects)), Some("2/2"));

        presenter.handle(Event::Cycle);
        assert_eq!(presenter.index(), 0);
    }

    #[test]
    fn scroll_timer_follows_current_destination() {
        let mut presenter = Presenter::new(settings(2));
        loaded(
            &mut presenter,
            vec![departure("S 1", "Flughafen Wien"), departure("S 2", "Linz Bahnhof")],
        );
        assert_eq!(presenter.timers().scroll.period(), Some(SCROLL_TICK));

        presenter.handle(Event::Cycle);
        assert!(!presenter.timers().scroll.is_armed());
        assert!(presenter.handle(Event::ScrollTick).is_empty());

        let epoch = presenter.timers().scroll.epoch();
        presenter.handle(Event::Cycle);
        assert!(presenter.timers().scroll.is_armed());
        assert!(presenter.timers().scroll.epoch() > epoch);
    }

    #[test]
    fn scroll_needs_destination_on_a_line() {
        let mut presenter = Presenter::new(Settings {
            line2: Field::Platform,
            ..settings(1)
        });
        loaded(&mut presenter, vec![departure("S 1", "Flughafen Wien")]);
        assert!(!presenter.timers().scroll.is_armed());
    }

    #[test]
    fn scroll_can_be_disabled() {
        let mut presenter = Presenter::new(Settings {
            enable_scrolling: false,
            ..settings(1)
        });
        loaded(&mut presenter, vec![departure("S 1", "Flughafen Wien")]);
        assert!(!presenter.timers().scroll.is_armed());
    }

    #[test]
    fn scroll_tick_moves_destination() {
        let mut presenter = Presenter::new(settings(1));
        loaded(&mut presenter, vec![departure("S 1", "Flughafen Wien")]);

        let mut last = Vec::new();
        for _ in 0..40 {
            last = presenter.handle(Event::ScrollTick);
        }
        assert_eq!(presenter.frame(), 80);
        match rendered(&last).content() {
            Content::Departure { offsets, .. } => assert_eq!(offsets[1], -20),
            Content::Message(_) => panic!("expected a departure"),
        }
    }

    #[test]
    fn manual_advance_while_cycling_restarts_cycle_timer() {
        let mut presenter = Presenter::new(settings(3));
        loaded(
            &mut presenter,
            vec![departure("S 1", "Wels"), departure("S 2", "Linz"), departure("S 3", "Enns")],
        );
        let epoch = presenter.timers().cycle.epoch();

        let effects = presenter.handle(Event::ManualAdvance);
        assert_eq!(presenter.index(), 1);
        assert_eq!(counter(rendered(&effects)), Some("2/3"));
        assert!(presenter.timers().cycle.epoch() > epoch);
    }

    #[test]
    fn manual_advance_without_rotation_refreshes() {
        let mut presenter = Presenter::new(settings(1));
        assert!(matches!(presenter.handle(Event::ManualAdvance).as_slice(), [Effect::Fetch(_)]));

        loaded(&mut presenter, vec![departure("S 1", "Wels")]);
        assert!(matches!(presenter.handle(Event::ManualAdvance).as_slice(), [Effect::Fetch(_)]));
    }

    #[test]
    fn settings_change_rearms_refresh_and_refetches() {
        let mut presenter = Presenter::new(Settings::default());
        let epoch = presenter.timers().refresh.epoch();

        let effects = presenter.handle(Event::SettingsChanged(Settings {
            station_id: "8100013".to_string(),
            refresh_interval: 30,
            ..Settings::default()
        }));

        match effects.as_slice() {
            [Effect::Fetch(request)] => assert_eq!(request.station_id, "8100013"),
            other => panic!("expected a fetch, got {other:?}"),
        }
        assert_eq!(presenter.timers().refresh.period(), Some(Duration::from_secs(30)));
        assert!(presenter.timers().refresh.epoch() > epoch);
    }

    #[test]
    fn filter_applies_before_count() {
        let mut presenter = Presenter::new(Settings {
            train_filter: Some("REX".to_string()),
            ..settings(2)
        });
        loaded(
            &mut presenter,
            vec![
                departure("S 1", "Wels"),
                departure("REX 1", "Linz"),
                departure("S 2", "Enns"),
                departure("REX 2", "Steyr"),
                departure("REX 3", "Amstetten"),
            ],
        );
        let trains: Vec<&str> = presenter.departures().iter().map(Departure::train).collect();
        assert_eq!(trains, ["REX 1", "REX 2"]);
    }

    #[test]
    fn teardown_disarms_everything_and_ignores_later_events() {
        let mut presenter = Presenter::new(settings(2));
        loaded(
            &mut presenter,
            vec![departure("S 1", "Flughafen Wien"), departure("S 2", "Linz")],
        );

        assert!(presenter.handle(Event::Teardown).is_empty());
        assert!(presenter.is_closed());
        assert!(!presenter.timers().refresh.is_armed());
        assert!(!presenter.timers().cycle.is_armed());
        assert!(!presenter.timers().scroll.is_armed());

        assert!(presenter.handle(Event::Refresh).is_empty());
        assert!(presenter.handle(Event::Cycle).is_empty());
        assert!(presenter.handle(Event::ScrollTick).is_empty());
    }
}
