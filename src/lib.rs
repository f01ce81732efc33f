//! # oebb_deck
//!
//! Live ÖBB (Austrian Federal Railways) departures for a 144×144 px button.
//!
//! The crate polls the ÖBB departure board, normalizes its journey feed into
//! [`departure::Departure`] records and renders the current one as an SVG
//! image. When several departures are shown they rotate on a timer, and
//! destinations too long for the button scroll back and forth.
//!
//! The host application talks to a [`scheduler::Scheduler`], one instance per
//! button; network access and the display are plugged in through
//! [`service::FeedSource`] and [`scheduler::DisplaySurface`].

pub mod compose;
pub mod constants;
pub mod departure;
pub mod error;
pub mod feed;
pub mod field;
pub mod filter;
pub mod scheduler;
pub mod scroll;
pub mod service;
pub mod settings;
