//! Srishti: recognition of medical signs from hand and body landmarks.
//!
//! Srishti consumes the output of two independent perception networks, one producing hand
//! landmarks and one producing body pose landmarks, and classifies the latest result of both into
//! a small vocabulary of signs ([`gesture::Gesture`]). Some of these signs ("Fever", "Chest Pain",
//! "Headache") are medical emergencies and raise an alert for volunteers.
//!
//! The entry point is [`session::Session`]. The individual stages ([`fusion`], [`gesture`],
//! [`cooldown`], [`alert`]) are usable on their own.
//!
//! # Coordinates
//!
//! All landmark coordinates are normalized to the camera image: X and Y are in range `0.0..=1.0`,
//! X points to the right and Y points *down*, so a smaller Y means higher up in the frame.
//!
//! # Environment Variables
//!
//! [`session::SessionOptions::from_env`] reads the following environment variables:
//!
//! * `SRISHTI_RULES`: Selects the classifier rule set. Allowed values are:
//!   * `dashboard` (default): open-palm "Fever", no "Throat Pain".
//!   * `standalone`: two-finger "Fever", wider head and chest regions, and "Throat Pain".
//! * `SRISHTI_COOLDOWN_MS`: Overrides the cooldown after an emitted gesture, in milliseconds
//!   (default: 2000).

use log::LevelFilter;

pub mod alert;
pub mod body;
pub mod cooldown;
pub mod fusion;
pub mod gesture;
pub mod hand;
pub mod history;
pub mod iter;
pub mod landmark;
pub mod overlay;
pub mod predicate;
pub mod session;
pub mod timer;
pub mod worker;


/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and Srishti will log at *debug* level unless overridden with `RUST_LOG`.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
