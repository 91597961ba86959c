//! Body pose landmarks.

pub mod landmark;
