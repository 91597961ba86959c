//! Hand landmarks and their anatomical layout.

pub mod landmark;
