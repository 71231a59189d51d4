//! Color model shared by the list, text and backend layers.
//!
//! Colors are straight-alpha and packed into 32 bits so a vertex stays small
//! and markup tokens map onto a color without conversion.

pub mod color;

pub use color::Color;
