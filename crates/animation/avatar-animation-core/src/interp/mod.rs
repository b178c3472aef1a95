//! Interpolation helpers: cubic-bezier timing shared by track sampling and weight easing.

pub mod functions;
