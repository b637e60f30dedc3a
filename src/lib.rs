//! Emergency risk map: a pannable, zoomable terminal map with a risk
//! density field, clickable risk markers and a detail popup.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod map;
pub mod overlay;
pub mod risk;
pub mod ui;
