//! Digitizing and maintaining plot regions over a reference image.
//!
//! Shapes are authored in a fixed high-resolution reference space and shown
//! over display images of other sizes. The engine here covers the scaling
//! between those spaces and the interactive polygon/circle editing on top of
//! them; `main.rs` wires it into an egui front-end.

pub mod bulk;
pub mod catalog;
pub mod editor;
pub mod export;
pub mod form;
pub mod geometry;
pub mod highlight;
pub mod loader;
pub mod model;
pub mod scale;
pub mod search;
pub mod settings;
pub mod workspace;
