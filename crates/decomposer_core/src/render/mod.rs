//! Text projection for rendering surfaces.

pub mod projector;
