//! Selection resolution for card creation.

pub mod resolver;
