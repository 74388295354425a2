//! Story Engine: CSV-authored branching dialogue for visual novels.
//!
//! Parses hand-authored story tables into a validated dialogue graph and
//! walks it with a small state machine. Rendering, audio, input and save
//! files belong to the host game.

pub mod core;
pub mod schema;
