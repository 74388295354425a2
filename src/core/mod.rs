pub mod csv;
pub mod loader;
pub mod manifest;
pub mod playtest;
pub mod traversal;
