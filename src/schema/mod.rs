pub mod node;
pub mod progress;
