//! Terminal output: progress via `tracing`, final summary via `crossterm`.

pub mod reporter;
pub mod summary;
pub mod theme;

pub use reporter::LogReporter;
pub use theme::Theme;
