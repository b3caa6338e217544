//! Terminal output: colored text for people, JSON for scripts.

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;
