//! Smartlink grammar and the engine resolving matches to rendered text.

mod engine;
mod grammar;

pub use engine::{LinkEngine, Resolution};
pub use grammar::{Grammar, LinkKind, ParsedLink};
