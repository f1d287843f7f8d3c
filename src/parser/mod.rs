// Selection event script parser

pub mod ast;
pub mod events;
pub mod lexer;
pub mod pipeline;

// Public API re-exports
pub use ast::{EventCommand, EventScript, ValueList};
pub use pipeline::parse_event_script;

use anyhow::{anyhow, Result};

/// Parse a script, turning nom's error into a readable one
pub fn parse_script(input: &str) -> Result<EventScript> {
    match parse_event_script(input) {
        Ok((_, script)) => Ok(script),
        Err(e) => Err(anyhow!("Parse error in event script: {:?}", e)),
    }
}
