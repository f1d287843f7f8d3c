// Abstract Syntax Tree for the selection event script

use crate::data::{Metric, TestPrep};

/// Options named in a checklist/dropdown command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueList<T> {
    /// `*`: every option the dataset offers
    All,
    Listed(Vec<T>),
}

/// One control change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventCommand {
    Education(ValueList<String>),
    Race(ValueList<String>),
    /// `metric()` clears the dropdown
    Metric(Option<Metric>),
    Prep(ValueList<TestPrep>),
}

/// Complete script: commands applied left to right
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventScript {
    pub events: Vec<EventCommand>,
}
