use crate::dashboard::SelectionEvent;
use crate::data::{Dataset, TestPrep};
use crate::parser::ast::{EventCommand, EventScript, ValueList};
use std::collections::BTreeSet;

/// Resolve a parsed script against the dataset's control options
pub fn resolve_events(script: &EventScript, dataset: &Dataset) -> Vec<SelectionEvent> {
    script
        .events
        .iter()
        .map(|cmd| resolve_event(cmd, dataset))
        .collect()
}

fn resolve_event(cmd: &EventCommand, dataset: &Dataset) -> SelectionEvent {
    match cmd {
        EventCommand::Education(values) => SelectionEvent::EducationLevels(resolve_strings(
            values,
            dataset.education_levels(),
            "education",
        )),
        EventCommand::Race(values) => {
            SelectionEvent::Races(resolve_strings(values, dataset.races(), "race"))
        }
        EventCommand::Metric(metric) => SelectionEvent::Metric(*metric),
        EventCommand::Prep(values) => SelectionEvent::TestPrep(match values {
            ValueList::All => TestPrep::ALL.into_iter().collect(),
            ValueList::Listed(v) => v.iter().copied().collect(),
        }),
    }
}

fn resolve_strings(
    values: &ValueList<String>,
    options: Vec<String>,
    control: &str,
) -> BTreeSet<String> {
    match values {
        ValueList::All => options.into_iter().collect(),
        ValueList::Listed(listed) => {
            // Unknown values are kept: they simply match no rows
            for v in listed.iter().filter(|v| !options.contains(v)) {
                log::warn!("{} value '{}' does not occur in the dataset", control, v);
            }
            listed.iter().cloned().collect()
        }
    }
}
