// Event-driven dashboard: merges control changes and recomputes dependent charts

use crate::data::{Dataset, Metric, TestPrep};
use crate::ir::ChartOutcome;
use crate::selection::Selection;
use crate::transform;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// The four charts on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartId {
    EducationLunch,
    RaceSubject,
    #[serde(rename = "histogram")]
    ScoreHistogram,
    #[serde(rename = "boxplot")]
    PrepBoxplot,
}

impl ChartId {
    pub const ALL: [ChartId; 4] = [
        ChartId::EducationLunch,
        ChartId::RaceSubject,
        ChartId::ScoreHistogram,
        ChartId::PrepBoxplot,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChartId::EducationLunch => "education-lunch",
            ChartId::RaceSubject => "race-subject",
            ChartId::ScoreHistogram => "histogram",
            ChartId::PrepBoxplot => "boxplot",
        }
    }

    /// Whether a change to `control` invalidates this chart
    pub fn depends_on(self, control: Control) -> bool {
        match self {
            ChartId::EducationLunch => {
                matches!(control, Control::EducationLevels | Control::Metric)
            }
            ChartId::RaceSubject => {
                matches!(control, Control::Races | Control::Metric | Control::TestPrep)
            }
            ChartId::ScoreHistogram | ChartId::PrepBoxplot => {
                matches!(control, Control::Metric | Control::TestPrep)
            }
        }
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChartId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        ChartId::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown chart '{}'", s))
    }
}

/// Dashboard filter controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    EducationLevels,
    Races,
    Metric,
    TestPrep,
}

/// A single control's new value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    EducationLevels(BTreeSet<String>),
    Races(BTreeSet<String>),
    Metric(Option<Metric>),
    TestPrep(BTreeSet<TestPrep>),
}

impl SelectionEvent {
    pub fn control(&self) -> Control {
        match self {
            SelectionEvent::EducationLevels(_) => Control::EducationLevels,
            SelectionEvent::Races(_) => Control::Races,
            SelectionEvent::Metric(_) => Control::Metric,
            SelectionEvent::TestPrep(_) => Control::TestPrep,
        }
    }

    /// Merge into a selection, replacing only this control's value
    pub fn apply_to(self, selection: &mut Selection) {
        match self {
            SelectionEvent::EducationLevels(v) => selection.education_levels = v,
            SelectionEvent::Races(v) => selection.races = v,
            SelectionEvent::Metric(v) => selection.metric = v,
            SelectionEvent::TestPrep(v) => selection.test_prep = v,
        }
    }
}

/// A freshly computed chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartUpdate {
    pub chart: ChartId,
    pub outcome: ChartOutcome,
}

/// Dropdown entry: the value sent back on change and the text shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricOption {
    pub value: Metric,
    pub label: &'static str,
}

/// Option lists offered by each control
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlOptions {
    pub education_levels: Vec<String>,
    pub races: Vec<String>,
    pub metrics: Vec<MetricOption>,
    pub test_prep: Vec<TestPrep>,
}

/// Evaluate one chart against a selection snapshot
pub fn evaluate(chart: ChartId, dataset: &Dataset, selection: &Selection) -> ChartOutcome {
    match chart {
        ChartId::EducationLunch => transform::education_lunch_comparison(
            dataset,
            &selection.education_levels,
            selection.metric,
        ),
        ChartId::RaceSubject => transform::race_subject_comparison(
            dataset,
            &selection.races,
            selection.metric,
            &selection.test_prep,
        ),
        ChartId::ScoreHistogram => {
            transform::score_distribution(dataset, selection.metric, &selection.test_prep)
        }
        ChartId::PrepBoxplot => {
            transform::score_spread(dataset, selection.metric, &selection.test_prep)
        }
    }
}

/// Holds the current selection over a shared read-only dataset
pub struct Dashboard<'a> {
    dataset: &'a Dataset,
    selection: Selection,
}

impl<'a> Dashboard<'a> {
    pub fn new(dataset: &'a Dataset, selection: Selection) -> Self {
        let unknown = selection.unknown_values(dataset);
        if !unknown.is_empty() {
            log::warn!("selection contains values absent from the dataset: {:?}", unknown);
        }
        Self { dataset, selection }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn controls(&self) -> ControlOptions {
        ControlOptions {
            education_levels: self.dataset.education_levels(),
            races: self.dataset.races(),
            metrics: Metric::ALL
                .into_iter()
                .map(|value| MetricOption {
                    value,
                    label: value.label(),
                })
                .collect(),
            test_prep: TestPrep::ALL.to_vec(),
        }
    }

    /// Apply one control change and recompute the charts that depend on it.
    /// All returned outcomes observe the same post-event selection.
    pub fn apply(&mut self, event: SelectionEvent) -> Vec<ChartUpdate> {
        let control = event.control();
        event.apply_to(&mut self.selection);
        log::debug!("{:?} changed, selection now {:?}", control, self.selection);

        let snapshot = self.selection.clone();
        ChartId::ALL
            .into_iter()
            .filter(|c| c.depends_on(control))
            .map(|chart| ChartUpdate {
                chart,
                outcome: evaluate(chart, self.dataset, &snapshot),
            })
            .collect()
    }

    /// Apply several events in order, keeping only the latest outcome per chart
    pub fn apply_all(&mut self, events: impl IntoIterator<Item = SelectionEvent>) -> Vec<ChartUpdate> {
        let mut latest: Vec<ChartUpdate> = Vec::new();
        for event in events {
            for update in self.apply(event) {
                match latest.iter_mut().find(|u| u.chart == update.chart) {
                    Some(slot) => *slot = update,
                    None => latest.push(update),
                }
            }
        }
        latest.sort_by_key(|u| u.chart);
        latest
    }

    pub fn evaluate(&self, chart: ChartId) -> ChartOutcome {
        evaluate(chart, self.dataset, &self.selection)
    }

    /// Outcomes for `charts`, reusing `updates` already computed for the
    /// current selection and evaluating only the charts they do not cover
    pub fn outcomes_for(&self, charts: &[ChartId], mut updates: Vec<ChartUpdate>) -> Vec<ChartUpdate> {
        charts
            .iter()
            .map(|&chart| match updates.iter().position(|u| u.chart == chart) {
                Some(idx) => updates.swap_remove(idx),
                None => ChartUpdate {
                    chart,
                    outcome: self.evaluate(chart),
                },
            })
            .collect()
    }

    pub fn refresh_all(&self) -> Vec<ChartUpdate> {
        ChartId::ALL
            .into_iter()
            .map(|chart| ChartUpdate {
                chart,
                outcome: self.evaluate(chart),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
gender,race/ethnicity,parental level of education,lunch,test preparation course,math score,reading score,writing score
female,group B,bachelor's degree,standard,none,72,72,74
female,group C,some college,standard,completed,69,90,88
male,group A,high school,free/reduced,none,47,57,44
";

    fn dataset() -> Dataset {
        Dataset::from_csv_reader(CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_metric_change_updates_all_charts() {
        let ds = dataset();
        let mut dash = Dashboard::new(&ds, Selection::default());
        let updates = dash.apply(SelectionEvent::Metric(Some(Metric::Reading)));
        assert_eq!(updates.len(), 4);
        assert_eq!(dash.selection().metric, Some(Metric::Reading));
    }

    #[test]
    fn test_education_change_updates_only_graph1() {
        let ds = dataset();
        let mut dash = Dashboard::new(&ds, Selection::default());
        let updates = dash.apply(SelectionEvent::EducationLevels(BTreeSet::new()));
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].chart, ChartId::EducationLunch);
        assert!(updates[0].outcome.is_no_data());
    }

    #[test]
    fn test_prep_change_skips_graph1() {
        let ds = dataset();
        let mut dash = Dashboard::new(&ds, Selection::default());
        let charts: Vec<ChartId> = dash
            .apply(SelectionEvent::TestPrep(BTreeSet::new()))
            .into_iter()
            .map(|u| u.chart)
            .collect();
        assert_eq!(charts, vec![ChartId::RaceSubject, ChartId::ScoreHistogram, ChartId::PrepBoxplot]);
    }

    #[test]
    fn test_apply_all_keeps_latest() {
        let ds = dataset();
        let mut dash = Dashboard::new(&ds, Selection::default());
        let updates = dash.apply_all(vec![
            SelectionEvent::TestPrep(BTreeSet::new()),
            SelectionEvent::TestPrep([TestPrep::Completed].into_iter().collect()),
        ]);
        let hist = updates.iter().find(|u| u.chart == ChartId::ScoreHistogram).unwrap();
        assert_eq!(hist.outcome.view().unwrap().samples().len(), 1);
    }

    #[test]
    fn test_refresh_all_is_idempotent() {
        let ds = dataset();
        let dash = Dashboard::new(&ds, Selection::everything(&ds));
        assert_eq!(dash.refresh_all(), dash.refresh_all());
    }

    #[test]
    fn test_controls_list_dataset_options() {
        let ds = dataset();
        let dash = Dashboard::new(&ds, Selection::default());
        let controls = dash.controls();
        assert_eq!(controls.races, vec!["group B", "group C", "group A"]);
        assert_eq!(controls.metrics.len(), 3);
        assert_eq!(controls.metrics[1].value, Metric::Reading);
        assert_eq!(controls.metrics[1].label, "Reading Score");
    }

    #[test]
    fn test_outcomes_for_reuses_updates() {
        let ds = dataset();
        let mut dash = Dashboard::new(&ds, Selection::default());
        let updates = dash.apply(SelectionEvent::EducationLevels(BTreeSet::new()));
        let all = dash.outcomes_for(&ChartId::ALL, updates.clone());
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], updates[0]);
        assert_eq!(all, dash.refresh_all());

        let one = dash.outcomes_for(&[ChartId::PrepBoxplot], updates);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].chart, ChartId::PrepBoxplot);
    }

    #[test]
    fn test_chart_id_round_trip_names() {
        for chart in ChartId::ALL {
            assert_eq!(chart.name().parse::<ChartId>().unwrap(), chart);
        }
    }
}
