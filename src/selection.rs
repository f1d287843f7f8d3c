// Filter selection: the combined state of every dashboard control

use crate::data::{Dataset, Metric, TestPrep};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Snapshot of every filter control at one update.
///
/// Empty sets mean "nothing qualifies", never "no filter". Selecting every
/// option is the only way to include all rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub education_levels: BTreeSet<String>,
    #[serde(default)]
    pub races: BTreeSet<String>,
    #[serde(default)]
    pub metric: Option<Metric>,
    #[serde(default)]
    pub test_prep: BTreeSet<TestPrep>,
}

impl Default for Selection {
    /// The dashboard's initial control values
    fn default() -> Self {
        Self {
            education_levels: ["bachelor's degree", "some college"]
                .into_iter()
                .map(String::from)
                .collect(),
            races: ["group B", "group C", "group D"]
                .into_iter()
                .map(String::from)
                .collect(),
            metric: Some(Metric::Math),
            test_prep: TestPrep::ALL.into_iter().collect(),
        }
    }
}

impl Selection {
    /// Nothing selected anywhere
    pub fn empty() -> Self {
        Self {
            education_levels: BTreeSet::new(),
            races: BTreeSet::new(),
            metric: None,
            test_prep: BTreeSet::new(),
        }
    }

    /// Every option the dataset offers, metric left at math
    pub fn everything(dataset: &Dataset) -> Self {
        Self {
            education_levels: dataset.education_levels().into_iter().collect(),
            races: dataset.races().into_iter().collect(),
            metric: Some(Metric::Math),
            test_prep: TestPrep::ALL.into_iter().collect(),
        }
    }

    /// Values selected in a control that the dataset never contains
    pub fn unknown_values(&self, dataset: &Dataset) -> Vec<String> {
        let levels = dataset.education_levels();
        let races = dataset.races();
        self.education_levels
            .iter()
            .filter(|v| !levels.contains(v))
            .chain(self.races.iter().filter(|v| !races.contains(v)))
            .cloned()
            .collect()
    }
}

/// Test-prep inclusion rule derived from the checklist contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepPolicy {
    KeepAll,
    Only(TestPrep),
    Nothing,
}

impl PrepPolicy {
    pub fn from_filter(filter: &BTreeSet<TestPrep>) -> Self {
        let completed = filter.contains(&TestPrep::Completed);
        let none = filter.contains(&TestPrep::None);
        match (completed, none) {
            (true, true) => PrepPolicy::KeepAll,
            (true, false) => PrepPolicy::Only(TestPrep::Completed),
            (false, true) => PrepPolicy::Only(TestPrep::None),
            (false, false) => PrepPolicy::Nothing,
        }
    }

    pub fn admits(self, prep: TestPrep) -> bool {
        match self {
            PrepPolicy::KeepAll => true,
            PrepPolicy::Only(p) => p == prep,
            PrepPolicy::Nothing => false,
        }
    }
}
