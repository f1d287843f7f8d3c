// Filter-reduce-shape operations: one pure function per chart

use crate::data::{Dataset, LunchType, Metric, Record, TestPrep};
use crate::ir::{BarSeries, ChartKind, ChartOutcome, DerivedView, Sample, ViewData};
use crate::palette::{self, ColorPalette};
use crate::selection::PrepPolicy;
use std::collections::{BTreeMap, BTreeSet};

pub const REDUCED_LUNCH: &str = "Reduced Lunch";
pub const NON_REDUCED_LUNCH: &str = "Non-Reduced Lunch";

/// Subject order of the race comparison series
pub const SUBJECT_ORDER: [Metric; 3] = [Metric::Reading, Metric::Writing, Metric::Math];

#[derive(Debug, Clone, Copy, Default)]
struct MeanAcc {
    sum: f64,
    count: usize,
}

impl MeanAcc {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Average `metric` per key. Keys come out sorted; keys with no non-null
/// value are dropped rather than reported as zero.
fn group_means<'a, I, K>(rows: I, key: K, metric: Metric) -> (Vec<String>, Vec<f64>)
where
    I: Iterator<Item = &'a Record>,
    K: Fn(&'a Record) -> &'a str,
{
    let mut groups: BTreeMap<&str, MeanAcc> = BTreeMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(row.score(metric));
    }

    groups
        .into_iter()
        .filter_map(|(k, acc)| acc.mean().map(|m| (k.to_string(), m)))
        .unzip()
}

/// Graph 1: mean score per parental education level, split by lunch type.
pub fn education_lunch_comparison(
    dataset: &Dataset,
    education_levels: &BTreeSet<String>,
    metric: Option<Metric>,
) -> ChartOutcome {
    let Some(metric) = metric else {
        return ChartOutcome::NoData;
    };
    if education_levels.is_empty() {
        return ChartOutcome::NoData;
    }

    let filtered: Vec<&Record> = dataset
        .records()
        .iter()
        .filter(|r| education_levels.contains(&r.parental_education))
        .collect();

    let series_for = |lunch: LunchType, name: &str, color: &str| {
        let (categories, values) = group_means(
            filtered.iter().copied().filter(|r| r.lunch_type == lunch),
            |r| r.parental_education.as_str(),
            metric,
        );
        BarSeries {
            name: name.to_string(),
            color: color.to_string(),
            categories,
            values,
        }
    };

    let reduced = series_for(LunchType::FreeOrReduced, REDUCED_LUNCH, palette::REDUCED_LUNCH_COLOR);
    let standard = series_for(LunchType::Standard, NON_REDUCED_LUNCH, palette::STANDARD_LUNCH_COLOR);

    log::debug!(
        "education/lunch: {} rows, {} reduced bars, {} standard bars",
        filtered.len(),
        reduced.categories.len(),
        standard.categories.len()
    );

    ChartOutcome::View(DerivedView {
        kind: ChartKind::GroupedBar,
        title: "Average Exam Scores by Parental Education Level".to_string(),
        x_label: "Parental Education Level".to_string(),
        y_label: metric.column().to_string(),
        legend_title: None,
        colors: vec![
            (reduced.name.clone(), reduced.color.clone()),
            (standard.name.clone(), standard.color.clone()),
        ],
        metric: Some(metric),
        data: ViewData::Bars(vec![reduced, standard]),
    })
}

/// Graph 2: mean of every subject per race/ethnicity group.
///
/// `metric` only labels the view and `_test_prep` is accepted for parity with
/// the other prep-aware charts; neither filters rows.
pub fn race_subject_comparison(
    dataset: &Dataset,
    races: &BTreeSet<String>,
    metric: Option<Metric>,
    _test_prep: &BTreeSet<TestPrep>,
) -> ChartOutcome {
    if races.is_empty() {
        return ChartOutcome::NoData;
    }

    // Per-column accumulators: a null in one subject never hides the others
    let mut groups: BTreeMap<&str, [MeanAcc; 3]> = BTreeMap::new();
    for row in dataset
        .records()
        .iter()
        .filter(|r| races.contains(&r.race_ethnicity))
    {
        let accs = groups.entry(row.race_ethnicity.as_str()).or_default();
        for (acc, subject) in accs.iter_mut().zip(SUBJECT_ORDER) {
            acc.push(row.score(subject));
        }
    }

    // Melt: one series per subject, one bar per race
    let series: Vec<BarSeries> = SUBJECT_ORDER
        .iter()
        .enumerate()
        .map(|(idx, &subject)| {
            let (categories, values) = groups
                .iter()
                .filter_map(|(race, accs)| accs[idx].mean().map(|m| (race.to_string(), m)))
                .unzip();
            BarSeries {
                name: subject.column().to_string(),
                color: palette::subject_color(subject).to_string(),
                categories,
                values,
            }
        })
        .collect();

    log::debug!("race/subject: {} race groups", groups.len());

    ChartOutcome::View(DerivedView {
        kind: ChartKind::GroupedBar,
        title: "Average Exam Scores by Race and Subject".to_string(),
        x_label: "race/ethnicity".to_string(),
        y_label: "Average Score".to_string(),
        legend_title: Some("Subject".to_string()),
        colors: series.iter().map(|s| (s.name.clone(), s.color.clone())).collect(),
        metric,
        data: ViewData::Bars(series),
    })
}

/// Rows with a non-null `metric` that pass the test-prep checklist.
/// `None` when the selection cannot produce a chart.
fn prep_filtered_samples(
    dataset: &Dataset,
    metric: Option<Metric>,
    test_prep: &BTreeSet<TestPrep>,
) -> Option<(Metric, Vec<Sample>)> {
    let metric = metric?;
    let policy = PrepPolicy::from_filter(test_prep);
    if policy == PrepPolicy::Nothing {
        return None;
    }

    let samples = dataset
        .records()
        .iter()
        .filter(|r| policy.admits(r.test_prep))
        .filter_map(|r| {
            r.score(metric).map(|value| Sample {
                value,
                gender: r.gender.clone(),
                test_prep: r.test_prep,
            })
        })
        .collect();

    Some((metric, samples))
}

fn gender_colors(samples: &[Sample]) -> Vec<(String, String)> {
    let mut genders: Vec<String> = Vec::new();
    for s in samples {
        if !genders.contains(&s.gender) {
            genders.push(s.gender.clone());
        }
    }
    ColorPalette::category10().assign_colors(&genders)
}

/// Graph 3: raw score samples coloured by gender, for histogram binning.
pub fn score_distribution(
    dataset: &Dataset,
    metric: Option<Metric>,
    test_prep: &BTreeSet<TestPrep>,
) -> ChartOutcome {
    let Some((metric, samples)) = prep_filtered_samples(dataset, metric, test_prep) else {
        return ChartOutcome::NoData;
    };
    log::debug!("distribution: {} samples of {}", samples.len(), metric);

    ChartOutcome::View(DerivedView {
        kind: ChartKind::Histogram,
        title: "Histogram of Exam Scores".to_string(),
        x_label: metric.column().to_string(),
        y_label: "count".to_string(),
        legend_title: Some("gender".to_string()),
        colors: gender_colors(&samples),
        metric: Some(metric),
        data: ViewData::Samples(samples),
    })
}

/// Graph 4: raw score samples by prep status and gender, for a boxplot.
pub fn score_spread(
    dataset: &Dataset,
    metric: Option<Metric>,
    test_prep: &BTreeSet<TestPrep>,
) -> ChartOutcome {
    let Some((metric, samples)) = prep_filtered_samples(dataset, metric, test_prep) else {
        return ChartOutcome::NoData;
    };
    log::debug!("spread: {} samples of {}", samples.len(), metric);

    ChartOutcome::View(DerivedView {
        kind: ChartKind::Boxplot,
        title: "Boxplot of Exam Scores by Prep Course Completion".to_string(),
        x_label: "test preparation course".to_string(),
        y_label: metric.column().to_string(),
        legend_title: Some("gender".to_string()),
        colors: gender_colors(&samples),
        metric: Some(metric),
        data: ViewData::Samples(samples),
    })
}
