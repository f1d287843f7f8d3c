use gradeboard::dashboard::{evaluate, ChartId, Dashboard, SelectionEvent};
use gradeboard::data::{Dataset, LunchType, Metric, Record, TestPrep};
use gradeboard::selection::Selection;
use gradeboard::transform::{
    education_lunch_comparison, race_subject_comparison, score_distribution, score_spread,
    NON_REDUCED_LUNCH, REDUCED_LUNCH,
};
use std::collections::BTreeSet;

fn load_fixture() -> Dataset {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/students.csv");
    Dataset::load(std::path::Path::new(path)).expect("Failed to load fixture")
}

fn strings(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn preps(values: &[TestPrep]) -> BTreeSet<TestPrep> {
    values.iter().copied().collect()
}

#[test]
fn test_education_lunch_means() {
    let ds = load_fixture();
    let levels = strings(&["bachelor's degree", "some college"]);
    let out = education_lunch_comparison(&ds, &levels, Some(Metric::Math));
    let view = out.view().expect("expected a view");

    let reduced = view.series(REDUCED_LUNCH).unwrap();
    assert_eq!(reduced.categories, vec!["some college"]);
    assert_eq!(reduced.values, vec![59.0]);

    // the null math score in the bachelor's group is skipped
    let standard = view.series(NON_REDUCED_LUNCH).unwrap();
    assert_eq!(standard.categories, vec!["bachelor's degree", "some college"]);
    assert_eq!(standard.values, vec![82.0, 77.75]);
}

#[test]
fn test_education_categories_subset_of_selection() {
    let ds = load_fixture();
    let all_levels = ds.education_levels();
    for n in 1..=all_levels.len() {
        let levels: BTreeSet<String> = all_levels.iter().take(n).cloned().collect();
        for metric in Metric::ALL {
            let out = education_lunch_comparison(&ds, &levels, Some(metric));
            let view = out.view().unwrap();
            for series in view.bars() {
                assert!(series.categories.iter().all(|c| levels.contains(c)));
                assert!(series.values.iter().all(|v| v.is_finite()));

                let lunch = if series.name == REDUCED_LUNCH {
                    LunchType::FreeOrReduced
                } else {
                    LunchType::Standard
                };
                // every bar is backed by at least one scored row of its own lunch subset
                for category in &series.categories {
                    assert!(
                        ds.records().iter().any(|r| &r.parental_education == category
                            && r.lunch_type == lunch
                            && r.score(metric).is_some()),
                        "{} bar for '{}' has no {} rows",
                        series.name,
                        category,
                        metric
                    );
                }
            }

            // and every level with scored rows in a subset gets a bar there
            for (name, lunch) in [
                (REDUCED_LUNCH, LunchType::FreeOrReduced),
                (NON_REDUCED_LUNCH, LunchType::Standard),
            ] {
                let series = view.series(name).unwrap();
                for level in &levels {
                    let has_rows = ds.records().iter().any(|r| &r.parental_education == level
                        && r.lunch_type == lunch
                        && r.score(metric).is_some());
                    assert_eq!(series.value_for(level).is_some(), has_rows);
                }
            }
        }
    }
}

#[test]
fn test_education_empty_selection_is_no_data() {
    let ds = load_fixture();
    assert!(education_lunch_comparison(&ds, &BTreeSet::new(), Some(Metric::Math)).is_no_data());
}

#[test]
fn test_race_subject_matches_independent_column_means() {
    let ds = load_fixture();
    let races = strings(&["group B", "group D", "group E"]);
    let out = race_subject_comparison(&ds, &races, Some(Metric::Reading), &BTreeSet::new());
    let view = out.view().unwrap();

    for race in &races {
        for metric in Metric::ALL {
            let values: Vec<f64> = ds
                .records()
                .iter()
                .filter(|r| &r.race_ethnicity == race)
                .filter_map(|r| r.score(metric))
                .collect();
            let series = view.series(metric.column()).unwrap();
            if values.is_empty() {
                assert_eq!(series.value_for(race), None);
            } else {
                let expected = values.iter().sum::<f64>() / values.len() as f64;
                assert_eq!(series.value_for(race), Some(expected));
            }
        }
    }

    // group B reading has one null among nine rows
    assert_eq!(view.series("reading score").unwrap().value_for("group B"), Some(70.125));
    // group E's only writing score is null: no bar rather than zero
    assert_eq!(view.series("writing score").unwrap().value_for("group E"), None);
}

#[test]
fn test_race_subject_two_row_example() {
    let rows = vec![
        Record {
            gender: "female".into(),
            race_ethnicity: "group B".into(),
            parental_education: "high school".into(),
            lunch_type: LunchType::Standard,
            test_prep: TestPrep::None,
            math_score: Some(70.0),
            reading_score: None,
            writing_score: Some(80.0),
        },
        Record {
            gender: "male".into(),
            race_ethnicity: "group B".into(),
            parental_education: "high school".into(),
            lunch_type: LunchType::Standard,
            test_prep: TestPrep::None,
            math_score: Some(90.0),
            reading_score: Some(85.0),
            writing_score: None,
        },
    ];
    let ds = Dataset::from_records(rows).unwrap();
    let out = race_subject_comparison(&ds, &strings(&["group B"]), Some(Metric::Math), &BTreeSet::new());
    let view = out.view().unwrap();
    assert_eq!(view.series("math score").unwrap().values, vec![80.0]);
    assert_eq!(view.series("reading score").unwrap().values, vec![85.0]);
    assert_eq!(view.series("writing score").unwrap().values, vec![80.0]);
}

#[test]
fn test_race_unknown_group_degrades_to_empty_series() {
    let ds = load_fixture();
    let out = race_subject_comparison(&ds, &strings(&["group Z"]), Some(Metric::Math), &BTreeSet::new());
    let view = out.view().expect("unknown groups are not NoData");
    assert!(view.bars().iter().all(|s| s.categories.is_empty()));
}

#[test]
fn test_prep_policy_row_counts() {
    let ds = load_fixture();
    for metric in Metric::ALL {
        let non_null = ds.records().iter().filter(|r| r.score(metric).is_some());
        let total = non_null.clone().count();
        let completed = non_null.clone().filter(|r| r.test_prep == TestPrep::Completed).count();
        let none = non_null.filter(|r| r.test_prep == TestPrep::None).count();

        let both = score_distribution(&ds, Some(metric), &preps(&TestPrep::ALL));
        assert_eq!(both.view().unwrap().samples().len(), total);

        let only_completed = score_distribution(&ds, Some(metric), &preps(&[TestPrep::Completed]));
        assert_eq!(only_completed.view().unwrap().samples().len(), completed);

        let only_none = score_spread(&ds, Some(metric), &preps(&[TestPrep::None]));
        assert_eq!(only_none.view().unwrap().samples().len(), none);

        assert!(score_distribution(&ds, Some(metric), &BTreeSet::new()).is_no_data());
        assert!(score_spread(&ds, Some(metric), &BTreeSet::new()).is_no_data());
    }

    let math = score_distribution(&ds, Some(Metric::Math), &preps(&TestPrep::ALL));
    assert_eq!(math.view().unwrap().samples().len(), 23);
}

#[test]
fn test_distribution_completed_math_keeps_gender() {
    let ds = load_fixture();
    let out = score_distribution(&ds, Some(Metric::Math), &preps(&[TestPrep::Completed]));
    let view = out.view().unwrap();
    let samples = view.samples();
    assert_eq!(samples.len(), 7);
    assert!(samples.iter().all(|s| s.test_prep == TestPrep::Completed));
    assert_eq!(samples[0].gender, "female");
    assert_eq!(samples[0].value, 69.0);
    assert_eq!(view.x_label, "math score");
}

#[test]
fn test_operations_are_idempotent() {
    let ds = load_fixture();
    let selection = Selection::everything(&ds);
    for chart in ChartId::ALL {
        let first = evaluate(chart, &ds, &selection);
        let second = evaluate(chart, &ds, &selection);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

#[test]
fn test_dashboard_event_flow() {
    let ds = load_fixture();
    let mut dash = Dashboard::new(&ds, Selection::default());

    let initial = dash.refresh_all();
    assert!(initial.iter().all(|u| !u.outcome.is_no_data()));

    let updates = dash.apply(SelectionEvent::TestPrep(BTreeSet::new()));
    assert_eq!(updates.len(), 3);
    for update in &updates {
        match update.chart {
            // the race chart accepts but ignores the prep checklist
            ChartId::RaceSubject => assert!(!update.outcome.is_no_data()),
            _ => assert!(update.outcome.is_no_data()),
        }
    }

    let updates = dash.apply(SelectionEvent::Metric(None));
    let boxplot = updates.iter().find(|u| u.chart == ChartId::PrepBoxplot).unwrap();
    assert!(boxplot.outcome.is_no_data());
    assert!(dash.evaluate(ChartId::EducationLunch).is_no_data());
}
