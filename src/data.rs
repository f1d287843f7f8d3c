// Typed student exam dataset: records, enums and loaders

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Lunch programme a student is enrolled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LunchType {
    #[serde(rename = "standard")]
    Standard,
    #[serde(rename = "free/reduced")]
    FreeOrReduced,
}

/// Test preparation course status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TestPrep {
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "none")]
    None,
}

impl TestPrep {
    pub const ALL: [TestPrep; 2] = [TestPrep::Completed, TestPrep::None];

    pub fn as_str(self) -> &'static str {
        match self {
            TestPrep::Completed => "completed",
            TestPrep::None => "none",
        }
    }
}

impl fmt::Display for TestPrep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestPrep {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" => Ok(TestPrep::Completed),
            "none" => Ok(TestPrep::None),
            other => Err(anyhow!("Unknown test preparation status '{}'", other)),
        }
    }
}

/// One of the three score columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "math score", alias = "math")]
    Math,
    #[serde(rename = "reading score", alias = "reading")]
    Reading,
    #[serde(rename = "writing score", alias = "writing")]
    Writing,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Math, Metric::Reading, Metric::Writing];

    /// Column name in the source table, also used as the axis label
    pub fn column(self) -> &'static str {
        match self {
            Metric::Math => "math score",
            Metric::Reading => "reading score",
            Metric::Writing => "writing score",
        }
    }

    /// Human readable label, as offered in the subject dropdown
    pub fn label(self) -> &'static str {
        match self {
            Metric::Math => "Math Score",
            Metric::Reading => "Reading Score",
            Metric::Writing => "Writing Score",
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Metric::Math => "math",
            Metric::Reading => "reading",
            Metric::Writing => "writing",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', " ");
        Metric::ALL
            .into_iter()
            .find(|m| normalized == m.keyword() || normalized == m.column())
            .ok_or_else(|| anyhow!("Unknown metric '{}' (expected math, reading or writing)", s))
    }
}

/// A single student's exam record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "gender")]
    pub gender: String,
    #[serde(rename = "race/ethnicity")]
    pub race_ethnicity: String,
    #[serde(rename = "parental level of education")]
    pub parental_education: String,
    #[serde(rename = "lunch")]
    pub lunch_type: LunchType,
    #[serde(rename = "test preparation course")]
    pub test_prep: TestPrep,
    #[serde(rename = "math score", default)]
    pub math_score: Option<f64>,
    #[serde(rename = "reading score", default)]
    pub reading_score: Option<f64>,
    #[serde(rename = "writing score", default)]
    pub writing_score: Option<f64>,
}

impl Record {
    pub fn score(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Math => self.math_score,
            Metric::Reading => self.reading_score,
            Metric::Writing => self.writing_score,
        }
    }

    fn validate(&self) -> Result<()> {
        for metric in Metric::ALL {
            if let Some(v) = self.score(metric) {
                if !v.is_finite() || !(0.0..=100.0).contains(&v) {
                    bail!("{} must be within 0-100, got {}", metric.column(), v);
                }
            }
        }
        Ok(())
    }
}

/// Immutable, validated set of exam records
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Validate records once; every later filter call trusts them.
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        if records.is_empty() {
            bail!("Dataset must contain at least one data row");
        }
        for (i, record) in records.iter().enumerate() {
            record
                .validate()
                .with_context(|| format!("Invalid record at row {}", i + 1))?;
        }
        Ok(Self { records })
    }

    /// Read CSV with the standard StudentPerformance headers
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (i, row) in rdr.deserialize::<Record>().enumerate() {
            let record = row.with_context(|| format!("Failed to parse CSV row {}", i + 1))?;
            records.push(record);
        }

        Self::from_records(records)
    }

    /// Read a JSON array of objects keyed by the same column names as the CSV
    pub fn from_json_str(text: &str) -> Result<Self> {
        let records: Vec<Record> =
            serde_json::from_str(text).context("Input data must be a JSON array of records")?;
        Self::from_records(records)
    }

    /// Load from a file path, dispatching on extension. `-` reads CSV from stdin.
    pub fn load(path: &Path) -> Result<Self> {
        if path.as_os_str() == "-" {
            let dataset = Self::from_csv_reader(std::io::stdin().lock())
                .context("Failed to read CSV from stdin")?;
            log::info!("loaded {} records from stdin", dataset.len());
            return Ok(dataset);
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let dataset = match ext.as_str() {
            "json" => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Self::from_json_str(&text)?
            }
            _ => {
                let file = std::fs::File::open(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                Self::from_csv_reader(file)?
            }
        };

        log::info!("loaded {} records from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct parental education levels, in order of first appearance
    pub fn education_levels(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.parental_education.as_str()))
    }

    /// Distinct race/ethnicity groups, in order of first appearance
    pub fn races(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.race_ethnicity.as_str()))
    }

    /// Distinct genders, in order of first appearance
    pub fn genders(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.gender.as_str()))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for v in values {
        if !seen.iter().any(|s| s == v) {
            seen.push(v.to_string());
        }
    }
    seen
}
