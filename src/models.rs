use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::AnalysisWarning;

pub const COURSE_COLUMN: &str = "course_number";
pub const TEACHER_COLUMN: &str = "teacher_name";
pub const STUDENT_COLUMN: &str = "student_id";

/// A unit, identified by the numeric suffix of its `unit<N>_time` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(pub u32);

impl UnitId {
    pub fn number(self) -> u32 {
        self.0
    }

    pub fn time_column(self) -> String {
        format!("unit{}_time", self.0)
    }

    pub fn outlier_column(self) -> String {
        format!("unit{}_time_outlier", self.0)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit{}", self.0)
    }
}

impl Serialize for UnitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitColumn {
    pub unit: UnitId,
    pub header: String,
    /// Position of the column in the raw header row.
    pub index: usize,
}

/// Untyped cells exactly as they were read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header.trim() == name)
    }
}

/// A raw table whose schema has been checked. Unit columns are ordered by unit number.
#[derive(Debug, Clone)]
pub struct ValidatedTable {
    pub table: RawTable,
    pub course_index: usize,
    pub teacher_index: usize,
    pub student_index: usize,
    pub units: Vec<UnitColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub course_id: String,
    pub teacher_name: String,
    pub student_id: String,
    /// Minutes per unit, aligned with `AnnotatedDataset::units`.
    pub unit_times: Vec<Option<f64>>,
    pub total_time: f64,
    pub avg_time_per_unit: Option<f64>,
    pub present_units: usize,
    /// Aligned with `unit_times`.
    pub outliers: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedDataset {
    pub units: Vec<UnitId>,
    pub records: Vec<StudentRecord>,
}

impl AnnotatedDataset {
    /// Distinct course ids in first-seen order.
    pub fn course_ids(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.course_id) {
                seen.push(record.course_id.clone());
            }
        }
        seen
    }

    pub fn course_records<'a>(&'a self, course_id: &'a str) -> impl Iterator<Item = &'a StudentRecord> + 'a {
        self.records
            .iter()
            .filter(move |record| record.course_id == course_id)
    }

    /// Renders the dataset, derived columns included, back into a table that
    /// can be fed through ingestion again.
    pub fn to_table(&self) -> RawTable {
        let mut headers = vec![
            COURSE_COLUMN.to_string(),
            TEACHER_COLUMN.to_string(),
            STUDENT_COLUMN.to_string(),
        ];
        headers.extend(self.units.iter().map(|unit| unit.time_column()));
        headers.push("total_time".to_string());
        headers.push("avg_time_per_unit".to_string());
        headers.extend(self.units.iter().map(|unit| unit.outlier_column()));

        let rows = self
            .records
            .iter()
            .map(|record| {
                let mut row = vec![
                    record.course_id.clone(),
                    record.teacher_name.clone(),
                    record.student_id.clone(),
                ];
                row.extend(record.unit_times.iter().map(|value| format_cell(*value)));
                row.push(record.total_time.to_string());
                row.push(format_cell(record.avg_time_per_unit));
                row.extend(record.outliers.iter().map(|flag| flag.to_string()));
                row
            })
            .collect();

        RawTable { headers, rows }
    }
}

fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitMetrics {
    pub observations: usize,
    pub mean_time: Option<f64>,
    pub median_time: Option<f64>,
    pub min_time: Option<f64>,
    pub max_time: Option<f64>,
    pub std_time: Option<f64>,
    pub difficulty_score: f64,
    pub outlier_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeacherMetrics {
    pub num_students: usize,
    pub avg_total_time: f64,
    pub avg_time_per_unit: BTreeMap<UnitId, Option<f64>>,
    /// Teacher mean total time over course mean total time. `None` when the
    /// course mean is zero.
    pub efficiency_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseMetrics {
    pub num_students: usize,
    pub num_units: usize,
    pub avg_total_completion_time: f64,
    pub median_total_completion_time: f64,
    pub std_total_completion_time: Option<f64>,
    pub min_total_completion_time: f64,
    pub max_total_completion_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComplexityCategory {
    Easy,
    Moderate,
    Challenging,
    #[serde(rename = "Very Difficult")]
    VeryDifficult,
}

impl fmt::Display for ComplexityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ComplexityCategory::Easy => "Easy",
            ComplexityCategory::Moderate => "Moderate",
            ComplexityCategory::Challenging => "Challenging",
            ComplexityCategory::VeryDifficult => "Very Difficult",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallComplexity {
    pub complexity_score: f64,
    pub category: ComplexityCategory,
    pub most_difficult_unit: Option<UnitId>,
    pub easiest_unit: Option<UnitId>,
    pub units_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseAnalysis {
    pub course_metrics: CourseMetrics,
    pub unit_metrics: BTreeMap<UnitId, UnitMetrics>,
    pub teacher_metrics: BTreeMap<String, TeacherMetrics>,
    pub overall_complexity: OverallComplexity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub courses: BTreeMap<String, CourseAnalysis>,
    /// Analyzed course ids in the order they first appear in the input.
    pub course_order: Vec<String>,
    pub warnings: Vec<AnalysisWarning>,
}

impl AnalysisReport {
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn insert(&mut self, course_id: String, analysis: CourseAnalysis) {
        if !self.courses.contains_key(&course_id) {
            self.course_order.push(course_id.clone());
        }
        self.courses.insert(course_id, analysis);
    }

    /// Courses in input order rather than key order.
    pub fn courses_in_order(&self) -> impl Iterator<Item = (&str, &CourseAnalysis)> {
        self.course_order.iter().filter_map(|course_id| {
            self.courses
                .get(course_id)
                .map(|analysis| (course_id.as_str(), analysis))
        })
    }
}
