use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Fatal failures while loading and validating the input table.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("input is missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("no unit completion time columns found (expected headers like `unit1_time`)")]
    NoUnitColumns,

    #[error("columns `{first}` and `{second}` both map to unit {unit}")]
    DuplicateUnit {
        unit: u32,
        first: String,
        second: String,
    },

    #[error("failed to open {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Per-course anomalies that are reported next to partial results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    /// The course has no records (for example an unknown `--course` filter).
    EmptyCourse { course_id: String },
    /// The course mean total time is zero, so teacher efficiency is undefined.
    DegenerateDivision { course_id: String },
}

impl AnalysisWarning {
    pub fn course_id(&self) -> &str {
        match self {
            AnalysisWarning::EmptyCourse { course_id }
            | AnalysisWarning::DegenerateDivision { course_id } => course_id,
        }
    }
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisWarning::EmptyCourse { course_id } => {
                write!(f, "no data found for course {}", course_id)
            }
            AnalysisWarning::DegenerateDivision { course_id } => write!(
                f,
                "course {} has a zero average completion time; teacher efficiency is undefined",
                course_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_lists_missing_columns() {
        let err = IngestError::Schema {
            missing: vec!["teacher_name".to_string(), "student_id".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "input is missing required columns: teacher_name, student_id"
        );
    }

    #[test]
    fn warnings_expose_their_course() {
        let warning = AnalysisWarning::DegenerateDivision {
            course_id: "CS101".to_string(),
        };
        assert_eq!(warning.course_id(), "CS101");
        assert!(warning.to_string().contains("CS101"));
    }
}
