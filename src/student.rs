use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{AnalysisReport, AnnotatedDataset};
use crate::preprocess::normalize_id;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoursePerformance {
    pub total_time: f64,
    /// Student total over course mean; 1.0 is exactly average.
    pub relative_performance: f64,
    /// Share of the course's students, in percent, who took strictly longer.
    pub percentile: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentProfile {
    pub student_id: String,
    pub completed_courses: Vec<String>,
    #[serde(rename = "performance_metrics")]
    pub performance: BTreeMap<String, CoursePerformance>,
}

/// Compares a student against every course they appear in. Courses that
/// were skipped during analysis fall back to the raw records for the mean.
pub fn compare_student(
    dataset: &AnnotatedDataset,
    report: &AnalysisReport,
    student_id: &str,
) -> Option<StudentProfile> {
    let student_id = normalize_id(student_id);
    let mut completed_courses: Vec<String> = Vec::new();
    for record in dataset.records.iter().filter(|r| r.student_id == student_id) {
        if !completed_courses.contains(&record.course_id) {
            completed_courses.push(record.course_id.clone());
        }
    }
    if completed_courses.is_empty() {
        return None;
    }

    let mut performance = BTreeMap::new();
    for course_id in &completed_courses {
        let totals: Vec<f64> = dataset
            .course_records(course_id)
            .map(|record| record.total_time)
            .collect();
        let Some(student_total) = dataset
            .course_records(course_id)
            .find(|record| record.student_id == student_id)
            .map(|record| record.total_time)
        else {
            continue;
        };

        let course_mean = report
            .courses
            .get(course_id)
            .map(|analysis| analysis.course_metrics.avg_total_completion_time)
            .unwrap_or_else(|| totals.iter().sum::<f64>() / totals.len() as f64);
        let relative_performance = if course_mean > 0.0 {
            student_total / course_mean
        } else {
            1.0
        };
        let slower = totals.iter().filter(|total| **total > student_total).count();

        performance.insert(
            course_id.clone(),
            CoursePerformance {
                total_time: student_total,
                relative_performance,
                percentile: slower as f64 / totals.len() as f64 * 100.0,
            },
        );
    }

    Some(StudentProfile {
        student_id,
        completed_courses,
        performance,
    })
}
