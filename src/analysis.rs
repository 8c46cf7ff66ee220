use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AnalysisWarning;
use crate::models::{
    AnalysisReport, AnnotatedDataset, CourseAnalysis, CourseMetrics, StudentRecord,
    TeacherMetrics, UnitId, UnitMetrics,
};
use crate::preprocess::normalize_id;
use crate::scoring;
use crate::stats;

/// Outcome of analyzing a single course in isolation.
struct CourseOutcome {
    course_id: String,
    analysis: Option<CourseAnalysis>,
    warnings: Vec<AnalysisWarning>,
}

#[derive(Debug, Clone, Copy)]
pub struct Analyzer {
    parallel: bool,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl Analyzer {
    pub fn new(config: &Config) -> Self {
        Self {
            parallel: config.parallel,
        }
    }

    pub fn sequential() -> Self {
        Self { parallel: false }
    }

    /// Analyzes every course, or only `course_filter` when given. Anomalies in
    /// one course never prevent the others from being computed.
    pub fn analyze(&self, dataset: &AnnotatedDataset, course_filter: Option<&str>) -> AnalysisReport {
        let course_ids = match course_filter.map(normalize_id) {
            Some(course_id) => {
                if dataset.course_records(&course_id).next().is_none() {
                    let warning = AnalysisWarning::EmptyCourse { course_id };
                    warn!("{}", warning);
                    return AnalysisReport {
                        warnings: vec![warning],
                        ..AnalysisReport::default()
                    };
                }
                vec![course_id]
            }
            None => dataset.course_ids(),
        };

        let outcomes: Vec<CourseOutcome> = if self.parallel {
            course_ids
                .par_iter()
                .map(|course_id| analyze_course(dataset, course_id))
                .collect()
        } else {
            course_ids
                .iter()
                .map(|course_id| analyze_course(dataset, course_id))
                .collect()
        };

        let mut report = AnalysisReport::default();
        for outcome in outcomes {
            report.warnings.extend(outcome.warnings);
            if let Some(analysis) = outcome.analysis {
                report.insert(outcome.course_id, analysis);
            }
        }

        info!(
            courses = report.courses.len(),
            warnings = report.warnings.len(),
            "course analysis complete"
        );
        report
    }
}

pub fn analyze(dataset: &AnnotatedDataset, course_filter: Option<&str>) -> AnalysisReport {
    Analyzer::default().analyze(dataset, course_filter)
}

fn analyze_course(dataset: &AnnotatedDataset, course_id: &str) -> CourseOutcome {
    let mut outcome = CourseOutcome {
        course_id: course_id.to_string(),
        analysis: None,
        warnings: Vec::new(),
    };
    let mut raise = |warning: AnalysisWarning| {
        warn!("{}", warning);
        outcome.warnings.push(warning);
    };

    let records: Vec<&StudentRecord> = dataset.course_records(course_id).collect();
    if records.is_empty() {
        raise(AnalysisWarning::EmptyCourse {
            course_id: course_id.to_string(),
        });
        return outcome;
    }

    // Every unit column of the input counts for every course; a unit with no
    // times in this course scores the neutral default.
    let units: Vec<(usize, UnitId)> = dataset.units.iter().copied().enumerate().collect();

    let unit_metrics: BTreeMap<UnitId, UnitMetrics> = units
        .iter()
        .map(|&(slot, unit)| (unit, unit_metrics(&records, slot)))
        .collect();

    let totals: Vec<f64> = records.iter().map(|record| record.total_time).collect();
    let course_mean = stats::mean(&totals).unwrap_or_default();
    let course_metrics = CourseMetrics {
        num_students: records.len(),
        num_units: units.len(),
        avg_total_completion_time: course_mean,
        median_total_completion_time: stats::median(&totals).unwrap_or_default(),
        std_total_completion_time: stats::std_dev(&totals),
        min_total_completion_time: stats::min(&totals).unwrap_or_default(),
        max_total_completion_time: stats::max(&totals).unwrap_or_default(),
    };

    if course_mean == 0.0 {
        raise(AnalysisWarning::DegenerateDivision {
            course_id: course_id.to_string(),
        });
    }
    let teacher_metrics = teacher_metrics(&records, &units, course_mean);

    let unit_scores: Vec<(UnitId, f64)> = unit_metrics
        .iter()
        .map(|(unit, metrics)| (*unit, metrics.difficulty_score))
        .collect();
    let overall_complexity = scoring::overall_complexity(&unit_scores, course_metrics.num_units);

    debug!(
        course = course_id,
        students = course_metrics.num_students,
        units = course_metrics.num_units,
        score = overall_complexity.complexity_score,
        category = %overall_complexity.category,
        "analyzed course"
    );

    outcome.analysis = Some(CourseAnalysis {
        course_metrics,
        unit_metrics,
        teacher_metrics,
        overall_complexity,
    });
    outcome
}

fn unit_metrics(records: &[&StudentRecord], slot: usize) -> UnitMetrics {
    let times: Vec<f64> = records
        .iter()
        .filter_map(|record| record.unit_times[slot])
        .collect();

    UnitMetrics {
        observations: times.len(),
        mean_time: stats::mean(&times),
        median_time: stats::median(&times),
        min_time: stats::min(&times),
        max_time: stats::max(&times),
        std_time: stats::std_dev(&times),
        difficulty_score: scoring::difficulty_score(&times),
        outlier_count: records.iter().filter(|record| record.outliers[slot]).count(),
    }
}

fn teacher_metrics(
    records: &[&StudentRecord],
    units: &[(usize, UnitId)],
    course_mean: f64,
) -> BTreeMap<String, TeacherMetrics> {
    let mut by_teacher: BTreeMap<&str, Vec<&StudentRecord>> = BTreeMap::new();
    for record in records {
        by_teacher
            .entry(record.teacher_name.as_str())
            .or_default()
            .push(*record);
    }

    by_teacher
        .into_iter()
        .map(|(teacher, students)| {
            let totals: Vec<f64> = students.iter().map(|record| record.total_time).collect();
            let avg_total_time = stats::mean(&totals).unwrap_or_default();
            let avg_time_per_unit = units
                .iter()
                .map(|&(slot, unit)| {
                    let times: Vec<f64> = students
                        .iter()
                        .filter_map(|record| record.unit_times[slot])
                        .collect();
                    (unit, stats::mean(&times))
                })
                .collect();
            let efficiency_score = (course_mean != 0.0).then(|| avg_total_time / course_mean);

            (
                teacher.to_string(),
                TeacherMetrics {
                    num_students: students.len(),
                    avg_total_time,
                    avg_time_per_unit,
                    efficiency_score,
                },
            )
        })
        .collect()
}
