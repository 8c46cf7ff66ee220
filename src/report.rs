use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{AnalysisReport, CourseAnalysis};

fn fmt_minutes(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}", v))
}

/// Courses ordered from most to least complex; equal scores keep input order.
pub fn rank_courses(report: &AnalysisReport) -> Vec<(&str, &CourseAnalysis)> {
    let mut ranked: Vec<(&str, &CourseAnalysis)> = report.courses_in_order().collect();
    ranked.sort_by(|a, b| {
        b.1.overall_complexity
            .complexity_score
            .total_cmp(&a.1.overall_complexity.complexity_score)
    });
    ranked
}

pub fn build_report(
    report: &AnalysisReport,
    scope: Option<&str>,
    generated_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();
    let scope_label = scope.unwrap_or("all courses");

    let _ = writeln!(output, "# Course Complexity Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        scope_label,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Ranking");

    if report.courses.is_empty() {
        let _ = writeln!(output, "No courses could be analyzed.");
    } else {
        for (course_id, analysis) in rank_courses(report) {
            let overall = &analysis.overall_complexity;
            let _ = writeln!(
                output,
                "- {}: {} (score {:.1})",
                course_id, overall.category, overall.complexity_score
            );
        }
    }

    for (course_id, analysis) in report.courses_in_order() {
        write_course(&mut output, course_id, analysis);
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Warnings");
        for warning in &report.warnings {
            let _ = writeln!(output, "- {}", warning);
        }
    }

    output
}

fn write_course(output: &mut String, course_id: &str, analysis: &CourseAnalysis) {
    let overall = &analysis.overall_complexity;
    let course = &analysis.course_metrics;

    let _ = writeln!(output);
    let _ = writeln!(output, "## Course {}", course_id);
    let _ = writeln!(
        output,
        "Complexity: **{}** (score {:.1}, units factor {:.2})",
        overall.category, overall.complexity_score, overall.units_factor
    );
    if let (Some(hardest), Some(easiest)) = (overall.most_difficult_unit, overall.easiest_unit) {
        let _ = writeln!(
            output,
            "Most difficult unit: {}; easiest unit: {}",
            hardest, easiest
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "- Students: {}\n- Units: {}\n- Average completion time: {:.1} minutes (median {:.1}, std {})\n- Time range: {:.1} - {:.1} minutes",
        course.num_students,
        course.num_units,
        course.avg_total_completion_time,
        course.median_total_completion_time,
        fmt_minutes(course.std_total_completion_time),
        course.min_total_completion_time,
        course.max_total_completion_time
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "| Unit | Difficulty | Avg time (min) | Range (min) | Outliers |");
    let _ = writeln!(output, "|---|---|---|---|---|");
    for (unit, metrics) in &analysis.unit_metrics {
        let _ = writeln!(
            output,
            "| {} | {:.1}/100 | {} | {} - {} | {} |",
            unit,
            metrics.difficulty_score,
            fmt_minutes(metrics.mean_time),
            fmt_minutes(metrics.min_time),
            fmt_minutes(metrics.max_time),
            metrics.outlier_count
        );
    }

    if analysis.teacher_metrics.len() > 1 {
        let _ = writeln!(output);
        let _ = writeln!(output, "| Teacher | Students | Avg time (min) | Efficiency |");
        let _ = writeln!(output, "|---|---|---|---|");
        for (teacher, metrics) in &analysis.teacher_metrics {
            let efficiency = match metrics.efficiency_score {
                Some(score) if score < 1.0 => format!("{:.2} (faster than average)", score),
                Some(score) => format!("{:.2}", score),
                None => "undefined".to_string(),
            };
            let _ = writeln!(
                output,
                "| {} | {} | {:.1} | {} |",
                teacher, metrics.num_students, metrics.avg_total_time, efficiency
            );
        }
    }
}
