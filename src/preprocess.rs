use std::collections::HashMap;

use tracing::{debug, info};

use crate::models::{AnnotatedDataset, StudentRecord, ValidatedTable};
use crate::stats;

/// A unit time further than this many standard deviations from its
/// course+unit mean is flagged.
pub const OUTLIER_SIGMA: f64 = 2.0;

/// Coerces a cell to minutes. Blank, garbage and non-finite cells are absent.
pub fn parse_minutes(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn normalize_teacher(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn normalize_id(raw: &str) -> String {
    raw.trim().to_string()
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

/// Builds the typed, outlier-annotated dataset. Never fails: bad cells
/// degrade to absent values.
pub fn preprocess(validated: &ValidatedTable) -> AnnotatedDataset {
    let units = validated.units.iter().map(|column| column.unit).collect();

    let mut records: Vec<StudentRecord> = validated
        .table
        .rows
        .iter()
        .map(|row| {
            let unit_times: Vec<Option<f64>> = validated
                .units
                .iter()
                .map(|column| parse_minutes(cell(row, column.index)))
                .collect();
            let present: Vec<f64> = unit_times.iter().flatten().copied().collect();

            StudentRecord {
                course_id: normalize_id(cell(row, validated.course_index)),
                teacher_name: normalize_teacher(cell(row, validated.teacher_index)),
                student_id: normalize_id(cell(row, validated.student_index)),
                total_time: present.iter().sum(),
                avg_time_per_unit: stats::mean(&present),
                present_units: present.len(),
                outliers: vec![false; unit_times.len()],
                unit_times,
            }
        })
        .collect();

    let flagged = flag_outliers(&mut records);
    info!(
        records = records.len(),
        outliers = flagged,
        "preprocessed course records"
    );

    AnnotatedDataset { units, records }
}

/// Flags unit times per (course, unit) group. Groups with fewer than two
/// values or zero spread flag nothing. Returns the number of flags set.
fn flag_outliers(records: &mut [StudentRecord]) -> usize {
    let mut by_course: HashMap<String, Vec<usize>> = HashMap::new();
    for (position, record) in records.iter().enumerate() {
        by_course
            .entry(record.course_id.clone())
            .or_default()
            .push(position);
    }

    let unit_count = records.first().map_or(0, |record| record.unit_times.len());
    let mut flagged = 0;

    for (course_id, members) in &by_course {
        for unit in 0..unit_count {
            let values: Vec<f64> = members
                .iter()
                .filter_map(|&position| records[position].unit_times[unit])
                .collect();
            let (Some(mean), Some(std)) = (stats::mean(&values), stats::std_dev(&values)) else {
                continue;
            };
            if std == 0.0 {
                continue;
            }

            for &position in members {
                let record = &mut records[position];
                if let Some(value) = record.unit_times[unit] {
                    if (value - mean).abs() > OUTLIER_SIGMA * std {
                        record.outliers[unit] = true;
                        flagged += 1;
                        debug!(
                            course = %course_id,
                            student = %record.student_id,
                            unit,
                            value,
                            "flagged unit time outlier"
                        );
                    }
                }
            }
        }
    }

    flagged
}
