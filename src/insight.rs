//! Read-only summary handed to the language-model insight layer. Nothing
//! here re-derives a metric; values are copied out of the analysis.

use serde::Serialize;

use crate::models::{AnalysisReport, AnnotatedDataset, ComplexityCategory, UnitId};
use crate::preprocess::{normalize_id, normalize_teacher};
use crate::student::{compare_student, StudentProfile};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexitySummary {
    pub score: f64,
    pub category: ComplexityCategory,
    pub most_difficult_unit: Option<UnitId>,
    pub easiest_unit: Option<UnitId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedTeacher {
    pub name: String,
    pub efficiency_score: Option<f64>,
    pub avg_total_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSummary {
    pub course_id: String,
    pub complexity: ComplexitySummary,
    pub units: usize,
    pub teachers: Vec<String>,
    pub avg_completion_time: f64,
    pub min_completion_time: f64,
    pub max_completion_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_teacher: Option<SelectedTeacher>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightContext {
    pub selected_course: Option<String>,
    pub selected_teacher: Option<String>,
    pub courses: Vec<CourseSummary>,
    pub student_info: Option<StudentProfile>,
}

impl InsightContext {
    pub fn build(
        report: &AnalysisReport,
        dataset: &AnnotatedDataset,
        selected_course: Option<&str>,
        selected_teacher: Option<&str>,
        student_id: Option<&str>,
    ) -> Self {
        let selected_course = selected_course.map(normalize_id);
        let selected_teacher = selected_teacher.map(normalize_teacher);

        let courses = report
            .courses_in_order()
            .filter(|(course_id, _)| {
                selected_course
                    .as_deref()
                    .map_or(true, |selected| selected == *course_id)
            })
            .map(|(course_id, analysis)| {
                let overall = &analysis.overall_complexity;
                let metrics = &analysis.course_metrics;
                let teacher = selected_teacher.as_deref().and_then(|name| {
                    analysis
                        .teacher_metrics
                        .get(name)
                        .map(|teacher| SelectedTeacher {
                            name: name.to_string(),
                            efficiency_score: teacher.efficiency_score,
                            avg_total_time: teacher.avg_total_time,
                        })
                });

                CourseSummary {
                    course_id: course_id.to_string(),
                    complexity: ComplexitySummary {
                        score: overall.complexity_score,
                        category: overall.category,
                        most_difficult_unit: overall.most_difficult_unit,
                        easiest_unit: overall.easiest_unit,
                    },
                    units: analysis.unit_metrics.len(),
                    teachers: analysis.teacher_metrics.keys().cloned().collect(),
                    avg_completion_time: metrics.avg_total_completion_time,
                    min_completion_time: metrics.min_total_completion_time,
                    max_completion_time: metrics.max_total_completion_time,
                    selected_teacher: teacher,
                }
            })
            .collect();

        let student_info = student_id.and_then(|id| compare_student(dataset, report, id));

        Self {
            selected_course,
            selected_teacher,
            courses,
            student_info,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::ingest::{ingest, read_table};
    use crate::preprocess::preprocess;

    fn dataset() -> AnnotatedDataset {
        let csv = "course_number,teacher_name,student_id,unit1_time,unit2_time\n\
                   CS101,Dr. Smith,s1,30,40\nCS101,Jones,s2,50,80\n\
                   CS201,Jones,s1,90,100\nCS201,Jones,s3,110,120\n";
        preprocess(&ingest(read_table(csv.as_bytes(), b',').unwrap()).unwrap())
    }

    #[test]
    fn summarizes_every_course_without_selection() {
        let data = dataset();
        let report = analyze(&data, None);
        let context = InsightContext::build(&report, &data, None, None, None);
        assert_eq!(context.courses.len(), 2);
        assert_eq!(context.courses[0].teachers, vec!["dr. smith", "jones"]);
        assert_eq!(context.courses[0].units, 2);
        assert!(context.student_info.is_none());
    }

    #[test]
    fn courses_follow_input_order() {
        let csv = "course_number,teacher_name,student_id,unit1_time\n\
                   PHYS201,a,s1,40\nCS101,b,s2,30\n";
        let data = preprocess(&ingest(read_table(csv.as_bytes(), b',').unwrap()).unwrap());
        let report = analyze(&data, None);
        let context = InsightContext::build(&report, &data, None, None, None);
        let ids: Vec<&str> = context.courses.iter().map(|c| c.course_id.as_str()).collect();
        assert_eq!(ids, vec!["PHYS201", "CS101"]);
    }

    #[test]
    fn selection_filters_course_and_teacher() {
        let data = dataset();
        let report = analyze(&data, None);
        let context =
            InsightContext::build(&report, &data, Some("CS101"), Some("  DR. SMITH"), Some("s1"));
        assert_eq!(context.courses.len(), 1);
        let teacher = context.courses[0].selected_teacher.as_ref().unwrap();
        assert_eq!(teacher.name, "dr. smith");
        assert_eq!(teacher.avg_total_time, 70.0);
        assert_eq!(
            context.student_info.unwrap().completed_courses,
            vec!["CS101", "CS201"]
        );
    }

    #[test]
    fn renders_json_with_unit_names() {
        let data = dataset();
        let report = analyze(&data, Some("CS201"));
        let json = InsightContext::build(&report, &data, Some("CS201"), None, None)
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["courses"][0]["course_id"], "CS201");
        assert_eq!(value["courses"][0]["complexity"]["most_difficult_unit"], "unit2");
        assert!(value["courses"][0].get("selected_teacher").is_none());
    }
}
