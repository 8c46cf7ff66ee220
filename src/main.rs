use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use course_complexity::config::parse_delimiter;
use course_complexity::insight::InsightContext;
use course_complexity::models::AnalysisReport;
use course_complexity::{ingest, preprocess, report, AnnotatedDataset, Analyzer, Config};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "course-complexity")]
#[command(about = "Course difficulty and complexity scoring from student completion times", long_about = None)]
struct Cli {
    /// Input field delimiter (overrides COURSE_COMPLEXITY_DELIMITER)
    #[arg(long, global = true, value_parser = delimiter_arg)]
    delimiter: Option<u8>,
    /// Analyze courses one at a time
    #[arg(long, global = true)]
    sequential: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Input {
    /// CSV with course_number, teacher_name, student_id and unit<N>_time columns
    #[arg(long, short)]
    data: PathBuf,
    /// Restrict the analysis to one course
    #[arg(long, short)]
    course: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score course complexity
    Analyze {
        #[command(flatten)]
        input: Input,
        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a markdown report
    Report {
        #[command(flatten)]
        input: Input,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the summary consumed by the insight layer as JSON
    Context {
        #[command(flatten)]
        input: Input,
        #[arg(long)]
        teacher: Option<String>,
        #[arg(long, short)]
        student: Option<String>,
    },
}

fn delimiter_arg(value: &str) -> Result<u8, String> {
    parse_delimiter(value).ok_or_else(|| format!("`{value}` is not a single-byte delimiter"))
}

fn run_pipeline(config: &Config, input: &Input) -> anyhow::Result<(AnnotatedDataset, AnalysisReport)> {
    let validated = ingest::load(&input.data, config.delimiter)
        .with_context(|| format!("failed to load {}", input.data.display()))?;
    let dataset = preprocess(&validated);
    let report = Analyzer::new(config).analyze(&dataset, input.course.as_deref());
    Ok((dataset, report))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(delimiter) = cli.delimiter {
        config.delimiter = delimiter;
    }
    if cli.sequential {
        config.parallel = false;
    }

    match cli.command {
        Commands::Analyze { input, json } => {
            let (_, analysis) = run_pipeline(&config, &input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else if analysis.is_empty() {
                println!("No courses could be analyzed.");
            } else {
                println!("Courses by complexity:");
                for (course_id, course) in report::rank_courses(&analysis) {
                    let overall = &course.overall_complexity;
                    println!(
                        "- {} {} (score {:.1}) across {} students and {} units",
                        course_id,
                        overall.category,
                        overall.complexity_score,
                        course.course_metrics.num_students,
                        course.course_metrics.num_units
                    );
                }
            }
        }
        Commands::Report { input, out } => {
            let (_, analysis) = run_pipeline(&config, &input)?;
            let out = out.unwrap_or(config.report_path);
            let markdown =
                report::build_report(&analysis, input.course.as_deref(), chrono::Utc::now());
            std::fs::write(&out, markdown)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Context {
            input,
            teacher,
            student,
        } => {
            let (dataset, analysis) = run_pipeline(&config, &input)?;
            let context = InsightContext::build(
                &analysis,
                &dataset,
                input.course.as_deref(),
                teacher.as_deref(),
                student.as_deref(),
            );
            println!("{}", context.to_json()?);
        }
    }

    Ok(())
}
