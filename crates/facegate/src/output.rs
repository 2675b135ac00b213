use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use facegate_node::LoopReport;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    node: &'a str,
    #[serde(flatten)]
    report: &'a LoopReport,
    timestamp: String,
}

/// Render the summary of a finished camera or decision loop.
pub fn print_loop_report(node: &str, report: &LoopReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReportOutput {
                node,
                report,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "NODE", "SHAPE", "FRAMES", "GRANTS", "DENIES", "SKIPPED", "ERRORS", "UNLOCKS",
                    "STOP",
                ])
                .add_row(vec![
                    node.to_string(),
                    report.shape.clone().unwrap_or_else(|| "-".to_string()),
                    report.frames.to_string(),
                    report.grants.to_string(),
                    report.denies.to_string(),
                    report.skipped.to_string(),
                    report.decision_errors.to_string(),
                    report.unlocks.to_string(),
                    report.stop.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{node}: shape={} frames={} grants={} denies={} skipped={} errors={} unlocks={} stop={}",
                report.shape.as_deref().unwrap_or("-"),
                report.frames,
                report.grants,
                report.denies,
                report.skipped,
                report.decision_errors,
                report.unlocks,
                report.stop
            );
        }
    }
}

/// Result of an offline `encode` run.
#[derive(Debug, Serialize)]
pub struct EncodeSummary {
    pub output: String,
    pub model: String,
    pub images: usize,
    pub faces: usize,
    pub per_image: Vec<ImageFaces>,
}

#[derive(Debug, Serialize)]
pub struct ImageFaces {
    pub path: String,
    pub faces: usize,
}

pub fn print_encode_summary(summary: &EncodeSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(summary).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["IMAGE", "FACES"]);
            for image in &summary.per_image {
                table.add_row(vec![image.path.clone(), image.faces.to_string()]);
            }
            println!("{table}");
            println!(
                "{} face(s) from {} image(s) written to {} [model={}]",
                summary.faces, summary.images, summary.output, summary.model
            );
        }
        OutputFormat::Pretty => {
            for image in &summary.per_image {
                println!("{}: {} face(s)", image.path, image.faces);
            }
            println!(
                "wrote {} embedding(s) to {} [model={}]",
                summary.faces, summary.output, summary.model
            );
        }
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
