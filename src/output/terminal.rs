// Colored terminal output for cluster reports and format support.

use std::collections::BTreeMap;

use colored::Colorize;

use super::truncate_chars;
use crate::pipeline::ClusterReport;
use crate::topics::NO_TOPIC;

/// Longest document preview shown per line.
const PREVIEW_CHARS: usize = 100;

/// Display a cluster report in the terminal.
pub fn display_report(report: &ClusterReport) {
    println!(
        "\n{}",
        format!(
            "=== {} clusters ({} documents) ===",
            report.clusters.len(),
            report.document_count()
        )
        .bold()
    );

    for (id, cluster) in &report.clusters {
        let topic = if cluster.topic == NO_TOPIC {
            cluster.topic.dimmed()
        } else {
            cluster.topic.bright_green().bold()
        };

        println!();
        println!(
            "  {} {}  {}",
            format!("Cluster {id}").bold(),
            format!("({} docs)", cluster.docs.len()).dimmed(),
            topic
        );

        for (index, doc) in cluster.indices.iter().zip(&cluster.docs) {
            let preview = truncate_chars(&doc.replace('\n', " "), PREVIEW_CHARS);
            println!("    {:>4}  {}", format!("#{index}").dimmed(), preview);
        }
    }

    if !report.excluded.is_empty() {
        let skipped: Vec<String> = report.excluded.iter().map(|i| format!("#{i}")).collect();
        println!(
            "\n  {} skipped (no usable text): {}",
            "Note:".yellow(),
            skipped.join(", ")
        );
    }
    println!();
}

/// Display per-file extraction problems.
pub fn display_file_errors(errors: &[String]) {
    for error in errors {
        println!("  {} {}", "Warning:".yellow(), error);
    }
}

/// Display which file formats this build can read.
pub fn display_formats(formats: &BTreeMap<&'static str, bool>) {
    println!("\n{}", "Supported file formats:".bold());
    for (format, available) in formats {
        let status = if *available {
            "available".green()
        } else {
            "not compiled in".red()
        };
        println!("  {:<6} {}", format, status);
    }
    println!("  {:<6} {}", "doc", "read as plain text".dimmed());
}
