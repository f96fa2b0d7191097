use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::aggregate;
use crate::catalog::categories;
use crate::charts::{self, escape, Band, ChartSet, CLASS_COLOR, STUDENT_COLOR};
use crate::models::Observation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Markdown,
    Html,
}

fn band_name(band: Band) -> &'static str {
    match band {
        Band::Green => "on track",
        Band::Amber => "developing",
        Band::Red => "needs support",
    }
}

pub fn build_report(observations: &[Observation], generated_at: NaiveDateTime) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Class Observation Report");
    let _ = writeln!(output, "Generated {}", generated_at.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(output);

    let Some(class_scores) = aggregate::class_profile(observations) else {
        let _ = writeln!(output, "No observations yet.");
        return output;
    };
    let summaries = aggregate::student_summaries(observations);

    let _ = writeln!(
        output,
        "{} observations across {} students, class average {:.2} / 5.",
        observations.len(),
        summaries.len(),
        aggregate::overall(&class_scores)
    );
    let unknown = aggregate::count_unrecognized(observations);
    if unknown > 0 {
        let _ = writeln!(
            output,
            "Warning: {unknown} ratings use labels outside the catalog and were scored 0."
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Class Profile");
    let _ = writeln!(output, "| Category | Average | Percent | Status |");
    let _ = writeln!(output, "|---|---|---|---|");
    for bar in charts::bar_chart(&class_scores, "Class Average Breakdown").bars {
        let _ = writeln!(
            output,
            "| {} | {:.2} | {} | {} |",
            bar.category,
            bar.score,
            bar.label,
            band_name(bar.band)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Students");
    for summary in &summaries {
        let weakest = summary
            .scores
            .iter()
            .zip(categories())
            .min_by(|a, b| a.0.partial_cmp(b.0).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(_, category)| category)
            .unwrap_or("-");
        let _ = writeln!(
            output,
            "- {}: average {:.2} over {} observations (latest {}), weakest area {}",
            summary.student_name,
            summary.overall,
            summary.observation_count,
            summary.latest.format("%Y-%m-%d"),
            weakest
        );
    }

    let mut recent = observations.to_vec();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Observations");
    for observation in recent.iter().take(5) {
        let scores = observation.ratings.scores().map(f64::from);
        let _ = writeln!(
            output,
            "- {} on {} (average {:.1})",
            observation.student_name,
            observation.display_label(),
            aggregate::overall(&scores)
        );
    }

    output
}

/// Self-contained HTML page with the class charts followed by one pair of
/// charts per student.
pub fn build_html(observations: &[Observation], generated_at: NaiveDateTime) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<title>Class Observation Report</title>\n");
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n</head>\n<body>\n");

    html.push_str("<header>\n<h1>Class Observation Report</h1>\n");
    let _ = writeln!(
        html,
        "<p class=\"meta\">Generated {}</p>\n</header>",
        generated_at.format("%Y-%m-%d %H:%M")
    );

    let Some(class_scores) = aggregate::class_profile(observations) else {
        html.push_str("<p>No observations yet.</p>\n</body>\n</html>\n");
        return html;
    };

    html.push_str("<section>\n<h2>Class Average</h2>\n<div class=\"charts\">\n");
    let class_charts = ChartSet::new(
        class_scores,
        "Class Average Skill Profile",
        "Class Average Breakdown",
        CLASS_COLOR,
        "Class Average",
    );
    html.push_str(&class_charts.radar.to_svg());
    html.push_str(&class_charts.bar.to_svg());
    html.push_str("</div>\n</section>\n");

    for summary in aggregate::student_summaries(observations) {
        let _ = writeln!(
            html,
            "<section>\n<h2>{}</h2>\n<p class=\"meta\">{} observations, average {:.2}</p>\n<div class=\"charts\">",
            escape(&summary.student_name),
            summary.observation_count,
            summary.overall
        );
        let student_charts = ChartSet::new(
            summary.scores,
            "Skill Profile (Radar)",
            "Performance Breakdown",
            STUDENT_COLOR,
            &summary.student_name,
        );
        html.push_str(&student_charts.radar.to_svg());
        html.push_str(&student_charts.bar.to_svg());
        html.push_str("</div>\n</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

const CSS: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.charts { display: flex; flex-wrap: wrap; gap: 1rem; align-items: flex-start; }
section { border-top: 1px solid #e5e7eb; }
"#;
