//! Radar and horizontal bar charts over a ten-category score vector.
//!
//! Chart construction is pure: the structs hold the computed geometry and
//! `to_svg` turns it into a standalone SVG document. Nothing here touches the
//! store.

use std::f64::consts::PI;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use crate::catalog::{categories, QUESTION_COUNT};
use crate::models::ScoreVector;
use crate::scoring::MAX_SCORE;

pub const STUDENT_COLOR: &str = "#2196F3";
pub const CLASS_COLOR: &str = "#FF5252";

const RADAR_SIZE: f64 = 520.0;
const RADAR_RADIUS: f64 = 170.0;
const RADAR_FILL_OPACITY: f64 = 0.25;

const BAR_HEIGHT: usize = 26;
const BAR_PADDING: usize = 10;
const BAR_MAX_WIDTH: usize = 400;
const BAR_LABEL_WIDTH: usize = 130;
const BAR_TOP: usize = 50;

pub(crate) fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[derive(Debug, Clone, Serialize)]
pub struct RadarChart {
    pub title: String,
    pub color: String,
    pub series_label: String,
    pub categories: [&'static str; QUESTION_COUNT],
    /// `QUESTION_COUNT + 1` angles in radians; the last repeats the first.
    pub angles: Vec<f64>,
    /// Values aligned with `angles`, closed the same way.
    pub values: Vec<f64>,
}

/// Evenly spaced axis angles for `n` categories, with the first angle
/// appended again to close the polygon.
pub fn radar_angles(n: usize) -> Vec<f64> {
    let mut angles: Vec<f64> = (0..n).map(|i| i as f64 / n as f64 * 2.0 * PI).collect();
    if let Some(first) = angles.first().copied() {
        angles.push(first);
    }
    angles
}

pub fn radar_chart(scores: &ScoreVector, title: &str, color: &str, series_label: &str) -> RadarChart {
    let mut values = scores.to_vec();
    values.push(scores[0]);

    RadarChart {
        title: title.to_string(),
        color: color.to_string(),
        series_label: series_label.to_string(),
        categories: categories(),
        angles: radar_angles(QUESTION_COUNT),
        values,
    }
}

impl RadarChart {
    /// Polygon vertices in SVG coordinates, closing point included.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.angles
            .iter()
            .zip(self.values.iter())
            .map(|(angle, value)| polar(*angle, value.clamp(0.0, f64::from(MAX_SCORE))))
            .collect()
    }

    pub fn to_svg(&self) -> String {
        let (cx, cy) = radar_center();
        let mut svg = String::new();

        let _ = writeln!(
            svg,
            "<svg width=\"{size}\" height=\"{size}\" viewBox=\"0 0 {size} {size}\" xmlns=\"http://www.w3.org/2000/svg\" font-family=\"sans-serif\">",
            size = RADAR_SIZE
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{cx}\" y=\"28\" font-size=\"16\" text-anchor=\"middle\">{}</text>",
            escape(&self.title)
        );

        for ring in 1..=MAX_SCORE {
            let r = f64::from(ring) / f64::from(MAX_SCORE) * RADAR_RADIUS;
            let _ = writeln!(
                svg,
                "  <circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{r:.2}\" fill=\"none\" stroke=\"#cccccc\" stroke-width=\"1\"/>"
            );
            let (lx, ly) = polar(PI / 6.0, f64::from(ring));
            let _ = writeln!(
                svg,
                "  <text x=\"{lx:.2}\" y=\"{ly:.2}\" font-size=\"9\" fill=\"grey\">{ring}</text>"
            );
        }

        for (angle, category) in self.angles.iter().zip(self.categories.iter()) {
            let (x, y) = polar(*angle, f64::from(MAX_SCORE));
            let _ = writeln!(
                svg,
                "  <line x1=\"{cx:.2}\" y1=\"{cy:.2}\" x2=\"{x:.2}\" y2=\"{y:.2}\" stroke=\"#dddddd\" stroke-width=\"1\"/>"
            );
            let (tx, ty) = polar(*angle, f64::from(MAX_SCORE) * 1.16);
            let _ = writeln!(
                svg,
                "  <text x=\"{tx:.2}\" y=\"{ty:.2}\" font-size=\"11\" text-anchor=\"{}\" dominant-baseline=\"middle\">{}</text>",
                anchor_for(*angle),
                escape(category)
            );
        }

        let path = self
            .points()
            .iter()
            .map(|(x, y)| format!("{x:.2},{y:.2}"))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(
            svg,
            "  <polygon points=\"{path}\" fill=\"{color}\" fill-opacity=\"{RADAR_FILL_OPACITY}\" stroke=\"{color}\" stroke-width=\"2\"/>",
            color = escape(&self.color)
        );

        let legend_y = RADAR_SIZE - 16.0;
        let _ = writeln!(
            svg,
            "  <rect x=\"16\" y=\"{:.0}\" width=\"12\" height=\"12\" fill=\"{}\"/>",
            legend_y - 10.0,
            escape(&self.color)
        );
        let _ = writeln!(
            svg,
            "  <text x=\"34\" y=\"{legend_y:.0}\" font-size=\"12\">{}</text>",
            escape(&self.series_label)
        );

        svg.push_str("</svg>\n");
        svg
    }
}

fn radar_center() -> (f64, f64) {
    (RADAR_SIZE / 2.0, RADAR_SIZE / 2.0 + 10.0)
}

/// Maps a polar position (angle counter-clockwise from east, value in score
/// units) to SVG coordinates.
fn polar(angle: f64, value: f64) -> (f64, f64) {
    let (cx, cy) = radar_center();
    let r = value / f64::from(MAX_SCORE) * RADAR_RADIUS;
    (cx + r * angle.cos(), cy - r * angle.sin())
}

fn anchor_for(angle: f64) -> &'static str {
    let x = angle.cos();
    if x > 0.2 {
        "start"
    } else if x < -0.2 {
        "end"
    } else {
        "middle"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Green,
    Amber,
    Red,
}

impl Band {
    pub fn for_percent(percent: f64) -> Self {
        if percent >= 80.0 {
            Band::Green
        } else if percent >= 60.0 {
            Band::Amber
        } else {
            Band::Red
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Band::Green => "#4CAF50",
            Band::Amber => "#FFC107",
            Band::Red => "#FF5252",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Bar {
    pub category: &'static str,
    pub score: f64,
    pub percent: f64,
    pub band: Band,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BarChart {
    pub title: String,
    /// Catalog order; the first bar is drawn at the top.
    pub bars: Vec<Bar>,
}

pub fn percent_of_max(score: f64) -> f64 {
    score * 100.0 / f64::from(MAX_SCORE)
}

pub fn bar_chart(scores: &ScoreVector, title: &str) -> BarChart {
    let bars = categories()
        .into_iter()
        .zip(scores.iter())
        .map(|(category, score)| {
            let percent = percent_of_max(*score);
            Bar {
                category,
                score: *score,
                percent,
                band: Band::for_percent(percent),
                label: format!("{percent:.0}%"),
            }
        })
        .collect();

    BarChart {
        title: title.to_string(),
        bars,
    }
}

impl BarChart {
    pub fn to_svg(&self) -> String {
        let rows_height = self.bars.len() * (BAR_HEIGHT + BAR_PADDING);
        let axis_y = BAR_TOP + rows_height;
        let total_height = axis_y + 50;
        let total_width = BAR_LABEL_WIDTH + BAR_MAX_WIDTH + 70;
        let mut svg = String::new();

        let _ = writeln!(
            svg,
            "<svg width=\"{total_width}\" height=\"{total_height}\" viewBox=\"0 0 {total_width} {total_height}\" xmlns=\"http://www.w3.org/2000/svg\" font-family=\"sans-serif\">"
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{}\" y=\"28\" font-size=\"16\" text-anchor=\"middle\">{}</text>",
            total_width / 2,
            escape(&self.title)
        );

        // SVG y grows downward, so row i at the top keeps catalog order.
        for (i, bar) in self.bars.iter().enumerate() {
            let y = BAR_TOP + i * (BAR_HEIGHT + BAR_PADDING);
            let width = (bar.percent.clamp(0.0, 100.0) / 100.0 * BAR_MAX_WIDTH as f64).round() as usize;

            let _ = writeln!(
                svg,
                "  <text x=\"{}\" y=\"{}\" font-size=\"12\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>",
                BAR_LABEL_WIDTH - 8,
                y + BAR_HEIGHT / 2,
                escape(bar.category)
            );
            let _ = writeln!(
                svg,
                "  <rect x=\"{BAR_LABEL_WIDTH}\" y=\"{y}\" width=\"{width}\" height=\"{BAR_HEIGHT}\" fill=\"{}\"/>",
                bar.band.color()
            );
            let _ = writeln!(
                svg,
                "  <text x=\"{}\" y=\"{}\" font-size=\"12\" font-weight=\"bold\" dominant-baseline=\"middle\">{}</text>",
                BAR_LABEL_WIDTH + width + 6,
                y + BAR_HEIGHT / 2,
                bar.label
            );
        }

        let _ = writeln!(
            svg,
            "  <line x1=\"{BAR_LABEL_WIDTH}\" y1=\"{axis_y}\" x2=\"{}\" y2=\"{axis_y}\" stroke=\"#888888\"/>",
            BAR_LABEL_WIDTH + BAR_MAX_WIDTH
        );
        for tick in (0..=100).step_by(20) {
            let x = BAR_LABEL_WIDTH + tick * BAR_MAX_WIDTH / 100;
            let _ = writeln!(
                svg,
                "  <text x=\"{x}\" y=\"{}\" font-size=\"10\" text-anchor=\"middle\">{tick}</text>",
                axis_y + 14
            );
        }
        let _ = writeln!(
            svg,
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" text-anchor=\"middle\">Performance (%)</text>",
            BAR_LABEL_WIDTH + BAR_MAX_WIDTH / 2,
            axis_y + 36
        );

        svg.push_str("</svg>\n");
        svg
    }
}

/// The pair of charts shown for any score vector.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSet {
    pub scores: ScoreVector,
    pub radar: RadarChart,
    pub bar: BarChart,
}

impl ChartSet {
    pub fn new(scores: ScoreVector, radar_title: &str, bar_title: &str, color: &str, series_label: &str) -> Self {
        Self {
            radar: radar_chart(&scores, radar_title, color, series_label),
            bar: bar_chart(&scores, bar_title),
            scores,
        }
    }

    /// Writes `<stem>-radar.svg` and `<stem>-bar.svg` under `dir`.
    pub fn write_svgs(&self, dir: &Path, stem: &str) -> anyhow::Result<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create chart directory {}", dir.display()))?;

        let radar_path = dir.join(format!("{stem}-radar.svg"));
        let bar_path = dir.join(format!("{stem}-bar.svg"));
        std::fs::write(&radar_path, self.radar.to_svg())
            .with_context(|| format!("failed to write {}", radar_path.display()))?;
        std::fs::write(&bar_path, self.bar.to_svg())
            .with_context(|| format!("failed to write {}", bar_path.display()))?;

        tracing::debug!(radar = %radar_path.display(), bar = %bar_path.display(), "charts written");
        Ok((radar_path, bar_path))
    }
}

/// File-name-safe form of a student name.
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let stem = stem
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if stem.is_empty() {
        "student".to_string()
    } else {
        stem
    }
}
