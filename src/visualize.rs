//! SVG rendering of the frequency distribution.
//!
//! Two images are produced: a word cloud of the most frequent tokens and a
//! horizontal bar chart of the top-percent tokens. Nothing rendered here is
//! read back by later stages.

use std::fmt::Write as _;

use crate::frequency::TermCount;

const PALETTE: [&str; 6] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b"];

pub trait Plotter {
    /// Word cloud for terms already ranked by count.
    fn word_cloud(&self, terms: &[&TermCount]) -> String;

    /// Bar chart for terms already ranked by count.
    fn bar_chart(&self, title: &str, terms: &[&TermCount]) -> String;
}

#[derive(Debug, Clone)]
pub struct SvgPlotter {
    pub width: u32,
    pub min_font: f64,
    pub max_font: f64,
}

impl Default for SvgPlotter {
    fn default() -> Self {
        Self {
            width: 800,
            min_font: 12.0,
            max_font: 64.0,
        }
    }
}

impl SvgPlotter {
    fn font_size(&self, count: usize, min: usize, max: usize) -> f64 {
        if max == min {
            return (self.min_font + self.max_font) / 2.0;
        }
        let t = (count - min) as f64 / (max - min) as f64;
        self.min_font + t.sqrt() * (self.max_font - self.min_font)
    }
}

impl Plotter for SvgPlotter {
    /// Row-packed layout: largest words first, wrapping when a row is full.
    fn word_cloud(&self, terms: &[&TermCount]) -> String {
        let max = terms.iter().map(|t| t.count).max().unwrap_or(0);
        let min = terms.iter().map(|t| t.count).min().unwrap_or(0);
        let margin = 10.0;
        let width = self.width as f64;

        let mut words = String::new();
        let (mut x, mut baseline, mut row_height) = (margin, margin, 0.0_f64);
        for (i, term) in terms.iter().enumerate() {
            let size = self.font_size(term.count, min, max);
            // average glyph advance is roughly 0.6 em
            let advance = term.token.chars().count() as f64 * size * 0.6;
            if x > margin && x + advance > width - margin {
                x = margin;
                baseline += row_height * 1.2;
                row_height = 0.0;
            }
            row_height = row_height.max(size);
            let _ = writeln!(
                words,
                r#"  <text x="{:.1}" y="{:.1}" font-size="{:.1}" fill="{}" dominant-baseline="hanging">{}</text>"#,
                x,
                baseline,
                size,
                PALETTE[i % PALETTE.len()],
                escape(&term.token)
            );
            x += advance + size * 0.4;
        }
        let height = (baseline + row_height * 1.2 + margin).ceil();

        svg_document(self.width, height as u32, &words)
    }

    fn bar_chart(&self, title: &str, terms: &[&TermCount]) -> String {
        let bar = 22.0;
        let label_width = 160.0;
        let top = 40.0;
        let width = self.width as f64;
        let plot_width = width - label_width - 70.0;
        let max = terms.iter().map(|t| t.count).max().unwrap_or(1).max(1) as f64;

        let mut body = String::new();
        let _ = writeln!(
            body,
            r#"  <text x="{:.1}" y="24" font-size="16" text-anchor="middle">{}</text>"#,
            width / 2.0,
            escape(title)
        );
        for (i, term) in terms.iter().enumerate() {
            let y = top + i as f64 * (bar + 6.0);
            let w = plot_width * term.count as f64 / max;
            let _ = writeln!(
                body,
                r#"  <text x="{:.1}" y="{:.1}" font-size="12" text-anchor="end">{}</text>"#,
                label_width - 8.0,
                y + bar * 0.7,
                escape(&term.token)
            );
            let _ = writeln!(
                body,
                r#"  <rect x="{label_width:.1}" y="{y:.1}" width="{w:.1}" height="{bar:.1}" fill="{}"/>"#,
                PALETTE[0]
            );
            let _ = writeln!(
                body,
                r#"  <text x="{:.1}" y="{:.1}" font-size="12">{}</text>"#,
                label_width + w + 6.0,
                y + bar * 0.7,
                term.count
            );
        }
        let height = top + terms.len() as f64 * (bar + 6.0) + 20.0;

        svg_document(self.width, height as u32, &body)
    }
}

fn svg_document(width: u32, height: u32, body: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\" font-family=\"sans-serif\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n{body}</svg>\n"
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
