//! Static HTML report and its one bar chart.

use core::hash::Hash;
use std::path::Path;

use hashbrown::HashMap;
use minijinja::{AutoEscape, Environment, context};
use serde::Serialize;

use crate::util::Output;

const LAYOUT: &str = include_str!("../templates/layout.html");
const CHART: &str = include_str!("../templates/chart.svg");

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|name| {
        if name.ends_with(".html") || name.ends_with(".svg") {
            AutoEscape::Html
        } else {
            AutoEscape::None
        }
    });
    env
}

/// Render a page template that extends `layout.html`.
pub fn render(name: &'static str, source: &'static str, ctx: impl Serialize) -> Result<String, minijinja::Error> {
    let mut env = environment();
    env.add_template("layout.html", LAYOUT)?;
    env.add_template(name, source)?;
    env.get_template(name)?.render(ctx)
}

/// Write the rendered page to `report.html`.
pub async fn publish(out: &Output, page: &str) -> anyhow::Result<()> {
    let path = out.report();
    tokio::fs::write(&path, page).await?;
    tracing::info!(target: "report", "\x1b[32mreport written to {}\x1b[0m", path.display());
    Ok(())
}

/// The drop-down on top of a report.
#[derive(Debug, Clone, Serialize)]
pub struct Filter {
    pub name: &'static str,
    pub label: &'static str,
    pub options: Vec<String>,
    pub selected: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
}

#[derive(Serialize)]
struct Shape<'a> {
    label: &'a str,
    value: f64,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

const WIDTH: f64 = 720.0;
const HEIGHT: f64 = 400.0;
const MARGIN: f64 = 56.0;

impl Chart {
    pub fn new<L: Into<String>>(
        title: impl Into<String>,
        y_label: impl Into<String>,
        bars: impl IntoIterator<Item = (L, f64)>,
    ) -> Self {
        Self {
            title: title.into(),
            y_label: y_label.into(),
            bars: bars
                .into_iter()
                .map(|(label, value)| Bar { label: label.into(), value })
                .collect(),
        }
    }

    pub fn to_svg(&self) -> Result<String, minijinja::Error> {
        let hi = self.bars.iter().map(|b| b.value).fold(0.0, f64::max);
        let lo = self.bars.iter().map(|b| b.value).fold(0.0, f64::min);
        let span = if hi - lo > 0.0 { hi - lo } else { 1.0 };

        let plot_w = WIDTH - 2.0 * MARGIN;
        let plot_h = HEIGHT - 2.0 * MARGIN;
        let zero = MARGIN + hi / span * plot_h;
        let slot = plot_w / self.bars.len().max(1) as f64;

        let shapes = self
            .bars
            .iter()
            .enumerate()
            .map(|(i, bar)| Shape {
                label: &bar.label,
                value: bar.value,
                x: MARGIN + i as f64 * slot + slot * 0.1,
                y: zero - bar.value.max(0.0) / span * plot_h,
                width: slot * 0.8,
                height: bar.value.abs() / span * plot_h,
            })
            .collect::<Vec<_>>();

        let mut env = environment();
        env.add_template("chart.svg", CHART)?;
        env.get_template("chart.svg")?.render(context! {
            title => &self.title,
            y_label => &self.y_label,
            width => WIDTH,
            height => HEIGHT,
            margin => MARGIN,
            zero => zero,
            bars => shapes,
        })
    }

    pub async fn write(&self, path: &Path) -> anyhow::Result<()> {
        tokio::fs::write(path, self.to_svg()?).await?;
        tracing::info!(target: "report", "chart written to {}", path.display());
        Ok(())
    }

    /// Write to `static/<name>.svg` and return the URL the page links.
    pub async fn publish(&self, out: &Output, name: &str) -> anyhow::Result<String> {
        self.write(&out.chart(name)).await?;
        Ok(Output::chart_url(name))
    }
}

pub fn tally<K: Hash + Eq>(keys: impl IntoIterator<Item = K>) -> HashMap<K, usize> {
    let mut counts = HashMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// The `n` largest counts, ties broken by key.
pub fn top<K: Ord>(counts: HashMap<K, usize>, n: usize) -> Vec<(K, usize)> {
    let mut v = counts.into_iter().collect::<Vec<_>>();
    v.sort_unstable_by(|(ka, a), (kb, b)| b.cmp(a).then_with(|| ka.cmp(kb)));
    v.truncate(n);
    v
}

/// Mean value per key, sorted by key.
pub fn averages<K: Hash + Eq + Ord>(pairs: impl IntoIterator<Item = (K, f64)>) -> Vec<(K, f64)> {
    let mut sums = HashMap::<K, (f64, usize)>::new();
    for (key, value) in pairs {
        let e = sums.entry(key).or_insert((0.0, 0));
        e.0 += value;
        e.1 += 1;
    }
    let mut v = sums
        .into_iter()
        .map(|(k, (sum, n))| (k, sum / n as f64))
        .collect::<Vec<_>>();
    v.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_breaks_ties_by_key() {
        let counts = tally(["Einstein", "Rowling", "Einstein", "Austen", "Rowling", "Twain"]);
        assert_eq!(top(counts, 3), [("Einstein", 2), ("Rowling", 2), ("Austen", 1)]);
    }

    #[test]
    fn averages_by_key() {
        let avg = averages([(1990, 8.0), (1970, 9.0), (1990, 9.0)]);
        assert_eq!(avg, [(1970, 9.0), (1990, 8.5)]);
    }

    #[test]
    fn svg_has_one_rect_per_bar() {
        let chart = Chart::new("24h change", "%", [("Bitcoin", 2.5), ("Ethereum", -1.25), ("<Tether>", 0.0)]);
        let svg = chart.to_svg().unwrap();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<rect class=\"bar\"").count(), 3);
        assert!(svg.contains("&lt;Tether&gt;"));
        assert!(svg.contains("24h change"));
    }

    #[test]
    fn render_extends_layout() {
        const PAGE: &str = r#"{% extends "layout.html" %}{% block content %}<p>{{ who }}</p>{% endblock %}"#;
        let html = render("page.html", PAGE, context! { title => "T", who => "<b>" }).unwrap();
        assert!(html.contains("<title>T</title>"));
        assert!(html.contains("<p>&lt;b&gt;</p>"));
    }
}
