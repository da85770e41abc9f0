mod scrape;

use std::path::PathBuf;

use minijinja::context;
use reqwest::{Client as Request, Url};
use scrape::{Article, Section, articles_csv};
use sscr::{
    cli::Args,
    extract::{Extractor, Limits},
    report::{self, Chart, Filter, tally, top},
    scrape::{HttpPages, Paging, basic},
    server::{Pipeline, launch},
    util::{Output, unique_sorted},
};

const BASE_URL: &str = "https://en.wikipedia.org/wiki/Python_(programming_language)";
const TEMPLATE: &str = include_str!("../../templates/wiki.html");

struct Pipe {
    client: Request,
    url: Url,
    limits: Limits,
    out: Output,
}

impl Pipe {
    fn export(&self) -> PathBuf {
        self.out.file("articles.csv")
    }
}

fn top_headings(sections: &[&Section]) -> Chart {
    let counts = tally(sections.iter().map(|s| s.heading.as_str()));
    Chart::new(
        "Top 5 Headings by Number of Paragraphs",
        "Number of Paragraphs",
        top(counts, 5).into_iter().map(|(heading, n)| (heading, n as f64)),
    )
}

impl Pipeline for Pipe {
    const FILTER: Option<&'static str> = Some("heading");

    async fn report(&self, filter: Option<String>) -> anyhow::Result<String> {
        let pages = HttpPages::new(self.client.clone(), Paging::Single(self.url.to_string()));
        let rule = Article::new(self.url.clone())?;
        let (sections, article) = Extractor::new("wiki", pages, rule, self.limits).run_with_rule().await;

        tokio::fs::write(self.export(), articles_csv(&sections, &article.info, &article.images)?).await?;
        tracing::info!(
            target: "store",
            "\x1b[36m{}: {} paragraphs, {} infobox rows, {} images\x1b[0m",
            self.export().display(),
            sections.len(),
            article.info.len(),
            article.images.len(),
        );

        let headings = unique_sorted(sections.iter().map(|s| s.heading.as_str()));
        let shown = sections
            .iter()
            .filter(|s| filter.as_ref().is_none_or(|h| s.heading == *h))
            .collect::<Vec<_>>();

        let chart = if shown.is_empty() {
            None
        } else {
            Some(top_headings(&shown).publish(&self.out, "paragraphs_per_heading").await?)
        };

        let page = report::render("wiki.html", TEMPLATE, context! {
            title => "Wikipedia Article Report",
            count => shown.len(),
            chart,
            filter => Filter { name: "heading", label: "Heading", options: headings, selected: filter },
            contents => shown,
            infobox => article.info,
            images => article.images,
        })?;
        report::publish(&self.out, &page).await?;
        Ok(page)
    }

    fn export_path(&self) -> PathBuf {
        self.export()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;

    pretty_env_logger::init_timed();

    let Args { common } = Args::parse();

    let pipe = Pipe {
        client: basic()?,
        url: Url::parse(common.base_url(BASE_URL))?,
        limits: common.limits(Limits::UNBOUNDED),
        out: common.output(),
    };

    launch(pipe, &common).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_shows_infobox_and_images() {
        let sections = [Section { heading: "History".to_owned(), paragraph: "Conceived in 1989.".to_owned() }];
        let page = report::render("wiki.html", TEMPLATE, context! {
            title => "Wikipedia Article Report",
            contents => sections,
            infobox => [("Designed by", "Guido van Rossum")],
            images => ["https://upload.wikimedia.org/logo.png"],
        })
        .unwrap();
        assert!(page.contains("<th>Designed by</th><td>Guido van Rossum</td>"));
        assert_eq!(page.matches("<li><a href=").count(), 1);
        assert!(page.contains("upload.wikimedia.org"));
        assert!(page.contains("<td>History</td><td>Conceived in 1989.</td>"));
    }
}
