mod scrape;

use std::path::PathBuf;

use minijinja::context;
use reqwest::Client as Request;
use scrape::{Quote, Quotes};
use sscr::{
    cli::Args,
    extract::{Extractor, Limits},
    report::{self, Chart, Filter, tally, top},
    scrape::{HttpPages, basic},
    server::{Pipeline, launch},
    store::{self, CsvStore},
    util::{Output, unique_sorted},
};

const BASE_URL: &str = "http://quotes.toscrape.com";
const TEMPLATE: &str = include_str!("../../templates/quotes.html");

struct Pipe {
    client: Request,
    base: String,
    limits: Limits,
    out: Output,
    store: CsvStore<Quote>,
}

fn top_authors(quotes: &[&Quote]) -> Chart {
    let counts = tally(quotes.iter().map(|q| q.author.as_str()));
    Chart::new(
        "Top 5 Authors by Number of Quotes",
        "Number of Quotes",
        top(counts, 5).into_iter().map(|(author, n)| (author, n as f64)),
    )
}

impl Pipeline for Pipe {
    const FILTER: Option<&'static str> = Some("tag");

    async fn report(&self, filter: Option<String>) -> anyhow::Result<String> {
        let pages = HttpPages::new(self.client.clone(), scrape::paging(&self.base));
        let quotes = Extractor::new("quotes", pages, Quotes::new()?, self.limits).run().await;
        let quotes = store::replace(&self.store, &quotes).await?;

        let tags = unique_sorted(quotes.iter().flat_map(|q| q.tags.iter().map(String::as_str)));
        let shown = quotes
            .iter()
            .filter(|q| filter.as_ref().is_none_or(|t| q.tags.contains(t)))
            .collect::<Vec<_>>();

        let chart = if shown.is_empty() {
            None
        } else {
            Some(top_authors(&shown).publish(&self.out, "quotes_by_author").await?)
        };

        let page = report::render("quotes.html", TEMPLATE, context! {
            title => "Quotes Report",
            count => shown.len(),
            chart,
            filter => Filter { name: "tag", label: "Tag", options: tags, selected: filter },
            quotes => shown,
        })?;
        report::publish(&self.out, &page).await?;
        Ok(page)
    }

    fn export_path(&self) -> PathBuf {
        self.store.path().to_owned()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;

    pretty_env_logger::init_timed();

    let Args { common } = Args::parse();
    let out = common.output();

    let pipe = Pipe {
        client: basic()?,
        base: common.base_url(BASE_URL).trim_end_matches('/').to_owned(),
        limits: common.limits(Limits::UNBOUNDED),
        store: CsvStore::new(out.file("quotes.csv")),
        out,
    };

    launch(pipe, &common).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(author: &str) -> Quote {
        Quote {
            quote_text: "q".to_owned(),
            author: author.to_owned(),
            tags: vec!["life".to_owned()],
        }
    }

    #[test]
    fn at_most_five_authors() {
        let quotes = ["A", "B", "B", "C", "D", "E", "F", "F", "F"].map(quote);
        let chart = top_authors(&quotes.iter().collect::<Vec<_>>());
        let labels = chart.bars.iter().map(|b| b.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, ["F", "B", "A", "C", "D"]);
        assert_eq!(chart.bars[0].value, 3.0);
    }
}
