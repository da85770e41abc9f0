mod scrape;

use std::path::PathBuf;

use minijinja::context;
use reqwest::Client as Request;
use scrape::{Post, Posts};
use sscr::{
    cli::Args,
    extract::{Extractor, Limits},
    report::{self, Chart},
    scrape::{HttpPages, Paging, basic},
    server::{Pipeline, launch},
    store::{self, JsonStore},
    util::Output,
};

const BASE_URL: &str = "https://www.reddit.com/r/Python/hot/";
const TEMPLATE: &str = include_str!("../../templates/reddit.html");

struct Pipe {
    client: Request,
    base: String,
    limits: Limits,
    out: Output,
    export: JsonStore<Post>,
}

fn upvotes(posts: &[Post]) -> Chart {
    Chart::new(
        "Upvotes of Hot Posts",
        "Upvotes",
        posts
            .iter()
            .map(|p| (p.title.chars().take(20).collect::<String>(), p.upvotes as f64)),
    )
}

impl Pipeline for Pipe {
    const FILTER: Option<&'static str> = None;

    async fn report(&self, _filter: Option<String>) -> anyhow::Result<String> {
        let pages = HttpPages::new(self.client.clone(), Paging::Single(self.base.clone()));
        let posts = Extractor::new("reddit", pages, Posts::new()?, self.limits).run().await;
        let posts = store::replace(&self.export, &posts).await?;

        let chart = if posts.is_empty() {
            None
        } else {
            Some(upvotes(&posts).publish(&self.out, "reddit_upvotes").await?)
        };

        let page = report::render("reddit.html", TEMPLATE, context! {
            title => "r/Python Hot Posts Report",
            count => posts.len(),
            chart,
            posts,
        })?;
        report::publish(&self.out, &page).await?;
        Ok(page)
    }

    fn export_path(&self) -> PathBuf {
        self.export.path().to_owned()
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
        base: common.base_url(BASE_URL).to_owned(),
        limits: common.limits(Limits::records(10)),
        export: JsonStore::new(out.file("posts.json")),
        out,
    };

    launch(pipe, &common).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_bar_per_post() {
        let post = |title: &str, upvotes| Post { title: title.to_owned(), upvotes, date: "N/A".to_owned() };
        let posts = [post("Python 3.13 is out with a new REPL", 1200), post("Weekly thread", 0)];

        let chart = upvotes(&posts);
        let bars = chart.bars.iter().map(|b| (b.label.as_str(), b.value)).collect::<Vec<_>>();
        assert_eq!(bars, [("Python 3.13 is out w", 1200.0), ("Weekly thread", 0.0)]);
    }
}
