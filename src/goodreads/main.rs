mod scrape;

use std::path::PathBuf;

use minijinja::context;
use reqwest::Client as Request;
use scrape::{Book, Books};
use sscr::{
    cli::Args,
    extract::{Extractor, Limits},
    report::{self, Chart, tally, top},
    scrape::{HttpPages, Paging, basic},
    server::{Pipeline, launch},
    store::{self, JsonStore},
    util::Output,
};

const BASE_URL: &str = "https://www.goodreads.com/list/show/1.Best_Books_Ever";
const TEMPLATE: &str = include_str!("../../templates/goodreads.html");

struct Pipe {
    client: Request,
    base: String,
    limits: Limits,
    out: Output,
    export: JsonStore<Book>,
}

fn top_authors(books: &[Book]) -> Chart {
    let counts = tally(books.iter().map(|b| b.author.as_str()));
    Chart::new(
        "Top 5 Authors on the List",
        "Number of Books",
        top(counts, 5).into_iter().map(|(author, n)| (author, n as f64)),
    )
}

impl Pipeline for Pipe {
    const FILTER: Option<&'static str> = None;

    async fn report(&self, _filter: Option<String>) -> anyhow::Result<String> {
        let pages = HttpPages::new(self.client.clone(), Paging::Single(self.base.clone()));
        let books = Extractor::new("goodreads", pages, Books::new()?, self.limits).run().await;
        let books = store::replace(&self.export, &books).await?;

        let chart = if books.is_empty() {
            None
        } else {
            Some(top_authors(&books).publish(&self.out, "goodreads_authors").await?)
        };

        let page = report::render("goodreads.html", TEMPLATE, context! {
            title => "Goodreads Best Books Report",
            count => books.len(),
            chart,
            books,
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
        limits: common.limits(Limits::UNBOUNDED),
        export: JsonStore::new(out.file("books.json")),
        out,
    };

    launch(pipe, &common).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_rows_and_authors() {
        let book = |title: &str, author: &str| Book { title: title.to_owned(), author: author.to_owned(), rating: 4.1 };
        let books = [book("Emma", "Jane Austen"), book("Persuasion", "Jane Austen"), book("Dune", "Frank Herbert")];

        let chart = top_authors(&books);
        assert_eq!(chart.bars[0].label, "Jane Austen");
        assert_eq!(chart.bars[0].value, 2.0);

        let page = report::render("goodreads.html", TEMPLATE, context! { title => "T", count => 3, books }).unwrap();
        assert!(page.contains("<td>Persuasion</td><td>Jane Austen</td><td>4.1</td>"));
    }
}
