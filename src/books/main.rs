mod scrape;

use std::path::PathBuf;

use minijinja::context;
use reqwest::Client as Request;
use scrape::{Book, Books};
use sscr::{
    cli::CommonArgs,
    db::{PgStore, init_db},
    extract::{Extractor, Limits},
    report::{self, Chart, Filter},
    scrape::{HttpPages, basic},
    server::{Pipeline, launch},
    store::{self, CsvStore},
    util::{Output, unique_sorted},
};

const BASE_URL: &str = "http://books.toscrape.com";
const TEMPLATE: &str = include_str!("../../templates/books.html");

#[derive(clap::Parser)]
#[command(version, about)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
    /// Also keep the books in the `books` table of the configured database
    #[arg(long)]
    db: bool,
}

struct Pipe {
    client: Request,
    base: String,
    limits: Limits,
    out: Output,
    db: Option<PgStore<Book>>,
    store: CsvStore<Book>,
}

fn by_rating(books: &[&Book]) -> Chart {
    let mut counts = [0usize; 5];
    for book in books {
        let slot = usize::try_from(book.rating)
            .ok()
            .and_then(|r| r.checked_sub(1))
            .and_then(|i| counts.get_mut(i));
        if let Some(n) = slot {
            *n += 1;
        }
    }
    Chart::new(
        "Distribution of Books by Rating",
        "Number of Books",
        counts.iter().enumerate().map(|(i, &n)| ((i + 1).to_string(), n as f64)),
    )
}

/// Best five by value score, titles cut to 20 characters.
fn top_value(books: &[&Book]) -> Chart {
    let mut ranked = books.to_vec();
    ranked.sort_by(|a, b| {
        b.value_score
            .total_cmp(&a.value_score)
            .then_with(|| a.title.cmp(&b.title))
    });
    Chart::new(
        "Top 5 Books by Value Score",
        "Value Score (Rating/Price)",
        ranked
            .iter()
            .take(5)
            .map(|b| (b.title.chars().take(20).collect::<String>(), b.value_score)),
    )
}

impl Pipeline for Pipe {
    const FILTER: Option<&'static str> = Some("category");

    async fn report(&self, filter: Option<String>) -> anyhow::Result<String> {
        let rule = Books::new(self.client.clone(), &self.base)?;
        let pages = HttpPages::new(self.client.clone(), scrape::paging(&self.base));
        let books = Extractor::new("books", pages, rule, self.limits).run().await;
        let books = match &self.db {
            Some(db) => {
                db.ensure_table().await?;
                store::replace(db, &books).await?
            }
            None => books,
        };
        let books = store::replace(&self.store, &books).await?;

        let categories = unique_sorted(books.iter().map(|b| b.category.as_str()));
        let shown = books
            .iter()
            .filter(|b| filter.as_ref().is_none_or(|c| b.category == *c))
            .collect::<Vec<_>>();

        let (chart, value_chart) = if shown.is_empty() {
            (None, None)
        } else {
            (
                Some(by_rating(&shown).publish(&self.out, "books_by_rating").await?),
                Some(top_value(&shown).publish(&self.out, "top_books").await?),
            )
        };

        let page = report::render("books.html", TEMPLATE, context! {
            title => "Books Report",
            count => shown.len(),
            chart,
            value_chart,
            filter => Filter { name: "category", label: "Category", options: categories, selected: filter },
            books => shown,
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

    let Args { common, db } = Args::parse();
    let out = common.output();

    let pipe = Pipe {
        client: basic()?,
        base: common.base_url(BASE_URL).trim_end_matches('/').to_owned(),
        limits: common.limits(Limits::UNBOUNDED),
        db: if db { Some(PgStore::new(init_db().await?)) } else { None },
        store: CsvStore::new(out.file("books.csv")),
        out,
    };

    launch(pipe, &common).await
}
