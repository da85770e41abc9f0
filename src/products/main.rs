mod scrape;

use std::path::PathBuf;

use minijinja::context;
use reqwest::Client as Request;
use scrape::{Product, Products};
use sscr::{
    cli::Args,
    extract::{Extractor, Limits},
    report::{self, Chart, Filter},
    scrape::{HttpPages, basic},
    server::{Pipeline, launch},
    store::{self, CsvStore},
    util::Output,
};

const BASE_URL: &str = "https://www.flipkart.com/mobiles/pr?sid=tyy%2C4io";
const TEMPLATE: &str = include_str!("../../templates/products.html");

/// Label and half-open `[low, high)` bounds of each price range, in rupees.
const PRICE_RANGES: [(&str, f64, f64); 5] = [
    ("<10000", f64::NEG_INFINITY, 10_000.0),
    ("10000-20000", 10_000.0, 20_000.0),
    ("20000-30000", 20_000.0, 30_000.0),
    ("30000-50000", 30_000.0, 50_000.0),
    (">50000", 50_000.0, f64::INFINITY),
];

/// A label that is not one of [`PRICE_RANGES`] means the top range.
fn in_range(product: &Product, range: &str) -> bool {
    let (_, low, high) = PRICE_RANGES
        .iter()
        .find(|(label, ..)| *label == range)
        .copied()
        .unwrap_or(PRICE_RANGES[PRICE_RANGES.len() - 1]);
    (low..high).contains(&product.price)
}

/// Products rated 0 (no rating shown) fall in no bucket.
fn rating_distribution(products: &[&Product]) -> Chart {
    const LABELS: [&str; 4] = ["1-2", "2-3", "3-4", "4-5"];

    let mut counts = [0usize; 4];
    for p in products {
        let i = match p.rating {
            r if (1.0..2.0).contains(&r) => 0,
            r if (2.0..3.0).contains(&r) => 1,
            r if (3.0..4.0).contains(&r) => 2,
            r if (4.0..=5.0).contains(&r) => 3,
            _ => continue,
        };
        counts[i] += 1;
    }
    Chart::new(
        "Ratings Distribution of Mobile Phones",
        "Number of Products",
        LABELS.into_iter().zip(counts).map(|(label, n)| (label, n as f64)),
    )
}

struct Pipe {
    client: Request,
    base: String,
    limits: Limits,
    out: Output,
    store: CsvStore<Product>,
}

impl Pipeline for Pipe {
    const FILTER: Option<&'static str> = Some("price_range");

    async fn report(&self, filter: Option<String>) -> anyhow::Result<String> {
        let pages = HttpPages::new(self.client.clone(), scrape::paging(&self.base));
        let products = Extractor::new("products", pages, Products::new()?, self.limits).run().await;
        let products = store::replace(&self.store, &products).await?;

        let shown = products
            .iter()
            .filter(|p| filter.as_deref().is_none_or(|r| in_range(p, r)))
            .collect::<Vec<_>>();

        let chart = if shown.is_empty() {
            None
        } else {
            Some(rating_distribution(&shown).publish(&self.out, "ratings_distribution").await?)
        };

        let page = report::render("products.html", TEMPLATE, context! {
            title => "Mobile Phones Report",
            count => shown.len(),
            chart,
            filter => Filter {
                name: "price_range",
                label: "Price range",
                options: PRICE_RANGES.iter().map(|(label, ..)| (*label).to_owned()).collect(),
                selected: filter,
            },
            products => shown,
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
        base: common.base_url(BASE_URL).to_owned(),
        limits: common.limits(Limits::pages(2)),
        store: CsvStore::new(out.file("products.csv")),
        out,
    };

    launch(pipe, &common).await
}
