mod scrape;

use std::path::PathBuf;

use minijinja::context;
use reqwest::Client as Request;
use scrape::{NA, Phone, Phones};
use sscr::{
    cli::Args,
    extract::{Extractor, Limits},
    normalize::digits_only,
    report::{self, Chart, Filter},
    scrape::{HttpPages, basic},
    server::{Pipeline, launch},
    store::{self, CsvStore},
    util::{Output, unique_sorted},
};

const BASE_URL: &str = "https://www.olx.uz/d/elektronika/telefony-i-aksesuary/";
const TEMPLATE: &str = include_str!("../../templates/phones.html");

/// Upper bound (inclusive) and label of each price bucket, in sum.
const BUCKETS: [(f64, &str); 5] = [
    (500_000.0, "<500K"),
    (1_000_000.0, "500K-1M"),
    (2_000_000.0, "1M-2M"),
    (5_000_000.0, "2M-5M"),
    (f64::INFINITY, ">5M"),
];

struct Pipe {
    client: Request,
    base: String,
    limits: Limits,
    out: Output,
    store: CsvStore<Phone>,
}

/// `None` when no listing has a readable price.
fn price_distribution(phones: &[&Phone]) -> Option<Chart> {
    let prices = phones.iter().filter_map(|p| digits_only(&p.price)).collect::<Vec<_>>();
    if prices.is_empty() {
        return None;
    }

    let mut counts = [0usize; BUCKETS.len()];
    for price in prices {
        if let Some(i) = BUCKETS.iter().position(|&(max, _)| price <= max) {
            counts[i] += 1;
        }
    }
    Some(Chart::new(
        "Price Distribution of Phone Listings",
        "Number of Phones",
        BUCKETS.iter().zip(counts).map(|(&(_, label), n)| (label, n as f64)),
    ))
}

impl Pipeline for Pipe {
    const FILTER: Option<&'static str> = Some("location");

    async fn report(&self, filter: Option<String>) -> anyhow::Result<String> {
        let pages = HttpPages::new(self.client.clone(), scrape::paging(&self.base));
        let phones = Extractor::new("phones", pages, Phones::new()?, self.limits).run().await;
        let phones = store::replace(&self.store, &phones).await?;

        let locations = unique_sorted(phones.iter().map(|p| p.location.as_str()).filter(|l| *l != NA));
        let shown = phones
            .iter()
            .filter(|p| filter.as_ref().is_none_or(|l| p.location == *l))
            .collect::<Vec<_>>();

        let chart = match price_distribution(&shown) {
            Some(chart) => Some(chart.publish(&self.out, "price_distribution").await?),
            None => None,
        };

        let page = report::render("phones.html", TEMPLATE, context! {
            title => "Phone Listings Report",
            count => shown.len(),
            chart,
            filter => Filter { name: "location", label: "Location", options: locations, selected: filter },
            phones => shown,
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
        limits: common.limits(Limits::pages(3)),
        store: CsvStore::new(out.file("phones.csv")),
        out,
    };

    launch(pipe, &common).await
}
