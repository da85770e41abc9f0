mod scrape;

use core::time::Duration;
use std::path::PathBuf;

use minijinja::context;
use scrape::{Product, Products};
use sscr::{
    cli::CommonArgs,
    extract::{Extractor, Limits},
    report::{self, Chart},
    scrape::ScrollPages,
    server::{Pipeline, launch},
    store::{self, JsonStore},
    util::Output,
};

const BASE_URL: &str = "https://www.amazon.com/s?k=mobile+phones";
const TEMPLATE: &str = include_str!("../../templates/amazon.html");
const SETTLE: Duration = Duration::from_secs(2);

#[derive(clap::Parser)]
#[command(version, about)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
    /// Show the browser window
    #[arg(long)]
    headed: bool,
}

struct Pipe {
    url: String,
    headless: bool,
    limits: Limits,
    out: Output,
    export: JsonStore<Product>,
}

/// Unpriced results (price 0) are left out.
fn prices(products: &[Product]) -> Chart {
    Chart::new(
        "Prices of Mobile Phones",
        "Price ($)",
        products
            .iter()
            .filter(|p| p.price > 0.0)
            .map(|p| (p.name.chars().take(20).collect::<String>(), p.price)),
    )
}

impl Pipeline for Pipe {
    const FILTER: Option<&'static str> = None;

    async fn report(&self, _filter: Option<String>) -> anyhow::Result<String> {
        let pages = ScrollPages::launch(self.url.clone(), self.headless, SETTLE).await?;
        let products = Extractor::new("amazon", pages, Products::new()?, self.limits).run().await;
        let products = store::replace(&self.export, &products).await?;

        let chart = if products.iter().any(|p| p.price > 0.0) {
            Some(prices(&products).publish(&self.out, "amazon_prices").await?)
        } else {
            None
        };

        let page = report::render("amazon.html", TEMPLATE, context! {
            title => "Amazon Mobile Phones Report",
            count => products.len(),
            chart,
            products,
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

    let Args { common, headed } = Args::parse();
    let out = common.output();

    let pipe = Pipe {
        url: common.base_url(BASE_URL).to_owned(),
        headless: !headed,
        limits: common.limits(Limits::pages(1)),
        export: JsonStore::new(out.file("products.json")),
        out,
    };

    launch(pipe, &common).await
}
