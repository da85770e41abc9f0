mod scrape;

use std::path::PathBuf;

use minijinja::context;
use reqwest::Client as Request;
use scrape::{Crypto, Cryptos};
use sscr::{
    cli::Args,
    db::{PgStore, init_db},
    extract::{Extractor, Limits},
    report::{self, Chart},
    scrape::{HttpPages, Paging, basic},
    server::{Pipeline, launch},
    store::{self, JsonStore},
    util::Output,
};

const BASE_URL: &str = "https://coinmarketcap.com";
const TEMPLATE: &str = include_str!("../../templates/crypto.html");

struct Pipe {
    client: Request,
    base: String,
    limits: Limits,
    out: Output,
    db: PgStore<Crypto>,
    export: JsonStore<Crypto>,
}

fn by_market_cap(cryptos: &mut [Crypto]) {
    cryptos.sort_by(|a, b| b.market_cap.cmp(&a.market_cap));
}

fn change_24h(cryptos: &[Crypto]) -> Chart {
    Chart::new(
        "24h Change of Top Cryptocurrencies",
        "24h Change (%)",
        cryptos.iter().map(|c| (c.name.as_str(), c.change_24h)),
    )
}

impl Pipeline for Pipe {
    const FILTER: Option<&'static str> = None;

    async fn report(&self, _filter: Option<String>) -> anyhow::Result<String> {
        let pages = HttpPages::new(self.client.clone(), Paging::Single(self.base.clone()));
        let mut cryptos = Extractor::new("crypto", pages, Cryptos::new()?, self.limits).run().await;
        by_market_cap(&mut cryptos);

        self.db.ensure_table().await?;
        let cryptos = store::replace(&self.db, &cryptos).await?;
        store::replace(&self.export, &cryptos).await?;

        let chart = if cryptos.is_empty() {
            None
        } else {
            Some(change_24h(&cryptos).publish(&self.out, "change_24h").await?)
        };

        let page = report::render("crypto.html", TEMPLATE, context! {
            title => "Cryptocurrency Report",
            count => cryptos.len(),
            chart,
            cryptos,
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
        limits: common.limits(Limits::records(20)),
        db: PgStore::new(init_db().await?),
        export: JsonStore::new(out.file("cryptos.json")),
        out,
    };

    launch(pipe, &common).await
}
