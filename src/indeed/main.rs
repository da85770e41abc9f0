mod scrape;

use std::path::PathBuf;

use minijinja::context;
use reqwest::Client as Request;
use scrape::{Job, Jobs};
use sscr::{
    cli::Args,
    extract::{Extractor, Limits},
    report,
    scrape::{HttpPages, Paging, basic},
    server::{Pipeline, launch},
    store::{self, JsonStore},
    util::Output,
};

const BASE_URL: &str = "https://www.indeed.com/jobs?q=software+developer";
const TEMPLATE: &str = include_str!("../../templates/indeed.html");

struct Pipe {
    client: Request,
    base: String,
    limits: Limits,
    out: Output,
    export: JsonStore<Job>,
}

impl Pipeline for Pipe {
    const FILTER: Option<&'static str> = None;

    async fn report(&self, _filter: Option<String>) -> anyhow::Result<String> {
        let pages = HttpPages::new(self.client.clone(), Paging::Single(self.base.clone()));
        let jobs = Extractor::new("indeed", pages, Jobs::new()?, self.limits).run().await;
        let jobs = store::replace(&self.export, &jobs).await?;

        let page = report::render("indeed.html", TEMPLATE, context! {
            title => "Software Developer Jobs Report",
            count => jobs.len(),
            jobs,
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
        export: JsonStore::new(out.file("jobs.json")),
        out,
    };

    launch(pipe, &common).await
}
