mod scrape;

use core::time::Duration;
use std::path::PathBuf;

use minijinja::context;
use scrape::{Job, Jobs};
use sscr::{
    cli::CommonArgs,
    db::{PgStore, init_db},
    extract::{Extractor, Limits},
    report::{self, Chart, tally, top},
    scrape::ScrollPages,
    server::{Pipeline, launch},
    store::{self, CsvStore},
    util::Output,
};

const BASE_URL: &str = "https://www.linkedin.com/jobs/search/?keywords=Python%20Developer";
const TEMPLATE: &str = include_str!("../../templates/jobs.html");
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
    db: PgStore<Job>,
    export: CsvStore<Job>,
}

fn top_companies(jobs: &[Job]) -> Chart {
    let counts = tally(jobs.iter().map(|j| j.company.as_str()));
    Chart::new(
        "Top 5 Companies with Python Developer Jobs",
        "Number of Jobs",
        top(counts, 5).into_iter().map(|(company, n)| (company, n as f64)),
    )
}

impl Pipeline for Pipe {
    const FILTER: Option<&'static str> = None;

    async fn report(&self, _filter: Option<String>) -> anyhow::Result<String> {
        let pages = ScrollPages::launch(self.url.clone(), self.headless, SETTLE).await?;
        let jobs = Extractor::new("jobs", pages, Jobs::new()?, self.limits).run().await;

        self.db.ensure_table().await?;
        let jobs = store::replace(&self.db, &jobs).await?;
        store::replace(&self.export, &jobs).await?;

        let chart = if jobs.is_empty() {
            None
        } else {
            Some(top_companies(&jobs).publish(&self.out, "jobs_by_company").await?)
        };

        let page = report::render("jobs.html", TEMPLATE, context! {
            title => "Python Developer Jobs Report",
            count => jobs.len(),
            chart,
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

    let Args { common, headed } = Args::parse();
    let out = common.output();

    let pipe = Pipe {
        url: common.base_url(BASE_URL).to_owned(),
        headless: !headed,
        limits: common.limits(Limits::records(20)),
        db: PgStore::new(init_db().await?),
        export: CsvStore::new(out.file("jobs.csv")),
        out,
    };

    launch(pipe, &common).await
}
