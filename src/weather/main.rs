mod scrape;

use std::path::PathBuf;

use minijinja::context;
use reqwest::Client as Request;
use scrape::{Conditions, Weather};
use sscr::{
    cli::Args,
    extract::{Extractor, Limits},
    report,
    scrape::{HttpPages, Paging, basic},
    server::{Pipeline, launch},
    store::{self, JsonStore},
    util::Output,
};

const BASE_URL: &str = "https://weather.com/weather/today/l/New+York+NY+USNY0996:1:US";
const TEMPLATE: &str = include_str!("../../templates/weather.html");

struct Pipe {
    client: Request,
    base: String,
    limits: Limits,
    out: Output,
    export: JsonStore<Weather>,
}

impl Pipeline for Pipe {
    const FILTER: Option<&'static str> = None;

    async fn report(&self, _filter: Option<String>) -> anyhow::Result<String> {
        let pages = HttpPages::new(self.client.clone(), Paging::Single(self.base.clone()));
        let weathers = Extractor::new("weather", pages, Conditions::new()?, self.limits).run().await;
        let weathers = store::replace(&self.export, &weathers).await?;

        let page = report::render("weather.html", TEMPLATE, context! {
            title => "Weather Report",
            count => weathers.len(),
            weathers,
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
        export: JsonStore::new(out.file("weather.json")),
        out,
    };

    launch(pipe, &common).await
}

#[cfg(test)]
mod tests {
    use axum::{Router, response::Html, routing::get};
    use sscr::store::RecordStore;

    use super::*;

    const PAGE: &str = r#"<html><body>
<h1 class="CurrentConditions--location--1YWj_">Boston, MA</h1>
<span class="CurrentConditions--tempValue--MHmYY">55°</span>
</body></html>"#;

    #[tokio::test]
    async fn one_cycle_exports_one_record() {
        let app = Router::new().route("/today", get(|| async { Html(PAGE) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let dir = std::env::temp_dir().join(format!("sscr-weather-{}", std::process::id()));
        let out = Output::new(&dir);
        out.prepare().await.unwrap();
        let pipe = Pipe {
            client: basic().unwrap(),
            base: format!("http://{addr}/today"),
            limits: Limits::UNBOUNDED,
            export: JsonStore::new(out.file("weather.json")),
            out,
        };

        let page = pipe.report(None).await.unwrap();
        assert!(page.contains("<td>Boston, MA</td><td>55°</td>"));
        assert!(page.contains("1 records"));
        assert_eq!(
            pipe.export.fetch_records().await.unwrap(),
            [Weather {
                city: "Boston, MA".to_owned(),
                temperature: "55°".to_owned(),
                humidity: "N/A".to_owned(),
                pressure: "N/A".to_owned(),
            }]
        );
        assert_eq!(pipe.export_path(), dir.join("weather.json"));
    }
}
