mod scrape;

use std::path::PathBuf;

use anyhow::Context;
use minijinja::context;
use reqwest::Client as Request;
use scrape::{Movie, Movies};
use sscr::{
    cli::Args,
    extract::{Extractor, Limits},
    report::{self, Chart, Filter, averages},
    scrape::{HttpPages, Paging, basic},
    server::{Pipeline, launch},
    store::{self, CsvStore},
    util::Output,
};

const BASE_URL: &str = "https://www.imdb.com/chart/top/";
const TEMPLATE: &str = include_str!("../../templates/movies.html");

struct Pipe {
    client: Request,
    base: String,
    limits: Limits,
    out: Output,
    store: CsvStore<Movie>,
}

fn by_decade(movies: &[&Movie]) -> Chart {
    Chart::new(
        "Average Rating of Top Movies by Decade",
        "Average Rating",
        averages(movies.iter().map(|m| (m.decade(), m.rating)))
            .into_iter()
            .map(|(decade, avg)| (decade.to_string(), avg)),
    )
}

fn decades(movies: &[Movie]) -> Vec<String> {
    let mut v = movies.iter().map(Movie::decade).collect::<Vec<_>>();
    v.sort_unstable();
    v.dedup();
    v.into_iter().map(|d| d.to_string()).collect()
}

impl Pipeline for Pipe {
    const FILTER: Option<&'static str> = Some("decade");

    async fn report(&self, filter: Option<String>) -> anyhow::Result<String> {
        let decade = filter
            .as_deref()
            .map(str::parse::<i32>)
            .transpose()
            .with_context(|| format!("invalid decade {filter:?}"))?;

        let pages = HttpPages::new(self.client.clone(), Paging::Single(self.base.clone()));
        let movies = Extractor::new("movies", pages, Movies::new()?, self.limits).run().await;
        let movies = store::replace(&self.store, &movies).await?;

        let shown = movies
            .iter()
            .filter(|m| decade.is_none_or(|d| m.decade() == d))
            .collect::<Vec<_>>();

        let chart = if shown.is_empty() {
            None
        } else {
            Some(by_decade(&shown).publish(&self.out, "ratings_by_decade").await?)
        };

        let page = report::render("movies.html", TEMPLATE, context! {
            title => "Top Movies Report",
            count => shown.len(),
            chart,
            filter => Filter { name: "decade", label: "Decade", options: decades(&movies), selected: filter },
            movies => shown,
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
        limits: common.limits(Limits::records(100)),
        store: CsvStore::new(out.file("movies.csv")),
        out,
    };

    launch(pipe, &common).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(year: i32, rating: f64) -> Movie {
        Movie { title: "m".to_owned(), year, rating }
    }

    #[test]
    fn decades_sorted_and_averaged() {
        let movies = [movie(1994, 9.3), movie(1972, 9.2), movie(1999, 8.7), movie(1974, 9.0)];
        assert_eq!(decades(&movies), ["1970", "1990"]);

        let chart = by_decade(&movies.iter().collect::<Vec<_>>());
        assert_eq!(chart.bars[0].label, "1970");
        assert!((chart.bars[0].value - 9.1).abs() < 1e-9);
        assert!((chart.bars[1].value - 9.0).abs() < 1e-9);
    }
}
