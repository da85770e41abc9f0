use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use sscr::{
    extract::Rule,
    html::{FieldError, FieldExt, select_text, selector},
    normalize::Malformed,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub title: String,
    pub year: i32,
    pub rating: f64,
}

impl Movie {
    pub const fn decade(&self) -> i32 {
        self.year.div_euclid(10) * 10
    }
}

pub struct Movies {
    item: Selector,
    heading: Selector,
    year: Selector,
    rating: Selector,
    /// `"1. The Shawshank Redemption"`
    ranked: Regex,
}

impl Movies {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            item: selector("li.ipc-metadata-list-summary-item")?,
            heading: selector("h3")?,
            year: selector(".sc-b189961a-8")?,
            rating: selector(".ipc-rating-star--imdb")?,
            ranked: Regex::new(r"^\d+\.\s+(.+)$")?,
        })
    }
}

impl Rule for Movies {
    type Block = Movie;
    type Record = Movie;

    fn container(&self) -> &Selector {
        &self.item
    }

    fn parse(&mut self, item: ElementRef<'_>) -> Result<Option<Movie>, FieldError> {
        let heading = select_text(item, &self.heading).field("title")?;
        let title = self
            .ranked
            .captures(&heading)
            .and_then(|c| c.get(1))
            .field("title")?
            .as_str()
            .to_owned();

        let year = select_text(item, &self.year).field("year")?;
        let year = year.parse().map_err(|_| Malformed(year.as_str().into())).field("year")?;

        let rating = select_text(item, &self.rating).field("rating")?;
        let score = rating.split('\u{a0}').next().unwrap_or_default().trim();
        let rating = score.parse().map_err(|_| Malformed(rating.as_str().into())).field("rating")?;

        Ok(Some(Movie { title, year, rating }))
    }

    async fn finish(&self, movie: Movie) -> Result<Movie, FieldError> {
        Ok(movie)
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    fn item(heading: &str, year: &str, rating: &str) -> String {
        format!(
            r#"<li class="ipc-metadata-list-summary-item"><h3 class="ipc-title__text">{heading}</h3>
<div><span class="sc-b189961a-8 kLaxqf">{year}</span><span class="sc-b189961a-8 kLaxqf">2h 22m</span></div>
<span class="ipc-rating-star ipc-rating-star--imdb">{rating}</span></li>"#
        )
    }

    #[test]
    fn rank_is_stripped_and_votes_dropped() {
        let doc = Html::parse_document(&format!(
            "<ul>{}{}{}</ul>",
            item("1. The Shawshank Redemption", "1994", "9.3\u{a0}(3M)"),
            item("12. Dr. Strangelove or: How I Learned to Stop Worrying", "1964", "8.4\u{a0}(530K)"),
            item("No rank", "2001", "8.0"),
        ));
        let mut rule = Movies::new().unwrap();
        let parsed = doc.select(&rule.item.clone()).map(|i| rule.parse(i)).collect::<Vec<_>>();

        assert_eq!(
            parsed[0].as_ref().unwrap().as_ref().unwrap(),
            &Movie { title: "The Shawshank Redemption".to_owned(), year: 1994, rating: 9.3 }
        );
        let second = parsed[1].as_ref().unwrap().as_ref().unwrap();
        assert_eq!(second.title, "Dr. Strangelove or: How I Learned to Stop Worrying");
        assert_eq!(second.decade(), 1960);
        assert!(matches!(parsed[2], Err(FieldError::Missing("title"))));
    }

    #[test]
    fn bad_year_skips_the_movie() {
        let doc = Html::parse_document(&item("3. Heat", "TV Movie", "8.3"));
        let mut rule = Movies::new().unwrap();
        let el = doc.select(&rule.item.clone()).next().unwrap();
        assert!(matches!(rule.parse(el), Err(FieldError::Invalid { field: "year", .. })));
    }
}
