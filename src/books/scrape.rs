use reqwest::Client as Request;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use sscr::{
    db::{DBResult, Table},
    extract::Rule,
    html::{FieldError, FieldExt, select_attr, select_text, selector},
    normalize::{map_rating, parse_count, parse_price},
    scrape::{Paging, fetch_html},
};
use tokio_postgres::{Row, types::ToSql};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub price: f64,
    pub rating: i16,
    pub category: String,
    pub availability: String,
    pub review_count: i64,
    /// Stars per pound, see [`value_score`].
    pub value_score: f64,
}

impl Table for Book {
    const NAME: &'static str = "books";
    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("title", "text not null"),
        ("price", "double precision not null"),
        ("rating", "smallint not null"),
        ("category", "text not null"),
        ("availability", "text not null"),
        ("review_count", "bigint not null"),
        ("value_score", "double precision not null"),
    ];

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![
            &self.title,
            &self.price,
            &self.rating,
            &self.category,
            &self.availability,
            &self.review_count,
            &self.value_score,
        ]
    }

    fn from_row(row: &Row) -> DBResult<Self> {
        Ok(Self {
            title: row.try_get(0)?,
            price: row.try_get(1)?,
            rating: row.try_get(2)?,
            category: row.try_get(3)?,
            availability: row.try_get(4)?,
            review_count: row.try_get(5)?,
            value_score: row.try_get(6)?,
        })
    }
}

/// `rating / price`; a free book scores 0.
pub fn value_score(rating: i16, price: f64) -> f64 {
    if price > 0.0 { f64::from(rating) / price } else { 0.0 }
}

/// What the listing tile knows; the rest is on the detail page.
#[derive(Debug)]
pub struct Tile {
    title: String,
    price: f64,
    rating: i16,
    href: String,
}

pub fn paging(base: &str) -> Paging {
    Paging::numbered(format!("{base}/index.html"), format!("{base}/catalogue/page-{{page}}.html"))
}

/// Tiles on the index link `catalogue/x/index.html`, tiles on catalogue pages
/// link `x/index.html`.
pub fn detail_url(base: &str, href: &str) -> String {
    if href.starts_with("catalogue/") {
        format!("{base}/{href}")
    } else {
        format!("{base}/catalogue/{href}")
    }
}

pub struct Books {
    client: Request,
    base: String,
    pod: Selector,
    link: Selector,
    price: Selector,
    rating: Selector,
    category: Selector,
    availability: Selector,
    reviews: Selector,
}

impl Books {
    pub fn new(client: Request, base: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client,
            base: base.to_owned(),
            pod: selector("article.product_pod")?,
            link: selector("h3 a")?,
            price: selector(".price_color")?,
            rating: selector("p.star-rating")?,
            category: selector(".breadcrumb li:nth-child(3) a")?,
            availability: selector(".availability")?,
            reviews: selector(".product_page > p:nth-last-child(2)")?,
        })
    }

    fn parse_detail(&self, markup: &str) -> Result<(String, String, i64), FieldError> {
        let doc = Html::parse_document(markup);
        let root = doc.root_element();
        let category = select_text(root, &self.category).field("category")?;
        let availability = select_text(root, &self.availability).field("availability")?;
        let review_count = match select_text(root, &self.reviews) {
            Some(text) => parse_count(text.split_whitespace().next().unwrap_or_default()).field("review_count")?,
            None => 0,
        };
        Ok((category, availability, review_count))
    }
}

impl Rule for Books {
    type Block = Tile;
    type Record = Book;

    fn container(&self) -> &Selector {
        &self.pod
    }

    fn parse(&mut self, pod: ElementRef<'_>) -> Result<Option<Tile>, FieldError> {
        let title = select_attr(pod, &self.link, "title").field("title")?.to_owned();
        let href = select_attr(pod, &self.link, "href").field("href")?.to_owned();
        let price = parse_price(&select_text(pod, &self.price).field("price")?).field("price")?;
        let rating = pod
            .select(&self.rating)
            .next()
            .and_then(|p| p.value().classes().find(|c| *c != "star-rating"))
            .map_or(0, |c| i16::from(map_rating(c)));

        Ok(Some(Tile { title, price, rating, href }))
    }

    async fn finish(&self, tile: Tile) -> Result<Book, FieldError> {
        let markup = fetch_html(&self.client, &detail_url(&self.base, &tile.href)).await?;
        let (category, availability, review_count) = self.parse_detail(&markup)?;

        Ok(Book {
            title: tile.title,
            price: tile.price,
            rating: tile.rating,
            category,
            availability,
            review_count,
            value_score: value_score(tile.rating, tile.price),
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, routing::get};
    use sscr::{
        extract::{Extractor, Limits},
        scrape::{HttpPages, basic},
    };

    use super::*;

    const INDEX: &str = r#"<html><body><ol>
<li><article class="product_pod">
  <p class="star-rating Three"></p>
  <h3><a href="catalogue/a-light-in-the-attic_1000/index.html" title="A Light in the Attic">A Light in the ...</a></h3>
  <div class="product_price"><p class="price_color">£51.77</p></div>
</article></li>
<li><article class="product_pod">
  <p class="star-rating One"></p>
  <h3><a href="catalogue/no-price_999/index.html" title="No Price">No Price</a></h3>
</article></li>
<li><article class="product_pod">
  <p class="star-rating Five"></p>
  <h3><a href="catalogue/gone_998/index.html" title="Gone">Gone</a></h3>
  <p class="price_color">£10.00</p>
</article></li>
</ol></body></html>"#;

    const PAGE_2: &str = r#"<html><body>
<article class="product_pod">
  <p class="star-rating Two"></p>
  <h3><a href="soumission_998/index.html" title="Soumission">Soumission</a></h3>
  <p class="price_color">£50.10</p>
</article>
</body></html>"#;

    fn detail(category: &str, reviews: &str) -> String {
        format!(
            r#"<html><body>
<ul class="breadcrumb"><li><a href="/">Home</a></li><li><a href="/books">Books</a></li><li><a href="/poetry">{category}</a></li><li class="active">x</li></ul>
<article class="product_page">
  <p class="instock availability">
    In stock (22 available)
  </p>
  <p>{reviews}</p>
  <p>last</p>
</article>
</body></html>"#
        )
    }

    #[test]
    fn detail_links_on_both_kinds_of_page() {
        let base = "http://books.toscrape.com";
        assert_eq!(
            detail_url(base, "catalogue/a-light-in-the-attic_1000/index.html"),
            "http://books.toscrape.com/catalogue/a-light-in-the-attic_1000/index.html"
        );
        assert_eq!(
            detail_url(base, "soumission_998/index.html"),
            "http://books.toscrape.com/catalogue/soumission_998/index.html"
        );
    }

    #[test]
    fn value_score_and_row_shape() {
        assert_eq!(value_score(4, 8.0), 0.5);
        assert_eq!(value_score(5, 0.0), 0.0);
        assert_eq!(
            sscr::db::insert_sql::<Book>(),
            "insert into books (title, price, rating, category, availability, review_count, value_score) values ($1, $2, $3, $4, $5, $6, $7)"
        );
    }

    #[tokio::test]
    async fn books_across_pages_with_detail_fetch() {
        let app = Router::new()
            .route("/index.html", get(|| async { axum::response::Html(INDEX) }))
            .route("/catalogue/page-2.html", get(|| async { axum::response::Html(PAGE_2) }))
            .route("/catalogue/page-3.html", get(|| async { axum::response::Html("<html></html>") }))
            .route(
                "/catalogue/a-light-in-the-attic_1000/index.html",
                get(|| async { axum::response::Html(detail("Poetry", "0 reviews")) }),
            )
            .route(
                "/catalogue/soumission_998/index.html",
                get(|| async { axum::response::Html(detail("Fiction", "3 reviews")) }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let base = format!("http://{addr}");
        let client = basic().unwrap();
        let rule = Books::new(client.clone(), &base).unwrap();
        let books = Extractor::new("books", HttpPages::new(client, paging(&base)), rule, Limits::UNBOUNDED)
            .run()
            .await;

        assert_eq!(
            books,
            [
                Book {
                    title: "A Light in the Attic".to_owned(),
                    price: 51.77,
                    rating: 3,
                    category: "Poetry".to_owned(),
                    availability: "In stock (22 available)".to_owned(),
                    review_count: 0,
                    value_score: 3.0 / 51.77,
                },
                Book {
                    title: "Soumission".to_owned(),
                    price: 50.1,
                    rating: 2,
                    category: "Fiction".to_owned(),
                    availability: "In stock (22 available)".to_owned(),
                    review_count: 3,
                    value_score: 2.0 / 50.1,
                },
            ]
        );
    }
}
