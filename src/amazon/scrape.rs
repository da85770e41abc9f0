use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use sscr::{
    extract::Rule,
    html::{FieldError, FieldExt, select_text, selector},
    normalize::{Malformed, parse_price},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: f64,
    pub rating: f64,
}

pub struct Products {
    item: Selector,
    name: Selector,
    whole: Selector,
    fraction: Selector,
    rating: Selector,
}

impl Products {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            item: selector("div.s-result-item")?,
            name: selector("h2 a span")?,
            whole: selector("span.a-price-whole")?,
            fraction: selector("span.a-price-fraction")?,
            rating: selector("span.a-icon-alt")?,
        })
    }
}

/// `"1,299."` and `"99"` -> `1299.99`; blank parts mean no price shown.
fn price(whole: &str, fraction: &str) -> Result<f64, Malformed> {
    let whole = whole.trim_end_matches('.');
    if whole.is_empty() || fraction.is_empty() {
        return Ok(0.0);
    }
    parse_price(&format!("{whole}.{fraction}"))
}

/// `"4.5 out of 5 stars"` -> `4.5`.
fn stars(alt: &str) -> Result<f64, Malformed> {
    match alt.split_whitespace().next() {
        None => Ok(0.0),
        Some(first) => first.parse().map_err(|_| Malformed(alt.into())),
    }
}

impl Rule for Products {
    type Block = Product;
    type Record = Product;

    fn container(&self) -> &Selector {
        &self.item
    }

    /// Result slots without a product title (banners, spacers) are not products.
    fn parse(&mut self, item: ElementRef<'_>) -> Result<Option<Product>, FieldError> {
        let Some(name) = select_text(item, &self.name).filter(|n| !n.is_empty()) else {
            return Ok(None);
        };
        let whole = select_text(item, &self.whole).field("price")?;
        let fraction = select_text(item, &self.fraction).field("price")?;
        let price = price(&whole, &fraction).field("price")?;
        let rating = stars(&select_text(item, &self.rating).field("rating")?).field("rating")?;

        Ok(Some(Product { name, price, rating }))
    }

    async fn finish(&self, product: Product) -> Result<Product, FieldError> {
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    fn item(name: &str, whole: &str, fraction: &str, stars: Option<&str>) -> String {
        let stars = stars.map_or_else(String::new, |s| format!(r#"<i class="a-icon a-icon-star-small"><span class="a-icon-alt">{s}</span></i>"#));
        format!(
            r#"<div data-component-type="s-search-result" class="s-result-item s-asin">
<h2 class="a-size-mini"><a class="a-link-normal" href="/dp/B0"><span class="a-size-medium a-text-normal">{name}</span></a></h2>
<div>{stars}</div>
<span class="a-price"><span class="a-offscreen">$0</span><span aria-hidden="true"><span class="a-price-whole">{whole}<span class="a-price-decimal">.</span></span><span class="a-price-fraction">{fraction}</span></span></span>
</div>"#
        )
    }

    #[test]
    fn result_items() {
        let doc = Html::parse_document(&format!(
            r#"<div class="s-main-slot">{}<div class="s-result-item s-widget"><span>Sponsored</span></div>{}{}</div>"#,
            item("Apple iPhone 15 (128 GB) - Black", "1,299", "99", Some("4.5 out of 5 stars")),
            item("Unrated phone", "89", "00", None),
            item("Odd phone", "1 299", "00", Some("4.0 out of 5 stars")),
        ));
        let mut rule = Products::new().unwrap();
        let parsed = doc.select(&rule.item.clone()).map(|i| rule.parse(i)).collect::<Vec<_>>();

        assert_eq!(parsed.len(), 4);
        assert_eq!(
            parsed[0].as_ref().unwrap().as_ref().unwrap(),
            &Product { name: "Apple iPhone 15 (128 GB) - Black".to_owned(), price: 1299.99, rating: 4.5 }
        );
        assert!(matches!(parsed[1], Ok(None)));
        assert!(matches!(parsed[2], Err(FieldError::Missing("rating"))));
        assert!(matches!(parsed[3], Err(FieldError::Invalid { field: "price", .. })));
    }

    #[test]
    fn blank_parts() {
        assert_eq!(price("", "99"), Ok(0.0));
        assert_eq!(price("12.", "50"), Ok(12.5));
        assert_eq!(stars(""), Ok(0.0));
    }
}
