use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use sscr::{
    extract::Rule,
    html::{FieldError, FieldExt, select_text, selector},
    normalize::{Malformed, parse_price},
    scrape::Paging,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: f64,
    pub rating: f64,
}

/// The base already carries a query string.
pub fn paging(base: &str) -> Paging {
    Paging::numbered(base, format!("{base}&page={{page}}"))
}

pub struct Products {
    tile: Selector,
    name: Selector,
    price: Selector,
    rating: Selector,
}

impl Products {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            tile: selector("div._1AtVbE")?,
            name: selector("div._4rR01T")?,
            price: selector("div._30jeq3")?,
            rating: selector("div._3LWZlK")?,
        })
    }
}

impl Rule for Products {
    type Block = Product;
    type Record = Product;

    fn container(&self) -> &Selector {
        &self.tile
    }

    /// Layout rows share the tile class; only tiles with a name are products.
    fn parse(&mut self, tile: ElementRef<'_>) -> Result<Option<Product>, FieldError> {
        let Some(name) = select_text(tile, &self.name) else {
            return Ok(None);
        };
        let price = match select_text(tile, &self.price) {
            Some(s) => parse_price(&s).field("price")?,
            None => 0.0,
        };
        let rating = match select_text(tile, &self.rating) {
            Some(s) => s.parse::<f64>().map_err(|_| Malformed(s.as_str().into())).field("rating")?,
            None => 0.0,
        };
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

    #[test]
    fn tiles_without_a_name_are_not_products() {
        let doc = Html::parse_document(
            r#"<div class="_1AtVbE"><div class="_4rR01T">POCO C51 (Royal Blue, 64 GB)</div><div class="_30jeq3">₹5,999</div><div class="_3LWZlK">4.2</div></div>
<div class="_1AtVbE"><span>Sponsored</span></div>
<div class="_1AtVbE"><div class="_4rR01T">Coming soon</div></div>
<div class="_1AtVbE"><div class="_4rR01T">Broken</div><div class="_3LWZlK">New</div></div>"#,
        );
        let mut rule = Products::new().unwrap();
        let parsed = doc.select(&rule.tile.clone()).map(|t| rule.parse(t)).collect::<Vec<_>>();

        assert_eq!(
            parsed[0].as_ref().unwrap().as_ref().unwrap(),
            &Product { name: "POCO C51 (Royal Blue, 64 GB)".to_owned(), price: 5999.0, rating: 4.2 }
        );
        assert!(matches!(parsed[1], Ok(None)));
        assert_eq!(
            parsed[2].as_ref().unwrap().as_ref().unwrap(),
            &Product { name: "Coming soon".to_owned(), price: 0.0, rating: 0.0 }
        );
        assert!(matches!(parsed[3], Err(FieldError::Invalid { field: "rating", .. })));
    }
}
