use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use sscr::{
    extract::Rule,
    html::{FieldError, FieldExt, select_text, selector},
    scrape::Paging,
};

pub const NA: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    pub name: String,
    /// As shown on the listing, currency and all.
    pub price: String,
    pub location: String,
}

pub fn paging(base: &str) -> Paging {
    Paging::numbered(base, format!("{base}?page={{page}}"))
}

pub struct Phones {
    card: Selector,
    name: Selector,
    price: Selector,
    location: Selector,
}

impl Phones {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            card: selector("div.css-1sw7q4x")?,
            name: selector("h6")?,
            price: selector(r#"p[data-testid="ad-price"]"#)?,
            location: selector(r#"p[data-testid="location-date"]"#)?,
        })
    }
}

impl Rule for Phones {
    type Block = Phone;
    type Record = Phone;

    fn container(&self) -> &Selector {
        &self.card
    }

    fn parse(&mut self, card: ElementRef<'_>) -> Result<Option<Phone>, FieldError> {
        let name = select_text(card, &self.name).field("name")?;
        let price = select_text(card, &self.price).unwrap_or_else(|| NA.to_owned());
        let location = select_text(card, &self.location).map_or_else(
            || NA.to_owned(),
            |s| s.split(" - ").next().unwrap_or_default().trim().to_owned(),
        );
        Ok(Some(Phone { name, price, location }))
    }

    async fn finish(&self, phone: Phone) -> Result<Phone, FieldError> {
        Ok(phone)
    }
}
