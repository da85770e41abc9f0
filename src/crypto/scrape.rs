use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use sscr::{
    db::{DBResult, Table},
    extract::Rule,
    html::{FieldError, FieldExt, select_text, selector, text},
    normalize::{parse_count, parse_percent, parse_price},
};
use tokio_postgres::{Row, types::ToSql};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crypto {
    pub name: String,
    pub price: f64,
    pub change_24h: f64,
    pub change_7d: f64,
    pub market_cap: i64,
}

impl Table for Crypto {
    const NAME: &'static str = "cryptocurrencies";
    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("name", "text not null"),
        ("price", "double precision not null"),
        ("change_24h", "double precision not null"),
        ("change_7d", "double precision not null"),
        ("market_cap", "bigint not null"),
    ];

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![&self.name, &self.price, &self.change_24h, &self.change_7d, &self.market_cap]
    }

    fn from_row(row: &Row) -> DBResult<Self> {
        Ok(Self {
            name: row.try_get(0)?,
            price: row.try_get(1)?,
            change_24h: row.try_get(2)?,
            change_7d: row.try_get(3)?,
            market_cap: row.try_get(4)?,
        })
    }
}

pub struct Cryptos {
    row: Selector,
    name: Selector,
    price: Selector,
    change: Selector,
    market_cap: Selector,
}

impl Cryptos {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            row: selector("table.cmc-table tbody tr")?,
            name: selector("p.sc-71024e3e-0.ehyYKa")?,
            price: selector("div.sc-b3fc6b7-0.dzgUIj")?,
            change: selector("span.sc-a59753b0-0")?,
            market_cap: selector("span.sc-11478c5b-1")?,
        })
    }
}

impl Rule for Cryptos {
    type Block = Crypto;
    type Record = Crypto;

    fn container(&self) -> &Selector {
        &self.row
    }

    fn parse(&mut self, row: ElementRef<'_>) -> Result<Option<Crypto>, FieldError> {
        let name = select_text(row, &self.name).field("name")?;
        let price = parse_price(&select_text(row, &self.price).field("price")?).field("price")?;

        let mut changes = row.select(&self.change).map(text);
        let change_24h = parse_percent(&changes.next().field("change_24h")?).field("change_24h")?;
        let change_7d = parse_percent(&changes.next().field("change_7d")?).field("change_7d")?;

        let cap = select_text(row, &self.market_cap).field("market_cap")?;
        let market_cap = parse_count(cap.trim_start_matches('$')).field("market_cap")?;

        Ok(Some(Crypto {
            name,
            price,
            change_24h,
            change_7d,
            market_cap,
        }))
    }

    async fn finish(&self, crypto: Crypto) -> Result<Crypto, FieldError> {
        Ok(crypto)
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    fn row(name: &str, price: &str, d1: &str, d7: &str, cap: &str) -> String {
        format!(
            r#"<tr><td><p class="sc-71024e3e-0 ehyYKa">{name}</p></td>
<td><div class="sc-b3fc6b7-0 dzgUIj"><span>{price}</span></div></td>
<td><span class="sc-a59753b0-0 ivvJzO"><span class="icon-Caret-up"></span>{d1}</span></td>
<td><span class="sc-a59753b0-0 cmnujh"><span class="icon-Caret-down"></span>{d7}</span></td>
<td><p><span class="sc-11478c5b-0">$1.3T</span><span class="sc-11478c5b-1" data-nosnippet="true">{cap}</span></p></td></tr>"#
        )
    }

    #[test]
    fn table_rows() {
        let doc = Html::parse_document(&format!(
            r#"<table class="cmc-table"><thead><tr><th>Name</th></tr></thead><tbody>{}{}</tbody></table>"#,
            row("Bitcoin", "$67,012.45", "1.25%", "-3.10%", "$1,321,456,789,012"),
            row("Ethereum", "$3,456.78", "0.5%", "n/a", "$415,000,000,000"),
        ));
        let mut rule = Cryptos::new().unwrap();
        let parsed = doc.select(&rule.row.clone()).map(|r| rule.parse(r)).collect::<Vec<_>>();

        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed[0].as_ref().unwrap().as_ref().unwrap(),
            &Crypto {
                name: "Bitcoin".to_owned(),
                price: 67012.45,
                change_24h: 1.25,
                change_7d: -3.1,
                market_cap: 1_321_456_789_012,
            }
        );
        assert!(matches!(parsed[1], Err(FieldError::Invalid { field: "change_7d", .. })));
        assert_eq!(Crypto::COLUMNS.len(), parsed[0].as_ref().unwrap().as_ref().unwrap().params().len());
    }
}
