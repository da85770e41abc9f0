use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use sscr::{
    extract::Rule,
    html::{FieldError, FieldExt, select_text, selector, text},
    scrape::Paging,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub quote_text: String,
    pub author: String,
    #[serde(with = "tag_list")]
    pub tags: Vec<String>,
}

/// Tags share one CSV cell, separated by `;`. A `;` or `\` inside a tag is
/// escaped with `\`.
mod tag_list {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(tags: &[String], s: S) -> Result<S::Ok, S::Error> {
        let cell = tags
            .iter()
            .map(|t| t.replace('\\', "\\\\").replace(';', "\\;"))
            .collect::<Vec<_>>()
            .join(";");
        s.serialize_str(&cell)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let cell = String::deserialize(d)?;
        let mut tags = Vec::new();
        let mut tag = String::new();
        let mut chars = cell.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => tag.extend(chars.next()),
                ';' => tags.push(core::mem::take(&mut tag)),
                c => tag.push(c),
            }
        }
        tags.push(tag);
        tags.retain(|t| !t.is_empty());
        Ok(tags)
    }
}

pub fn paging(base: &str) -> Paging {
    Paging::numbered(base, format!("{base}/page/{{page}}/"))
}

pub struct Quotes {
    quote: Selector,
    text: Selector,
    author: Selector,
    tag: Selector,
}

impl Quotes {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            quote: selector("div.quote")?,
            text: selector("span.text")?,
            author: selector("small.author")?,
            tag: selector("a.tag")?,
        })
    }
}

impl Rule for Quotes {
    type Block = Quote;
    type Record = Quote;

    fn container(&self) -> &Selector {
        &self.quote
    }

    fn parse(&mut self, quote: ElementRef<'_>) -> Result<Option<Quote>, FieldError> {
        Ok(Some(Quote {
            quote_text: select_text(quote, &self.text).field("text")?,
            author: select_text(quote, &self.author).field("author")?,
            tags: quote.select(&self.tag).map(text).collect(),
        }))
    }

    async fn finish(&self, quote: Quote) -> Result<Quote, FieldError> {
        Ok(quote)
    }
}
