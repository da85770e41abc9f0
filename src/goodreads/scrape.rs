use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use sscr::{
    extract::Rule,
    html::{FieldError, FieldExt, select_text, selector},
    normalize::Malformed,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: String,
    pub rating: f64,
}

pub struct Books {
    row: Selector,
    title: Selector,
    author: Selector,
    rating: Selector,
}

impl Books {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            row: selector(r#"tr[itemtype="http://schema.org/Book"]"#)?,
            title: selector("a.bookTitle")?,
            author: selector("a.authorName")?,
            rating: selector("span.minirating")?,
        })
    }
}

impl Rule for Books {
    type Block = Book;
    type Record = Book;

    fn container(&self) -> &Selector {
        &self.row
    }

    fn parse(&mut self, row: ElementRef<'_>) -> Result<Option<Book>, FieldError> {
        let title = select_text(row, &self.title).field("title")?;
        let author = select_text(row, &self.author).field("author")?;

        // "4.28 avg rating — 9,411,452 ratings"
        let line = select_text(row, &self.rating).field("rating")?;
        let first = line.split_whitespace().next().unwrap_or_default();
        let rating = first.parse().map_err(|_| Malformed(line.as_str().into())).field("rating")?;

        Ok(Some(Book { title, author, rating }))
    }

    async fn finish(&self, book: Book) -> Result<Book, FieldError> {
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    fn row(title: &str, author: &str, rating: &str) -> String {
        format!(
            r#"<tr itemscope itemtype="http://schema.org/Book">
<td class="number">1</td>
<td><a class="bookTitle" itemprop="url" href="/book/show/2767052"><span itemprop="name" role="heading">{title}</span></a>
<br><span class="by">by</span> <span itemprop="author"><div class="authorName__container"><a class="authorName" href="/author/show/153394"><span itemprop="name">{author}</span></a></div></span>
<br><div><span class="greyText smallText uitext"><span class="minirating"><span class="stars staticStars"></span> {rating}</span></span></div></td></tr>"#
        )
    }

    #[test]
    fn list_rows() {
        let doc = Html::parse_document(&format!(
            "<table class=\"tableList\"><tbody>{}{}{}</tbody></table>",
            row("The Hunger Games (The Hunger Games, #1)", "Suzanne Collins", "4.34 avg rating — 9,411,452 ratings"),
            row("Pride and Prejudice", "Jane Austen", "avg rating unavailable"),
            r#"<tr itemtype="http://schema.org/Book"><td><a class="bookTitle">Anonymous</a></td></tr>"#,
        ));
        let mut rule = Books::new().unwrap();
        let parsed = doc.select(&rule.row.clone()).map(|r| rule.parse(r)).collect::<Vec<_>>();

        assert_eq!(parsed.len(), 3);
        assert_eq!(
            parsed[0].as_ref().unwrap().as_ref().unwrap(),
            &Book {
                title: "The Hunger Games (The Hunger Games, #1)".to_owned(),
                author: "Suzanne Collins".to_owned(),
                rating: 4.34,
            }
        );
        assert!(matches!(parsed[1], Err(FieldError::Invalid { field: "rating", .. })));
        assert!(matches!(parsed[2], Err(FieldError::Missing("author"))));
    }
}
