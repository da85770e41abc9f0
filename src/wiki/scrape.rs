use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use sscr::{
    extract::Rule,
    html::{FieldError, select_text, selector, text},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub paragraph: String,
}

/// Walks the article body top to bottom: headings move the current section,
/// non-empty paragraphs become records. The infobox and image links are
/// page-level and collected once per page.
pub struct Article {
    base: Url,
    body: Selector,
    headline: Selector,
    inner_heading: Selector,
    infobox: Selector,
    row: Selector,
    th: Selector,
    td: Selector,
    img: Selector,
    heading: String,
    pub info: Vec<(String, String)>,
    pub images: Vec<String>,
}

impl Article {
    pub fn new(base: Url) -> anyhow::Result<Self> {
        Ok(Self {
            base,
            body: selector("#mw-content-text .mw-parser-output > *")?,
            headline: selector(".mw-headline")?,
            inner_heading: selector("h2, h3")?,
            infobox: selector(".infobox")?,
            row: selector("tr")?,
            th: selector("th")?,
            td: selector("td")?,
            img: selector(".mw-parser-output img")?,
            heading: "Introduction".to_owned(),
            info: Vec::new(),
            images: Vec::new(),
        })
    }

    fn set_heading(&mut self, el: ElementRef<'_>) {
        let heading = select_text(el, &self.headline).unwrap_or_else(|| text(el));
        if !heading.is_empty() {
            self.heading = heading;
        }
    }
}

impl Rule for Article {
    type Block = Section;
    type Record = Section;

    fn container(&self) -> &Selector {
        &self.body
    }

    fn observe(&mut self, page: &Html) {
        if let Some(table) = page.select(&self.infobox).next() {
            for row in table.select(&self.row) {
                let (Some(key), Some(value)) = (select_text(row, &self.th), select_text(row, &self.td)) else {
                    continue;
                };
                match self.info.iter_mut().find(|(k, _)| *k == key) {
                    Some(entry) => entry.1 = value,
                    None => self.info.push((key, value)),
                }
            }
        }

        for img in page.select(&self.img) {
            let Some(src) = img.value().attr("src").filter(|s| !s.is_empty()) else {
                continue;
            };
            let Ok(url) = self.base.join(src) else {
                continue;
            };
            let url = String::from(url);
            if !self.images.contains(&url) {
                self.images.push(url);
            }
        }
    }

    fn parse(&mut self, el: ElementRef<'_>) -> Result<Option<Section>, FieldError> {
        match el.value().name() {
            "h2" | "h3" => self.set_heading(el),
            "div" if el.value().classes().any(|c| c == "mw-heading") => {
                if let Some(h) = el.select(&self.inner_heading).next() {
                    self.set_heading(h);
                }
            }
            "p" => {
                let paragraph = text(el);
                if !paragraph.is_empty() {
                    return Ok(Some(Section {
                        heading: self.heading.clone(),
                        paragraph,
                    }));
                }
            }
            _ => {}
        }
        Ok(None)
    }

    async fn finish(&self, section: Section) -> Result<Section, FieldError> {
        Ok(section)
    }
}

/// Sections, then the infobox, then image links, as three tables in one file.
pub fn articles_csv(sections: &[Section], info: &[(String, String)], images: &[String]) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());

    wtr.write_record(["heading", "paragraph"])?;
    for s in sections {
        wtr.write_record([&s.heading, &s.paragraph])?;
    }

    wtr.write_record(["Infobox Data"])?;
    wtr.write_record(["Key", "Value"])?;
    for (key, value) in info {
        wtr.write_record([key, value])?;
    }

    wtr.write_record(["Image Links"])?;
    wtr.write_record(["Image URL"])?;
    for url in images {
        wtr.write_record([url])?;
    }

    wtr.into_inner().map_err(|e| e.into_error().into())
}

#[cfg(test)]
mod tests {
    use sscr::{
        extract::{Extractor, Limits},
        scrape::{FetchError, Transport},
    };

    use super::*;

    const PAGE: &str = r#"<html><body><div id="mw-content-text"><div class="mw-parser-output">
<table class="infobox"><tbody>
  <tr><th colspan="2">Python</th></tr>
  <tr><th>Paradigm</th><td>Multi-paradigm</td></tr>
  <tr><th>Designed by</th><td>Guido van Rossum</td></tr>
  <tr><th>Paradigm</th><td>Object-oriented</td></tr>
</tbody></table>
<p>Python is a high-level language.</p>
<p>   </p>
<img src="//upload.wikimedia.org/logo.png">
<h2><span class="mw-headline">History</span></h2>
<p>Python was conceived in the late 1980s.</p>
<div class="mw-heading mw-heading3"><h3 id="Syntax">Syntax</h3></div>
<p>Python uses whitespace indentation.</p>
<img src="/static/images/icon.png">
<img src="//upload.wikimedia.org/logo.png">
</div></div></body></html>"#;

    struct OnePage;

    impl Transport for OnePage {
        async fn fetch(&mut self, page: u32) -> Result<Option<String>, FetchError> {
            Ok((page == 1).then(|| PAGE.to_owned()))
        }

        fn describe(&self, page: u32) -> String {
            format!("article page {page}")
        }
    }

    #[tokio::test]
    async fn sections_infobox_and_images() {
        let base = Url::parse("https://en.wikipedia.org/wiki/Python_(programming_language)").unwrap();
        let (sections, article) = Extractor::new("wiki", OnePage, Article::new(base).unwrap(), Limits::UNBOUNDED)
            .run_with_rule()
            .await;

        let pairs = sections
            .iter()
            .map(|s| (s.heading.as_str(), s.paragraph.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            pairs,
            [
                ("Introduction", "Python is a high-level language."),
                ("History", "Python was conceived in the late 1980s."),
                ("Syntax", "Python uses whitespace indentation."),
            ]
        );
        assert_eq!(
            article.info,
            [
                ("Paradigm".to_owned(), "Object-oriented".to_owned()),
                ("Designed by".to_owned(), "Guido van Rossum".to_owned()),
            ]
        );
        assert_eq!(
            article.images,
            [
                "https://upload.wikimedia.org/logo.png",
                "https://en.wikipedia.org/static/images/icon.png",
            ]
        );

        let csv = String::from_utf8(articles_csv(&sections, &article.info, &article.images).unwrap()).unwrap();
        assert!(csv.starts_with("heading,paragraph\nIntroduction,Python is a high-level language.\n"));
        assert!(csv.contains("Infobox Data\nKey,Value\nParadigm,Object-oriented\n"));
        assert!(csv.ends_with("Image Links\nImage URL\nhttps://upload.wikimedia.org/logo.png\nhttps://en.wikipedia.org/static/images/icon.png\n"));
    }
}
