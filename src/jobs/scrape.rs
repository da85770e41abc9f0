use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use sscr::{
    db::{DBResult, Table},
    extract::Rule,
    html::{FieldError, FieldExt, select_text, selector},
};
use tokio_postgres::{Row, types::ToSql};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub post_date: String,
    pub description: String,
}

impl Table for Job {
    const NAME: &'static str = "jobs";
    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("job_title", "text not null"),
        ("company", "text not null"),
        ("location", "text not null"),
        ("post_date", "text not null"),
        ("description", "text not null"),
    ];

    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![&self.job_title, &self.company, &self.location, &self.post_date, &self.description]
    }

    fn from_row(row: &Row) -> DBResult<Self> {
        Ok(Self {
            job_title: row.try_get(0)?,
            company: row.try_get(1)?,
            location: row.try_get(2)?,
            post_date: row.try_get(3)?,
            description: row.try_get(4)?,
        })
    }
}

pub struct Jobs {
    card: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    date: Selector,
    snippet: Selector,
}

impl Jobs {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            card: selector("div.job-search-card")?,
            title: selector("h3.base-search-card__title")?,
            company: selector("h4.base-search-card__subtitle")?,
            location: selector("span.job-search-card__location")?,
            date: selector("time.job-search-card__listdate")?,
            snippet: selector("div.job-search-card__snippet")?,
        })
    }
}

impl Rule for Jobs {
    type Block = Job;
    type Record = Job;

    fn container(&self) -> &Selector {
        &self.card
    }

    fn parse(&mut self, card: ElementRef<'_>) -> Result<Option<Job>, FieldError> {
        Ok(Some(Job {
            job_title: select_text(card, &self.title).field("job_title")?,
            company: select_text(card, &self.company).field("company")?,
            location: select_text(card, &self.location).field("location")?,
            post_date: select_text(card, &self.date).field("post_date")?,
            description: select_text(card, &self.snippet).unwrap_or_else(|| "No description".to_owned()),
        }))
    }

    async fn finish(&self, job: Job) -> Result<Job, FieldError> {
        Ok(job)
    }

    /// Every scroll returns the whole list again.
    fn is_duplicate(&self, seen: &[Job], job: &Job) -> bool {
        seen.contains(job)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use sscr::{
        extract::{Extractor, Limits},
        scrape::{FetchError, Transport},
    };

    use super::*;

    fn card(title: &str, company: &str, snippet: Option<&str>) -> String {
        let snippet = snippet.map_or_else(String::new, |s| format!(r#"<div class="job-search-card__snippet">{s}</div>"#));
        format!(
            r#"<div class="base-card job-search-card"><h3 class="base-search-card__title">{title}</h3>
<h4 class="base-search-card__subtitle"><a>{company}</a></h4>
<span class="job-search-card__location">Berlin, Germany</span>
<time class="job-search-card__listdate" datetime="2024-06-01">1 week ago</time>{snippet}</div>"#
        )
    }

    /// Mimics an infinite list: every scroll returns everything loaded so far.
    struct Feed {
        loads: Vec<Vec<String>>,
        calls: Arc<Mutex<u32>>,
    }

    impl Transport for Feed {
        async fn fetch(&mut self, page: u32) -> Result<Option<String>, FetchError> {
            *self.calls.lock().unwrap() += 1;
            let Some(upto) = self.loads.get(page as usize - 1) else {
                return Ok(None);
            };
            Ok(Some(format!("<ul>{}</ul>", upto.concat())))
        }

        fn describe(&self, page: u32) -> String {
            format!("feed scroll {page}")
        }
    }

    #[tokio::test]
    async fn rescrolled_cards_are_not_repeated() {
        let a = card("Python Developer", "Acme", Some("Build APIs"));
        let b = card("Backend Engineer", "Initech", None);
        let c = card("Data Engineer", "Acme", None);
        let calls = Arc::new(Mutex::new(0));
        let feed = Feed {
            loads: vec![vec![a.clone(), b.clone()], vec![a.clone(), b.clone(), c.clone()]],
            calls: Arc::clone(&calls),
        };

        let jobs = Extractor::new("jobs", feed, Jobs::new().unwrap(), Limits::records(20)).run().await;

        let titles = jobs.iter().map(|j| j.job_title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, ["Python Developer", "Backend Engineer", "Data Engineer"]);
        assert_eq!(jobs[0].description, "Build APIs");
        assert_eq!(jobs[1].description, "No description");
        assert_eq!(jobs[1].company, "Initech");
        assert_eq!(*calls.lock().unwrap(), 3);
    }
}
