use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use sscr::{
    extract::Rule,
    html::{FieldError, FieldExt, select_text, selector},
};

pub const NA: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    pub location: String,
    pub salary: String,
    pub description: String,
}

pub struct Jobs {
    card: Selector,
    title: Selector,
    location: Selector,
    salary: Selector,
    summary: Selector,
}

impl Jobs {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            card: selector("div.jobsearch-SerpJobCard")?,
            title: selector("h2.title a")?,
            location: selector("div.recJobLoc")?,
            salary: selector("span.salaryText")?,
            summary: selector("div.summary")?,
        })
    }
}

impl Rule for Jobs {
    type Block = Job;
    type Record = Job;

    fn container(&self) -> &Selector {
        &self.card
    }

    /// The location holder must exist; its `data-rc-loc` may be blank.
    fn parse(&mut self, card: ElementRef<'_>) -> Result<Option<Job>, FieldError> {
        let name = select_text(card, &self.title).field("name")?;
        let location = card
            .select(&self.location)
            .next()
            .field("location")?
            .attr("data-rc-loc")
            .filter(|l| !l.is_empty())
            .unwrap_or(NA)
            .to_owned();

        Ok(Some(Job {
            name,
            location,
            salary: select_text(card, &self.salary).unwrap_or_else(|| NA.to_owned()),
            description: select_text(card, &self.summary).unwrap_or_else(|| NA.to_owned()),
        }))
    }

    async fn finish(&self, job: Job) -> Result<Job, FieldError> {
        Ok(job)
    }
}
