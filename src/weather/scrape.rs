use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use sscr::{
    extract::Rule,
    html::{FieldError, FieldExt, select_text, selector},
};

pub const NA: &str = "N/A";

/// Position of each reading in the details list.
const HUMIDITY: usize = 2;
const PRESSURE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weather {
    pub city: String,
    pub temperature: String,
    pub humidity: String,
    pub pressure: String,
}

/// The whole page is one record.
pub struct Conditions {
    body: Selector,
    city: Selector,
    temperature: Selector,
    detail: Selector,
    value: Selector,
}

impl Conditions {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            body: selector("body")?,
            city: selector("h1.CurrentConditions--location--1YWj_")?,
            temperature: selector("span.CurrentConditions--tempValue--MHmYY")?,
            detail: selector("div.WeatherDetailsListItem--wxData--kK81o")?,
            value: selector("span")?,
        })
    }
}

impl Rule for Conditions {
    type Block = Weather;
    type Record = Weather;

    fn container(&self) -> &Selector {
        &self.body
    }

    /// A short details list reads as `N/A`; a listed reading without its
    /// value drops the page.
    fn parse(&mut self, body: ElementRef<'_>) -> Result<Option<Weather>, FieldError> {
        let city = select_text(body, &self.city).field("city")?;
        let temperature = select_text(body, &self.temperature).field("temperature")?;

        let details = body.select(&self.detail).collect::<Vec<_>>();
        let reading = |at: usize, name: &'static str| match details.get(at) {
            Some(&d) => select_text(d, &self.value).field(name),
            None => Ok(NA.to_owned()),
        };

        Ok(Some(Weather {
            city,
            temperature,
            humidity: reading(HUMIDITY, "humidity")?,
            pressure: reading(PRESSURE, "pressure")?,
        }))
    }

    async fn finish(&self, weather: Weather) -> Result<Weather, FieldError> {
        Ok(weather)
    }
}
