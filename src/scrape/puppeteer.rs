use std::{ffi::OsStr, sync::Arc, time::Duration};

use anyhow::Context;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use tokio::{task::spawn_blocking, time::sleep};

use super::{FetchError, Transport, USER_AGENTS};

pub fn puppeteer(headless: bool) -> anyhow::Result<Browser> {
    Browser::new(LaunchOptions {
        args: vec![OsStr::new("--disable-blink-features=AutomationControlled")],
        headless,
        ..LaunchOptions::default()
    })
}

#[allow(clippy::significant_drop_tightening)]
pub fn first_tab(browser: &Browser) -> anyhow::Result<Arc<Tab>> {
    let tab = browser.new_tab()?;

    {
        let tabs_guard = browser
            .get_tabs()
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        for remain in &*tabs_guard {
            if !Arc::ptr_eq(&tab, remain) {
                remain.close(true)?;
            }
        }
    }

    Ok(tab)
}

async fn navigate_to(tab: &Arc<Tab>, url: String) -> anyhow::Result<()> {
    let tab = Arc::clone(tab);

    spawn_blocking(move || -> anyhow::Result<()> {
        tab.navigate_to(&url)?.wait_until_navigated()?;
        Ok(())
    })
    .await?
}

async fn evaluate(tab: &Arc<Tab>, js: &'static str) -> anyhow::Result<Option<Value>> {
    let tab = Arc::clone(tab);

    let ret = spawn_blocking(move || tab.evaluate(js, false)).await??;
    Ok(ret.value)
}

async fn content(tab: &Arc<Tab>) -> anyhow::Result<String> {
    let tab = Arc::clone(tab);

    spawn_blocking(move || tab.get_content()).await?
}

/// Infinite-scroll listing driven by one browser session.
///
/// Page 1 loads the address; every later page scrolls to the bottom, waits
/// `settle`, and counts as "nothing more" once the document height stops
/// growing. There is no overall deadline; each browser command keeps its own
/// timeout. The session lives exactly as long as this value.
pub struct ScrollPages {
    _browser: Browser,
    tab: Arc<Tab>,
    url: String,
    settle: Duration,
    last_height: Option<i64>,
}

impl ScrollPages {
    pub async fn launch(url: String, headless: bool, settle: Duration) -> anyhow::Result<Self> {
        let user_agent = {
            use rand::seq::IndexedRandom;
            *USER_AGENTS
                .choose(&mut rand::rng())
                .ok_or_else(|| anyhow::anyhow!("no UA available"))?
        };
        tracing::info!(target: "browser", "choosing user-agent \x1b[1;36m{user_agent}\x1b[0m ...");

        let (browser, tab) = spawn_blocking(move || -> anyhow::Result<_> {
            let browser = puppeteer(headless).context("failed to start browser")?;
            let tab = first_tab(&browser)?;
            tab.set_user_agent(user_agent, None, None)?;
            Ok((browser, tab))
        })
        .await??;
        tracing::info!(target: "browser", "browser started");

        Ok(Self {
            _browser: browser,
            tab,
            url,
            settle,
            last_height: None,
        })
    }

    async fn height(&self) -> anyhow::Result<i64> {
        match evaluate(&self.tab, "document.body.scrollHeight").await? {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(|| anyhow::anyhow!("scroll height {n} out of range")),
            Some(value) => anyhow::bail!("scroll height is not a number: {value}"),
            None => anyhow::bail!("scroll height returned nothing"),
        }
    }
}

impl Transport for ScrollPages {
    async fn fetch(&mut self, page: u32) -> Result<Option<String>, FetchError> {
        if page == 1 {
            navigate_to(&self.tab, self.url.clone()).await?;
        } else {
            evaluate(&self.tab, "window.scrollTo(0, document.body.scrollHeight)").await?;
            sleep(self.settle).await;
        }

        let height = self.height().await?;
        if page > 1 && self.last_height == Some(height) {
            tracing::info!(target: "browser", "height stayed at {height}, no more content");
            return Ok(None);
        }
        self.last_height = Some(height);

        Ok(Some(content(&self.tab).await?))
    }

    fn describe(&self, page: u32) -> String {
        if page == 1 {
            self.url.clone()
        } else {
            format!("{} (scroll #{})", self.url, page - 1)
        }
    }
}

impl Drop for ScrollPages {
    fn drop(&mut self) {
        tracing::info!(target: "browser", "browser closed");
    }
}
