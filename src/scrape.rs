use core::future::Future;

use reqwest::{Client as Request, StatusCode};

mod puppeteer;

pub use puppeteer::ScrollPages;

pub static USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
];

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Browser(#[from] anyhow::Error),
}

/// Plain client for the static sites. No timeout on purpose: a slow page
/// blocks the run, it is never abandoned and retried.
pub fn basic() -> reqwest::Result<Request> {
    Request::builder().user_agent("Mozilla/5.0").build()
}

/// One GET, body as text. Any non-2xx status is a failure.
pub async fn fetch_html(client: &Request, url: &str) -> Result<String, FetchError> {
    let res = client.get(url).send().await?;
    let status = res.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }
    Ok(res.text().await?)
}

/// Source of raw page markup for the extractor.
pub trait Transport: Send {
    /// Markup of page `page` (1-based), or `None` if the source has no such page.
    fn fetch(&mut self, page: u32) -> impl Future<Output = Result<Option<String>, FetchError>> + Send;

    /// Human-readable location of `page`, for log lines.
    fn describe(&self, page: u32) -> String;
}

/// How a site numbers its listing pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Paging {
    /// Exactly one page.
    Single(String),
    /// Page 1 is `first`; page `n > 1` is `rest` with `{page}` replaced by `n`.
    Numbered { first: String, rest: String },
}

impl Paging {
    pub fn numbered(first: impl Into<String>, rest: impl Into<String>) -> Self {
        Self::Numbered {
            first: first.into(),
            rest: rest.into(),
        }
    }

    pub fn url(&self, page: u32) -> Option<String> {
        match self {
            Self::Single(url) => (page == 1).then(|| url.clone()),
            Self::Numbered { first, .. } if page == 1 => Some(first.clone()),
            Self::Numbered { rest, .. } => Some(rest.replace("{page}", &page.to_string())),
        }
    }
}

pub struct HttpPages {
    client: Request,
    paging: Paging,
}

impl HttpPages {
    pub const fn new(client: Request, paging: Paging) -> Self {
        Self { client, paging }
    }
}

impl Transport for HttpPages {
    async fn fetch(&mut self, page: u32) -> Result<Option<String>, FetchError> {
        let Some(url) = self.paging.url(page) else {
            return Ok(None);
        };
        fetch_html(&self.client, &url).await.map(Some)
    }

    fn describe(&self, page: u32) -> String {
        self.paging
            .url(page)
            .unwrap_or_else(|| format!("page {page} (none)"))
    }
}
