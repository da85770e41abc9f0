use scraper::{ElementRef, Selector};

use crate::{normalize::Malformed, scrape::FetchError};

/// Why one record block was dropped. Never aborts the page.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("bad {field}: {source}")]
    Invalid {
        field: &'static str,
        #[source]
        source: Malformed,
    },
    #[error("detail page: {0}")]
    Detail(#[from] FetchError),
}

pub trait FieldExt<T> {
    fn field(self, name: &'static str) -> Result<T, FieldError>;
}

impl<T> FieldExt<T> for Option<T> {
    #[inline]
    fn field(self, name: &'static str) -> Result<T, FieldError> {
        self.ok_or(FieldError::Missing(name))
    }
}

impl<T> FieldExt<T> for Result<T, Malformed> {
    #[inline]
    fn field(self, name: &'static str) -> Result<T, FieldError> {
        self.map_err(|source| FieldError::Invalid { field: name, source })
    }
}

pub fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("bad selector {css:?}: {e}"))
}

/// Concatenated text of `el`, trimmed at both ends.
pub fn text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_owned()
}

pub fn select_text(el: ElementRef<'_>, sel: &Selector) -> Option<String> {
    el.select(sel).next().map(text)
}

pub fn select_attr<'a>(el: ElementRef<'a>, sel: &Selector, attr: &str) -> Option<&'a str> {
    el.select(sel).next()?.value().attr(attr)
}
