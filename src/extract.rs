//! The paginated record extractor shared by every site.
//!
//! One call walks pages 1, 2, ... through a [`Transport`], hands every
//! container matched by the [`Rule`] to the rule, and keeps what comes back.
//! A failed fetch ends the call with whatever was gathered so far; a page with
//! no containers is the natural end; a bad block only loses itself.

use core::future::Future;

use compact_str::{CompactString, format_compact};
use scraper::{ElementRef, Html, Selector};

use crate::{html::FieldError, scrape::Transport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    pub max_pages: Option<u32>,
    pub max_records: Option<usize>,
}

impl Limits {
    pub const UNBOUNDED: Self = Self {
        max_pages: None,
        max_records: None,
    };

    #[must_use]
    pub const fn pages(max: u32) -> Self {
        Self {
            max_pages: Some(max),
            max_records: None,
        }
    }

    #[must_use]
    pub const fn records(max: usize) -> Self {
        Self {
            max_pages: None,
            max_records: Some(max),
        }
    }

    /// Fill unset ceilings from `defaults`.
    #[must_use]
    pub const fn or(self, defaults: Self) -> Self {
        Self {
            max_pages: if self.max_pages.is_some() { self.max_pages } else { defaults.max_pages },
            max_records: if self.max_records.is_some() { self.max_records } else { defaults.max_records },
        }
    }

    fn records_full(&self, n: usize) -> bool {
        self.max_records.is_some_and(|max| n >= max)
    }

    fn pages_done(&self, page: u32) -> bool {
        self.max_pages.is_some_and(|max| page >= max)
    }
}

/// Site-specific field extraction.
pub trait Rule: Send + Sync {
    /// Owned data pulled out of one container, before any secondary fetch.
    type Block: Send;
    type Record: Send;

    /// Matches one container per record.
    fn container(&self) -> &Selector;

    /// Sees every page once, before its containers.
    fn observe(&mut self, _page: &Html) {}

    /// `Ok(None)` drops the block quietly (it is not a record at all);
    /// `Err` drops it with a warning.
    fn parse(&mut self, block: ElementRef<'_>) -> Result<Option<Self::Block>, FieldError>;

    /// Completes a block into a record, possibly fetching more.
    fn finish(&self, block: Self::Block) -> impl Future<Output = Result<Self::Record, FieldError>> + Send;

    fn is_duplicate(&self, _seen: &[Self::Record], _record: &Self::Record) -> bool {
        false
    }
}

pub struct Extractor<T, R> {
    transport: T,
    rule: R,
    limits: Limits,
    target: CompactString,
}

type Parsed<R> = Result<Option<<R as Rule>::Block>, FieldError>;

fn parse_page<R: Rule>(rule: &mut R, markup: &str) -> Vec<Parsed<R>> {
    let doc = Html::parse_document(markup);
    rule.observe(&doc);
    let container = rule.container().clone();
    doc.select(&container).map(|el| rule.parse(el)).collect()
}

impl<T: Transport, R: Rule> Extractor<T, R> {
    /// `site` names the log target, `extract-<site>`, used by this call only.
    pub fn new(site: &str, transport: T, rule: R, limits: Limits) -> Self {
        Self {
            transport,
            rule,
            limits,
            target: format_compact!("extract-{site}"),
        }
    }

    pub async fn run(self) -> Vec<R::Record> {
        self.run_with_rule().await.0
    }

    /// Like [`Self::run`], also returning the rule with whatever it observed.
    /// The transport (and any browser session behind it) is dropped before
    /// this returns.
    pub async fn run_with_rule(self) -> (Vec<R::Record>, R) {
        let Self {
            mut transport,
            mut rule,
            limits,
            target,
        } = self;
        let target = target.as_str();

        let mut records = Vec::new();
        let mut page = 1;
        'pages: loop {
            if limits.records_full(records.len()) {
                break;
            }

            let location = transport.describe(page);
            let markup = match transport.fetch(page).await {
                Ok(Some(markup)) => markup,
                Ok(None) => {
                    log::info!(target: target, "[Page #{page}] nothing more at {location}");
                    break;
                }
                Err(e) => {
                    log::error!(target: target, "\x1b[31m[Page #{page}] failed to fetch {location}: {e}\x1b[0m");
                    break;
                }
            };
            log::info!(target: target, "[Page #{page}] fetched {location} ({} bytes)", markup.len());

            let blocks = parse_page(&mut rule, &markup);
            if blocks.is_empty() {
                log::info!(target: target, "[Page #{page}] no records, stopping");
                break;
            }

            let found = blocks.len();
            let mut kept = 0;
            for (idx, block) in blocks.into_iter().enumerate() {
                let block = match block {
                    Ok(Some(block)) => block,
                    Ok(None) => continue,
                    Err(e) => {
                        log::warn!(target: target, "[Page #{page}] record #{idx} skipped: {e}");
                        continue;
                    }
                };
                let record = match rule.finish(block).await {
                    Ok(record) => record,
                    Err(e) => {
                        log::warn!(target: target, "[Page #{page}] record #{idx} skipped: {e}");
                        continue;
                    }
                };
                if rule.is_duplicate(&records, &record) {
                    log::debug!(target: target, "[Page #{page}] record #{idx} is a duplicate");
                    continue;
                }

                records.push(record);
                kept += 1;
                if limits.records_full(records.len()) {
                    log::info!(target: target, "\x1b[36m[Page #{page}] {kept}/{found} records, ceiling of {} reached\x1b[0m", records.len());
                    break 'pages;
                }
            }
            log::info!(target: target, "\x1b[36m[Page #{page}] {kept}/{found} records\x1b[0m");

            if limits.pages_done(page) {
                break;
            }
            page += 1;
        }

        log::info!(target: target, "scraped {} records", records.len());
        (records, rule)
    }
}
