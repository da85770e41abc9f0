use std::path::PathBuf;

use crate::{extract::Limits, util::Output};

/// Flags every site binary accepts.
#[derive(Debug, Clone, clap::Args)]
pub struct CommonArgs {
    /// Listing address to start from, instead of the site default
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
    #[arg(long)]
    pub max_pages: Option<u32>,
    #[arg(long)]
    pub max_records: Option<usize>,
    #[arg(short, long, default_value_t = 5000)]
    pub port: u16,
    #[arg(long, default_value = "out")]
    pub out_dir: PathBuf,
    /// Run one extract-and-report cycle, write the report, and exit
    #[arg(long)]
    pub once: bool,
}

impl CommonArgs {
    /// Ceilings from the command line, falling back to the site's own.
    pub const fn limits(&self, defaults: Limits) -> Limits {
        Limits {
            max_pages: self.max_pages,
            max_records: self.max_records,
        }
        .or(defaults)
    }

    pub fn base_url<'a>(&'a self, default: &'a str) -> &'a str {
        self.base_url.as_deref().unwrap_or(default)
    }

    pub fn output(&self) -> Output {
        Output::new(&self.out_dir)
    }
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Args {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn overrides_fill_from_defaults() {
        let args = Args::parse_from(["books", "--max-records", "7", "--once"]);
        assert!(args.common.once);
        assert_eq!(args.common.port, 5000);
        assert_eq!(
            args.common.limits(Limits::pages(3)),
            Limits {
                max_pages: Some(3),
                max_records: Some(7)
            }
        );
        assert_eq!(args.common.base_url("http://books.toscrape.com"), "http://books.toscrape.com");
    }
}
