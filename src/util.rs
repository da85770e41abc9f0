use std::path::PathBuf;

use hashbrown::HashSet;

/// Layout of one binary's output directory:
/// exports at the top, `report.html`, and charts under `static/`.
#[derive(Debug, Clone)]
pub struct Output {
    dir: PathBuf,
}

impl Output {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn report(&self) -> PathBuf {
        self.dir.join("report.html")
    }

    pub fn static_dir(&self) -> PathBuf {
        self.dir.join("static")
    }

    pub fn chart(&self, name: &str) -> PathBuf {
        self.static_dir().join(format!("{name}.svg"))
    }

    /// URL the report uses for [`Self::chart`].
    pub fn chart_url(name: &str) -> String {
        format!("/static/{name}.svg")
    }

    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.static_dir()).await
    }
}

/// Distinct values, sorted.
pub fn unique_sorted<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut v = values
        .into_iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();
    v.sort_unstable();
    v
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn paths() {
        let out = Output::new("out");
        assert_eq!(out.report(), Path::new("out/report.html"));
        assert_eq!(out.chart("rating"), Path::new("out/static/rating.svg"));
        assert_eq!(out.file("books.csv"), Path::new("out/books.csv"));
        assert_eq!(Output::chart_url("rating"), "/static/rating.svg");
    }

    #[test]
    fn unique() {
        assert_eq!(
            unique_sorted(["Poetry", "Travel", "Poetry", "Mystery"]),
            ["Mystery", "Poetry", "Travel"]
        );
    }
}
