//! Where extraction results go after a run.
//!
//! [`RecordStore`] is the only thing the pipelines know about persistence;
//! file stores live here, the Postgres one in [`crate::db`].

use core::{future::Future, marker::PhantomData};
use std::{
    io,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};

use crate::db::{BB8Error, DBError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Db(#[from] DBError),
    #[error(transparent)]
    Pool(#[from] BB8Error),
}

pub trait RecordStore<R>: Send + Sync {
    /// Appends `records` after whatever is already stored.
    fn save_records(&self, records: &[R]) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Everything stored, in insertion order.
    fn fetch_records(&self) -> impl Future<Output = Result<Vec<R>, StoreError>> + Send;

    fn clear(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

async fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn remove(path: &Path) -> Result<(), StoreError> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// One CSV file with a header row, rewritten on every save.
pub struct CsvStore<R> {
    path: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R> CsvStore<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn csv_decode<R: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<R>, StoreError> {
    csv::Reader::from_reader(bytes)
        .deserialize()
        .collect::<Result<_, _>>()
        .map_err(Into::into)
}

fn csv_encode<'a, R: Serialize + 'a>(records: impl Iterator<Item = &'a R>) -> Result<Vec<u8>, StoreError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.into_inner().map_err(|e| StoreError::Io(e.into_error()))
}

impl<R> RecordStore<R> for CsvStore<R>
where
    R: Serialize + DeserializeOwned + Send + Sync,
{
    async fn save_records(&self, records: &[R]) -> Result<(), StoreError> {
        let existing = match read_existing(&self.path).await? {
            Some(bytes) => csv_decode::<R>(&bytes)?,
            None => Vec::new(),
        };
        let bytes = csv_encode(existing.iter().chain(records))?;
        tokio::fs::write(&self.path, bytes).await?;
        tracing::info!(target: "store", "\x1b[36m{}: saved {} rows\x1b[0m", self.path.display(), records.len());
        Ok(())
    }

    async fn fetch_records(&self) -> Result<Vec<R>, StoreError> {
        match read_existing(&self.path).await? {
            Some(bytes) => csv_decode(&bytes),
            None => Ok(Vec::new()),
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        remove(&self.path).await
    }
}

/// One pretty-printed JSON array.
pub struct JsonStore<R> {
    path: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R> JsonStore<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R> RecordStore<R> for JsonStore<R>
where
    R: Serialize + DeserializeOwned + Send + Sync,
{
    async fn save_records(&self, records: &[R]) -> Result<(), StoreError> {
        let existing: Vec<R> = match read_existing(&self.path).await? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => Vec::new(),
        };
        let all = existing.iter().chain(records).collect::<Vec<_>>();
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&all)?).await?;
        tracing::info!(target: "store", "\x1b[36m{}: saved {} records\x1b[0m", self.path.display(), records.len());
        Ok(())
    }

    async fn fetch_records(&self) -> Result<Vec<R>, StoreError> {
        match read_existing(&self.path).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        remove(&self.path).await
    }
}

/// Replace the stored set with `records` and read it back.
pub async fn replace<R, S: RecordStore<R>>(store: &S, records: &[R]) -> Result<Vec<R>, StoreError> {
    store.clear().await?;
    store.save_records(records).await?;
    store.fetch_records().await
}

#[cfg(test)]
pub(crate) mod tests {
    use serde::Deserialize;

    use super::*;

    pub fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sscr-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        title: String,
        price: f64,
        rating: u8,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { title: "A Light in the Attic".to_owned(), price: 51.77, rating: 3 },
            Row { title: "Tipping the Velvet, Vol. 1".to_owned(), price: 53.74, rating: 1 },
        ]
    }

    #[tokio::test]
    async fn csv_appends_and_clears() {
        let store = CsvStore::<Row>::new(scratch("rows.csv"));
        assert!(store.fetch_records().await.unwrap().is_empty());

        store.save_records(&rows()).await.unwrap();
        store.save_records(&rows()[..1]).await.unwrap();
        let back = store.fetch_records().await.unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back[..2], rows()[..]);

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("title,price,rating\n"));
        assert!(text.contains("\"Tipping the Velvet, Vol. 1\""));

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.fetch_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn json_replace_round() {
        let store = JsonStore::<Row>::new(scratch("rows.json"));
        store.save_records(&rows()[1..]).await.unwrap();

        let back = replace(&store, &rows()).await.unwrap();
        assert_eq!(back, rows());
    }
}
