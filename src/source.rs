// 📡 Data Source - where the two collections come from
// HTTP backend in production, CSV directory for offline demos and tests

use crate::model::{Country, Record};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

pub const COUNTRIES_PATH: &str = "/api/countries/";
pub const RECORDS_PATH: &str = "/api/data/";

// ============================================================================
// ERRORS
// ============================================================================

/// Which collection a fetch was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Countries,
    Records,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Countries => write!(f, "countries"),
            Collection::Records => write!(f, "data"),
        }
    }
}

/// A failed fetch of one collection (network, status or decoding)
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {collection} failed: {source}")]
    Http {
        collection: Collection,
        #[source]
        source: reqwest::Error,
    },

    #[error("server returned {status} for {collection}")]
    Status { collection: Collection, status: u16 },

    #[error("could not decode {collection}: {source}")]
    Decode {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not read {collection} from {path:?}: {source}")]
    Csv {
        collection: Collection,
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl FetchError {
    pub fn collection(&self) -> Collection {
        match self {
            FetchError::Http { collection, .. }
            | FetchError::Status { collection, .. }
            | FetchError::Decode { collection, .. }
            | FetchError::Csv { collection, .. } => *collection,
        }
    }
}

// ============================================================================
// SOURCE TRAIT
// ============================================================================

/// Supplier of the two read-only collections
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_countries(&self) -> Result<Vec<Country>, FetchError>;

    async fn fetch_records(&self) -> Result<Vec<Record>, FetchError>;

    /// Short human description for logs and the status bar
    fn describe(&self) -> String;
}

// ============================================================================
// HTTP SOURCE
// ============================================================================

/// Backend API client: `GET /api/countries/` and `GET /api/data/`.
/// No retries, no timeout.
pub struct HttpSource {
    pub base_url: String,
    client: Client,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        collection: Collection,
    ) -> Result<Vec<T>, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Http { collection, source })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                collection,
                status: response.status().as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Http { collection, source })?;

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode { collection, source })
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch_countries(&self) -> Result<Vec<Country>, FetchError> {
        self.get_json(COUNTRIES_PATH, Collection::Countries).await
    }

    async fn fetch_records(&self) -> Result<Vec<Record>, FetchError> {
        self.get_json(RECORDS_PATH, Collection::Records).await
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

// ============================================================================
// CSV SOURCE
// ============================================================================

/// Reads `countries.csv` (id,name) and `data.csv`
/// (country,year,external_debt,education_expenditure) from one directory
pub struct CsvSource {
    pub dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read<T: DeserializeOwned>(path: &Path, collection: Collection) -> Result<Vec<T>, FetchError> {
        let csv_err = |source: csv::Error| FetchError::Csv {
            collection,
            path: path.to_path_buf(),
            source,
        };

        let mut rdr = csv::Reader::from_path(path).map_err(csv_err)?;

        let mut rows = Vec::new();
        for result in rdr.deserialize::<T>() {
            rows.push(result.map_err(csv_err)?);
        }

        Ok(rows)
    }
}

#[async_trait]
impl DataSource for CsvSource {
    async fn fetch_countries(&self) -> Result<Vec<Country>, FetchError> {
        Self::read(&self.dir.join("countries.csv"), Collection::Countries)
    }

    async fn fetch_records(&self) -> Result<Vec<Record>, FetchError> {
        Self::read(&self.dir.join("data.csv"), Collection::Records)
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Result of one collection fetch, delivered to the owner of the dashboard
#[derive(Debug)]
pub enum LoadEvent {
    Countries(Result<Vec<Country>, FetchError>),
    Records(Result<Vec<Record>, FetchError>),
}

/// Both fetches issued concurrently; each result stands on its own
pub async fn load_all(
    source: &dyn DataSource,
) -> (
    Result<Vec<Country>, FetchError>,
    Result<Vec<Record>, FetchError>,
) {
    tokio::join!(source.fetch_countries(), source.fetch_records())
}

/// Background load on the runtime, one task per collection.
/// Sends are ignored once the receiver is gone. The UI never joins the
/// returned handles.
pub fn spawn_load<S>(
    source: std::sync::Arc<S>,
    tx: UnboundedSender<LoadEvent>,
) -> (JoinHandle<()>, JoinHandle<()>)
where
    S: DataSource + ?Sized + 'static,
{
    let countries_source = source.clone();
    let countries_tx = tx.clone();
    let countries = tokio::spawn(async move {
        let result = countries_source.fetch_countries().await;
        if countries_tx.send(LoadEvent::Countries(result)).is_err() {
            tracing::debug!("dashboard closed before countries arrived");
        }
    });

    let records = tokio::spawn(async move {
        let result = source.fetch_records().await;
        if tx.send(LoadEvent::Records(result)).is_err() {
            tracing::debug!("dashboard closed before data arrived");
        }
    });

    (countries, records)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CountryId;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_http_source_fetches_both_collections() {
        let app = Router::new()
            .route(
                COUNTRIES_PATH,
                get(|| async { Json(json!([{"id": 1, "name": "Kenya"}, {"id": 2, "name": "Peru"}])) }),
            )
            .route(
                RECORDS_PATH,
                get(|| async {
                    Json(json!([
                        {"country": 1, "year": 2020, "external_debt": "100.50", "education_expenditure": 10}
                    ]))
                }),
            );
        let base = serve(app).await;

        let source = HttpSource::new(format!("{}/", base));
        let (countries, records) = load_all(&source).await;

        let countries = countries.unwrap();
        assert_eq!(countries.len(), 2);
        assert_eq!(countries[1].name, "Peru");

        let records = records.unwrap();
        assert_eq!(records[0].country, CountryId(1));
        assert_eq!(records[0].external_debt, 100.5);
    }

    #[tokio::test]
    async fn test_http_source_failures_are_independent() {
        let app = Router::new()
            .route(COUNTRIES_PATH, get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
            .route(RECORDS_PATH, get(|| async { "not json" }));
        let base = serve(app).await;

        let source = HttpSource::new(base);
        let (countries, records) = load_all(&source).await;

        match countries {
            Err(FetchError::Status { collection, status }) => {
                assert_eq!(collection, Collection::Countries);
                assert_eq!(status, 500);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            records,
            Err(FetchError::Decode { collection: Collection::Records, .. })
        ));
    }

    #[tokio::test]
    async fn test_http_source_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = HttpSource::new(format!("http://{}", addr));
        let result = source.fetch_countries().await;

        assert!(matches!(result, Err(FetchError::Http { .. })));
        assert_eq!(result.unwrap_err().collection(), Collection::Countries);
    }

    #[tokio::test]
    async fn test_csv_source_reads_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("countries.csv"), "id,name\n1,Kenya\n2,Peru\n").unwrap();
        std::fs::write(
            dir.path().join("data.csv"),
            "country,year,external_debt,education_expenditure\n1,2020,100.5,10\n2,2021,50,5.25\n",
        )
        .unwrap();

        let source = CsvSource::new(dir.path());
        let (countries, records) = load_all(&source).await;

        assert_eq!(countries.unwrap()[0].name, "Kenya");
        let records = records.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].education_expenditure, 5.25);
    }

    #[tokio::test]
    async fn test_csv_source_missing_file() {
        let dir = TempDir::new().unwrap();
        let source = CsvSource::new(dir.path());

        let err = source.fetch_records().await.unwrap_err();
        assert!(matches!(err, FetchError::Csv { .. }));
        assert_eq!(err.collection(), Collection::Records);

        let err = source.fetch_countries().await.unwrap_err();
        assert_eq!(err.collection(), Collection::Countries);
    }

    #[tokio::test]
    async fn test_spawn_load_delivers_both_events() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("countries.csv"), "id,name\n1,Kenya\n").unwrap();
        std::fs::write(
            dir.path().join("data.csv"),
            "country,year,external_debt,education_expenditure\n1,2020,1,1\n",
        )
        .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let (countries, records) = spawn_load(Arc::new(CsvSource::new(dir.path())), tx);

        let mut got_countries = false;
        let mut got_records = false;
        for _ in 0..2 {
            match rx.recv().await.unwrap() {
                LoadEvent::Countries(result) => got_countries = result.is_ok(),
                LoadEvent::Records(result) => got_records = result.is_ok(),
            }
        }
        assert!(got_countries && got_records);
        assert!(countries.await.is_ok());
        assert!(records.await.is_ok());
    }

    #[tokio::test]
    async fn test_spawn_load_after_receiver_dropped_is_noop() {
        let dir = TempDir::new().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        // Both fetches fail and both sends fail; a panic would surface as a JoinError
        let (countries, records) = spawn_load(Arc::new(CsvSource::new(dir.path())), tx);

        assert!(countries.await.is_ok());
        assert!(records.await.is_ok());
    }
}
