// 📥 Record sources - where the full record list comes from
//
// The whole set is always fetched at once; there is no server-side paging
// or filtering.

use crate::record::Record;
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/sights";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request failed with status code {0}")]
    Status(u16),

    #[error("Network Error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Failed to read {0}")]
    Io(String),
}

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Human-readable origin for logs and the status bar
    fn describe(&self) -> String;

    async fn fetch_all(&self) -> Result<Vec<Record>, FetchError>;
}

// ============================================================================
// HTTP
// ============================================================================

pub struct HttpSource {
    http: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RecordSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch_all(&self) -> Result<Vec<Record>, FetchError> {
        tracing::debug!(url = %self.url, "fetching records");

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

// ============================================================================
// LOCAL FILE
// ============================================================================

/// JSON array or CSV file with a header row
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Vec<Record>, FetchError> {
        load_records(&self.path)
    }
}

#[async_trait]
impl RecordSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_all(&self) -> Result<Vec<Record>, FetchError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_records(&path))
            .await
            .map_err(|e| FetchError::Io(e.to_string()))?
    }
}

pub fn load_records(path: &Path) -> Result<Vec<Record>, FetchError> {
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        load_csv(path)
    } else {
        let bytes = std::fs::read(path).map_err(|_| FetchError::Io(path.display().to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

fn load_csv(path: &Path) -> Result<Vec<Record>, FetchError> {
    let mut rdr =
        csv::Reader::from_path(path).map_err(|_| FetchError::Io(path.display().to_string()))?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: Record = result.map_err(|e| FetchError::Decode(e.to_string()))?;
        records.push(record);
    }

    Ok(records)
}

/// Pick a source from the configured endpoint: URLs go over HTTP, anything else is a file
pub fn source_for(endpoint: &str, timeout: Duration) -> Result<Box<dyn RecordSource>, FetchError> {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(Box::new(HttpSource::new(endpoint, timeout)?))
    } else {
        let path = endpoint.strip_prefix("file://").unwrap_or(endpoint);
        Ok(Box::new(FileSource::new(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the URL
    async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}/sights", addr)
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let url = serve_once(http_response("500 Internal Server Error", "")).await;
        let source = HttpSource::new(url, Duration::from_secs(5)).unwrap();

        let err = source.fetch_all().await.unwrap_err();
        assert_eq!(err, FetchError::Status(500));
        assert_eq!(err.to_string(), "Request failed with status code 500");
    }

    #[tokio::test]
    async fn test_http_fetch_records() {
        let body = r#"[{"id":1,"name":"Park","address":"A","latitude":47.1,"longitude":38.9,"type":"Парки и природные объекты"}]"#;
        let url = serve_once(http_response("200 OK", body)).await;
        let source = HttpSource::new(url, Duration::from_secs(5)).unwrap();

        let records = source.fetch_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Park");
    }

    #[tokio::test]
    async fn test_http_bad_json_is_decode_error() {
        let url = serve_once(http_response("200 OK", "{not json")).await;
        let source = HttpSource::new(url, Duration::from_secs(5)).unwrap();

        assert!(matches!(source.fetch_all().await, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_file_source_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"id":3,"name":"Bin","address":"B","lat":47.0,"lng":38.0,"percent":10,"batLevel":90,"timeAt":"now"}}]"#
        )
        .unwrap();

        let source = FileSource::new(file.path());
        let records = source.fetch_all().await.unwrap();
        assert_eq!(records[0].id, 3);
        assert_eq!(records[0].percent, Some(10.0));
    }

    #[test]
    fn test_file_source_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "id,name,address,latitude,longitude,type,description").unwrap();
        writeln!(file, "1,Museum,Petrovskaya 5,47.21,38.93,Музеи,Local lore").unwrap();
        writeln!(file, "2,Theatre,Petrovskaya 90,47.22,38.94,Театры,").unwrap();

        let records = FileSource::new(file.path()).load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description.as_deref(), Some("Local lore"));
        assert_eq!(records[1].description, None);
        assert!(records[1].matches_category("Театры"));
    }

    #[test]
    fn test_missing_file() {
        let err = FileSource::new("/nonexistent/sights.json").load().unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }

    #[test]
    fn test_source_for_picks_by_scheme() {
        let timeout = Duration::from_secs(1);
        assert_eq!(
            source_for(DEFAULT_ENDPOINT, timeout).unwrap().describe(),
            DEFAULT_ENDPOINT
        );
        assert_eq!(
            source_for("file:///tmp/sights.json", timeout).unwrap().describe(),
            "/tmp/sights.json"
        );
    }
}
