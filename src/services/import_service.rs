//! Dataset import from a local file or a link
//!
//! Produces ordered rows (`field -> scalar`) from CSV with a header row or
//! from a JSON array of objects. Only one import may be in flight at a time;
//! a second request while busy fails with [`ImportError::Busy`].

use crate::core::Row;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// User-facing import failures. Messages are shown verbatim in the import prompt.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("No file found")]
    NoFile,
    #[error("No data found")]
    NoData,
    #[error("Could not download csv file")]
    ResponseNotOk { status: u16 },
    #[error("Could not download csv file")]
    Http(#[from] reqwest::Error),
    #[error("Could not parse CSV")]
    Parse(String),
    #[error("Could not read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unknown error occured")]
    Unknown(String),
    #[error("An import is already running")]
    Busy,
    #[error("Import cancelled")]
    Cancelled,
}

/// Where to import from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    File(PathBuf),
    Link(String),
}

impl ImportSource {
    /// Pick a source from the two prompt fields; a file takes priority over a link
    pub fn choose(file: &str, link: &str) -> Result<Self, ImportError> {
        let file = file.trim();
        let link = link.trim();
        if !file.is_empty() {
            Ok(ImportSource::File(PathBuf::from(file)))
        } else if !link.is_empty() {
            Ok(ImportSource::Link(link.to_string()))
        } else {
            Err(ImportError::NoData)
        }
    }

    /// Interpret a single CLI argument as a link when it looks like one
    pub fn from_arg(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            ImportSource::Link(arg.to_string())
        } else {
            ImportSource::File(PathBuf::from(arg))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ImportSource::File(path) => path.display().to_string(),
            ImportSource::Link(link) => link.clone(),
        }
    }
}

/// Text format of the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Json,
}

impl DataFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DataFormat::Json,
            _ => DataFormat::Csv,
        }
    }

    fn from_response(link: &str, content_type: Option<&str>) -> Self {
        let by_type = content_type.is_some_and(|ct| ct.contains("json"));
        let by_path = url::Url::parse(link)
            .map(|u| u.path().to_ascii_lowercase().ends_with(".json"))
            .unwrap_or(false);
        if by_type || by_path {
            DataFormat::Json
        } else {
            DataFormat::Csv
        }
    }
}

/// Clears the in-flight flag when the import finishes, however it finishes
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Service for loading datasets
pub struct ImportService {
    client: reqwest::Client,
    in_flight: Arc<AtomicBool>,
}

impl ImportService {
    pub fn new(timeout: Duration) -> Result<Self, ImportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Whether an import is currently running
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Import rows from `source`, giving up early if `cancel` fires
    pub async fn import(
        &self,
        source: ImportSource,
        cancel: CancellationToken,
    ) -> Result<Vec<Row>, ImportError> {
        let _guard = InFlight::acquire(&self.in_flight).ok_or(ImportError::Busy)?;
        info!("Importing from {}", source.describe());

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ImportError::Cancelled),
            result = self.fetch(&source) => result,
        };

        match &result {
            Ok(rows) => info!("Imported {} rows from {}", rows.len(), source.describe()),
            Err(e) => error!("Import from {} failed: {e:?}", source.describe()),
        }
        result
    }

    async fn fetch(&self, source: &ImportSource) -> Result<Vec<Row>, ImportError> {
        match source {
            ImportSource::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => ImportError::NoFile,
                    _ => ImportError::Io(e),
                })?;
                parse_rows(&decode_text(&bytes), DataFormat::from_path(path))
            }
            ImportSource::Link(link) => {
                let response = self.client.get(link).send().await?;
                if !response.status().is_success() {
                    return Err(ImportError::ResponseNotOk {
                        status: response.status().as_u16(),
                    });
                }
                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);
                let bytes = response.bytes().await?;
                let format = DataFormat::from_response(link, content_type.as_deref());
                parse_rows(&decode_text(&bytes), format)
            }
        }
    }
}

/// Decode bytes as UTF-8 (BOM aware), falling back to Windows-1252
pub fn decode_text(bytes: &[u8]) -> String {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if !had_errors {
        return text.into_owned();
    }
    debug!("Input is not valid UTF-8, decoding as Windows-1252");
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text.into_owned()
}

pub fn parse_rows(text: &str, format: DataFormat) -> Result<Vec<Row>, ImportError> {
    let rows = match format {
        DataFormat::Csv => parse_csv(text)?,
        DataFormat::Json => parse_json(text)?,
    };
    if rows.is_empty() {
        return Err(ImportError::NoData);
    }
    Ok(rows)
}

/// CSV with a header row; every cell becomes a string value
pub fn parse_csv(text: &str) -> Result<Vec<Row>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| ImportError::Parse(e.to_string()))?
        .clone();

    reader
        .records()
        .map(|record| {
            let record = record.map_err(|e| ImportError::Parse(e.to_string()))?;
            Ok(headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
                .collect())
        })
        .collect()
}

/// JSON array of objects; scalars keep their JSON types
pub fn parse_json(text: &str) -> Result<Vec<Row>, ImportError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ImportError::Parse(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(ImportError::Parse("expected a JSON array of objects".to_string()));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(row) => Ok(row),
            other => Err(ImportError::Parse(format!("expected an object, got {other}"))),
        })
        .collect()
}
