use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::BankError;

//
// ─── BANK SOURCES ─────────────────────────────────────────────────────────────
//

const FETCH_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(8);

/// Where raw question banks come from. Sources return the untrusted JSON
/// as-is; normalization and validation happen downstream.
#[async_trait]
pub trait BankSource: Send + Sync {
    async fn fetch(&self, file: &str) -> Result<Value, BankError>;
}

/// Fetches bank files over HTTP, retrying transient failures with a
/// doubling backoff.
pub struct HttpBankSource {
    client: Client,
    base_url: String,
}

impl HttpBankSource {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url_for(&self, file: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), file)
    }

    async fn fetch_once(&self, url: &str) -> Result<Value, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| err.to_string())?;
        if !response.status().is_success() {
            return Err(format!("server answered {}", response.status()));
        }
        response.json().await.map_err(|err| err.to_string())
    }
}

#[async_trait]
impl BankSource for HttpBankSource {
    async fn fetch(&self, file: &str) -> Result<Value, BankError> {
        let url = self.url_for(file);
        let mut backoff = BACKOFF_BASE;
        let mut last_reason = String::new();

        for attempt in 1..=FETCH_ATTEMPTS {
            match self.fetch_once(&url).await {
                Ok(value) => return Ok(value),
                Err(reason) => {
                    log::warn!("fetch attempt {attempt}/{FETCH_ATTEMPTS} for {url} failed: {reason}");
                    last_reason = reason;
                }
            }
            if attempt < FETCH_ATTEMPTS {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(BACKOFF_CAP);
            }
        }

        Err(BankError::Exhausted {
            url,
            attempts: FETCH_ATTEMPTS,
            reason: last_reason,
        })
    }
}

/// Reads bank files from a local directory.
pub struct DirBankSource {
    root: PathBuf,
}

impl DirBankSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BankSource for DirBankSource {
    async fn fetch(&self, file: &str) -> Result<Value, BankError> {
        let path = self.root.join(file);
        if !path.is_file() {
            return Err(BankError::NotFound { file: file.into() });
        }
        let bytes = fs::read(&path).map_err(|err| BankError::File {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|err| BankError::File {
            path: path.display().to_string(),
            reason: err.to_string(),
        })
    }
}

/// Fixed in-memory banks, used by tests and the mistake-practice flow.
#[derive(Default)]
pub struct StaticBankSource {
    banks: HashMap<String, Value>,
}

impl StaticBankSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bank(mut self, file: impl Into<String>, bank: Value) -> Self {
        self.banks.insert(file.into(), bank);
        self
    }
}

#[async_trait]
impl BankSource for StaticBankSource {
    async fn fetch(&self, file: &str) -> Result<Value, BankError> {
        self.banks
            .get(file)
            .cloned()
            .ok_or_else(|| BankError::NotFound { file: file.into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn static_source_serves_registered_banks() {
        let source = StaticBankSource::new().with_bank("polity.json", json!([{"id": "q1"}]));

        let bank = source.fetch("polity.json").await.unwrap();
        assert_eq!(bank[0]["id"], "q1");

        let err = source.fetch("missing.json").await.unwrap_err();
        assert!(matches!(err, BankError::NotFound { file } if file == "missing.json"));
    }

    #[tokio::test]
    async fn dir_source_reads_and_parses_files() {
        let dir = std::env::temp_dir().join(format!("banks_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("eco.json"), br#"{"questions": []}"#).unwrap();
        fs::write(dir.join("bad.json"), b"not json").unwrap();

        let source = DirBankSource::new(&dir);
        let bank = source.fetch("eco.json").await.unwrap();
        assert!(bank["questions"].is_array());

        let err = source.fetch("absent.json").await.unwrap_err();
        assert!(matches!(err, BankError::NotFound { .. }));

        let err = source.fetch("bad.json").await.unwrap_err();
        assert!(matches!(err, BankError::File { .. }));

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn http_source_gives_up_after_three_attempts() {
        // nothing listens on this port; every attempt fails fast
        let source = HttpBankSource::new("http://127.0.0.1:1/banks");
        let err = source.fetch("polity.json").await.unwrap_err();
        match err {
            BankError::Exhausted { url, attempts, .. } => {
                assert_eq!(url, "http://127.0.0.1:1/banks/polity.json");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
