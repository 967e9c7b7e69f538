use serde::{Deserialize, Serialize};

/// Hard cap on records held by one store.
pub const DEFAULT_MAX_RECORDS: usize = 10_000;
/// Rows shown per page of results.
pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const DEFAULT_DATA_PATH: &str = "financial_fraud_detection_dataset.csv";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Loading stops once this many records are retained.
    pub max_records: usize,
    pub page_size:   usize,
    /// CSV source read at start-up by the runner.
    pub data_path:   String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            page_size:   DEFAULT_PAGE_SIZE,
            data_path:   DEFAULT_DATA_PATH.to_string(),
        }
    }
}

impl StoreConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: StoreConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        if config.page_size == 0 {
            anyhow::bail!("{path}: page_size must be at least 1");
        }
        Ok(config)
    }

    /// Small cap so truncation is easy to exercise in tests.
    pub fn default_test() -> Self {
        Self {
            max_records: 50,
            page_size:   DEFAULT_PAGE_SIZE,
            data_path:   String::new(),
        }
    }

    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }
}
