//! JSON export of a result set.
//!
//! Document shape: a JSON array whose first element is the header
//! (title and metadata) and whose remaining elements are one entry per
//! record, in result order. The caller always chooses the path.

use crate::{
    error::{StoreError, StoreResult},
    record::Record,
    result_set::ResultSet,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportHeader {
    pub title:        String,
    pub record_count: usize,
    pub exported_at:  DateTime<Utc>,
    pub export_id:    Uuid,
}

/// The exported subset of a record's columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub transaction_id:    String,
    pub payment_channel:   String,
    pub transaction_type:  String,
    pub location:          String,
    pub amount:            f64,
    pub merchant_category: String,
}

impl From<&Record> for ExportEntry {
    fn from(r: &Record) -> Self {
        Self {
            transaction_id:    r.transaction_id.clone(),
            payment_channel:   r.payment_channel.clone(),
            transaction_type:  r.transaction_type.clone(),
            location:          r.location.clone(),
            amount:            r.amount,
            merchant_category: r.merchant_category.clone(),
        }
    }
}

impl ExportEntry {
    /// True when every exported column equals the record's.
    pub fn matches(&self, r: &Record) -> bool {
        *self == ExportEntry::from(r)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub header:  ExportHeader,
    pub entries: Vec<ExportEntry>,
}

impl ExportDocument {
    pub fn build(title: &str, results: &ResultSet) -> Self {
        Self {
            header: ExportHeader {
                title:        title.to_string(),
                record_count: results.len(),
                exported_at:  Utc::now(),
                export_id:    Uuid::new_v4(),
            },
            entries: results.iter().map(ExportEntry::from).collect(),
        }
    }

    pub fn to_json(&self) -> StoreResult<String> {
        let mut items = Vec::with_capacity(self.entries.len() + 1);
        items.push(serde_json::to_value(&self.header)?);
        for entry in &self.entries {
            items.push(serde_json::to_value(entry)?);
        }
        Ok(serde_json::to_string_pretty(&Value::Array(items))?)
    }

    pub fn from_json(text: &str) -> StoreResult<Self> {
        let items: Vec<Value> = serde_json::from_str(text)?;
        let (first, rest) = items.split_first().ok_or_else(|| StoreError::MalformedExport {
            reason: "document has no header".into(),
        })?;
        let header: ExportHeader = serde_json::from_value(first.clone())?;
        let entries = rest
            .iter()
            .map(|v| serde_json::from_value::<ExportEntry>(v.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        if entries.len() != header.record_count {
            return Err(StoreError::MalformedExport {
                reason: format!(
                    "header declares {} records, found {}",
                    header.record_count,
                    entries.len()
                ),
            });
        }
        Ok(Self { header, entries })
    }

    pub fn write_to(&self, path: &Path) -> StoreResult<()> {
        std::fs::write(path, self.to_json()?)?;
        log::info!(
            "Exported {} records ({}) to {}",
            self.header.record_count,
            self.header.title,
            path.display()
        );
        Ok(())
    }

    pub fn read_from(path: &Path) -> StoreResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// Build and write an export in one step.
pub fn export_results(path: &Path, title: &str, results: &ResultSet) -> StoreResult<ExportHeader> {
    let doc = ExportDocument::build(title, results);
    doc.write_to(path)?;
    Ok(doc.header)
}
