use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Error, Result};
use serde_json::Value;

/// The set of BUSCO lineage databases available for download
pub struct LineageList {
    databases: HashSet<String>,
    suffix: String,
}

impl LineageList {
    /// Parse the list of available databases from a JSON file. BUSCO lists
    /// them either as the keys of an object or as a plain array of names.
    pub fn from_json(pb: &PathBuf, suffix: &str) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .open(pb)
            .with_context(|| format!("Failed to open file \"{}\" for reading", pb.display()))?;

        let value: Value = serde_json::from_reader(BufReader::new(file))
            .context("Error parsing lineage database file as JSON")?;

        Ok(LineageList {
            databases: databases_from_value(value)?,
            suffix: suffix.to_string(),
        })
    }

    pub fn from_databases(databases: HashSet<String>, suffix: &str) -> Self {
        LineageList {
            databases,
            suffix: suffix.to_string(),
        }
    }

    /// Select the database for the most specific rank of a lineage that has
    /// one. The lineage is ordered broad to specific, so the scan runs in
    /// reverse and stops at the first rank whose lowercased name, with the
    /// suffix appended, is a known database. None when no rank has one.
    pub fn select_database(&self, lineage: &[String]) -> Option<String> {
        for rank in lineage.iter().rev() {
            let database = rank.to_lowercase() + &self.suffix;
            if self.databases.contains(&database) {
                return Some(database);
            }
        }

        None
    }
}

fn databases_from_value(value: Value) -> Result<HashSet<String>> {
    match value {
        Value::Object(entries) => Ok(entries.into_iter().map(|(name, _)| name).collect()),
        Value::Array(names) => names
            .into_iter()
            .map(|name| match name {
                Value::String(name) => Ok(name),
                other => Err(Error::msg(format!(
                    "Expected a database name, found {other}"
                ))),
            })
            .collect(),
        other => Err(Error::msg(format!(
            "Expected a JSON object or array of database names, found {other}"
        ))),
    }
}
