//! Reading manifests from YAML/JSON text and files
//!
//! Files may hold several `---`-separated documents; JSON is accepted as
//! the YAML subset it is.

use crate::errors::{ExError, LiveDiffError, Result};
use crate::model::{Application, ApplicationRevision, Object};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// Parse every non-empty document in `content`
pub fn parse_documents(content: &str) -> Result<Vec<Value>> {
    let mut docs = Vec::new();
    for doc in serde_yaml::Deserializer::from_str(content) {
        let value = serde_yaml::Value::deserialize(doc)?;
        if value.is_null() {
            continue;
        }
        docs.push(serde_json::to_value(value)?);
    }
    Ok(docs)
}

pub fn parse_objects(content: &str) -> Result<Vec<Object>> {
    parse_documents(content)?
        .into_iter()
        .map(Object::from_value)
        .collect()
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        ExError::from(LiveDiffError::Io {
            target: path.display().to_string(),
            reason: e.to_string(),
        })
        .with_op("read_manifest")
    })
}

/// The single document of `path`
fn read_single(path: &Path) -> Result<Value> {
    let mut docs = parse_documents(&read(path)?)
        .map_err(|e| e.wrap("read_manifest", format!("cannot parse {}", path.display())))?;
    match docs.len() {
        1 => Ok(docs.remove(0)),
        n => Err(ExError::from(LiveDiffError::InvalidManifest {
            reason: format!("{} must hold exactly one document, found {}", path.display(), n),
        })
        .with_op("read_manifest")),
    }
}

pub fn read_objects(path: &Path) -> Result<Vec<Object>> {
    parse_objects(&read(path)?)
        .map_err(|e| e.wrap("read_manifest", format!("cannot parse {}", path.display())))
}

pub fn read_object(path: &Path) -> Result<Object> {
    Object::from_value(read_single(path)?)
}

pub fn read_application(path: &Path) -> Result<Application> {
    read_object(path)?.to_typed()
}

pub fn read_revision(path: &Path) -> Result<ApplicationRevision> {
    read_object(path)?.to_typed()
}
