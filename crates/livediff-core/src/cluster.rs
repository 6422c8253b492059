//! Cluster object access
//!
//! The engine never talks to an API server directly. Everything it needs
//! from a cluster goes through [`ClusterClient`]: get an object by type and
//! key, and submit creates/updates in dry-run mode for server-side
//! validation.

use crate::errors::{ExError, LiveDiffError, Result};
use crate::model::{Object, ObjectKey, TypeMeta};
use livediff_core_types::RequestContext;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Whether a write is persisted or only validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DryRunMode {
    /// Persist the write
    None,
    /// Run admission and validation, persist nothing
    All,
}

/// Get/create/update typed objects by key
pub trait ClusterClient: Send + Sync {
    /// Fetch one object. A missing object yields an error for which
    /// [`ExError::is_not_found`] is true.
    fn get(&self, ctx: &RequestContext, type_meta: &TypeMeta, key: &ObjectKey) -> Result<Object>;

    fn create(&self, ctx: &RequestContext, obj: &Object, mode: DryRunMode) -> Result<()>;

    fn update(&self, ctx: &RequestContext, obj: &Object, mode: DryRunMode) -> Result<()>;
}

type StoreKey = (TypeMeta, ObjectKey);

/// In-process object store implementing [`ClusterClient`]
///
/// Used by the CLI (objects preloaded from files) and by tests.
/// `resourceVersion` is a per-store counter bumped on every persisted write.
#[derive(Debug, Default)]
pub struct MemoryCluster {
    objects: RwLock<BTreeMap<StoreKey, Object>>,
    version: RwLock<u64>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding `objects`, later entries replacing earlier ones
    pub fn with_objects(objects: impl IntoIterator<Item = Object>) -> Result<Self> {
        let cluster = Self::new();
        for obj in objects {
            cluster.insert(obj)?;
        }
        Ok(cluster)
    }

    /// Insert or replace an object without any checks
    pub fn insert(&self, mut obj: Object) -> Result<()> {
        let key = store_key(&obj);
        let version = self.next_version()?;
        obj.set_resource_version(&version.to_string());
        self.objects
            .write()
            .map_err(|_| lock_poisoned("insert"))?
            .insert(key, obj);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn next_version(&self) -> Result<u64> {
        let mut version = self
            .version
            .write()
            .map_err(|_| lock_poisoned("next_version"))?;
        *version += 1;
        Ok(*version)
    }
}

fn store_key(obj: &Object) -> StoreKey {
    (obj.type_meta(), obj.key())
}

fn lock_poisoned(op: &str) -> ExError {
    ExError::from(LiveDiffError::Internal {
        reason: "object store lock poisoned".to_string(),
    })
    .with_op(op.to_string())
}

fn validate_object(obj: &Object, op: &str) -> Result<()> {
    if obj.api_version().is_empty() || obj.kind().is_empty() {
        return Err(ExError::from(LiveDiffError::InvalidManifest {
            reason: "apiVersion and kind must be set".to_string(),
        })
        .with_op(op.to_string()));
    }
    if obj.name().is_empty() {
        return Err(ExError::from(LiveDiffError::InvalidManifest {
            reason: format!("{} must have metadata.name", obj.kind()),
        })
        .with_op(op.to_string()));
    }
    Ok(())
}

impl ClusterClient for MemoryCluster {
    fn get(&self, _ctx: &RequestContext, type_meta: &TypeMeta, key: &ObjectKey) -> Result<Object> {
        let objects = self.objects.read().map_err(|_| lock_poisoned("get"))?;
        objects
            .get(&(type_meta.clone(), key.clone()))
            .cloned()
            .ok_or_else(|| {
                ExError::from(LiveDiffError::ObjectNotFound {
                    resource: type_meta.resource(),
                    name: key.name.clone(),
                })
                .with_op("get")
            })
    }

    fn create(&self, _ctx: &RequestContext, obj: &Object, mode: DryRunMode) -> Result<()> {
        validate_object(obj, "create")?;
        let key = store_key(obj);
        if self
            .objects
            .read()
            .map_err(|_| lock_poisoned("create"))?
            .contains_key(&key)
        {
            return Err(ExError::from(LiveDiffError::AlreadyExists {
                resource: key.0.resource(),
                name: key.1.name,
            })
            .with_op("create"));
        }
        if mode == DryRunMode::All {
            return Ok(());
        }
        self.insert(obj.clone())
    }

    fn update(&self, _ctx: &RequestContext, obj: &Object, mode: DryRunMode) -> Result<()> {
        validate_object(obj, "update")?;
        let key = store_key(obj);
        let current_version = {
            let objects = self.objects.read().map_err(|_| lock_poisoned("update"))?;
            match objects.get(&key) {
                Some(current) => current.resource_version().to_string(),
                None => {
                    return Err(ExError::from(LiveDiffError::ObjectNotFound {
                        resource: key.0.resource(),
                        name: key.1.name,
                    })
                    .with_op("update"))
                }
            }
        };
        let expected = obj.resource_version();
        if !expected.is_empty() && expected != current_version {
            return Err(ExError::from(LiveDiffError::Conflict {
                resource: key.0.resource(),
                name: key.1.name,
                expected: expected.to_string(),
                actual: current_version,
            })
            .with_op("update"));
        }
        if mode == DryRunMode::All {
            return Ok(());
        }
        self.insert(obj.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_map(name: &str) -> Object {
        Object::new(&TypeMeta::new("v1", "ConfigMap"), "default", name)
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let cluster = MemoryCluster::new();
        let err = cluster
            .get(
                &RequestContext::new(),
                &TypeMeta::new("core.oam.dev/v1alpha1", "Workflow"),
                &ObjectKey::new("default", "myworker"),
            )
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(err
            .to_string()
            .contains("workflows.core.oam.dev \"myworker\" not found"));
    }

    #[test]
    fn test_dry_run_create_does_not_persist() {
        let cluster = MemoryCluster::new();
        let ctx = RequestContext::new();

        cluster
            .create(&ctx, &config_map("cm"), DryRunMode::All)
            .unwrap();
        assert!(cluster.is_empty());

        cluster
            .create(&ctx, &config_map("cm"), DryRunMode::None)
            .unwrap();
        assert_eq!(cluster.len(), 1);
    }

    #[test]
    fn test_update_checks_resource_version() {
        let cluster = MemoryCluster::with_objects([config_map("cm")]).unwrap();
        let ctx = RequestContext::new();

        let mut stale = config_map("cm");
        stale.set_resource_version("999");
        let err = cluster.update(&ctx, &stale, DryRunMode::All).unwrap_err();
        assert_eq!(err.code(), "ERR_CONFLICT");

        let live = cluster
            .get(&ctx, &TypeMeta::new("v1", "ConfigMap"), &ObjectKey::new("default", "cm"))
            .unwrap();
        cluster.update(&ctx, &live, DryRunMode::All).unwrap();
    }

    #[test]
    fn test_create_existing_fails() {
        let cluster = MemoryCluster::with_objects([config_map("cm")]).unwrap();
        let err = cluster
            .create(&RequestContext::new(), &config_map("cm"), DryRunMode::All)
            .unwrap_err();
        assert_eq!(err.code(), "ERR_ALREADY_EXISTS");
    }
}
