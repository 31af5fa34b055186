//! Instance registry - discovery and loading of generated instances

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::constants::{MANIFEST_FILE, extensions};
use crate::error::AppResult;
use crate::models::{Instance, InstanceId};
use crate::utils::{natural_sort_by_key, now_utc};

/// Instance list recorded by the generation stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub instances: Vec<InstanceId>,
}

/// Read-only view of the instance store
#[derive(Debug, Clone)]
pub struct InstanceRegistry {
    dir: PathBuf,
}

impl InstanceRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stored file of an instance
    pub fn instance_path(&self, id: &InstanceId) -> PathBuf {
        self.dir.join(format!("{}.{}", id, extensions::INSTANCE))
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// All stored instances in natural order
    ///
    /// The manifest is authoritative when present and readable; otherwise
    /// the directory is scanned. A missing directory yields an empty list.
    pub async fn list_instances(&self) -> AppResult<Vec<InstanceId>> {
        let manifest = match self.read_manifest().await {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::warn!(
                    manifest = %self.manifest_path().display(),
                    code = e.error_code(),
                    "Ignoring unreadable manifest: {}",
                    e
                );
                None
            }
        };

        let mut ids = match manifest {
            Some(manifest) => {
                let mut present = Vec::with_capacity(manifest.instances.len());
                for id in manifest.instances {
                    if fs::try_exists(self.instance_path(&id)).await? {
                        present.push(id);
                    } else {
                        tracing::warn!(instance = %id, "Manifest entry has no instance file");
                    }
                }
                present
            }
            None => self.scan().await?,
        };

        natural_sort_by_key(&mut ids, InstanceId::to_string);
        ids.dedup();
        Ok(ids)
    }

    async fn read_manifest(&self) -> AppResult<Option<Manifest>> {
        match fs::read(self.manifest_path()).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn scan(&self) -> AppResult<Vec<InstanceId>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(dir = %self.dir.display(), "Instance directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(extensions::INSTANCE) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match stem.parse::<InstanceId>() {
                Ok(id) => ids.push(id),
                Err(_) => {
                    tracing::warn!(file = %path.display(), "Ignoring file with unrecognized instance name");
                }
            }
        }

        Ok(ids)
    }

    /// Record the generated instance list
    pub async fn write_manifest(&self, instances: &[InstanceId]) -> AppResult<()> {
        let manifest = Manifest {
            generated_at: now_utc(),
            instances: instances.to_vec(),
        };
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.manifest_path(), serde_json::to_vec_pretty(&manifest)?).await?;
        Ok(())
    }

    /// Raw stored bytes, exactly what solvers receive on stdin
    pub async fn read_raw(&self, id: &InstanceId) -> AppResult<Vec<u8>> {
        Ok(fs::read(self.instance_path(id)).await?)
    }

    /// Parsed instance
    pub async fn load(&self, id: &InstanceId) -> AppResult<Instance> {
        let text = fs::read_to_string(self.instance_path(id)).await?;
        Instance::parse(id.clone(), &text)
    }
}
