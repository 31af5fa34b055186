//! Instance generator adapter
//!
//! Instances are produced once by an external generator and never rewritten:
//! a stored file is reused as-is on later sweeps.

use std::sync::Arc;
use std::time::Duration;

use tokio::fs;

use crate::config::{GenerationConfig, StorageConfig, ToolchainConfig};
use crate::error::{AppError, AppResult};
use crate::models::InstanceId;

use super::process::{CommandRunner, CommandSpec};
use super::registry::InstanceRegistry;

/// What happened to one planned instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generated {
    Created,
    Reused,
}

pub struct InstanceGenerator {
    runner: Arc<dyn CommandRunner>,
    command: CommandSpec,
    time_limit: Duration,
    plan: GenerationConfig,
    registry: InstanceRegistry,
}

impl InstanceGenerator {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        toolchain: &ToolchainConfig,
        generation: GenerationConfig,
        storage: &StorageConfig,
    ) -> AppResult<Self> {
        Ok(Self {
            runner,
            command: CommandSpec::from_words(&toolchain.generator_command)?
                .current_dir(&storage.work_dir),
            time_limit: Duration::from_secs_f64(toolchain.generator_time_limit_seconds),
            plan: generation,
            registry: InstanceRegistry::new(&storage.instances_path),
        })
    }

    /// Every instance id of the plan: sizes x cost classes x seeds
    ///
    /// A size `p` is split evenly into `(p / 2, p / 2)`.
    pub fn plan(&self) -> Vec<InstanceId> {
        let mut ids = Vec::with_capacity(
            self.plan.sizes.len() * self.plan.cost_classes.len() * self.plan.seeds.len(),
        );
        for &size in &self.plan.sizes {
            let half = (size / 2) as usize;
            for class in &self.plan.cost_classes {
                for &seed in &self.plan.seeds {
                    ids.push(InstanceId::new(half, half, class.clone(), seed));
                }
            }
        }
        ids
    }

    /// Produce one instance file unless it already exists
    pub async fn generate(&self, id: &InstanceId) -> AppResult<Generated> {
        let path = self.registry.instance_path(id);
        if fs::try_exists(&path).await? {
            tracing::debug!(instance = %id, "Reusing stored instance");
            return Ok(Generated::Reused);
        }

        let invocation = self
            .runner
            .invoke(&self.command, id.generator_request().into_bytes(), Some(self.time_limit))
            .await?;

        if invocation.timed_out {
            return Err(AppError::Generator(format!(
                "{} exceeded {:?}",
                id, self.time_limit
            )));
        }
        if !invocation.success {
            return Err(AppError::Generator(format!(
                "{} (exit code {:?}): {}",
                id,
                invocation.exit_code,
                invocation.stderr_excerpt()
            )));
        }

        fs::create_dir_all(self.registry.dir()).await?;
        fs::write(&path, &invocation.stdout).await?;
        tracing::info!(
            instance = %id,
            elapsed_ms = invocation.elapsed.as_millis() as u64,
            "Generated instance"
        );
        Ok(Generated::Created)
    }

    /// Generate the whole plan and record the available ids in the manifest
    ///
    /// Failed instances are logged and left out.
    pub async fn generate_all(&self) -> AppResult<Vec<InstanceId>> {
        let mut available = Vec::new();
        for id in self.plan() {
            match self.generate(&id).await {
                Ok(_) => available.push(id),
                Err(e) => {
                    tracing::error!(instance = %id, code = e.error_code(), "{}", e);
                }
            }
        }

        self.registry.write_manifest(&available).await?;
        Ok(available)
    }
}
