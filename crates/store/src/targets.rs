use shardline_runtime::{MEMORY_TARGET, SHARD_PLACEHOLDER};

use crate::error::BackendError;

/// Where each shard's database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardTargets {
    /// One target string with `{shard}` substituted per index.
    Template(String),
    /// Targets listed one per shard, in shard order.
    Explicit(Vec<String>),
}

impl ShardTargets {
    /// A template must name each shard distinctly unless it is the in-memory target.
    pub fn template(template: impl Into<String>) -> Result<Self, BackendError> {
        let template = template.into();
        if template != MEMORY_TARGET && !template.contains(SHARD_PLACEHOLDER) {
            return Err(BackendError::InvalidTarget(template));
        }
        Ok(Self::Template(template))
    }

    pub fn explicit(targets: Vec<String>) -> Result<Self, BackendError> {
        if let Some(empty) = targets.iter().find(|t| t.trim().is_empty()) {
            return Err(BackendError::InvalidTarget(empty.clone()));
        }
        Ok(Self::Explicit(targets))
    }

    pub fn memory() -> Self {
        Self::Template(MEMORY_TARGET.to_owned())
    }

    /// Number of shards this set can address, `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        match self {
            ShardTargets::Template(_) => None,
            ShardTargets::Explicit(targets) => Some(targets.len()),
        }
    }

    pub fn target(&self, shard: usize) -> Result<String, BackendError> {
        match self {
            ShardTargets::Template(template) => {
                Ok(template.replace(SHARD_PLACEHOLDER, &shard.to_string()))
            }
            ShardTargets::Explicit(targets) => targets
                .get(shard)
                .cloned()
                .ok_or(BackendError::MissingTarget(shard)),
        }
    }
}

#[cfg(test)]
#[path = "targets_tests.rs"]
mod tests;
