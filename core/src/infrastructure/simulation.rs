// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deterministic capability implementations for tests and dry runs.
//!
//! Simulation is the same pipeline with these adapters substituted — not a
//! separate orchestrator. The forced outcome and synthetic sizes come from
//! configuration, so the full admission/poll flow can run with no ssh,
//! rsync, or MySQL anywhere near the process.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::domain::provision::{DataMover, ProvisionError, SizeProbe, SpaceChecker};
use crate::domain::source::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedOutcome {
    Succeed,
    Fail,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimulationSettings {
    pub force: Option<ForcedOutcome>,
    pub source_bytes: Option<u64>,
    pub free_bytes: Option<u64>,
}

const DEFAULT_SOURCE_BYTES: u64 = 1024;

#[derive(Clone)]
pub struct SimulatedSizeProbe {
    settings: SimulationSettings,
}

impl SimulatedSizeProbe {
    pub fn new(settings: SimulationSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SizeProbe for SimulatedSizeProbe {
    async fn source_size_bytes(&self, source: &SourceLocation) -> Result<u64, ProvisionError> {
        let size = match self.settings.force {
            Some(ForcedOutcome::Fail) => u64::MAX,
            Some(ForcedOutcome::Succeed) => 0,
            None => self.settings.source_bytes.unwrap_or(DEFAULT_SOURCE_BYTES),
        };
        debug!(%source, size, "simulated size probe");
        Ok(size)
    }
}

#[derive(Clone)]
pub struct SimulatedSpaceChecker {
    settings: SimulationSettings,
}

impl SimulatedSpaceChecker {
    pub fn new(settings: SimulationSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SpaceChecker for SimulatedSpaceChecker {
    async fn available_bytes(&self, _mount: &Path) -> Result<u64, ProvisionError> {
        Ok(match self.settings.force {
            Some(ForcedOutcome::Fail) => 0,
            Some(ForcedOutcome::Succeed) => u64::MAX,
            None => self.settings.free_bytes.unwrap_or(u64::MAX),
        })
    }
}

/// Accepts every transfer without touching the source.
#[derive(Clone, Default)]
pub struct SimulatedDataMover;

#[async_trait]
impl DataMover for SimulatedDataMover {
    async fn transfer(&self, source: &SourceLocation, dest: &Path) -> Result<(), ProvisionError> {
        debug!(%source, dest = %dest.display(), "simulated transfer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn synthetic_sizes_flow_through() {
        let settings = SimulationSettings {
            force: None,
            source_bytes: Some(2_000),
            free_bytes: Some(1_000),
        };
        let src = SourceLocation::parse("host:/src").unwrap();
        assert_eq!(
            SimulatedSizeProbe::new(settings)
                .source_size_bytes(&src)
                .await
                .unwrap(),
            2_000
        );
        assert_eq!(
            SimulatedSpaceChecker::new(settings)
                .available_bytes(Path::new("/data"))
                .await
                .unwrap(),
            1_000
        );
    }

    #[tokio::test]
    async fn forced_failure_reports_no_free_space() {
        let settings = SimulationSettings {
            force: Some(ForcedOutcome::Fail),
            ..Default::default()
        };
        assert_eq!(
            SimulatedSpaceChecker::new(settings)
                .available_bytes(Path::new("/data"))
                .await
                .unwrap(),
            0
        );
    }
}
