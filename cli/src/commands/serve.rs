// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Daemon startup: wire the capability set from configuration and serve the
//! HTTP surface. Simulation mode swaps in the deterministic adapters; the
//! pipeline itself is the same either way.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use tempoftp_core::application::provisioner::{
    PipelineSettings, ProvisioningService, StandardProvisioningService,
};
use tempoftp_core::domain::provision::{AccountDirectory, DataMover, SizeProbe, SpaceChecker};
use tempoftp_core::domain::repository::RequestRepository;
use tempoftp_core::infrastructure::accounts::{InMemoryAccountDirectory, MySqlAccountDirectory};
use tempoftp_core::infrastructure::config::ServiceConfig;
use tempoftp_core::infrastructure::crypto::SecretCipher;
use tempoftp_core::infrastructure::mover::SystemDataMover;
use tempoftp_core::infrastructure::probe::{MountSpaceChecker, SshSizeProbe};
use tempoftp_core::infrastructure::repositories::SqliteRequestRepository;
use tempoftp_core::infrastructure::simulation::{
    SimulatedDataMover, SimulatedSizeProbe, SimulatedSpaceChecker,
};
use tempoftp_core::presentation::api;

pub async fn run(host: &str, port: u16) -> Result<()> {
    let config = ServiceConfig::from_env().context("invalid configuration")?;
    let simulation = config.simulation;
    let service = build_service(config).await?;
    let app = api::app(service);

    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}"))
        .await
        .with_context(|| format!("could not bind {host}:{port}"))?;
    info!(host, port, simulation, "tempoftp daemon listening");
    axum::serve(listener, app)
        .await
        .context("server terminated")?;
    Ok(())
}

async fn build_service(config: ServiceConfig) -> Result<Arc<dyn ProvisioningService>> {
    let repository: Arc<dyn RequestRepository> = Arc::new(
        SqliteRequestRepository::connect(&config.store_path)
            .await
            .context("could not open request store")?,
    );
    let cipher = Arc::new(SecretCipher::new(&config.encryption_key));
    let settings = PipelineSettings {
        staging_root: config.staging_root.clone(),
        min_free_bytes: config.min_free_bytes,
        owner: config.owner.clone(),
    };

    let (size_probe, space_checker, mover, accounts): (
        Arc<dyn SizeProbe>,
        Arc<dyn SpaceChecker>,
        Arc<dyn DataMover>,
        Arc<dyn AccountDirectory>,
    ) = if config.simulation {
        info!("simulation mode: deterministic capability set in use");
        (
            Arc::new(SimulatedSizeProbe::new(config.sim)),
            Arc::new(SimulatedSpaceChecker::new(config.sim)),
            Arc::new(SimulatedDataMover),
            Arc::new(InMemoryAccountDirectory::new(config.hash_scheme)),
        )
    } else {
        let url = config
            .accounts_url
            .as_deref()
            .context("TEMPOFTP_ACCOUNTS_URL must be set outside simulation mode")?;
        let directory = MySqlAccountDirectory::connect(
            url,
            config.hash_scheme,
            config.account_uid,
            config.account_gid,
        )
        .await
        .context("could not reach the account directory")?;
        (
            Arc::new(SshSizeProbe::new(config.ssh_user.clone())),
            Arc::new(MountSpaceChecker),
            Arc::new(SystemDataMover::new(config.ssh_user.clone())),
            Arc::new(directory),
        )
    };

    Ok(Arc::new(StandardProvisioningService::new(
        repository,
        size_probe,
        space_checker,
        mover,
        accounts,
        cipher,
        settings,
    )))
}
