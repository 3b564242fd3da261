// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod provisioner;

pub use provisioner::{
    AdmissionAck, AdmitRequest, HealthView, PipelineSettings, ProvisioningService,
    StandardProvisioningService, StatusView,
};
