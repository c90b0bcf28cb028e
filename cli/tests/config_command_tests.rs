// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0

//! Generated configuration files must load and validate as-is.

use vryndara_cli::commands::config::{generate, EXAMPLES_TEMPLATE, MINIMAL_TEMPLATE};
use vryndara_kernel::domain::kernel_config::{KernelConfigManifest, StorageBackendKind};

#[test]
fn test_minimal_template_is_valid() {
    let config = KernelConfigManifest::from_yaml_str(MINIMAL_TEMPLATE).unwrap();
    config.validate().unwrap();

    assert_eq!(config.spec.network.grpc_port, 50051);
    assert_eq!(config.spec.storage.backend, StorageBackendKind::InMemory);
    assert_eq!(config.spec.subscription.stream_buffer, 32);
}

#[test]
fn test_examples_template_is_valid() {
    let config = KernelConfigManifest::from_yaml_str(EXAMPLES_TEMPLATE).unwrap();
    config.validate().unwrap();

    assert_eq!(config.spec.orchestrator.step_timeout_seconds, 120);
    assert_eq!(config.logging().format, "text");
}

#[test]
fn test_generate_writes_loadable_file() {
    let dir = tempfile::tempdir().unwrap();

    for examples in [false, true] {
        let path = dir.path().join(format!("config-{}.yaml", examples));
        generate(&path, examples).unwrap();

        let config = KernelConfigManifest::from_yaml_file(&path).unwrap();
        config.validate().unwrap();
        assert_eq!(config.metadata.name, "vryndara-kernel");
    }
}

#[test]
fn test_generate_into_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("config.yaml");

    assert!(generate(&path, false).is_err());
}
