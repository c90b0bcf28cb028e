// Copyright (c) 2026 Vryndara contributors
// SPDX-License-Identifier: AGPL-3.0
//! Build Script for vryndara-kernel
//!
//! Compiles `../proto/vryndara.proto` into tonic client and server stubs.
//! Generated code lands in `OUT_DIR` and is pulled in with
//! `tonic::include_proto!` from `src/presentation/grpc/mod.rs`.
//!
//! `protoc` comes from `protoc-bin-vendored`, so no system install is needed.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let protoc = protoc_bin_vendored::protoc_bin_path()?;
    std::env::set_var("PROTOC", protoc);

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["../proto/vryndara.proto"], &["../proto"])?;

    println!("cargo:rerun-if-changed=../proto/vryndara.proto");

    Ok(())
}
