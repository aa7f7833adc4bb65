// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Storage for processed images

pub mod artifacts;

pub use artifacts::{ArtifactStore, StorageError, StoredArtifact, DEFAULT_MAX_ARTIFACTS};
