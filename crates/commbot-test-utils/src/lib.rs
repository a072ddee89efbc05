// SPDX-FileCopyrightText: 2026 Commbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Commbot integration tests.
//!
//! Provides mock adapters and catalog fixtures for fast, deterministic,
//! CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockPlatform`] - Scripted walls and profiles with captured sends
//! - [`MemoryObjectStore`] - In-memory object store with swappable content
//! - [`fixtures`] - Catalog tables and wall post builders

pub mod fixtures;
pub mod memory_store;
pub mod mock_platform;

pub use memory_store::MemoryObjectStore;
pub use mock_platform::MockPlatform;
