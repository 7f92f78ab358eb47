// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lib
//!
//! Core library of the LLM gateway: provider catalogue and configuration,
//! lazy service registry, request dispatch and the HTTP surface.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Everything the `llm-gateway` binary serves

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
