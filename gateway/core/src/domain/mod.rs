// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Provider catalogue, the provider capability interface, request and
//! response contracts, and gateway configuration.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Types shared by every other layer

pub mod credentials;
pub mod gateway_config;
pub mod llm;
pub mod provider;
pub mod request;
pub mod response;
