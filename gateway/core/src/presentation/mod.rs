// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`llm-gateway-core`)
//!
//! HTTP surface that translates external requests into application service
//! calls. Handlers only extract, delegate and map errors to status codes.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Per-provider REST endpoints, health and service descriptor |

pub mod api;
