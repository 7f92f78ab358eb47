// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod dispatcher;
pub mod health;
pub mod registry;

// Re-export services for convenience
pub use dispatcher::{DispatchError, RequestDispatcher};
pub use health::{GatewayHealth, HealthReporter, HealthState, ProviderHealth};
pub use registry::{HandleScope, RegistryError, ServiceHandle, ServiceRegistry, SlotState};
