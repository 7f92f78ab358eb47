// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Per-request credential override. Lives only as long as the request-scoped
// service handle built from it; never stored in the registry.

use std::fmt;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl Credentials {
    /// Build an override from raw header values. Blank values count as
    /// absent; returns `None` when nothing is left.
    pub fn from_parts(api_key: Option<&str>, base_url: Option<&str>) -> Option<Self> {
        let clean = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let credentials = Self {
            api_key: clean(api_key),
            base_url: clean(base_url),
        };
        if credentials.is_empty() {
            None
        } else {
            Some(credentials)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.is_none() && self.base_url.is_none()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}
