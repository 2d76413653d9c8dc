// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Known-collections view for admin listings.
//!
//! The view is the sorted, deduplicated union of the configured default
//! collections and whatever the registry currently reports. It is a cache:
//! [`KnownCollections::refresh`] rebuilds it from the store, and nothing
//! treats it as authoritative in between.

use std::collections::BTreeSet;

use super::manifest::{registrable_name, SkipReason};
use super::{Registry, RegistrationTask};

/// Union of `defaults` and `dynamic`, blank names dropped, sorted.
#[must_use]
pub fn known_collections(defaults: &[String], dynamic: &[String]) -> Vec<String> {
    defaults
        .iter()
        .chain(dynamic.iter())
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Client-side list of collections an admin UI can offer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownCollections {
    names: Vec<String>,
}

impl KnownCollections {
    #[must_use]
    pub fn from_defaults(defaults: &[String]) -> Self {
        Self {
            names: known_collections(defaults, &[]),
        }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).is_ok()
    }

    /// Rebuild from the registry. A failed registry read leaves only the defaults.
    pub async fn refresh(&mut self, registry: &Registry) -> &[String] {
        self.names = registry.list_known_collections().await;
        &self.names
    }

    /// Insert keeping the list sorted and unique. Returns `false` if already present.
    pub fn insert(&mut self, name: &str) -> bool {
        match self.names.binary_search_by(|n| n.as_str().cmp(name)) {
            Ok(_) => false,
            Err(pos) => {
                self.names.insert(pos, name.to_string());
                true
            }
        }
    }

    /// Manually add a collection: show it immediately and register it in the
    /// background. Blank or unusable names are ignored.
    pub fn add_manual(&mut self, registry: &Registry, raw: &str) -> Option<RegistrationTask> {
        let name = match registrable_name(raw) {
            Ok(name) => name,
            Err(SkipReason::Reserved) => raw.trim(),
            Err(SkipReason::Empty | SkipReason::Invalid) => return None,
        };
        self.insert(name);
        Some(registry.register_detached(name))
    }
}
