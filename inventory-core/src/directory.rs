//! Source and NGO directory
//!
//! Identity and display metadata are owned by the upstream CRUD layer;
//! this is the read-mostly mirror the reporting path resolves names
//! through. Upserts arrive from outside, the core never invents entries.

use crate::types::{NgoId, NgoProfile, SourceId, SourceProfile};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Read-mostly mirror of source/NGO identity
#[derive(Debug, Default)]
pub struct Directory {
    sources: RwLock<HashMap<SourceId, SourceProfile>>,
    ngos: RwLock<HashMap<NgoId, NgoProfile>>,
}

impl Directory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a source profile
    pub fn upsert_source(&self, profile: SourceProfile) {
        self.sources.write().insert(profile.source_id, profile);
    }

    /// Insert or replace an NGO profile
    pub fn upsert_ngo(&self, profile: NgoProfile) {
        self.ngos.write().insert(profile.ngo_id, profile);
    }

    /// Look up a source profile
    pub fn source(&self, source_id: SourceId) -> Option<SourceProfile> {
        self.sources.read().get(&source_id).cloned()
    }

    /// Look up an NGO profile
    pub fn ngo(&self, ngo_id: NgoId) -> Option<NgoProfile> {
        self.ngos.read().get(&ngo_id).cloned()
    }

    /// Display name for a source, with a stable fallback for unknown ids
    pub fn source_name(&self, source_id: SourceId) -> String {
        self.source(source_id)
            .map(|p| p.name)
            .unwrap_or_else(|| format!("source-{}", source_id))
    }

    /// Display name for an NGO, with a stable fallback for unknown ids
    pub fn ngo_name(&self, ngo_id: NgoId) -> String {
        self.ngo(ngo_id)
            .map(|p| p.name)
            .unwrap_or_else(|| format!("ngo-{}", ngo_id))
    }
}
