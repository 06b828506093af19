//! Shared JSON fixtures for procrig tests and benches.
//!
//! Skeletons live in the workspace `fixtures/` directory and are indexed by
//! `fixtures/manifest.json`. Loaders are generic over the target type so this crate
//! does not depend on the crates it serves.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    skeletons: BTreeMap<String, SkeletonEntry>,
}

/// Either a bare relative path or `{ "path": ..., "description": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SkeletonEntry {
    Path(String),
    Detailed { path: String },
}

impl SkeletonEntry {
    fn as_path(&self) -> &str {
        match self {
            SkeletonEntry::Path(path) | SkeletonEntry::Detailed { path } => path,
        }
    }
}

/// Skeleton definitions in the `SkeletonDef` JSON shape.
pub mod skeletons {
    use super::*;

    /// Fixture names in sorted order.
    pub fn keys() -> Vec<String> {
        MANIFEST.skeletons.keys().cloned().collect()
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = MANIFEST
            .skeletons
            .get(name)
            .ok_or_else(|| anyhow!("unknown skeleton fixture '{name}'"))?;
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(entry.as_path());
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read skeleton {name} at {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("failed to parse skeleton {name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_manifest_entry_loads() {
        let keys = skeletons::keys();
        assert!(!keys.is_empty());
        for name in keys {
            let value: serde_json::Value = skeletons::load(&name).unwrap();
            assert!(value.get("bones").is_some(), "{name} has no bones");
        }
    }

    #[test]
    fn unknown_fixture_is_an_error() {
        let err = skeletons::load::<serde_json::Value>("does-not-exist").unwrap_err();
        assert!(err.to_string().contains("does-not-exist"));
    }
}
