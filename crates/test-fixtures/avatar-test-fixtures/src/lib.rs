use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

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
    clips: HashMap<String, String>,
    configs: HashMap<String, String>,
    speechmarks: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a>(map: &'a HashMap<String, String>, kind: &str, name: &str) -> Result<&'a str> {
    map.get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Stored-animation clip JSON, one clip per file.
pub mod clips {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.clips.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(&MANIFEST.clips, "clip", name)?)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        Ok(resolve_path(lookup(&MANIFEST.clips, "clip", name)?))
    }

    /// Every clip JSON whose name starts with `prefix`, sorted by name.
    pub fn with_prefix(prefix: &str) -> Result<Vec<(String, String)>> {
        keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .map(|k| json(&k).map(|j| (k, j)))
            .collect()
    }
}

/// Gesture, point-of-interest and host configuration files.
pub mod configs {
    use super::*;

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(&MANIFEST.configs, "config", name)?)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        load_json(lookup(&MANIFEST.configs, "config", name)?)
    }
}

/// Raw provider timing events as recorded from a synthesis call.
pub mod speechmarks {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.speechmarks.keys().cloned().collect()
    }

    pub fn raw(name: &str) -> Result<String> {
        read_to_string(lookup(&MANIFEST.speechmarks, "speechmark", name)?)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        load_json(lookup(&MANIFEST.speechmarks, "speechmark", name)?)
    }
}
