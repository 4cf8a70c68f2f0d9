#![allow(dead_code, unused_imports)]

use std::path::{Path, PathBuf};

use tbuild::fs::FileSystem;

pub use tbuild_test_utils::builders;
pub use tbuild_test_utils::{
    init_tracing, wait_until, with_timeout, FakeBackend, FakeEvent, FakeScript,
};

/// Artifact path used by the default `SettingsBuilder`.
pub const ARTIFACT: &str = "/work/.built";
/// Stable path used by the default `SettingsBuilder`; also the fake app's program name.
pub const APP: &str = "/work/tbuild-bin";
/// Build program used by the default `SettingsBuilder`.
pub const BUILD: &str = "go";

/// Ids of `program` processes in spawn order, interleaved with kills, as
/// `("spawn", id)` / `("kill", id)` pairs.
pub fn lifecycle(events: &[FakeEvent], program: &str) -> Vec<(&'static str, u32)> {
    let mut ids = Vec::new();
    let mut out = Vec::new();
    for event in events {
        match event {
            FakeEvent::Spawned { id, program: p, .. } if p == program => {
                ids.push(*id);
                out.push(("spawn", *id));
            }
            FakeEvent::Killed { id } if ids.contains(id) => out.push(("kill", *id)),
            FakeEvent::Exited { id, .. } if ids.contains(id) => out.push(("exit", *id)),
            _ => {}
        }
    }
    out
}

pub fn artifact() -> PathBuf {
    PathBuf::from(ARTIFACT)
}

pub fn stable() -> &'static Path {
    Path::new(APP)
}

/// Filesystem whose promotions always succeed, so overlapping run cycles
/// never race on the artifact.
#[derive(Debug)]
pub struct LenientFs;

impl FileSystem for LenientFs {
    fn rename(&self, _from: &Path, _to: &Path) -> anyhow::Result<()> {
        Ok(())
    }
    fn read(&self, _path: &Path) -> anyhow::Result<Vec<u8>> {
        Ok(Vec::new())
    }
    fn write(&self, _path: &Path, _contents: &[u8]) -> anyhow::Result<()> {
        Ok(())
    }
    fn exists(&self, _path: &Path) -> bool {
        true
    }
}
