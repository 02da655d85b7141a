// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Injected host accessors.
//!
//! The bootstrap sequence never touches process-global filesystem or
//! environment state directly; it goes through these traits so the
//! install phase can be tested deterministically, including failure
//! injection. [`OsFs`]/[`OsEnv`] are the real implementations;
//! [`InMemoryFs`]/[`InMemoryEnv`] back the test suites.

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::NamedUtf8TempFile;
use std::collections::BTreeMap;
use std::io;
use std::io::Write;
use std::sync::Mutex;

/// Read/write access to named environment variables.
pub trait HostEnv: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str);
}

/// Read/write access to named files.
pub trait HostFs: Send + Sync {
    fn read(&self, path: &Utf8Path) -> io::Result<Vec<u8>>;

    /// Write `data` to `path`, creating parent directories as needed.
    ///
    /// The write is atomic from the caller's perspective: a reader never
    /// observes a partially-written file at `path`.
    fn write(&self, path: &Utf8Path, data: &[u8]) -> io::Result<()>;
}

/// The process's real environment.
#[derive(Debug, Default)]
pub struct OsEnv;

impl HostEnv for OsEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn set(&self, name: &str, value: &str) {
        std::env::set_var(name, value);
    }
}

/// The real filesystem. Writes go to a temporary sibling first and are
/// renamed into place.
#[derive(Debug, Default)]
pub struct OsFs;

impl HostFs for OsFs {
    fn read(&self, path: &Utf8Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&self, path: &Utf8Path, data: &[u8]) -> io::Result<()> {
        let parent = path.parent().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path {path:?} has no parent directory"),
            )
        })?;
        std::fs::create_dir_all(parent)?;
        // Stage under a unique name in the same directory so the rename
        // is atomic and can never consume a sibling file.
        let mut tmp = NamedUtf8TempFile::new_in(parent)?;
        tmp.write_all(data)?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// In-memory environment for tests.
#[derive(Debug, Default)]
pub struct InMemoryEnv {
    vars: Mutex<BTreeMap<String, String>>,
}

impl InMemoryEnv {
    pub fn remove(&self, name: &str) {
        self.vars.lock().unwrap().remove(name);
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.vars.lock().unwrap().clone()
    }
}

impl HostEnv for InMemoryEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.lock().unwrap().get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        self.vars
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }
}

/// In-memory filesystem for tests.
#[derive(Debug, Default)]
pub struct InMemoryFs {
    files: Mutex<BTreeMap<Utf8PathBuf, Vec<u8>>>,
}

impl InMemoryFs {
    pub fn snapshot(&self) -> BTreeMap<Utf8PathBuf, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }
}

impl HostFs for InMemoryFs {
    fn read(&self, path: &Utf8Path) -> io::Result<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, path.to_string())
        })
    }

    fn write(&self, path: &Utf8Path, data: &[u8]) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }
}
