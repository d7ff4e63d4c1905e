#![allow(dead_code)]

//! Throwaway projects with a fake `mvnw` wrapper.
//!
//! The wrapper is a POSIX shell script understanding a few goals:
//!
//! | goal      | effect                                                        |
//! |-----------|---------------------------------------------------------------|
//! | `clean`   | removes `target/`                                             |
//! | `package` | writes `target/app-1.0.jar`, logs `BUILD SUCCESS`             |
//! | `fail`    | logs an error on stderr and exits 1                           |
//! | `nomark`  | exits 0 without ever logging the marker                       |
//! | `flood`   | writes `FLOOD_LINES` lines to stdout and stderr               |
//! | `watch`   | logs `BUILD SUCCESS` `WATCH_ROUNDS` times, 200ms apart, exits |
//! | `forever` | blocks until killed                                           |

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const ARTIFACT_NAME: &str = "app-1.0.jar";

const FAKE_MVNW: &str = r#"#!/bin/sh
for goal in "$@"; do
  case "$goal" in
    clean)
      rm -rf target
      echo "[INFO] --- clean ---"
      ;;
    package)
      mkdir -p target
      echo "bundle-$(date +%s%N)" > target/app-1.0.jar
      echo "[INFO] --- package ---"
      echo "[INFO] BUILD SUCCESS"
      ;;
    fail)
      echo "[ERROR] goal 'fail' failed" >&2
      echo "[INFO] BUILD FAILURE"
      exit 1
      ;;
    nomark)
      echo "[INFO] nothing to do"
      exit 0
      ;;
    flood)
      i=0
      while [ "$i" -lt "${FLOOD_LINES:-20000}" ]; do
        echo "stdout line $i padding-padding-padding-padding-padding"
        echo "stderr line $i padding-padding-padding-padding-padding" >&2
        i=$((i + 1))
      done
      ;;
    watch)
      i=0
      while [ "$i" -lt "${WATCH_ROUNDS:-2}" ]; do
        sleep 0.2
        echo "[INFO] Changes detected - recompiling"
        echo "[INFO] BUILD SUCCESS"
        i=$((i + 1))
      done
      exit 0
      ;;
    forever)
      echo "[INFO] waiting for changes"
      exec sleep 30
      ;;
    *)
      echo "[INFO] --- $goal ---"
      ;;
  esac
done
"#;

/// A temporary project directory.
pub struct FixtureProject {
    dir: TempDir,
}

impl FixtureProject {
    /// Empty project: no wrapper, no descriptor.
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("creating fixture dir"),
        }
    }

    /// Maven-style project whose `mvnw` behaves like a healthy build.
    pub fn known_good() -> Self {
        Self::empty()
            .with_file("pom.xml", "<project/>")
            .with_wrapper(FAKE_MVNW)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.path().join("target").join(ARTIFACT_NAME)
    }

    pub fn with_file(self, rel: &str, contents: &str) -> Self {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("creating fixture subdir");
        }
        fs::write(path, contents).expect("writing fixture file");
        self
    }

    /// Write an executable `mvnw` with the given script body.
    pub fn with_wrapper(self, script: &str) -> Self {
        let path = self.path().join("mvnw");
        fs::write(&path, script).expect("writing fixture wrapper");
        make_executable(&path);
        self
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path).expect("wrapper metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod wrapper");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}
