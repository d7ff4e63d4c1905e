// src/deploy/artifacts.rs

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::errors::{BundleError, Result};
use crate::types::BuildTool;

/// Where to look for build outputs and which files count as artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    output_dir: PathBuf,
    patterns: Vec<String>,
}

impl ArtifactLocator {
    pub fn new(output_dir: impl Into<PathBuf>, patterns: Vec<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            patterns,
        }
    }

    /// Conventional output directory of `tool` inside `project_dir`.
    pub fn for_tool(project_dir: &Path, tool: BuildTool, patterns: Vec<String>) -> Self {
        Self::new(project_dir.join(tool.output_dir()), patterns)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn locate(&self) -> Result<Vec<PathBuf>> {
        locate_artifacts(&self.output_dir, &self.patterns)
    }
}

/// Files directly inside `output_dir` whose names match any of `patterns`
/// (e.g. `*.jar`, `*.war`), sorted by path.
///
/// An empty result is a deploy precondition failure: the build did not
/// produce anything to deploy.
pub fn locate_artifacts(output_dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let globs = compile_patterns(patterns)?;

    if !output_dir.is_dir() {
        return Err(BundleError::DeployPrecondition(format!(
            "build output directory {:?} does not exist",
            output_dir
        )));
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(output_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        if globs.is_match(Path::new(name)) {
            debug!(artifact = %path.display(), "matched build artifact");
            found.push(path);
        }
    }
    found.sort();

    if found.is_empty() {
        return Err(BundleError::DeployPrecondition(format!(
            "no artifacts matching {:?} found in {:?}",
            patterns, output_dir
        )));
    }

    Ok(found)
}

fn compile_patterns(patterns: &[String]) -> Result<GlobSet> {
    if patterns.is_empty() {
        return Err(BundleError::ConfigError(
            "at least one artifact pattern is required".to_string(),
        ));
    }

    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|e| {
            BundleError::ConfigError(format!("invalid artifact pattern '{pat}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| BundleError::ConfigError(format!("building artifact globset: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Vec<String> {
        vec!["*.jar".to_string(), "*.war".to_string()]
    }

    #[test]
    fn finds_matching_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.war"), b"w").unwrap();
        fs::write(dir.path().join("a.jar"), b"j").unwrap();
        fs::write(dir.path().join("notes.txt"), b"t").unwrap();
        fs::create_dir(dir.path().join("classes.jar")).unwrap();

        let found = locate_artifacts(dir.path(), &patterns()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jar", "b.war"]);
    }

    #[test]
    fn nothing_to_deploy_is_precondition_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"t").unwrap();

        match locate_artifacts(dir.path(), &patterns()) {
            Err(BundleError::DeployPrecondition(msg)) => assert!(msg.contains("no artifacts")),
            other => panic!("expected DeployPrecondition, got {other:?}"),
        }
    }

    #[test]
    fn missing_output_dir_is_precondition_failure() {
        let dir = tempfile::tempdir().unwrap();
        let locator = ArtifactLocator::for_tool(dir.path(), BuildTool::Maven, patterns());
        assert!(matches!(
            locator.locate(),
            Err(BundleError::DeployPrecondition(_))
        ));
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = locate_artifacts(dir.path(), &["[".to_string()]);
        assert!(matches!(res, Err(BundleError::ConfigError(_))));
    }
}
