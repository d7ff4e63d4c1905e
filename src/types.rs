use std::str::FromStr;
use std::sync::OnceLock;

use serde::Deserialize;

/// Which external build tool drives the project.
///
/// Each tool carries the handful of conventions bundlewatch relies on:
/// wrapper script names, the global fallback command, the success marker
/// printed at the end of a good build and where artifacts end up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTool {
    #[default]
    Maven,
    Gradle,
}

impl BuildTool {
    /// Project-local wrapper script for the given platform.
    pub fn wrapper_name(self, platform: Platform) -> &'static str {
        match (self, platform) {
            (BuildTool::Maven, Platform::Posix) => "mvnw",
            (BuildTool::Maven, Platform::Windows) => "mvnw.cmd",
            (BuildTool::Gradle, Platform::Posix) => "gradlew",
            (BuildTool::Gradle, Platform::Windows) => "gradlew.bat",
        }
    }

    /// Globally installed command used when no wrapper exists.
    pub fn fallback_command(self, platform: Platform) -> &'static str {
        match (self, platform) {
            (BuildTool::Maven, Platform::Posix) => "mvn",
            (BuildTool::Maven, Platform::Windows) => "mvn.cmd",
            (BuildTool::Gradle, Platform::Posix) => "gradle",
            (BuildTool::Gradle, Platform::Windows) => "gradle.bat",
        }
    }

    /// Literal line fragment printed by the tool when the whole build passed.
    pub fn success_marker(self) -> &'static str {
        match self {
            BuildTool::Maven => "BUILD SUCCESS",
            BuildTool::Gradle => "BUILD SUCCESSFUL",
        }
    }

    pub fn default_goals(self) -> &'static [&'static str] {
        match self {
            BuildTool::Maven => &["clean", "package"],
            BuildTool::Gradle => &["clean", "build"],
        }
    }

    /// Goals for the long-running incremental build used by `watch`.
    pub fn default_watch_goals(self) -> &'static [&'static str] {
        match self {
            BuildTool::Maven => &["fizzed-watcher:run"],
            BuildTool::Gradle => &["build", "--continuous"],
        }
    }

    /// Directory (relative to the project) the tool writes artifacts to.
    pub fn output_dir(self) -> &'static str {
        match self {
            BuildTool::Maven => "target",
            BuildTool::Gradle => "build/libs",
        }
    }

    /// Guess the tool from the build descriptors present in `dir`.
    pub fn detect(dir: &std::path::Path) -> Option<BuildTool> {
        if dir.join("pom.xml").is_file() {
            Some(BuildTool::Maven)
        } else if dir.join("build.gradle").is_file() || dir.join("build.gradle.kts").is_file() {
            Some(BuildTool::Gradle)
        } else {
            None
        }
    }
}

impl FromStr for BuildTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "maven" | "mvn" => Ok(BuildTool::Maven),
            "gradle" => Ok(BuildTool::Gradle),
            other => Err(format!(
                "invalid build tool: {other} (expected \"maven\" or \"gradle\")"
            )),
        }
    }
}

/// Host platform family, as far as command construction is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Posix,
}

static CURRENT_PLATFORM: OnceLock<Platform> = OnceLock::new();

impl Platform {
    /// Platform of the running process, computed once.
    pub fn current() -> Platform {
        *CURRENT_PLATFORM.get_or_init(|| Platform::from_os_name(std::env::consts::OS))
    }

    /// Classify an OS name such as `"linux"`, `"macos"` or `"Windows 10"`.
    pub fn from_os_name(name: &str) -> Platform {
        if name.trim().to_lowercase().starts_with("windows") {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    /// Whether invocations must go through `cmd.exe /c`.
    pub fn needs_shell(self) -> bool {
        matches!(self, Platform::Windows)
    }
}
