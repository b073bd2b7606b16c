//! sdkdiff configuration loading from `.sdkdiff.toml`.
//!
//! Configuration is optional. Missing files and missing keys fall back to
//! defaults; command-line flags override whatever is configured here.
//!
//! # Example Configuration
//!
//! ```toml
//! [build]
//! work_dir = ".sdkdiff"
//! package_command = "swift build -Xswiftc -enable-library-evolution -Xswiftc -emit-module-interface"
//! project_command = "xcodebuild -scheme {scheme} -destination 'platform=macOS,variant=Mac Catalyst' -derivedDataPath .build build"
//! describe_command = "swift package describe --type json"
//!
//! [dump]
//! build_dir = ".build"
//! products_dir = ".build/Build/Products/Debug-maccatalyst"
//!
//! [output]
//! format = "markdown"
//! color = true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use sdkdiff_core::DumpLayout;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".sdkdiff.toml";

/// Root configuration structure loaded from `.sdkdiff.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct SdkdiffConfig {
    /// How projects are checked out and built.
    #[serde(default)]
    pub build: BuildConfig,

    /// Where build products are looked up.
    #[serde(default)]
    pub dump: DumpLayout,

    /// Output formatting preferences.
    #[serde(default)]
    pub output: OutputSettings,
}

/// Build settings.
///
/// Commands run through `sh -c` inside the project directory. `{scheme}`
/// is replaced with the scheme passed on the command line.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory remote sources are cloned into.
    pub work_dir: PathBuf,
    /// Build command for packages (no scheme).
    pub package_command: String,
    /// Build command for projects (scheme given).
    pub project_command: String,
    /// Command printing the JSON package description.
    pub describe_command: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from(".sdkdiff"),
            package_command: "swift build -Xswiftc -enable-library-evolution -Xswiftc -emit-module-interface".to_string(),
            project_command: "xcodebuild -scheme {scheme} -destination 'platform=macOS,variant=Mac Catalyst' -derivedDataPath .build BUILD_LIBRARY_FOR_DISTRIBUTION=YES build".to_string(),
            describe_command: "swift package describe --type json".to_string(),
        }
    }
}

/// Output formatting preferences.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Default report format: `markdown`, `json` or `table`.
    #[serde(default)]
    pub format: Option<String>,

    /// Whether to use colored output. `None` means auto-detect.
    #[serde(default)]
    pub color: Option<bool>,
}

impl SdkdiffConfig {
    /// Load `.sdkdiff.toml` from the given directory.
    ///
    /// If the file doesn't exist or can't be parsed, returns defaults.
    /// Parse errors are logged as warnings but don't cause failures.
    pub fn load(root: &Path) -> Self {
        Self::load_file(&root.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from an explicit file path.
    pub fn load_file(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", config_path.display(), e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", config_path.display(), e);
                }
            }
        }
        Self::default()
    }

    /// Get the default output format, if configured.
    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    /// Returns the configured color preference, or `None` to auto-detect.
    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }
}
