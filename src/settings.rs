use std::ffi::OsString;
use std::path::{Path, PathBuf};
use crate::error::{ConfigError, Result};
use crate::profile::DEFAULT_PROFILE_FILE;

/// Environment variable naming the SDK installation root
pub const TOOL_HOME_ENV: &str = "DEVECO_SDK_HOME";

/// Installation root used when the environment does not provide one
pub const DEFAULT_TOOL_HOME: &str = "/Applications/DevEco-Studio.app/Contents/sdk/default/openharmony";

/// Location of the signing tool archive inside the tool home
pub const SIGN_TOOL_JAR: &str = "toolchains/lib/hap-sign-tool.jar";

/// Where the signing tool installation lives.
///
/// A value supplied through the environment always wins. Without one the
/// built-in default is used, unless the deployment requires the variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolHome {
    pub value: Option<PathBuf>,
    pub default: Option<PathBuf>,
}

impl ToolHome {
    /// Fixed-path deployment: environment override, falling back to the default
    pub fn with_default(value: Option<PathBuf>) -> Self {
        ToolHome {
            value,
            default: Some(PathBuf::from(DEFAULT_TOOL_HOME)),
        }
    }

    /// Environment deployment: the variable must be set
    pub fn required(value: Option<PathBuf>) -> Self {
        ToolHome { value, default: None }
    }

    /// Resolve to a concrete directory
    pub fn resolve(&self) -> Result<PathBuf> {
        match (&self.value, &self.default) {
            (Some(value), _) if !value.as_os_str().is_empty() => Ok(value.clone()),
            (_, Some(default)) => Ok(default.clone()),
            _ => Err(ConfigError::MissingToolHome(TOOL_HOME_ENV.to_string()).into()),
        }
    }
}

/// External decryption helper, run as `<program> <script> <certDir> <encrypted>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperCommand {
    pub program: OsString,
    pub script: PathBuf,
}

impl Default for HelperCommand {
    fn default() -> Self {
        HelperCommand {
            program: OsString::from("node"),
            script: PathBuf::from("sign.js"),
        }
    }
}

/// Everything the signer needs from its surroundings, gathered once at startup
#[derive(Debug, Clone)]
pub struct SignSettings {
    /// Directory relative paths are resolved against and children run in
    pub working_dir: PathBuf,
    /// Signing profile, relative to `working_dir` unless absolute
    pub profile_path: PathBuf,
    /// Resolved installation root of the signing tool
    pub tool_home: PathBuf,
    /// Program used to launch the tool archive
    pub java: OsString,
    pub helper: HelperCommand,
}

impl SignSettings {
    /// Settings with the stock file names for the given working directory and tool home
    pub fn new(working_dir: PathBuf, tool_home: &ToolHome) -> Result<Self> {
        Ok(SignSettings {
            working_dir,
            profile_path: PathBuf::from(DEFAULT_PROFILE_FILE),
            tool_home: tool_home.resolve()?,
            java: OsString::from("java"),
            helper: HelperCommand::default(),
        })
    }

    /// Absolute location of the signing profile
    pub fn profile_file(&self) -> PathBuf {
        self.anchor(&self.profile_path)
    }

    /// Absolute location of hap-sign-tool.jar
    pub fn sign_tool_jar(&self) -> PathBuf {
        self.anchor(&self.tool_home).join(SIGN_TOOL_JAR)
    }

    fn anchor(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}
