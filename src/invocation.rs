use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use crate::credentials::ResolvedCredentials;
use crate::profile::SigningMaterial;

/// Subcommand of hap-sign-tool that signs an application package
pub const SIGN_APP: &str = "sign-app";

const REDACTED: &str = "***";

/// A single `-flag value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub name: &'static str,
    pub value: FlagValue,
}

#[derive(Clone, PartialEq, Eq)]
pub enum FlagValue {
    Plain(OsString),
    Secret(String),
}

impl fmt::Debug for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Plain(value) => write!(f, "{:?}", value),
            FlagValue::Secret(_) => f.write_str(REDACTED),
        }
    }
}

impl FlagValue {
    fn as_os_str(&self) -> OsString {
        match self {
            FlagValue::Plain(value) => value.clone(),
            FlagValue::Secret(value) => OsString::from(value),
        }
    }
}

/// Fully assembled `java -jar hap-sign-tool.jar sign-app ...` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInvocation {
    pub java: OsString,
    pub jar: PathBuf,
    pub flags: Vec<Flag>,
}

impl SignInvocation {
    /// Build the invocation; every value is copied verbatim
    pub fn assemble(
        java: OsString,
        jar: PathBuf,
        material: &SigningMaterial,
        credentials: &ResolvedCredentials,
        in_file: &Path,
        out_file: &Path,
    ) -> Self {
        let plain = |name: &'static str, value: &str| Flag {
            name,
            value: FlagValue::Plain(OsString::from(value)),
        };
        let path = |name: &'static str, value: &Path| Flag {
            name,
            value: FlagValue::Plain(value.as_os_str().to_owned()),
        };
        let secret = |name: &'static str, value: &str| Flag {
            name,
            value: FlagValue::Secret(value.to_string()),
        };

        let flags = vec![
            plain("-keyAlias", &material.key_alias),
            plain("-signAlg", &material.sign_alg),
            plain("-mode", "localSign"),
            plain("-appCertFile", &material.certpath),
            plain("-profileFile", &material.profile),
            path("-inFile", in_file),
            plain("-keystoreFile", &material.store_file),
            path("-outFile", out_file),
            secret("-keyPwd", &credentials.key_password),
            secret("-keystorePwd", &credentials.store_password),
        ];

        SignInvocation { java, jar, flags }
    }

    /// Arguments passed to the launcher, secrets included
    pub fn args(&self) -> Vec<OsString> {
        let mut args = Vec::with_capacity(3 + self.flags.len() * 2);
        args.push(OsString::from("-jar"));
        args.push(self.jar.as_os_str().to_owned());
        args.push(OsString::from(SIGN_APP));
        for flag in &self.flags {
            args.push(OsString::from(flag.name));
            args.push(flag.value.as_os_str());
        }
        args
    }

    /// Complete command line including secrets; never log this
    pub fn command_line(&self) -> String {
        self.render(false)
    }

    /// Command line with password values masked, safe for display
    pub fn redacted(&self) -> String {
        self.render(true)
    }

    fn render(&self, redact: bool) -> String {
        let mut parts = vec![
            self.java.to_string_lossy().into_owned(),
            "-jar".to_string(),
            self.jar.display().to_string(),
            SIGN_APP.to_string(),
        ];
        for flag in &self.flags {
            parts.push(flag.name.to_string());
            parts.push(match &flag.value {
                FlagValue::Plain(value) => value.to_string_lossy().into_owned(),
                FlagValue::Secret(_) if redact => REDACTED.to_string(),
                FlagValue::Secret(value) => value.clone(),
            });
        }
        parts.join(" ")
    }
}
