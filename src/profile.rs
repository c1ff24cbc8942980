use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use crate::error::{ConfigError, Error, Result};

/// Default location of the signing profile, relative to the working directory
pub const DEFAULT_PROFILE_FILE: &str = "build-profile.json5";

/// Project build profile (build-profile.json5)
///
/// Only the parts needed for signing are modelled; everything else in the
/// file (products, modules, ...) is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildProfile {
    #[serde(default)]
    pub app: Option<AppProfile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppProfile {
    #[serde(rename = "signingConfigs", default)]
    pub signing_configs: Option<Vec<SigningConfig>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SigningConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub material: Option<RawMaterial>,
}

/// Material record as written in the profile; every key may be absent
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMaterial {
    pub certpath: Option<String>,
    pub profile: Option<String>,
    pub key_alias: Option<String>,
    pub sign_alg: Option<String>,
    pub store_file: Option<String>,
    pub key_password: Option<String>,
    pub store_password: Option<String>,
}

/// Validated signing material of the first signing config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningMaterial {
    /// Application certificate (.cer)
    pub certpath: String,
    /// Signing profile (.p7b)
    pub profile: String,
    pub key_alias: String,
    pub sign_alg: String,
    /// Keystore (.p12)
    pub store_file: String,
    /// Encrypted key password, hex
    pub key_password: String,
    /// Encrypted keystore password, hex
    pub store_password: String,
}

impl BuildProfile {
    /// Load a profile from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadProfile(path.to_path_buf(), e))?;

        Self::from_json5(&contents).map_err(|e| ConfigError::ParseProfile(path.to_path_buf(), e).into())
    }

    /// Parse a profile from a JSON5 string
    pub fn from_json5(source: &str) -> std::result::Result<Self, json5::Error> {
        json5::from_str(source)
    }

    /// Extract the material of the first signing config.
    ///
    /// `origin` is only used to label errors.
    pub fn signing_material(&self, origin: &Path) -> Result<SigningMaterial> {
        let missing = |key: &str| -> Error {
            ConfigError::MissingKey(origin.to_path_buf(), key.to_string()).into()
        };

        let app = self.app.as_ref().ok_or_else(|| missing("app"))?;
        let configs = app
            .signing_configs
            .as_ref()
            .ok_or_else(|| missing("app.signingConfigs"))?;
        let first = configs.first().ok_or_else(|| missing("app.signingConfigs[0]"))?;

        if let Some(name) = &first.name {
            tracing::debug!("Using signing config `{}`", name);
        }

        let raw = first
            .material
            .as_ref()
            .ok_or_else(|| missing("app.signingConfigs[0].material"))?;

        raw.validate(origin)
    }
}

impl RawMaterial {
    /// Check that every key is present and non-empty
    pub fn validate(&self, origin: &Path) -> Result<SigningMaterial> {
        let field = |value: &Option<String>, key: &str| -> Result<String> {
            let key_path = format!("app.signingConfigs[0].material.{}", key);
            match value {
                None => Err(ConfigError::MissingKey(origin.to_path_buf(), key_path).into()),
                Some(v) if v.trim().is_empty() => {
                    Err(ConfigError::EmptyValue(origin.to_path_buf(), key_path).into())
                }
                Some(v) => Ok(v.clone()),
            }
        };

        Ok(SigningMaterial {
            certpath: field(&self.certpath, "certpath")?,
            profile: field(&self.profile, "profile")?,
            key_alias: field(&self.key_alias, "keyAlias")?,
            sign_alg: field(&self.sign_alg, "signAlg")?,
            store_file: field(&self.store_file, "storeFile")?,
            key_password: field(&self.key_password, "keyPassword")?,
            store_password: field(&self.store_password, "storePassword")?,
        })
    }
}

impl SigningMaterial {
    /// Load the signing material straight from a profile file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        BuildProfile::from_file(path)?.signing_material(path)
    }

    /// Absolute directory containing the certificate.
    ///
    /// Relative paths are anchored at `working_dir`; the filesystem is not
    /// consulted, so the directory does not have to exist.
    pub fn cert_dir(&self, working_dir: &Path) -> PathBuf {
        let parent = Path::new(&self.certpath)
            .parent()
            .unwrap_or_else(|| Path::new(""));

        if parent.is_absolute() {
            parent.to_path_buf()
        } else if parent.as_os_str().is_empty() {
            working_dir.to_path_buf()
        } else {
            working_dir.join(parent)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) const PROFILE: &str = r#"
{
  // generated by DevEco Studio
  app: {
    signingConfigs: [
      {
        name: "default",
        "type": "HarmonyOS",
        material: {
          certpath: "signing/default.cer",
          storePassword: "0000001B9C3F",
          keyAlias: "debugKey",
          keyPassword: "0000001B7A21",
          profile: "signing/default.p7b",
          signAlg: "SHA256withECDSA",
          storeFile: "signing/default.p12",
        },
      },
      {
        name: "release",
        material: {
          certpath: "release/release.cer",
          storePassword: "ff",
          keyAlias: "releaseKey",
          keyPassword: "ee",
          profile: "release/release.p7b",
          signAlg: "SHA256withECDSA",
          storeFile: "release/release.p12",
        },
      },
    ],
    products: [{ name: "default", signingConfig: "default" }],
  },
  modules: [{ name: "entry", srcPath: "./entry" }],
}
"#;

    #[test]
    fn test_profile_parsing() {
        let profile = BuildProfile::from_json5(PROFILE).unwrap();
        let material = profile.signing_material(Path::new("build-profile.json5")).unwrap();

        assert_eq!(material.certpath, "signing/default.cer");
        assert_eq!(material.profile, "signing/default.p7b");
        assert_eq!(material.key_alias, "debugKey");
        assert_eq!(material.sign_alg, "SHA256withECDSA");
        assert_eq!(material.store_file, "signing/default.p12");
        assert_eq!(material.key_password, "0000001B7A21");
        assert_eq!(material.store_password, "0000001B9C3F");
    }

    #[test]
    fn test_missing_signing_configs() {
        let profile = BuildProfile::from_json5("{ app: { products: [] } }").unwrap();
        let err = profile.signing_material(Path::new("p.json5")).unwrap_err();

        match err {
            Error::Config(ConfigError::MissingKey(_, key)) => assert_eq!(key, "app.signingConfigs"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_signing_configs() {
        let profile = BuildProfile::from_json5("{ app: { signingConfigs: [] } }").unwrap();
        let err = profile.signing_material(Path::new("p.json5")).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::MissingKey(_, ref k)) if k == "app.signingConfigs[0]"));
    }

    #[test]
    fn test_material_validation() {
        let mut raw = RawMaterial {
            certpath: Some("a.cer".to_string()),
            profile: Some("a.p7b".to_string()),
            key_alias: Some("key".to_string()),
            sign_alg: Some("SHA256withECDSA".to_string()),
            store_file: Some("a.p12".to_string()),
            key_password: Some("aa".to_string()),
            store_password: Some("bb".to_string()),
        };
        assert!(raw.validate(Path::new("p.json5")).is_ok());

        raw.key_alias = None;
        let err = raw.validate(Path::new("p.json5")).unwrap_err();
        assert!(err.to_string().contains("app.signingConfigs[0].material.keyAlias"));

        raw.key_alias = Some("  ".to_string());
        let err = raw.validate(Path::new("p.json5")).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::EmptyValue(..))));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_PROFILE_FILE);
        fs::write(&path, PROFILE).unwrap();

        let material = SigningMaterial::load(&path).unwrap();
        assert_eq!(material.key_alias, "debugKey");

        let err = SigningMaterial::load(temp_dir.path().join("absent.json5")).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ReadProfile(..))));

        fs::write(&path, "{ app: ").unwrap();
        let err = SigningMaterial::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseProfile(..))));
    }

    #[test]
    fn test_cert_dir() {
        let mut material = BuildProfile::from_json5(PROFILE)
            .unwrap()
            .signing_material(Path::new("p.json5"))
            .unwrap();
        let work = Path::new("/work/project");

        assert_eq!(material.cert_dir(work), PathBuf::from("/work/project/signing"));

        material.certpath = "/opt/certs/app.cer".to_string();
        assert_eq!(material.cert_dir(work), PathBuf::from("/opt/certs"));

        material.certpath = "app.cer".to_string();
        assert_eq!(material.cert_dir(work), PathBuf::from("/work/project"));
    }
}
