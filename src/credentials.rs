use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use crate::error::{Error, Result, Secret};
use crate::settings::HelperCommand;

/// Turns an encrypted credential field into plaintext
pub trait SecretResolver {
    /// `context_dir` is the absolute directory holding the certificate; the
    /// decryption material lives next to it.
    fn resolve(&self, context_dir: &Path, encrypted: &str) -> std::result::Result<String, String>;
}

/// Plaintext passwords for one signing run
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub key_password: String,
    pub store_password: String,
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("key_password", &"***")
            .field("store_password", &"***")
            .finish()
    }
}

impl ResolvedCredentials {
    /// Resolve the key password, then the keystore password
    pub fn resolve<R: SecretResolver + ?Sized>(
        resolver: &R,
        context_dir: &Path,
        key_password: &str,
        store_password: &str,
    ) -> Result<Self> {
        let key_password = resolve_one(resolver, context_dir, key_password, Secret::KeyPassword)?;
        let store_password = resolve_one(resolver, context_dir, store_password, Secret::StorePassword)?;

        Ok(ResolvedCredentials {
            key_password,
            store_password,
        })
    }
}

fn resolve_one<R: SecretResolver + ?Sized>(
    resolver: &R,
    context_dir: &Path,
    encrypted: &str,
    secret: Secret,
) -> Result<String> {
    tracing::debug!("Decrypting {}", secret);

    let plaintext = resolver
        .resolve(context_dir, encrypted)
        .map_err(|reason| Error::CredentialResolution { secret, reason })?;

    if plaintext.is_empty() {
        return Err(Error::CredentialResolution {
            secret,
            reason: "decryption helper produced no output".to_string(),
        });
    }

    Ok(plaintext)
}

/// Resolver that shells out to the decryption helper
#[derive(Debug, Clone)]
pub struct HelperResolver {
    helper: HelperCommand,
    working_dir: PathBuf,
}

impl HelperResolver {
    pub fn new(helper: HelperCommand, working_dir: PathBuf) -> Self {
        HelperResolver { helper, working_dir }
    }
}

impl SecretResolver for HelperResolver {
    fn resolve(&self, context_dir: &Path, encrypted: &str) -> std::result::Result<String, String> {
        let program = self.helper.program.to_string_lossy().into_owned();

        let output = Command::new(&self.helper.program)
            .arg(&self.helper.script)
            .arg(context_dir)
            .arg(encrypted)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| format!("failed to run decryption helper `{}`: {}", program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let status = match output.status.code() {
                Some(code) => format!("status {}", code),
                None => "a signal".to_string(),
            };
            return Err(if stderr.trim().is_empty() {
                format!("decryption helper exited with {}", status)
            } else {
                format!("decryption helper exited with {}: {}", status, stderr.trim())
            });
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| "decryption helper output is not valid UTF-8".to_string())?;

        Ok(stdout.trim_end().to_string())
    }
}
