use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use crate::credentials::{HelperResolver, ResolvedCredentials, SecretResolver};
use crate::error::{Result, SigningToolError};
use crate::invocation::SignInvocation;
use crate::profile::SigningMaterial;
use crate::runner::{ProcessRunner, ToolRunner};
use crate::settings::SignSettings;

/// Signs application packages with hap-sign-tool
pub struct AppSigner<R, T> {
    settings: SignSettings,
    resolver: R,
    runner: T,
}

impl AppSigner<HelperResolver, ProcessRunner> {
    /// Signer backed by the real decryption helper and signing tool
    pub fn from_settings(settings: SignSettings) -> Self {
        let resolver = HelperResolver::new(settings.helper.clone(), settings.working_dir.clone());
        let runner = ProcessRunner::new(settings.working_dir.clone());
        AppSigner::new(settings, resolver, runner)
    }
}

impl<R: SecretResolver, T: ToolRunner> AppSigner<R, T> {
    pub fn new(settings: SignSettings, resolver: R, runner: T) -> Self {
        AppSigner {
            settings,
            resolver,
            runner,
        }
    }

    pub fn settings(&self) -> &SignSettings {
        &self.settings
    }

    /// Decrypt the passwords and build the command
    pub fn prepare(&self, material: &SigningMaterial, in_file: &Path, out_file: &Path) -> Result<SignInvocation> {
        let cert_dir = material.cert_dir(&self.settings.working_dir);
        tracing::debug!("Certificate directory: {}", cert_dir.display());

        let credentials = ResolvedCredentials::resolve(
            &self.resolver,
            &cert_dir,
            &material.key_password,
            &material.store_password,
        )?;

        let invocation = SignInvocation::assemble(
            self.settings.java.clone(),
            self.settings.sign_tool_jar(),
            material,
            &credentials,
            in_file,
            out_file,
        );
        tracing::debug!("Assembled `{}`", invocation.redacted());

        Ok(invocation)
    }

    /// Run a prepared invocation and report the tool's result
    pub fn execute(&self, invocation: &SignInvocation) -> Result<()> {
        let launcher = invocation.java.to_string_lossy().into_owned();
        let status = self
            .runner
            .run(invocation)
            .map_err(|e| SigningToolError::Launch(launcher, e))?;

        if status.success() {
            return Ok(());
        }

        match status.code() {
            Some(code) => Err(SigningToolError::Exited(code).into()),
            None => Err(SigningToolError::Terminated.into()),
        }
    }

    /// Sign `in_file`, writing the signed package to `out_file`
    pub fn sign(&self, material: &SigningMaterial, in_file: &Path, out_file: &Path) -> Result<()> {
        tracing::info!("Signing {}", in_file.display());

        let invocation = self.prepare(material, in_file, out_file)?;
        self.execute(&invocation)?;

        let out_path = if out_file.is_absolute() {
            out_file.to_path_buf()
        } else {
            self.settings.working_dir.join(out_file)
        };
        match digest_file(&out_path) {
            Ok((size, hash)) => {
                tracing::info!("Signed package: {} ({} bytes, sha256 {})", out_path.display(), size, hash);
            }
            Err(e) => {
                tracing::debug!("Could not hash {}: {}", out_path.display(), e);
                tracing::info!("Signed package: {}", out_path.display());
            }
        }

        Ok(())
    }
}

/// Size and SHA256 hash of a file
pub fn digest_file(path: &Path) -> std::io::Result<(u64, String)> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let size = std::io::copy(&mut file, &mut hasher)?;
    Ok((size, hex::encode(hasher.finalize())))
}

/// Load the signing profile named by the signer's settings and sign with it.
///
/// With `dry_run` the redacted command is printed instead of executed.
pub fn sign_app<R: SecretResolver, T: ToolRunner>(
    signer: &AppSigner<R, T>,
    in_file: &Path,
    out_file: &Path,
    dry_run: bool,
) -> Result<()> {
    let profile_file = signer.settings().profile_file();
    tracing::info!("Loading signing profile {}", profile_file.display());
    let material = SigningMaterial::load(&profile_file)?;

    if dry_run {
        let invocation = signer.prepare(&material, in_file, out_file)?;
        println!("{}", invocation.redacted());
        return Ok(());
    }

    signer.sign(&material, in_file, out_file)
}

/// Sign a package using settings gathered by the CLI
pub fn sign_app_cmd(settings: SignSettings, in_file: &Path, out_file: &Path, dry_run: bool) -> Result<()> {
    sign_app(&AppSigner::from_settings(settings), in_file, out_file, dry_run)
}
