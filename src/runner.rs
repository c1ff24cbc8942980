use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use crate::invocation::SignInvocation;

/// Executes an assembled signing command
pub trait ToolRunner {
    fn run(&self, invocation: &SignInvocation) -> std::io::Result<ExitStatus>;
}

/// Runs the signing tool as a child process, sharing our stdin/stdout/stderr
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    working_dir: PathBuf,
}

impl ProcessRunner {
    pub fn new(working_dir: PathBuf) -> Self {
        ProcessRunner { working_dir }
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &SignInvocation) -> std::io::Result<ExitStatus> {
        tracing::debug!("Running Command `{}`", invocation.redacted());

        Command::new(&invocation.java)
            .args(invocation.args())
            .current_dir(&self.working_dir)
            .status()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_exit_status_is_observed() {
        let temp_dir = TempDir::new().unwrap();
        let launcher = temp_dir.path().join("java");
        fs::write(&launcher, "#!/bin/sh\n[ \"$3\" = sign-app ] || exit 9\nexit 3\n").unwrap();
        fs::set_permissions(&launcher, fs::Permissions::from_mode(0o755)).unwrap();

        let invocation = SignInvocation {
            java: OsString::from(launcher.as_os_str()),
            jar: PathBuf::from("hap-sign-tool.jar"),
            flags: Vec::new(),
        };

        let status = ProcessRunner::new(temp_dir.path().to_path_buf())
            .run(&invocation)
            .unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn test_missing_launcher() {
        let temp_dir = TempDir::new().unwrap();
        let invocation = SignInvocation {
            java: OsString::from(temp_dir.path().join("no-such-java").as_os_str()),
            jar: PathBuf::from("hap-sign-tool.jar"),
            flags: Vec::new(),
        };

        assert!(ProcessRunner::new(temp_dir.path().to_path_buf())
            .run(&invocation)
            .is_err());
    }
}
