//! Remote command execution over the system `ssh` binary.
//!
//! Each call is one blocking round trip; there is no persistent session.
//! Host-key checking is disabled because target hosts are freshly
//! provisioned and not yet in known_hosts.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};
use crate::logging::Logger;
use crate::params::DeployParams;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
            exit_code: 0,
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
            exit_code,
        }
    }

    /// stderr when present, stdout otherwise. Remote tools are inconsistent
    /// about which stream carries the diagnostic.
    pub fn detail(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

/// Seam between deployment stages and the remote host. Stages depend on
/// this trait so tests can probe against a fake instead of a live server.
pub trait RemoteExec {
    /// Run a command on the remote host and capture its output.
    fn run(&self, command: &str) -> CommandOutput;

    /// Write `content` to `remote_path`, streaming over stdin.
    fn write_file(&self, remote_path: &str, content: &str) -> CommandOutput;
}

pub struct SshClient {
    pub host: String,
    pub user: String,
    pub identity_file: String,
}

impl SshClient {
    pub fn from_params(params: &DeployParams) -> Self {
        Self {
            host: params.server_host.clone(),
            user: params.ssh_user.clone(),
            identity_file: params.key_path.clone(),
        }
    }

    fn build_ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = vec!["-i".to_string(), self.identity_file.clone()];

        // Timeout and keepalive options prevent hangs on stalled
        // connections or unexpected prompts.
        args.extend(
            [
                "-o",
                "BatchMode=yes",
                "-o",
                "ConnectTimeout=10",
                "-o",
                "StrictHostKeyChecking=no",
                "-o",
                "ServerAliveInterval=15",
                "-o",
                "ServerAliveCountMax=3",
            ]
            .map(String::from),
        );

        args.push(format!("{}@{}", self.user, self.host));
        args.push(command.to_string());
        args
    }

    fn execute(&self, command: &str, stdin_data: Option<&[u8]>) -> CommandOutput {
        let args = self.build_ssh_args(command);

        let mut cmd = Command::new("ssh");
        cmd.args(&args);

        if stdin_data.is_some() {
            cmd.stdin(Stdio::piped());
        } else {
            cmd.stdin(Stdio::null());
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return CommandOutput::failed(-1, format!("SSH error: {}", e)),
        };

        if let Some(data) = stdin_data {
            if let Some(mut stdin) = child.stdin.take() {
                if let Err(e) = stdin.write_all(data) {
                    let _ = child.kill();
                    return CommandOutput::failed(-1, format!("SSH stdin error: {}", e));
                }
            }
        }

        match child.wait_with_output() {
            Ok(out) => CommandOutput {
                stdout: String::from_utf8_lossy(&out.stdout).to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).to_string(),
                success: out.status.success(),
                exit_code: out.status.code().unwrap_or(-1),
            },
            Err(e) => CommandOutput::failed(-1, format!("SSH error: {}", e)),
        }
    }
}

impl RemoteExec for SshClient {
    fn run(&self, command: &str) -> CommandOutput {
        self.execute(command, None)
    }

    fn write_file(&self, remote_path: &str, content: &str) -> CommandOutput {
        let command = format!("cat > {}", crate::utils::shell::quote_path(remote_path));
        self.execute(&command, Some(content.as_bytes()))
    }
}

/// Connectivity probe: one bounded-timeout remote echo. Fatal on failure.
/// A follow-up ICMP ping is advisory only.
pub fn probe(logger: &Logger, client: &SshClient) -> Result<()> {
    logger.info(format!("Testing SSH connection to {}@{}", client.user, client.host));
    let output = client.run("echo ok");
    if !output.success {
        return Err(Error::Ssh(format!(
            "cannot reach {}@{}: {}",
            client.user,
            client.host,
            output.detail()
        )));
    }
    logger.info("SSH connection established");

    let ping = Command::new("ping")
        .args(["-c", "1", "-W", "3", &client.host])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match ping {
        Ok(status) if status.success() => logger.debug("Host answers ICMP"),
        _ => logger.warn("Host does not answer ICMP (continuing; ping is advisory)"),
    }

    Ok(())
}
