//! File synchronization: mirror the local project tree to the remote
//! deployment directory, preferring rsync's delta transfer and falling
//! back to a plain recursive scp.

use std::process::Command;

use crate::error::{Error, Result};
use crate::logging::Logger;
use crate::params::DeployParams;
use crate::ssh::{RemoteExec, SshClient};
use crate::utils::shell;

fn ssh_transport(identity_file: &str) -> String {
    format!(
        "ssh -i {} -o StrictHostKeyChecking=no -o BatchMode=yes",
        shell::quote_path(identity_file)
    )
}

pub fn build_rsync_args(params: &DeployParams) -> Vec<String> {
    vec![
        "-az".to_string(),
        "--delete".to_string(),
        "-e".to_string(),
        ssh_transport(&params.key_path),
        format!("{}/", params.project.name),
        format!(
            "{}@{}:{}/",
            params.ssh_user,
            params.server_host,
            params.remote_dir()
        ),
    ]
}

pub fn build_scp_args(params: &DeployParams) -> Vec<String> {
    vec![
        "-r".to_string(),
        "-i".to_string(),
        params.key_path.clone(),
        "-o".to_string(),
        "StrictHostKeyChecking=no".to_string(),
        ".".to_string(),
        format!(
            "{}@{}:{}/",
            params.ssh_user,
            params.server_host,
            params.remote_dir()
        ),
    ]
}

/// Ensure the remote directory exists, then mirror the project tree into
/// it. Failure of either transfer path is fatal with the transfer code.
pub fn run(logger: &Logger, client: &SshClient, params: &DeployParams) -> Result<()> {
    let remote_dir = params.remote_dir();
    let mkdir = client.run(&format!("mkdir -p {}", shell::quote_path(&remote_dir)));
    if !mkdir.success {
        return Err(Error::Transfer(format!(
            "cannot create remote directory {}: {}",
            remote_dir,
            mkdir.detail()
        )));
    }

    if which::which("rsync").is_ok() {
        logger.info(format!("Syncing project to {} via rsync", remote_dir));
        let output = Command::new("rsync")
            .args(build_rsync_args(params))
            .output()
            .map_err(|e| Error::Transfer(format!("failed to run rsync: {}", e)))?;
        if !output.status.success() {
            return Err(Error::Transfer(format!(
                "rsync failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
    } else {
        logger.warn("rsync not found locally; falling back to scp -r");
        let output = Command::new("scp")
            .args(build_scp_args(params))
            .current_dir(&params.project.name)
            .output()
            .map_err(|e| Error::Transfer(format!("failed to run scp: {}", e)))?;
        if !output.status.success() {
            return Err(Error::Transfer(format!(
                "scp failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
    }

    logger.info("Project files synchronized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{DeployParams, ProjectIdent};

    fn params() -> DeployParams {
        DeployParams {
            repo_url: "https://github.com/u/app.git".into(),
            access_token: "tok".into(),
            branch: "main".into(),
            ssh_user: "deploy".into(),
            server_host: "203.0.113.10".into(),
            key_path: "/home/me/.ssh/id_rsa".into(),
            app_port: 3000,
            project: ProjectIdent::derive("https://github.com/u/app.git").unwrap(),
        }
    }

    #[test]
    fn rsync_args_mirror_with_delete() {
        let args = build_rsync_args(&params());
        assert_eq!(args[0], "-az");
        assert_eq!(args[1], "--delete");
        assert_eq!(args[4], "app/");
        assert_eq!(args[5], "deploy@203.0.113.10:deployments/app/");
    }

    #[test]
    fn rsync_transport_disables_host_key_checking() {
        let args = build_rsync_args(&params());
        assert!(args[3].contains("StrictHostKeyChecking=no"));
        assert!(args[3].contains("'/home/me/.ssh/id_rsa'"));
    }

    #[test]
    fn scp_args_are_recursive_with_identity() {
        let args = build_scp_args(&params());
        assert_eq!(args[0], "-r");
        assert_eq!(args[2], "/home/me/.ssh/id_rsa");
        assert_eq!(args.last().unwrap(), "deploy@203.0.113.10:deployments/app/");
    }
}
