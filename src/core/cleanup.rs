//! Cleanup flow: best-effort, order-independent teardown of everything a
//! deployment leaves on the remote host. Succeeds even when resources are
//! already gone; there is no verification step afterwards.

use crate::error::Result;
use crate::logging::Logger;
use crate::params::DeployParams;
use crate::ssh::RemoteExec;
use crate::utils::shell;

pub fn run(logger: &Logger, remote: &dyn RemoteExec, params: &DeployParams) -> Result<()> {
    let container = shell::quote_arg(&params.project.container);
    let site = &params.project.site;

    let steps: Vec<(String, String)> = vec![
        (
            format!("stop container {}", params.project.container),
            format!("docker stop {}", container),
        ),
        (
            format!("remove container {}", params.project.container),
            format!("docker rm {}", container),
        ),
        (
            format!("remove image {}", params.project.container),
            format!("docker rmi {}", container),
        ),
        (
            format!("remove site {}", site),
            format!(
                "sudo rm -f {} {}",
                shell::quote_path(&format!("/etc/nginx/sites-available/{}", site)),
                shell::quote_path(&format!("/etc/nginx/sites-enabled/{}", site))
            ),
        ),
        (
            "reload nginx".to_string(),
            "sudo systemctl reload nginx".to_string(),
        ),
        (
            format!("remove {}", params.remote_dir()),
            format!("rm -rf {}", shell::quote_path(&params.remote_dir())),
        ),
    ];

    for (label, command) in steps {
        let output = remote.run(&command);
        if output.success {
            logger.info(format!("cleanup: {}", label));
        } else {
            // Absent resources are the common case here, not a failure.
            logger.debug(format!("cleanup: {} skipped ({})", label, output.detail()));
        }
    }

    logger.info("Cleanup finished");
    Ok(())
}
