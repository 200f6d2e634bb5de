//! Remote provisioning: install and start the container runtime, compose
//! tool, and reverse proxy. Every step is a function of probed remote
//! state, so reruns against an already-provisioned host converge to no-ops.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::logging::Logger;
use crate::ssh::RemoteExec;

pub const SERVICE_POLL_ATTEMPTS: u32 = 30;
pub const SERVICE_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct ToolSpec {
    pub name: &'static str,
    /// Presence probe; zero exit means installed.
    pub probe: &'static str,
    pub install: &'static str,
    /// systemd unit to enable and start after install, if any.
    pub service: Option<&'static str>,
}

pub const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "docker",
        probe: "command -v docker",
        install: "sudo apt-get update -y && sudo apt-get install -y docker.io",
        service: Some("docker"),
    },
    ToolSpec {
        name: "docker-compose",
        probe: "command -v docker-compose",
        install: "sudo apt-get install -y docker-compose",
        service: None,
    },
    ToolSpec {
        name: "nginx",
        probe: "command -v nginx",
        install: "sudo apt-get install -y nginx",
        service: Some("nginx"),
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Install,
    Skip,
}

/// Pure decision: desired state is "installed", so the only input that
/// matters is whether the probe found the tool.
pub fn plan_action(probed_present: bool) -> Action {
    if probed_present {
        Action::Skip
    } else {
        Action::Install
    }
}

pub fn is_installed(remote: &dyn RemoteExec, spec: &ToolSpec) -> bool {
    remote.run(spec.probe).success
}

/// Install missing tools, start their services, and verify all three
/// report a version. Service activation is awaited but advisory.
pub fn run(logger: &Logger, remote: &dyn RemoteExec, ssh_user: &str) -> Result<()> {
    for spec in TOOLS {
        provision_tool(logger, remote, spec, SERVICE_POLL_INTERVAL)?;
    }

    // Fresh docker installs require a group grant before the deploy user
    // can talk to the daemon; activation may still wait on a re-login,
    // which is what the advisory poll above tolerates.
    let grant = remote.run(&format!(
        "sudo usermod -aG docker {}",
        crate::utils::shell::quote_arg(ssh_user)
    ));
    if !grant.success {
        logger.warn(format!("docker group grant failed: {}", grant.detail()));
    }

    verify(remote)?;
    logger.info("Remote provisioning complete: docker, docker-compose, nginx available");
    Ok(())
}

pub fn provision_tool(
    logger: &Logger,
    remote: &dyn RemoteExec,
    spec: &ToolSpec,
    poll_interval: Duration,
) -> Result<()> {
    match plan_action(is_installed(remote, spec)) {
        Action::Skip => {
            logger.info(format!("{} already installed", spec.name));
        }
        Action::Install => {
            logger.info(format!("Installing {}", spec.name));
            let output = remote.run(spec.install);
            if !output.success {
                return Err(Error::Remote(format!(
                    "install of {} failed: {}",
                    spec.name,
                    output.detail()
                )));
            }
        }
    }

    if let Some(service) = spec.service {
        let start = remote.run(&format!("sudo systemctl enable --now {}", service));
        if !start.success {
            // Some environments defer activation until a session re-login.
            logger.warn(format!(
                "could not start {} service yet: {}",
                service,
                start.detail()
            ));
        }
        if !wait_for_service(remote, service, SERVICE_POLL_ATTEMPTS, poll_interval) {
            logger.warn(format!(
                "{} service did not report active after {} attempts (continuing)",
                service, SERVICE_POLL_ATTEMPTS
            ));
        }
    }

    Ok(())
}

/// Bounded poll for a systemd unit to report `active`. Returns whether it
/// did; callers treat a timeout as a warning, not a failure.
pub fn wait_for_service(
    remote: &dyn RemoteExec,
    service: &str,
    attempts: u32,
    interval: Duration,
) -> bool {
    for attempt in 0..attempts {
        let output = remote.run(&format!("systemctl is-active {}", service));
        if output.stdout.trim() == "active" {
            return true;
        }
        if attempt + 1 < attempts {
            std::thread::sleep(interval);
        }
    }
    false
}

/// All three tools must report version information. This is the one fatal
/// gate of the provisioning stage.
pub fn verify(remote: &dyn RemoteExec) -> Result<()> {
    let output = remote.run("docker --version && docker-compose --version && nginx -v");
    if !output.success {
        return Err(Error::Runtime(format!(
            "provisioning verification failed: {}",
            output.detail()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Logger;
    use crate::ssh::fake::FakeRemote;

    #[test]
    fn plan_skips_when_probe_finds_tool() {
        assert_eq!(plan_action(true), Action::Skip);
        assert_eq!(plan_action(false), Action::Install);
    }

    #[test]
    fn installed_tool_short_circuits_install() {
        let remote = FakeRemote::new();
        remote.respond("command -v docker", true, "/usr/bin/docker");
        remote.respond("is-active", true, "active");

        provision_tool(&Logger::discard(), &remote, &TOOLS[0], Duration::ZERO).unwrap();
        assert!(!remote.ran("apt-get install"));
    }

    #[test]
    fn missing_tool_installs_and_starts_service() {
        let remote = FakeRemote::new();
        remote.respond("command -v nginx", false, "");
        remote.respond("is-active", true, "active");

        provision_tool(&Logger::discard(), &remote, &TOOLS[2], Duration::ZERO).unwrap();
        assert!(remote.ran("sudo apt-get install -y nginx"));
        assert!(remote.ran("sudo systemctl enable --now nginx"));
    }

    #[test]
    fn failed_install_is_remote_error() {
        let remote = FakeRemote::new();
        remote.respond("command -v docker", false, "");
        remote.respond("apt-get", false, "no network");

        let err = provision_tool(&Logger::discard(), &remote, &TOOLS[0], Duration::ZERO)
            .unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn deferred_service_start_is_not_fatal() {
        let remote = FakeRemote::new();
        remote.respond("command -v docker", false, "");
        remote.respond("apt-get", true, "");
        remote.respond("systemctl enable", false, "requires re-login");
        remote.respond("is-active", true, "inactive");

        provision_tool(&Logger::discard(), &remote, &TOOLS[0], Duration::ZERO).unwrap();
    }

    #[test]
    fn wait_for_service_polls_until_active() {
        let remote = FakeRemote::new();
        remote.respond("is-active", true, "inactive");
        remote.respond("is-active", true, "activating");
        remote.respond("is-active", true, "active");

        assert!(wait_for_service(&remote, "docker", 5, Duration::ZERO));
        assert_eq!(remote.run_count("is-active"), 3);
    }

    #[test]
    fn wait_for_service_is_bounded() {
        let remote = FakeRemote::new();
        remote.respond("is-active", true, "inactive");

        assert!(!wait_for_service(&remote, "docker", 4, Duration::ZERO));
        assert_eq!(remote.run_count("is-active"), 4);
    }

    #[test]
    fn verify_failure_is_runtime_error() {
        let remote = FakeRemote::new();
        remote.respond("--version", false, "docker: command not found");

        let err = verify(&remote).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn rerun_on_provisioned_host_is_idempotent() {
        let remote = FakeRemote::new();
        remote.respond("command -v", true, "/usr/bin/tool");
        remote.respond("is-active", true, "active");

        run(&Logger::discard(), &remote, "deploy").unwrap();
        assert!(!remote.ran("apt-get install"));
    }
}
