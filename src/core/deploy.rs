//! Container deployment: tear down any prior instance of the project's
//! container, then bring up the new one via compose or build+run.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::logging::Logger;
use crate::params::DeployParams;
use crate::source::Descriptor;
use crate::ssh::RemoteExec;
use crate::utils::shell;

const SETTLE_DELAY: Duration = Duration::from_secs(5);
const LOG_TAIL_LINES: u32 = 20;

/// List the running container matching `container` exactly. The filter
/// value is quoted like every other interpolated remote argument.
pub(crate) fn ps_filter(container: &str) -> String {
    format!(
        "docker ps --filter {} --format '{{{{.Names}}}}'",
        shell::quote_arg(&format!("name=^{}$", container))
    )
}

/// Stop and remove the project's container if it is currently running.
/// Absence is the expected steady state on first deploy; every command
/// here is best-effort.
pub fn teardown_existing(logger: &Logger, remote: &dyn RemoteExec, container: &str) {
    let running = remote.run(&ps_filter(container));
    if !running.stdout.trim().contains(container) {
        logger.debug(format!("No running container named {}", container));
        return;
    }

    logger.info(format!("Stopping existing container {}", container));
    let stop = remote.run(&format!("docker stop {}", shell::quote_arg(container)));
    if !stop.success {
        logger.warn(format!("docker stop failed: {}", stop.detail()));
    }
    let rm = remote.run(&format!("docker rm {}", shell::quote_arg(container)));
    if !rm.success {
        logger.warn(format!("docker rm failed: {}", rm.detail()));
    }
}

/// Deploy according to the descriptor found at fetch time, wait for the
/// container to settle, then verify liveness and capture a log tail.
pub fn run(
    logger: &Logger,
    remote: &dyn RemoteExec,
    params: &DeployParams,
    descriptor: &Descriptor,
) -> Result<()> {
    deploy_with_settle(logger, remote, params, descriptor, SETTLE_DELAY)
}

pub fn deploy_with_settle(
    logger: &Logger,
    remote: &dyn RemoteExec,
    params: &DeployParams,
    descriptor: &Descriptor,
    settle: Duration,
) -> Result<()> {
    let container = &params.project.container;
    teardown_existing(logger, remote, container);

    let remote_dir = shell::quote_path(&params.remote_dir());
    match descriptor {
        Descriptor::Compose(_) => {
            logger.info("Deploying via docker-compose");
            let down = remote.run(&format!(
                "cd {} && docker-compose down --remove-orphans",
                remote_dir
            ));
            if !down.success {
                logger.debug(format!("compose down skipped: {}", down.detail()));
            }

            let up = remote.run(&format!(
                "cd {} && docker-compose up -d --build",
                remote_dir
            ));
            if !up.success {
                return Err(Error::Runtime(format!(
                    "docker-compose up failed: {}",
                    up.detail()
                )));
            }
        }
        Descriptor::Dockerfile(_) => {
            logger.info(format!("Building image {}", container));
            let build = remote.run(&format!(
                "cd {} && docker build -t {} .",
                remote_dir,
                shell::quote_arg(container)
            ));
            if !build.success {
                return Err(Error::Runtime(format!(
                    "docker build failed: {}",
                    build.detail()
                )));
            }

            logger.info(format!(
                "Starting container {} on port {}",
                container, params.app_port
            ));
            let run = remote.run(&format!(
                "docker run -d --name {} --restart unless-stopped -p {}:{} {}",
                shell::quote_arg(container),
                params.app_port,
                params.app_port,
                shell::quote_arg(container)
            ));
            if !run.success {
                return Err(Error::Runtime(format!(
                    "docker run failed: {}",
                    run.detail()
                )));
            }
        }
    }

    std::thread::sleep(settle);
    verify_liveness(logger, remote, container)
}

fn verify_liveness(logger: &Logger, remote: &dyn RemoteExec, container: &str) -> Result<()> {
    let running = remote.run(&ps_filter(container));
    if !running.stdout.trim().contains(container) {
        let logs = remote.run(&format!(
            "docker logs --tail {} {} 2>&1",
            LOG_TAIL_LINES,
            shell::quote_arg(container)
        ));
        return Err(Error::Runtime(format!(
            "container {} is not running after deploy; last output: {}",
            container,
            logs.stdout.trim()
        )));
    }

    let tail = remote.run(&format!(
        "docker logs --tail {} {} 2>&1",
        LOG_TAIL_LINES,
        shell::quote_arg(container)
    ));
    if !tail.stdout.trim().is_empty() {
        logger.debug(format!("container log tail:\n{}", tail.stdout.trim()));
    }
    logger.info(format!("Container {} is running", container));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{DeployParams, ProjectIdent};
    use crate::ssh::fake::FakeRemote;
    use std::path::PathBuf;

    fn params() -> DeployParams {
        DeployParams {
            repo_url: "https://github.com/u/app.git".into(),
            access_token: "tok".into(),
            branch: "main".into(),
            ssh_user: "deploy".into(),
            server_host: "203.0.113.10".into(),
            key_path: "/tmp/key".into(),
            app_port: 3000,
            project: ProjectIdent::derive("https://github.com/u/app.git").unwrap(),
        }
    }

    #[test]
    fn compose_descriptor_uses_compose_path() {
        let remote = FakeRemote::new();
        remote.respond("docker ps", true, "deploy_app");

        let descriptor = Descriptor::Compose(PathBuf::from("docker-compose.yml"));
        deploy_with_settle(&Logger::discard(), &remote, &params(), &descriptor, Duration::ZERO)
            .unwrap();

        assert!(remote.ran("docker-compose up -d --build"));
        assert!(!remote.ran("docker build -t"));
    }

    #[test]
    fn dockerfile_descriptor_builds_and_runs() {
        let remote = FakeRemote::new();
        // Absent before deploy, present at the liveness check.
        remote.respond("docker ps", true, "");
        remote.respond("docker ps", true, "deploy_app");

        let descriptor = Descriptor::Dockerfile(PathBuf::from("Dockerfile"));
        deploy_with_settle(&Logger::discard(), &remote, &params(), &descriptor, Duration::ZERO)
            .unwrap();

        assert!(remote.ran("docker build -t deploy_app ."));
        assert!(remote.ran("docker run -d --name deploy_app --restart unless-stopped -p 3000:3000 deploy_app"));
        assert!(!remote.ran("docker-compose"));
    }

    #[test]
    fn ps_filter_quotes_the_container_name() {
        assert_eq!(
            ps_filter("deploy_app"),
            "docker ps --filter 'name=^deploy_app$' --format '{{.Names}}'"
        );
        // A hostile name stays a single argument on the remote shell.
        assert!(ps_filter("deploy_a;id").contains("'name=^deploy_a;id$'"));
        assert!(!ps_filter("deploy_a;id").contains(" name=^"));
    }

    #[test]
    fn teardown_tolerates_absent_container() {
        let remote = FakeRemote::new();
        remote.respond("docker ps", true, "");

        teardown_existing(&Logger::discard(), &remote, "deploy_app");
        assert!(!remote.ran("docker stop"));
        assert!(!remote.ran("docker rm"));
    }

    #[test]
    fn teardown_stops_running_container() {
        let remote = FakeRemote::new();
        remote.respond("docker ps", true, "deploy_app");

        teardown_existing(&Logger::discard(), &remote, "deploy_app");
        assert!(remote.ran("docker stop deploy_app"));
        assert!(remote.ran("docker rm deploy_app"));
    }

    #[test]
    fn dead_container_after_deploy_is_runtime_error() {
        let remote = FakeRemote::new();
        remote.respond("docker ps", true, "");
        remote.respond("docker logs", true, "panic: port in use");

        let descriptor = Descriptor::Compose(PathBuf::from("docker-compose.yml"));
        let err = deploy_with_settle(
            &Logger::discard(),
            &remote,
            &params(),
            &descriptor,
            Duration::ZERO,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("port in use"));
    }

    #[test]
    fn failed_compose_up_is_runtime_error() {
        let remote = FakeRemote::new();
        remote.respond("docker ps", true, "");
        remote.respond("docker-compose up", false, "build error");

        let descriptor = Descriptor::Compose(PathBuf::from("docker-compose.yml"));
        let err = deploy_with_settle(
            &Logger::discard(),
            &remote,
            &params(),
            &descriptor,
            Duration::ZERO,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
