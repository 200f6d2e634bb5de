//! Full deployment flow: collect, fetch, probe, provision, sync, deploy,
//! configure the proxy, validate.

use dockhand::logging::Logger;
use dockhand::pipeline::run_stage;
use dockhand::prompt::PromptEngine;
use dockhand::ssh::SshClient;
use dockhand::{deploy, params, provision, proxy, source, ssh, sync, validate, Result};

pub fn run(logger: &Logger) -> Result<()> {
    let mut prompt = PromptEngine::stdin();
    let params = run_stage(logger, "collect parameters", || {
        params::collect(logger, &mut prompt)
    })?;

    let descriptor = run_stage(logger, "fetch source", || source::fetch(logger, &params))?;

    let client = SshClient::from_params(&params);
    run_stage(logger, "probe connectivity", || ssh::probe(logger, &client))?;

    run_stage(logger, "provision remote host", || {
        provision::run(logger, &client, &params.ssh_user)
    })?;

    run_stage(logger, "synchronize files", || {
        sync::run(logger, &client, &params)
    })?;

    run_stage(logger, "deploy container", || {
        deploy::run(logger, &client, &params, &descriptor)
    })?;

    run_stage(logger, "configure proxy", || {
        proxy::run(logger, &client, &params)
    })?;

    run_stage(logger, "validate deployment", || {
        validate::run(logger, &client, &params)
    })?;

    logger.info(format!(
        "Deployment complete: http://{}/ (container {})",
        params.server_host, params.project.container
    ));
    Ok(())
}
