//! Teardown flow: reuses parameter collection and the connectivity probe,
//! then removes whatever a previous deployment left behind.

use dockhand::logging::Logger;
use dockhand::pipeline::run_stage;
use dockhand::prompt::PromptEngine;
use dockhand::ssh::SshClient;
use dockhand::{cleanup, params, ssh, Result};

pub fn run(logger: &Logger) -> Result<()> {
    let mut prompt = PromptEngine::stdin();
    let params = run_stage(logger, "collect parameters", || {
        params::collect(logger, &mut prompt)
    })?;

    let client = SshClient::from_params(&params);
    run_stage(logger, "probe connectivity", || ssh::probe(logger, &client))?;

    run_stage(logger, "clean up remote host", || {
        cleanup::run(logger, &client, &params)
    })
}
