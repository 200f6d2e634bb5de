//! Deployment parameters: collected once, validated, then immutable.
//!
//! Every stage receives `&DeployParams`; nothing reads ambient process
//! state after collection. Derived identifiers are computed exactly once,
//! after all structural validation has passed.

use std::io::BufRead;
use std::path::Path;

use crate::error::{Error, Result};
use crate::logging::Logger;
use crate::prompt::PromptEngine;
use crate::utils::validation;

pub const DEFAULT_BRANCH: &str = "main";
const CONTAINER_PREFIX: &str = "deploy_";

/// Identifiers derived from the repository URL basename. Lower-cased and
/// fixed for the lifetime of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdent {
    /// Repository basename without a `.git` suffix.
    pub name: String,
    /// Container and image name on the remote host.
    pub container: String,
    /// Reverse-proxy site name under sites-available/sites-enabled.
    pub site: String,
}

impl ProjectIdent {
    pub fn derive(repo_url: &str) -> Result<Self> {
        // Only the path after the authority can name the project; a URL
        // with no path has nothing to derive from.
        let rest = repo_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(repo_url);
        let path = rest.split_once('/').map(|(_, path)| path).unwrap_or("");

        let basename = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .trim_end_matches(".git")
            .to_lowercase();

        if basename.is_empty() {
            return Err(Error::Input(format!(
                "cannot derive a project name from '{}'",
                repo_url
            )));
        }

        Ok(Self {
            container: format!("{}{}", CONTAINER_PREFIX, basename),
            site: basename.clone(),
            name: basename,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DeployParams {
    pub repo_url: String,
    pub access_token: String,
    pub branch: String,
    pub ssh_user: String,
    pub server_host: String,
    pub key_path: String,
    pub app_port: u16,
    pub project: ProjectIdent,
}

impl DeployParams {
    /// Remote deployment directory, relative to the SSH user's home.
    pub fn remote_dir(&self) -> String {
        format!("deployments/{}", self.project.name)
    }
}

/// Interactive parameter collection. Structural invalidity re-prompts;
/// missing mandatory values fail immediately with the input error code.
pub fn collect<R: BufRead>(logger: &Logger, prompt: &mut PromptEngine<R>) -> Result<DeployParams> {
    let repo_url = prompt.ask_validated(
        "Repository URL",
        None,
        validation::is_valid_repo_url,
        "Expected a URL like https://github.com/user/repo.git",
    )?;

    let access_token = prompt.ask_required("Access token", "access token")?;

    let branch = prompt.ask("Branch", Some(DEFAULT_BRANCH))?;
    let branch = validation::require_non_empty(&branch, "branch", "cannot be blank")?.to_string();

    let ssh_user = prompt.ask_required("SSH username", "SSH username")?;

    let server_host = prompt.ask_validated(
        "Server address",
        None,
        validation::is_valid_ipv4,
        "Expected a dotted-quad IPv4 address, e.g. 203.0.113.10",
    )?;

    let key_path = prompt.ask_required("SSH key path", "SSH key path")?;
    let key_path = shellexpand::tilde(&key_path).to_string();
    if !Path::new(&key_path).exists() {
        return Err(Error::Input(format!("SSH key not found: {}", key_path)));
    }

    let port_input = prompt.ask_validated(
        "Application port",
        Some("3000"),
        |v| validation::parse_port(v).is_some(),
        "Expected a port between 1 and 65535",
    )?;
    let app_port = validation::parse_port(&port_input)
        .ok_or_else(|| Error::Input(format!("invalid port: {}", port_input)))?;

    // Identifiers are derived only after every field has validated.
    let project = ProjectIdent::derive(&repo_url)?;
    logger.info(format!(
        "Parameters collected: project '{}', container '{}', branch '{}', port {}",
        project.name, project.container, branch, app_port
    ));

    Ok(DeployParams {
        repo_url,
        access_token,
        branch,
        ssh_user,
        server_host,
        key_path,
        app_port,
        project,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn derive_strips_git_suffix_and_lowercases() {
        let ident = ProjectIdent::derive("https://github.com/u/App.git").unwrap();
        assert_eq!(ident.name, "app");
        assert_eq!(ident.container, "deploy_app");
        assert_eq!(ident.site, "app");
    }

    #[test]
    fn derive_handles_trailing_slash() {
        let ident = ProjectIdent::derive("https://github.com/u/service/").unwrap();
        assert_eq!(ident.name, "service");
    }

    #[test]
    fn derive_rejects_empty_basename() {
        assert!(ProjectIdent::derive("https://").is_err());
        assert!(ProjectIdent::derive("https:///").is_err());
    }

    #[test]
    fn derive_rejects_url_without_path() {
        // The authority alone must never become the project name.
        assert!(ProjectIdent::derive("https://github.com").is_err());
        assert!(ProjectIdent::derive("https://github.com/").is_err());
    }

    #[test]
    fn remote_dir_is_per_project() {
        let params = DeployParams {
            repo_url: "https://github.com/u/app.git".into(),
            access_token: "tok".into(),
            branch: "main".into(),
            ssh_user: "deploy".into(),
            server_host: "203.0.113.10".into(),
            key_path: "/tmp/key".into(),
            app_port: 3000,
            project: ProjectIdent::derive("https://github.com/u/app.git").unwrap(),
        };
        assert_eq!(params.remote_dir(), "deployments/app");
    }

    #[test]
    fn collect_reprompts_invalid_url_then_succeeds() {
        let key = tempfile::NamedTempFile::new().unwrap();
        let input = format!(
            "not-a-url\nhttps://github.com/u/app.git\nsecret\n\ndeploy\n999.1.1.1\n203.0.113.10\n{}\n3000\n",
            key.path().display()
        );
        let mut prompt = PromptEngine::with_reader(Cursor::new(input.into_bytes()));
        let params = collect(&Logger::discard(), &mut prompt).unwrap();
        assert_eq!(params.repo_url, "https://github.com/u/app.git");
        assert_eq!(params.branch, "main");
        assert_eq!(params.server_host, "203.0.113.10");
        assert_eq!(params.project.container, "deploy_app");
        assert_eq!(params.app_port, 3000);
    }

    #[test]
    fn collect_fails_fast_on_missing_token() {
        let input = "https://github.com/u/app.git\n\n";
        let mut prompt = PromptEngine::with_reader(Cursor::new(input.as_bytes().to_vec()));
        let err = collect(&Logger::discard(), &mut prompt).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn collect_fails_on_missing_key_file() {
        let input =
            "https://github.com/u/app.git\ntok\nmain\ndeploy\n203.0.113.10\n/no/such/key\n";
        let mut prompt = PromptEngine::with_reader(Cursor::new(input.as_bytes().to_vec()));
        let err = collect(&Logger::discard(), &mut prompt).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("SSH key not found"));
    }
}
