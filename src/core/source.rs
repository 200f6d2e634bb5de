//! Source fetching: clone or fast-forward the project repository locally,
//! then verify it carries a supported build descriptor.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};
use crate::logging::Logger;
use crate::params::DeployParams;

/// Hosts where the access token is substituted into the URL credential
/// position. Anything else deploys with the literal URL plus a warning.
const TOKEN_HOSTS: &[&str] = &["github.com"];

const COMPOSE_FILES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// How the project's container image gets built and started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    /// Multi-service stack file; deployed with docker-compose.
    Compose(PathBuf),
    /// Single-container recipe; deployed with docker build + run.
    Dockerfile(PathBuf),
}

/// Inject the token into the URL credential position for recognized hosts.
/// Returns the URL to use and whether authentication was applied.
pub fn authenticated_url(repo_url: &str, token: &str) -> (String, bool) {
    for host in TOKEN_HOSTS {
        let prefix = format!("https://{}/", host);
        if let Some(rest) = repo_url.strip_prefix(&prefix) {
            return (format!("https://{}@{}/{}", token, host, rest), true);
        }
    }
    (repo_url.to_string(), false)
}

/// Credential-masked URL for logs. The token never reaches the log file.
pub fn masked_url(url: &str) -> String {
    match (url.find("://"), url.find('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}***{}", &url[..scheme_end + 3], &url[at..])
        }
        _ => url.to_string(),
    }
}

fn run_git(args: &[&str]) -> std::result::Result<String, String> {
    let output = Command::new("git")
        .args(args)
        .output()
        .map_err(|e| format!("failed to run git: {}", e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
    }
}

/// Clone the branch, or fetch + switch + fast-forward when the directory
/// already exists. Pull failures are fatal; there is no conflict handling.
pub fn fetch(logger: &Logger, params: &DeployParams) -> Result<Descriptor> {
    let (url, authenticated) = authenticated_url(&params.repo_url, &params.access_token);
    if !authenticated {
        logger.warn(format!(
            "Unrecognized host in {}; cloning without token authentication",
            params.repo_url
        ));
    }

    let dir = params.project.name.clone();
    if Path::new(&dir).exists() {
        logger.info(format!(
            "Repository directory '{}' exists; fast-forwarding {}",
            dir, params.branch
        ));
        run_git(&["-C", &dir, "fetch", "origin"])
            .map_err(|e| Error::Source(format!("git fetch failed: {}", e)))?;
        run_git(&["-C", &dir, "checkout", &params.branch])
            .map_err(|e| Error::Source(format!("git checkout failed: {}", e)))?;
        run_git(&["-C", &dir, "pull", "--ff-only", "origin", &params.branch])
            .map_err(|e| Error::Source(format!("git pull failed: {}", e)))?;
    } else {
        logger.info(format!(
            "Cloning {} (branch {})",
            masked_url(&url),
            params.branch
        ));
        run_git(&["clone", "--branch", &params.branch, &url, &dir])
            .map_err(|e| Error::Source(format!("git clone failed: {}", masked_url(&e))))?;
    }

    let descriptor = detect_descriptor(Path::new(&dir))?;
    match &descriptor {
        Descriptor::Compose(path) => {
            logger.info(format!("Found compose descriptor: {}", path.display()))
        }
        Descriptor::Dockerfile(path) => {
            logger.info(format!("Found build descriptor: {}", path.display()))
        }
    }
    Ok(descriptor)
}

/// A compose file wins when both are present. A project with neither is a
/// fatal source error, raised before any remote mutation happens.
pub fn detect_descriptor(project_dir: &Path) -> Result<Descriptor> {
    for name in COMPOSE_FILES {
        let candidate = project_dir.join(name);
        if candidate.is_file() {
            return Ok(Descriptor::Compose(candidate));
        }
    }

    let dockerfile = project_dir.join("Dockerfile");
    if dockerfile.is_file() {
        return Ok(Descriptor::Dockerfile(dockerfile));
    }

    Err(Error::Source(format!(
        "no Dockerfile or compose file in {}",
        project_dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_injected_for_recognized_host() {
        let (url, auth) = authenticated_url("https://github.com/u/app.git", "tok123");
        assert!(auth);
        assert_eq!(url, "https://tok123@github.com/u/app.git");
    }

    #[test]
    fn literal_url_for_unrecognized_host() {
        let (url, auth) = authenticated_url("https://code.example.org/u/app.git", "tok123");
        assert!(!auth);
        assert_eq!(url, "https://code.example.org/u/app.git");
    }

    #[test]
    fn masked_url_hides_credential() {
        assert_eq!(
            masked_url("https://tok123@github.com/u/app.git"),
            "https://***@github.com/u/app.git"
        );
        assert_eq!(
            masked_url("https://github.com/u/app.git"),
            "https://github.com/u/app.git"
        );
    }

    #[test]
    fn compose_descriptor_preferred() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("docker-compose.yml"), "services: {}").unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM scratch").unwrap();

        match detect_descriptor(dir.path()).unwrap() {
            Descriptor::Compose(path) => {
                assert_eq!(path.file_name().unwrap(), "docker-compose.yml")
            }
            other => panic!("expected compose descriptor, got {:?}", other),
        }
    }

    #[test]
    fn dockerfile_only_takes_build_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM scratch").unwrap();

        assert!(matches!(
            detect_descriptor(dir.path()).unwrap(),
            Descriptor::Dockerfile(_)
        ));
    }

    #[test]
    fn missing_descriptor_is_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = detect_descriptor(dir.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn modern_compose_names_recognized() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("compose.yaml"), "services: {}").unwrap();
        assert!(matches!(
            detect_descriptor(dir.path()).unwrap(),
            Descriptor::Compose(_)
        ));
    }
}
