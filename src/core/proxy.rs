//! Reverse-proxy configuration: render the nginx site for the application
//! port, install it as the enabled site, and reload nginx.

use crate::error::{Error, Result};
use crate::logging::Logger;
use crate::params::DeployParams;
use crate::ssh::RemoteExec;
use crate::utils::shell;
use crate::utils::template::{self, TemplateVars};

pub const HEALTH_PATH: &str = "/health";

const SITE_TEMPLATE: &str = r#"server {
    listen 80;
    server_name _;

    location / {
        proxy_pass http://127.0.0.1:{{appPort}};
        proxy_http_version 1.1;
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
        proxy_connect_timeout 60s;
        proxy_send_timeout 60s;
        proxy_read_timeout 60s;
    }

    location /health {
        access_log off;
        default_type text/plain;
        return 200 "healthy\n";
    }
}
"#;

pub fn render_site(app_port: u16) -> String {
    template::render(
        SITE_TEMPLATE,
        &[(TemplateVars::APP_PORT, &app_port.to_string())],
    )
}

fn fatal(step: &str, output: &crate::ssh::CommandOutput) -> Error {
    Error::Proxy(format!("{}: {}", step, output.detail()))
}

/// Upload the rendered site, enable it, drop the distribution default
/// site, then syntax-check and reload. Every step is fatal.
pub fn run(logger: &Logger, remote: &dyn RemoteExec, params: &DeployParams) -> Result<()> {
    let site = &params.project.site;
    let staging = format!("/tmp/{}.nginx", site);
    let available = format!("/etc/nginx/sites-available/{}", site);
    let enabled = format!("/etc/nginx/sites-enabled/{}", site);

    logger.info(format!(
        "Configuring nginx site '{}' -> 127.0.0.1:{}",
        site, params.app_port
    ));

    let upload = remote.write_file(&staging, &render_site(params.app_port));
    if !upload.success {
        return Err(fatal("site upload failed", &upload));
    }

    let install = remote.run(&format!(
        "sudo mv {} {} && sudo ln -sf {} {}",
        shell::quote_path(&staging),
        shell::quote_path(&available),
        shell::quote_path(&available),
        shell::quote_path(&enabled)
    ));
    if !install.success {
        return Err(fatal("site install failed", &install));
    }

    let drop_default = remote.run("sudo rm -f /etc/nginx/sites-enabled/default");
    if !drop_default.success {
        return Err(fatal("removing default site failed", &drop_default));
    }

    let check = remote.run("sudo nginx -t");
    if !check.success {
        return Err(fatal("nginx config check failed", &check));
    }

    let reload = remote.run("sudo systemctl reload nginx");
    if !reload.success {
        return Err(fatal("nginx reload failed", &reload));
    }

    logger.info("nginx site installed and reloaded");
    Ok(())
}
