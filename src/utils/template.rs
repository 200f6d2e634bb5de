//! String template rendering for generated configuration files.

pub struct TemplateVars;

impl TemplateVars {
    pub const APP_PORT: &'static str = "appPort";
}

pub fn render(template: &str, variables: &[(&str, &str)]) -> String {
    let mut result = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_placeholder() {
        let out = render("listen {{appPort}};", &[(TemplateVars::APP_PORT, "3000")]);
        assert_eq!(out, "listen 3000;");
    }

    #[test]
    fn render_leaves_unknown_placeholders() {
        let out = render("{{appPort}} {{other}}", &[(TemplateVars::APP_PORT, "80")]);
        assert_eq!(out, "80 {{other}}");
    }
}
