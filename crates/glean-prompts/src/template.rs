use glean_core::error::{GleanError, Result};

/// Fill `{{name}}` placeholders in one pass over the template.
///
/// Values are inserted verbatim and never rescanned, so interpolated content
/// may itself contain braces. A placeholder without a value is an error.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> Result<String> {
    let extra: usize = vars.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| {
            GleanError::Template(format!(
                "unterminated placeholder: {}",
                after.chars().take(32).collect::<String>()
            ))
        })?;
        let key = after[..end].trim();
        let value = vars
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .ok_or_else(|| GleanError::Template(format!("no value for placeholder `{key}`")))?;
        out.push_str(value);
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}
