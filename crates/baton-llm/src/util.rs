//! Small helpers shared by the model and transport layers

/// Expand `${VAR}` references using the process environment.
///
/// Unset variables expand to an empty string. Text without references is
/// returned unchanged.
///
/// # Examples
/// ```
/// use baton_llm::util::expand_env;
/// assert_eq!(expand_env("plain"), "plain");
/// ```
#[must_use]
pub fn expand_env(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var_name = &after[..end];
                match std::env::var(var_name) {
                    Ok(v) => out.push_str(&v),
                    Err(_) => {
                        tracing::warn!(var = %var_name, "Environment variable not set");
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Mask a credential for safe display in logs
///
/// Shows the first and last 4 characters of keys longer than 8 characters.
#[must_use]
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
