//! Environment-variable expansion for plugin command lines.
//!
//! Supports `${NAME}` references resolved against an explicit environment
//! map. Undefined names expand to the empty string, matching what shipped
//! plugins expect from a shell-style expansion. A `$` not followed by `{`
//! passes through unchanged.

use std::collections::HashMap;

/// Expands `${NAME}` references in `input` using the given environment map.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use pm_core::expand_env;
///
/// let mut env = HashMap::new();
/// env.insert("PM_LIBRARY".to_string(), "/opt/plugins".to_string());
///
/// assert_eq!(expand_env("${PM_LIBRARY}/bin/check", &env), "/opt/plugins/bin/check");
/// assert_eq!(expand_env("${UNSET} stays empty", &env), " stays empty");
/// ```
pub fn expand_env(input: &str, env: &HashMap<String, String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for nc in chars.by_ref() {
                    if nc == '}' {
                        closed = true;
                        break;
                    }
                    name.push(nc);
                }
                if closed {
                    if let Some(value) = env.get(&name) {
                        result.push_str(value);
                    }
                } else {
                    // Unterminated reference passes through literally.
                    result.push_str("${");
                    result.push_str(&name);
                }
            }
            _ => result.push('$'),
        }
    }

    result
}
