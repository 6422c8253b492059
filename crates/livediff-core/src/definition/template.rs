//! Placeholder substitution over JSON templates
//!
//! - A string that is exactly `${path}` is replaced by the value at `path`,
//!   keeping its type. If the value is absent the field (or array element)
//!   is dropped, so optional parameters can be left unset.
//! - `${path}` embedded in a longer string is interpolated; an absent value
//!   there is an error.
//!
//! Paths are dot-separated and start at the scope root, e.g.
//! `parameter.image`, `context.name` or `parameter.ports.0`.

use crate::errors::{LiveDiffError, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

fn placeholder() -> Result<&'static Regex> {
    static RE: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_\-]*(?:\.[A-Za-z0-9_\-]+)*)\}"))
        .as_ref()
        .map_err(|e| {
            LiveDiffError::Internal {
                reason: format!("placeholder pattern: {}", e),
            }
            .into()
        })
}

/// Look up a dot-separated path; numeric segments index arrays
pub fn lookup<'a>(scope: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(scope, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Render `template` against `scope`
///
/// Returns `Ok(None)` when the whole template is a single absent placeholder.
/// `owner` names the definition in error messages.
pub fn render(template: &Value, scope: &Value, owner: &str) -> Result<Option<Value>> {
    match template {
        Value::String(s) => render_string(s, scope, owner),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if let Some(v) = render(item, scope, owner)? {
                    out.push(v);
                }
            }
            Ok(Some(Value::Array(out)))
        }
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                if let Some(v) = render(value, scope, owner)? {
                    out.insert(key.clone(), v);
                }
            }
            Ok(Some(Value::Object(out)))
        }
        other => Ok(Some(other.clone())),
    }
}

/// Render a template that must produce an object
pub fn render_object(template: &Value, scope: &Value, owner: &str) -> Result<Map<String, Value>> {
    match render(template, scope, owner)? {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(LiveDiffError::TemplateNotObject {
            owner: owner.to_string(),
        }
        .into()),
    }
}

fn render_string(s: &str, scope: &Value, owner: &str) -> Result<Option<Value>> {
    let re = placeholder()?;

    if let Some(caps) = re.captures(s) {
        if caps.get(0).map(|m| m.as_str().len()) == Some(s.len()) {
            return Ok(lookup(scope, &caps[1]).filter(|v| !v.is_null()).cloned());
        }
    } else {
        return Ok(Some(Value::String(s.to_string())));
    }

    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for caps in re.captures_iter(s) {
        let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&s[last..whole.start()]);
        match lookup(scope, path.as_str()) {
            Some(Value::String(v)) => out.push_str(v),
            Some(Value::Null) | None => {
                return Err(LiveDiffError::UndefinedTemplateValue {
                    owner: owner.to_string(),
                    path: path.as_str().to_string(),
                }
                .into())
            }
            Some(other) => out.push_str(&other.to_string()),
        }
        last = whole.end();
    }
    out.push_str(&s[last..]);
    Ok(Some(Value::String(out)))
}
