//! # Path Template Resolution
//!
//! Expands `{field}` placeholders against a record and `@alias` prefixes against
//! configured roots. Resolution is best-effort: a placeholder whose field is
//! missing or not a string/number is left in place, so templates can be resolved
//! before the record has an identifier and again once it does.

use std::collections::HashMap;

use regex::Captures;
use serde_json::Value;
use tracing::trace;

use crate::error::{PlacementError, PlacementResult};
use crate::models::HostRecord;
use crate::utils::validator::{ALIAS_REGEX, PLACEHOLDER_REGEX};

/// Replaces every `{name}` in `template` with the value of field `name`.
pub fn resolve<R: HostRecord + ?Sized>(template: &str, record: &R) -> String {
    PLACEHOLDER_REGEX
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            match scalar_text(record.attribute(name)) {
                Some(text) => text,
                None => {
                    trace!(placeholder = name, "Placeholder left unresolved");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Whether `text` still carries at least one placeholder.
pub fn has_placeholders(text: &str) -> bool {
    PLACEHOLDER_REGEX.is_match(text)
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Named `@alias` prefixes, e.g. `@webroot` → `/srv/app/public`.
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    aliases: HashMap<String, String>,
}

impl AliasMap {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        let aliases = aliases
            .into_iter()
            .map(|(name, value)| (name.trim_start_matches('@').to_string(), value))
            .collect();
        Self { aliases }
    }

    /// Replaces a leading `@alias` with its value. Text without an alias, or
    /// with an unknown one, is returned unchanged.
    pub fn expand(&self, text: &str) -> String {
        let Some(caps) = ALIAS_REGEX.captures(text) else {
            return text.to_string();
        };

        match self.aliases.get(&caps[1]) {
            Some(root) => {
                let rest = &text[caps[0].len()..];
                format!("{}{}", root.trim_end_matches(['/', '\\']), rest)
            }
            None => text.to_string(),
        }
    }

    /// Fails if `template` starts with an alias that isn't configured.
    pub fn check(&self, template: &str) -> PlacementResult<()> {
        if let Some(caps) = ALIAS_REGEX.captures(template) {
            if !self.aliases.contains_key(&caps[1]) {
                return Err(PlacementError::Configuration(format!(
                    "unknown alias `@{}` in template `{template}`",
                    &caps[1]
                )));
            }
        }
        Ok(())
    }
}
