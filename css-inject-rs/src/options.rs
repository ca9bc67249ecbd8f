use std::fmt;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CssInjectError, Result};

/// Decides, by chunk name, whether a chunk receives the injected CSS.
pub type ChunkPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Options for one injection pass.
#[derive(Clone)]
pub struct InjectionOptions {
    /// Run the injected code before the chunk's own code.
    pub top_execution_priority: bool,
    /// Id given to the injected `<style>` element. Empty disables the id and
    /// the duplicate check.
    pub style_id: String,
    /// Chunks to inject into. `None` injects into the first chunk only.
    pub should_inject_into: Option<ChunkPredicate>,
}

impl Default for InjectionOptions {
    fn default() -> Self {
        Self {
            top_execution_priority: true,
            style_id: String::new(),
            should_inject_into: None,
        }
    }
}

impl fmt::Debug for InjectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionOptions")
            .field("top_execution_priority", &self.top_execution_priority)
            .field("style_id", &self.style_id)
            .field(
                "should_inject_into",
                &self.should_inject_into.as_ref().map(|_| "<predicate>"),
            )
            .finish()
    }
}

impl InjectionOptions {
    pub fn with_predicate(
        mut self,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_inject_into = Some(Arc::new(predicate));
        self
    }
}

/// Serializable form of [`InjectionOptions`], as read from a JSON config file.
///
/// ```json
/// {"topExecutionPriority": false, "styleId": "app-css", "injectInto": ["^assets/index-.*\\.js$"]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct InjectionConfig {
    pub top_execution_priority: Option<bool>,
    pub style_id: Option<String>,
    /// Regular expressions over chunk names; a chunk is selected when any
    /// of them matches. Empty means "first chunk only".
    pub inject_into: Vec<String>,
}

impl InjectionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|err| CssInjectError::io(path, err))?;
        Self::from_json(&json)
    }

    /// Overlay the values set in `other` onto `self`. Patterns accumulate.
    pub fn merge(mut self, other: InjectionConfig) -> Self {
        if other.top_execution_priority.is_some() {
            self.top_execution_priority = other.top_execution_priority;
        }
        if other.style_id.is_some() {
            self.style_id = other.style_id;
        }
        self.inject_into.extend(other.inject_into);
        self
    }

    pub fn into_options(self) -> Result<InjectionOptions> {
        let defaults = InjectionOptions::default();
        let should_inject_into = if self.inject_into.is_empty() {
            None
        } else {
            let patterns = self
                .inject_into
                .iter()
                .map(|pattern| {
                    Regex::new(pattern).map_err(|source| CssInjectError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let predicate: ChunkPredicate =
                Arc::new(move |name: &str| patterns.iter().any(|re| re.is_match(name)));
            Some(predicate)
        };

        Ok(InjectionOptions {
            top_execution_priority: self
                .top_execution_priority
                .unwrap_or(defaults.top_execution_priority),
            style_id: self.style_id.unwrap_or(defaults.style_id),
            should_inject_into,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = InjectionConfig::default().into_options().unwrap();
        assert!(options.top_execution_priority);
        assert_eq!(options.style_id, "");
        assert!(options.should_inject_into.is_none());
    }

    #[test]
    fn test_parse_config() {
        let config = InjectionConfig::from_json(
            r#"{"topExecutionPriority": false, "styleId": "app", "injectInto": ["^main", "legacy"]}"#,
        )
        .unwrap();
        let options = config.into_options().unwrap();
        assert!(!options.top_execution_priority);
        assert_eq!(options.style_id, "app");

        let predicate = options.should_inject_into.unwrap();
        assert!(predicate("main.js"));
        assert!(predicate("index-legacy.js"));
        assert!(!predicate("vendor.js"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = InjectionConfig::from_json(r#"{"styleID": "x"}"#).unwrap_err();
        assert!(matches!(err, CssInjectError::Config(_)));
    }

    #[test]
    fn test_invalid_pattern() {
        let config = InjectionConfig {
            inject_into: vec!["(".to_string()],
            ..Default::default()
        };
        let err = config.into_options().unwrap_err();
        assert!(matches!(err, CssInjectError::InvalidPattern { .. }));
    }

    #[test]
    fn test_merge_overrides() {
        let file = InjectionConfig {
            top_execution_priority: Some(false),
            style_id: Some("file".to_string()),
            inject_into: vec!["a".to_string()],
        };
        let flags = InjectionConfig {
            style_id: Some("flag".to_string()),
            inject_into: vec!["b".to_string()],
            ..Default::default()
        };
        let merged = file.merge(flags);
        assert_eq!(merged.top_execution_priority, Some(false));
        assert_eq!(merged.style_id.as_deref(), Some("flag"));
        assert_eq!(merged.inject_into, vec!["a", "b"]);
    }
}
