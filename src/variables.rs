//! Variable mappings and their sources
//!
//! A [`Variables`] mapping is the ordered key-path → replacement-string table
//! that drives one substitution pass. It comes either from the process
//! environment or from explicit `key=value` command-line tokens.

use crate::errors::StampError;
use crate::substitution::path::SEPARATOR;

/// Default separator translated to `.` in environment variable names, so
/// that `Logging_LogLevel_Default` addresses `Logging.LogLevel.Default`.
pub const DEFAULT_ENV_SEPARATOR: &str = "_";

/// Ordered mapping with unique keys.
///
/// Inserting an existing key replaces its value in place, so the entry keeps
/// the position of its first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    entries: Vec<(String, String)>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut variables = Variables::new();
        variables.extend(iter);
        variables
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Variables {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Source of the variable mapping for a run.
pub trait VariablesProvider {
    fn variables(&self) -> Variables;
}

/// Reads variables from the process environment.
#[derive(Debug, Clone)]
pub struct EnvironmentVariables {
    separator: String,
}

impl Default for EnvironmentVariables {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_SEPARATOR)
    }
}

impl EnvironmentVariables {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Translate raw name/value pairs into key paths.
    pub fn from_pairs<I, K, V>(&self, pairs: I) -> Variables
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(name, value)| (self.key_path(name.as_ref()), value.into()))
            .collect()
    }

    fn key_path(&self, name: &str) -> String {
        if self.separator.is_empty() {
            name.to_string()
        } else {
            name.replace(&self.separator, &SEPARATOR.to_string())
        }
    }
}

impl VariablesProvider for EnvironmentVariables {
    fn variables(&self) -> Variables {
        // Entries that are not valid Unicode cannot address a JSON property.
        let pairs = std::env::vars_os().filter_map(|(name, value)| {
            Some((name.into_string().ok()?, value.into_string().ok()?))
        });
        self.from_pairs(pairs)
    }
}

/// Wraps an explicitly supplied mapping.
#[derive(Debug, Clone, Default)]
pub struct ExplicitVariables {
    variables: Variables,
}

impl ExplicitVariables {
    pub fn new(variables: Variables) -> Self {
        Self { variables }
    }

    /// Build from `key=value` command-line tokens.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, StampError> {
        parse_variable_tokens(tokens).map(Self::new)
    }
}

impl VariablesProvider for ExplicitVariables {
    fn variables(&self) -> Variables {
        self.variables.clone()
    }
}

/// Parse `key=value` tokens. The split happens at the first `=`, so values
/// may contain further `=` characters. Later duplicates override earlier ones.
pub fn parse_variable_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Variables, StampError> {
    let mut variables = Variables::new();
    for token in tokens {
        let token = token.as_ref();
        match token.split_once('=') {
            Some((key, value)) if !key.is_empty() => variables.insert(key, value),
            _ => {
                return Err(StampError::InvalidVariableFormat {
                    token: token.to_string(),
                })
            }
        }
    }
    Ok(variables)
}

/// Explicit tokens when any were given, the environment otherwise.
pub fn select_provider(
    tokens: &[String],
    env_separator: &str,
) -> Result<Box<dyn VariablesProvider>, StampError> {
    if tokens.is_empty() {
        Ok(Box::new(EnvironmentVariables::new(env_separator)))
    } else {
        Ok(Box::new(ExplicitVariables::from_tokens(tokens)?))
    }
}
