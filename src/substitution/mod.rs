//! JSON substitution engine
//!
//! One call takes a document's source text and a [`Variables`] mapping,
//! resolves every key path, converts each replacement into the type already
//! stored at the target and overwrites it. The pass is all-or-nothing: the
//! mutations happen on a scratch tree parsed from the source text, and only
//! an error-free pass is serialized. Any failure returns the source text
//! untouched.

pub mod convert;
pub mod path;
pub mod timespan;

use serde_json::Value;
use tracing::{debug, error, info, trace, warn};

use crate::config::Config;
use crate::errors::{SubstitutionError, VariableError};
use crate::observability::telemetry::sanitize_for_log;
use crate::redact::loggable_value;
use crate::variables::Variables;

pub use convert::{LeafKind, TypeDetection};

const BOM: char = '\u{feff}';

/// Result of one substitution call.
#[derive(Debug)]
pub struct SubstitutionOutcome {
    /// The substituted document, or the original source text.
    pub text: String,
    /// True only when at least one leaf was overwritten and the whole pass
    /// succeeded.
    pub was_substituted: bool,
    /// The error that rolled the document back, if any.
    pub failure: Option<SubstitutionError>,
}

impl SubstitutionOutcome {
    fn unchanged(source: &str) -> Self {
        Self {
            text: source.to_string(),
            was_substituted: false,
            failure: None,
        }
    }

    fn substituted(text: String) -> Self {
        Self {
            text,
            was_substituted: true,
            failure: None,
        }
    }

    fn failed(source: &str, failure: SubstitutionError) -> Self {
        Self {
            text: source.to_string(),
            was_substituted: false,
            failure: Some(failure),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Substitutes variables into JSON documents.
///
/// Holds only immutable settings, so one instance can serve any number of
/// documents, including from several threads at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonSubstituter {
    detection: TypeDetection,
    pretty: bool,
    redact_secrets: bool,
}

impl Default for JsonSubstituter {
    fn default() -> Self {
        Self {
            detection: TypeDetection::default(),
            pretty: true,
            redact_secrets: true,
        }
    }
}

impl JsonSubstituter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            detection: config.detection,
            pretty: config.output.pretty,
            redact_secrets: config.logging.redact_secrets,
        }
    }

    pub fn with_detection(mut self, detection: TypeDetection) -> Self {
        self.detection = detection;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_redaction(mut self, redact_secrets: bool) -> Self {
        self.redact_secrets = redact_secrets;
        self
    }

    /// Substitute `variables` into `source`, recovering from every failure.
    ///
    /// Errors are logged and reported through [`SubstitutionOutcome::failure`];
    /// the returned text is then the unmodified source.
    pub fn substitute(&self, variables: &Variables, source: &str) -> SubstitutionOutcome {
        match self.try_substitute(variables, source) {
            Ok(Some(text)) => SubstitutionOutcome::substituted(text),
            Ok(None) => SubstitutionOutcome::unchanged(source),
            Err(e) => {
                if let Some(key) = e.key() {
                    error!("Failed processing variable '{}'.", sanitize_for_log(key));
                }
                error!("Substitution failed: {}", e);
                SubstitutionOutcome::failed(source, e)
            }
        }
    }

    /// Substitute `variables` into `source`.
    ///
    /// Returns `Ok(None)` when no key path matched, `Ok(Some(text))` with the
    /// serialized document when at least one leaf was overwritten. Entries are
    /// applied in mapping order and the first failing entry stops the pass.
    pub fn try_substitute(
        &self,
        variables: &Variables,
        source: &str,
    ) -> Result<Option<String>, SubstitutionError> {
        let (bom, body) = match source.strip_prefix(BOM) {
            Some(rest) => (true, rest),
            None => (false, source),
        };
        let mut document: Value = serde_json::from_str(body)?;
        let mut substituted = false;

        for (key, value) in variables.iter() {
            let applied = self
                .apply(&mut document, key, value)
                .map_err(|e| SubstitutionError::Variable {
                    key: key.to_string(),
                    source: e,
                })?;
            substituted |= applied;
        }

        if !substituted {
            return Ok(None);
        }

        let mut text = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        }
        .map_err(SubstitutionError::Serialize)?;

        if bom {
            text.insert(0, BOM);
        }
        if body.ends_with('\n') {
            text.push('\n');
        }
        Ok(Some(text))
    }

    /// Resolve, convert and overwrite one entry. Returns whether a leaf was
    /// overwritten.
    fn apply(&self, document: &mut Value, key: &str, value: &str) -> Result<bool, VariableError> {
        let Some(target) = path::resolve(document, key)? else {
            trace!("No match for key '{}'", sanitize_for_log(key));
            return Ok(false);
        };

        let kind = LeafKind::detect(target, &self.detection);
        let replacement = match kind.converter() {
            Some(convert) => convert(value)?,
            None => {
                warn!(
                    "It is not possible to specify a conversion method for property '{}' with type '{}'.",
                    sanitize_for_log(key),
                    kind
                );
                convert::verbatim(value)?
            }
        };

        if *target == replacement {
            debug!("Value on key '{}' already up to date", sanitize_for_log(key));
        }
        info!(
            "Substituting value on key '{}' with ({}) value: {}",
            sanitize_for_log(key),
            kind,
            self.shown(key, value)
        );
        *target = replacement;
        Ok(true)
    }

    fn shown(&self, key: &str, value: &str) -> String {
        if self.redact_secrets {
            sanitize_for_log(&loggable_value(key, value))
        } else {
            sanitize_for_log(value)
        }
    }
}
