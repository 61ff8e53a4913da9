//! Monitored office targets.
//!
//! Targets come from a single `;`-separated environment value. Each entry has
//! the shape `[key=]office_name[@office_address]`:
//!
//! - `Municipio I` tracks every office whose name contains `Municipio I`.
//! - `centro=Municipio I@Via X` tracks it under the key `centro` and also
//!   requires the address to contain `Via X`.
//!
//! When no key is given the office-name substring doubles as the key.

use serde::{Deserialize, Serialize};

use crate::filter::FilterCriteria;
use crate::ConfigError;

/// One office (or office family) being watched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Identity under which dedup memory is tracked.
    pub key: String,
    pub office_name: String,
    /// Empty means "any address".
    pub office_address: String,
}

impl Target {
    #[must_use]
    pub fn new(office_name: impl Into<String>) -> Self {
        let office_name = office_name.into();
        Self {
            key: office_name.clone(),
            office_name,
            office_address: String::new(),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn with_address(mut self, office_address: impl Into<String>) -> Self {
        self.office_address = office_address.into();
        self
    }

    /// Filter criteria selecting this target's rows.
    #[must_use]
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new(&self.office_name, &self.office_address)
    }
}

/// Parse the `CIEWATCH_TARGETS` value.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] when the value holds no target, when
/// an entry has an empty office name or key, or when two entries share a key.
pub fn parse_targets(var: &str, raw: &str) -> Result<Vec<Target>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let mut targets: Vec<Target> = Vec::new();
    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (key, rest) = match entry.split_once('=') {
            Some((key, rest)) => (Some(key.trim()), rest.trim()),
            None => (None, entry),
        };
        let (name, address) = match rest.split_once('@') {
            Some((name, address)) => (name.trim(), address.trim()),
            None => (rest, ""),
        };

        if name.is_empty() {
            return Err(invalid(format!("target '{entry}' has an empty office name")));
        }
        if key.is_some_and(str::is_empty) {
            return Err(invalid(format!("target '{entry}' has an empty key")));
        }

        let mut target = Target::new(name).with_address(address);
        if let Some(key) = key {
            target = target.with_key(key);
        }
        if targets.iter().any(|t| t.key == target.key) {
            return Err(invalid(format!("duplicate target key '{}'", target.key)));
        }
        targets.push(target);
    }

    if targets.is_empty() {
        return Err(invalid("at least one target is required".to_string()));
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_uses_name_as_key() {
        let targets = parse_targets("T", "Municipio I").unwrap();
        assert_eq!(targets, vec![Target::new("Municipio I")]);
        assert_eq!(targets[0].key, "Municipio I");
        assert!(targets[0].office_address.is_empty());
    }

    #[test]
    fn key_name_and_address() {
        let targets = parse_targets("T", "centro = Municipio I @ Via X").unwrap();
        assert_eq!(targets[0].key, "centro");
        assert_eq!(targets[0].office_name, "Municipio I");
        assert_eq!(targets[0].office_address, "Via X");
    }

    #[test]
    fn multiple_entries_skip_blanks() {
        let targets = parse_targets("T", "Municipio I;; Municipio II@Via Y ;").unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].office_address, "Via Y");
    }

    #[test]
    fn empty_value_is_rejected() {
        let err = parse_targets("T", " ; ").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "T"));
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(parse_targets("T", "k=@Via X").is_err());
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(parse_targets("T", "=Municipio I").is_err());
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = parse_targets("T", "Municipio I;Municipio I@Via X").unwrap_err();
        assert!(err.to_string().contains("duplicate target key"), "{err}");
    }
}
