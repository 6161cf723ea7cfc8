//! Named sender profiles

use super::error::EmailError;
use crate::domain::{SenderProfile, DEFAULT_SENDER};
use crate::error::AppError;
use std::collections::HashMap;
use validator::Validate;

/// Read-only map from sender profile name to [`SenderProfile`]
///
/// Built once from configuration; there are no mutation methods, so a
/// registry can be shared across tasks without locking.
#[derive(Debug, Clone, Default)]
pub struct SenderRegistry {
    profiles: HashMap<String, SenderProfile>,
}

impl SenderRegistry {
    pub fn new(profiles: HashMap<String, SenderProfile>) -> Self {
        Self { profiles }
    }

    /// Look up a profile by name
    pub fn resolve(&self, name: &str) -> Result<&SenderProfile, EmailError> {
        self.profiles
            .get(name)
            .ok_or_else(|| EmailError::UnknownSender(name.to_string()))
    }

    /// The profile used when no sender is named, if configured
    pub fn default_profile(&self) -> Option<&SenderProfile> {
        self.profiles.get(DEFAULT_SENDER)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// Profile names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Validate every profile, reporting the first invalid one by name
    pub fn validate(&self) -> crate::error::Result<()> {
        for name in self.names() {
            if let Some(profile) = self.profiles.get(name) {
                profile.validate().map_err(|e| {
                    AppError::Validation(format!("sender profile \"{}\": {}", name, e))
                })?;
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, SenderProfile)> for SenderRegistry {
    fn from_iter<I: IntoIterator<Item = (String, SenderProfile)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn registry() -> SenderRegistry {
        [
            (
                "default".to_string(),
                SenderProfile::new("a@x.com").with_name("A"),
            ),
            (
                "billing".to_string(),
                SenderProfile::new("billing@x.com").with_password("secret"),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[rstest]
    #[case("default", "a@x.com")]
    #[case("billing", "billing@x.com")]
    fn test_resolve_registered(#[case] name: &str, #[case] address: &str) {
        let registry = registry();
        let profile = registry.resolve(name).unwrap();
        assert_eq!(profile.address, address);
    }

    #[rstest]
    #[case("mkt")]
    #[case("")]
    #[case("Default")]
    fn test_resolve_unregistered(#[case] name: &str) {
        let registry = registry();
        let err = registry.resolve(name).unwrap_err();
        assert!(matches!(err, EmailError::UnknownSender(n) if n == name));
    }

    #[test]
    fn test_default_profile() {
        let registry = registry();
        assert_eq!(registry.default_profile().unwrap().address, "a@x.com");

        let empty = SenderRegistry::default();
        assert!(empty.default_profile().is_none());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_names_sorted() {
        let registry = registry();
        assert_eq!(registry.names(), vec!["billing", "default"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("billing"));
        assert!(!registry.contains("mkt"));
    }

    #[test]
    fn test_validate_reports_invalid_profile() {
        let invalid: SenderRegistry = [
            ("default".to_string(), SenderProfile::new("a@x.com")),
            ("broken".to_string(), SenderProfile::new("not-an-email")),
        ]
        .into_iter()
        .collect();

        let err = invalid.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("\"broken\"")));
        assert!(registry().validate().is_ok());
    }
}
