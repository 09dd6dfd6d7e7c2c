//! Speaker profiles.

use serde::{Deserialize, Serialize};

use super::{Error, UserIdentity};
use super::validation::require_non_blank;

/// Speaker profile as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    /// Identity of the user who created the profile.
    pub owner: UserIdentity,
    /// Editable profile fields.
    pub profile: SpeakerProfile,
}

/// Editable fields of a speaker profile.
///
/// ## Invariants
/// - `name`, `surname` and `email` are non-blank once validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SpeakerProfile {
    pub name: String,
    pub surname: String,
    pub about: String,
    pub email: String,
    pub company: String,
}

impl SpeakerProfile {
    /// Check mandatory fields.
    pub fn validate(&self) -> Result<(), Error> {
        require_non_blank("name", &self.name)?;
        require_non_blank("surname", &self.surname)?;
        require_non_blank("email", &self.email)?;
        Ok(())
    }

    /// "Name Surname", used in presentation listings.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_owned()
    }
}

/// Single-field equality filter over speakers. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerFilter {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
}

impl SpeakerFilter {
    /// Whether `profile` satisfies every populated criterion.
    #[must_use]
    pub fn matches(&self, profile: &SpeakerProfile) -> bool {
        fn field_matches(criterion: Option<&String>, value: &str) -> bool {
            criterion.is_none_or(|expected| expected == value)
        }
        field_matches(self.name.as_ref(), &profile.name)
            && field_matches(self.surname.as_ref(), &profile.surname)
            && field_matches(self.email.as_ref(), &profile.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::{fixture, rstest};

    #[fixture]
    fn profile() -> SpeakerProfile {
        SpeakerProfile {
            name: "Grace".to_owned(),
            surname: "Hopper".to_owned(),
            about: "Compilers".to_owned(),
            email: "grace@example.com".to_owned(),
            company: "Navy".to_owned(),
        }
    }

    #[rstest]
    fn complete_profile_is_valid(profile: SpeakerProfile) {
        assert!(profile.validate().is_ok());
        assert_eq!(profile.full_name(), "Grace Hopper");
    }

    #[rstest]
    fn blank_email_is_rejected(mut profile: SpeakerProfile) {
        profile.email = "  ".to_owned();
        let err = profile.validate().expect_err("email is mandatory");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    fn optional_fields_may_be_empty(mut profile: SpeakerProfile) {
        profile.about.clear();
        profile.company.clear();
        assert!(profile.validate().is_ok());
    }

    #[rstest]
    fn filter_requires_every_populated_field(profile: SpeakerProfile) {
        let by_name = SpeakerFilter {
            name: Some("Grace".to_owned()),
            ..SpeakerFilter::default()
        };
        assert!(by_name.matches(&profile));

        let mismatched = SpeakerFilter {
            name: Some("Grace".to_owned()),
            email: Some("other@example.com".to_owned()),
            ..SpeakerFilter::default()
        };
        assert!(!mismatched.matches(&profile));
        assert!(SpeakerFilter::default().matches(&profile));
    }
}
