//! Authenticated principal: public profile fields only.
//!
//! A principal is display data. It is produced by the credential validator,
//! mirrored in the client session cache, and never consulted for access
//! decisions.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrincipalError {
    #[error("field `{0}` must not be empty")]
    Empty(&'static str),
    #[error("invalid email address")]
    InvalidEmail,
    #[error("invalid image url")]
    InvalidImageUrl,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    #[serde(rename = "image")]
    pub image_url: String,
}

impl Principal {
    /// Structural validation of the profile fields.
    ///
    /// # Errors
    /// Returns the first field that fails its check.
    pub fn validate(&self) -> Result<(), PrincipalError> {
        for (name, value) in [
            ("username", &self.username),
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("gender", &self.gender),
        ] {
            if value.trim().is_empty() {
                return Err(PrincipalError::Empty(name));
            }
        }

        if !valid_email(&self.email) {
            return Err(PrincipalError::InvalidEmail);
        }

        match Url::parse(&self.image_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
            _ => Err(PrincipalError::InvalidImageUrl),
        }
    }

    /// Validate and return self, for use in `?` chains.
    ///
    /// # Errors
    /// See [`Principal::validate`].
    pub fn validated(self) -> Result<Self, PrincipalError> {
        self.validate()?;
        Ok(self)
    }
}

pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

#[cfg(test)]
pub(crate) fn emily() -> Principal {
    Principal {
        id: 1,
        username: "emilys".to_string(),
        email: "emily.johnson@x.dummyjson.com".to_string(),
        first_name: "Emily".to_string(),
        last_name: "Johnson".to_string(),
        gender: "female".to_string(),
        image_url: "https://dummyjson.com/icon/emilys/128".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn accepts_well_formed_profile() {
        assert_eq!(emily().validate(), Ok(()));
    }

    #[test]
    fn rejects_blank_fields() {
        let mut principal = emily();
        principal.last_name = "  ".to_string();
        assert_eq!(principal.validate(), Err(PrincipalError::Empty("lastName")));
    }

    #[test]
    fn rejects_bad_email() {
        let mut principal = emily();
        principal.email = "emily.example.com".to_string();
        assert_eq!(principal.validate(), Err(PrincipalError::InvalidEmail));
    }

    #[test]
    fn rejects_bad_image_url() {
        let mut principal = emily();
        principal.image_url = "not a url".to_string();
        assert_eq!(principal.validate(), Err(PrincipalError::InvalidImageUrl));

        principal.image_url = "ftp://dummyjson.com/icon.png".to_string();
        assert_eq!(principal.validate(), Err(PrincipalError::InvalidImageUrl));
    }

    #[test]
    fn deserializes_validator_shape() -> Result<()> {
        let json = serde_json::json!({
            "id": 1,
            "username": "emilys",
            "email": "emily.johnson@x.dummyjson.com",
            "firstName": "Emily",
            "lastName": "Johnson",
            "gender": "female",
            "image": "https://dummyjson.com/icon/emilys/128",
            "accessToken": "ignored"
        });
        let principal: Principal = serde_json::from_value(json)?;
        assert_eq!(principal, emily());
        Ok(())
    }

    #[test]
    fn rejects_non_numeric_id() {
        let json = serde_json::json!({
            "id": "one",
            "username": "emilys",
            "email": "emily.johnson@x.dummyjson.com",
            "firstName": "Emily",
            "lastName": "Johnson",
            "gender": "female",
            "image": "https://dummyjson.com/icon/emilys/128"
        });
        assert!(serde_json::from_value::<Principal>(json).is_err());
    }
}
