//! Session store: the two script-inaccessible slots holding the credential pair.
//!
//! A [`SessionJar`] is the per-request view of the store. It is loaded from the
//! request's `Cookie` header, mutated only by the issuer, and turned into
//! `Set-Cookie` headers on the response. Each slot holds at most one pending
//! write, so a rotation is a single overwrite per slot and a clear always
//! removes both slots together.

mod cookies;

pub use cookies::CookiePolicy;
pub(crate) use cookies::is_cookie_safe;

use axum::http::{HeaderMap, HeaderValue, header::InvalidHeaderValue};
use secrecy::{ExposeSecret, SecretString};
use std::{
    fmt,
    time::{Duration, SystemTime},
};

/// Short-lived access secret plus long-lived renewal secret.
#[derive(Clone)]
pub struct CredentialPair {
    pub access: SecretString,
    pub renewal: SecretString,
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access", &"***")
            .field("renewal", &"***")
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Access,
    Renewal,
}

impl Slot {
    pub const ALL: [Self; 2] = [Self::Access, Self::Renewal];

    #[must_use]
    pub const fn cookie_name(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Renewal => "renewal",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Access => 0,
            Self::Renewal => 1,
        }
    }
}

/// One slot of a freshly written session record.
#[derive(Clone)]
pub struct SlotRecord {
    pub value: SecretString,
    pub created_at: SystemTime,
    pub max_age: Duration,
}

#[derive(Clone)]
enum SlotWrite {
    Set(SlotRecord),
    Clear,
}

#[derive(Clone)]
pub struct SessionJar {
    access: Option<SecretString>,
    renewal: Option<SecretString>,
    writes: [Option<SlotWrite>; 2],
    policy: CookiePolicy,
}

impl fmt::Debug for SessionJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionJar")
            .field("access", &self.access.is_some())
            .field("renewal", &self.renewal.is_some())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

impl SessionJar {
    /// An empty jar using the given cookie policy.
    #[must_use]
    pub fn new(policy: CookiePolicy) -> Self {
        Self {
            access: None,
            renewal: None,
            writes: [None, None],
            policy,
        }
    }

    /// Load both slots from the request cookies.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, policy: CookiePolicy) -> Self {
        Self {
            access: cookies::read_cookie(headers, Slot::Access.cookie_name())
                .map(SecretString::from),
            renewal: cookies::read_cookie(headers, Slot::Renewal.cookie_name())
                .map(SecretString::from),
            writes: [None, None],
            policy,
        }
    }

    /// Existence-only check on the access slot.
    #[must_use]
    pub fn has_access(&self) -> bool {
        self.access.is_some()
    }

    #[must_use]
    pub fn has_renewal(&self) -> bool {
        self.renewal.is_some()
    }

    #[must_use]
    pub fn access(&self) -> Option<&SecretString> {
        self.access.as_ref()
    }

    #[must_use]
    pub fn renewal(&self) -> Option<&SecretString> {
        self.renewal.as_ref()
    }

    /// Overwrite both slots with a new pair.
    pub(crate) fn store(&mut self, pair: CredentialPair) {
        let policy = self.policy;
        let now = SystemTime::now();
        for (slot, value) in [(Slot::Access, pair.access), (Slot::Renewal, pair.renewal)] {
            self.writes[slot.index()] = Some(SlotWrite::Set(SlotRecord {
                value: value.clone(),
                created_at: now,
                max_age: policy.max_age(slot),
            }));
            match slot {
                Slot::Access => self.access = Some(value),
                Slot::Renewal => self.renewal = Some(value),
            }
        }
    }

    /// Erase both slots.
    pub(crate) fn clear(&mut self) {
        self.access = None;
        self.renewal = None;
        self.writes = [Some(SlotWrite::Clear), Some(SlotWrite::Clear)];
    }

    /// Whether this jar will emit any `Set-Cookie` header.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.writes.iter().any(Option::is_some)
    }

    /// The record written to a slot during this request, if any.
    #[must_use]
    pub fn written(&self, slot: Slot) -> Option<&SlotRecord> {
        match &self.writes[slot.index()] {
            Some(SlotWrite::Set(record)) => Some(record),
            _ => None,
        }
    }

    /// Render pending writes as `Set-Cookie` header values.
    ///
    /// # Errors
    /// Returns an error if a secret cannot be encoded as a header value.
    pub fn set_cookie_headers(&self) -> Result<Vec<HeaderValue>, InvalidHeaderValue> {
        let secure = self.policy.secure();
        let mut headers = Vec::with_capacity(2);
        for slot in Slot::ALL {
            match &self.writes[slot.index()] {
                Some(SlotWrite::Set(record)) => {
                    headers.push(cookies::set_cookie(
                        slot,
                        record.value.expose_secret(),
                        record.max_age,
                        secure,
                    )?);
                }
                Some(SlotWrite::Clear) => headers.push(cookies::clear_cookie(slot, secure)?),
                None => {}
            }
        }
        Ok(headers)
    }
}

/// Existence-only check for the access slot, without loading the jar.
#[must_use]
pub fn access_present(headers: &HeaderMap) -> bool {
    cookies::read_cookie(headers, Slot::Access.cookie_name()).is_some()
}
