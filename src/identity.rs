use std::collections::HashSet;

use serde::Serialize;
use warp::http::HeaderMap;

use crate::errors::AdminError;

pub const DEFAULT_EMAIL_HEADER: &str = "x-forwarded-email";
pub const DEFAULT_DISPLAY_NAME_HEADER: &str = "x-forwarded-user";

/// The signed-in user, as reported by the authenticating proxy in front
/// of this service. Signing in and out happens at the proxy.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Identity {
    pub email: String,
    pub display_name: Option<String>,
}

/// Where to find the identity headers and who may administer courses.
#[derive(Clone, Debug)]
pub struct IdentityConfig {
    email_header: String,
    display_name_header: String,

    /// Lower-cased e-mail addresses. `None` admits every signed-in user.
    allowed: Option<HashSet<String>>,
}

impl IdentityConfig {
    pub fn new(
        email_header: impl Into<String>,
        display_name_header: impl Into<String>,
        allowed: Option<HashSet<String>>,
    ) -> Self {
        IdentityConfig {
            email_header: email_header.into(),
            display_name_header: display_name_header.into(),
            allowed: allowed.map(|a| a.into_iter().map(|e| e.trim().to_lowercase()).collect()),
        }
    }

    /// Parses a comma-separated allow-list. A blank list admits everyone.
    pub fn parse_allowed(list: &str) -> Option<HashSet<String>> {
        let allowed: HashSet<String> = list
            .split(',')
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        if allowed.is_empty() {
            None
        } else {
            Some(allowed)
        }
    }

    /// Returns the signed-in identity, if any.
    pub fn current(&self, headers: &HeaderMap) -> Option<Identity> {
        let read = |name: &str| -> Option<String> {
            let value = headers.get(name)?.to_str().ok()?.trim();

            if value.is_empty() {
                None
            } else {
                Some(value.to_owned())
            }
        };

        Some(Identity {
            email: read(&self.email_header)?,
            display_name: read(&self.display_name_header),
        })
    }

    /// Returns the signed-in identity if it may administer courses.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<Identity, AdminError> {
        let identity = self.current(headers).ok_or(AdminError::Unauthenticated)?;

        match &self.allowed {
            Some(allowed) if !allowed.contains(&identity.email.to_lowercase()) => {
                Err(AdminError::Forbidden {
                    email: identity.email,
                })
            }
            _ => Ok(identity),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig::new(DEFAULT_EMAIL_HEADER, DEFAULT_DISPLAY_NAME_HEADER, None)
    }
}
