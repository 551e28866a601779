use std::fmt;

/// Credentials applied to every request sent to a service.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    Basic { user: String, password: String },
    Bearer(String),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { user, .. } => f.debug_struct("Basic").field("user", user).finish_non_exhaustive(),
            Self::Bearer(_) => f.write_str("Bearer(..)"),
        }
    }
}

/// Connection details of one backing product.
pub trait ServiceDetails: Send + Sync {
    /// Base URL without a trailing slash.
    fn url(&self) -> &str;

    fn auth(&self) -> Option<&Auth>;

    /// Server version when known, used for capability checks.
    fn version(&self) -> Option<&str>;
}

macro_rules! service_details {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct $name {
            url:     String,
            auth:    Option<Auth>,
            version: Option<String>,
        }

        impl $name {
            pub fn new(url: impl Into<String>) -> Self {
                Self { url: url.into().trim_end_matches('/').to_string(), auth: None, version: None }
            }

            #[must_use]
            pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
                self.auth = Some(Auth::Basic { user: user.into(), password: password.into() });
                self
            }

            #[must_use]
            pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
                self.auth = Some(Auth::Bearer(token.into()));
                self
            }

            #[must_use]
            pub fn with_version(mut self, version: impl Into<String>) -> Self {
                self.version = Some(version.into());
                self
            }
        }

        impl ServiceDetails for $name {
            fn url(&self) -> &str { &self.url }

            fn auth(&self) -> Option<&Auth> { self.auth.as_ref() }

            fn version(&self) -> Option<&str> { self.version.as_deref() }
        }
    };
}

service_details! {
    /// Binary repository manager.
    ArtifactoryDetails
}

service_details! {
    /// Release distribution service.
    DistributionDetails
}
