//! Domain primitives: TimeMs, entity ids, Slug, ClickToken.

use serde::{Deserialize, Serialize};

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Add a whole number of days.
    pub fn plus_days(&self, days: i64) -> Self {
        TimeMs(self.0 + days * 86_400_000)
    }
}

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            /// Mint a fresh random id.
            pub fn generate() -> Self {
                $name(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a creator account.
    CreatorId
);
string_id!(
    /// Identifier of a brand account.
    BrandId
);
string_id!(
    /// Identifier of a promotable product.
    ProductId
);
string_id!(
    /// Identifier of an affiliate link.
    LinkId
);
string_id!(
    /// Identifier of a click row.
    ClickId
);
string_id!(
    /// Identifier of a ledger transaction.
    TransactionId
);

/// Short public tracking code embedded in a shareable URL.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slug(pub String);

impl Slug {
    pub fn new(slug: impl Into<String>) -> Self {
        Slug(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque per-click token issued to the browser via cookie.
///
/// 128 bits of randomness, URL-safe lowercase hex. Unguessable by
/// construction; used to correlate a later conversion with its click.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClickToken(pub String);

impl ClickToken {
    pub fn new(token: impl Into<String>) -> Self {
        ClickToken(token.into())
    }

    /// Mint a fresh random token.
    pub fn generate() -> Self {
        ClickToken(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClickToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
