//! Discount coupons. Not part of the attribution core; only validity
//! checks are needed here.

use crate::domain::{ProductId, TimeMs};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: String,
    pub code: String,
    pub product_id: Option<ProductId>,
    pub active: bool,
    pub expires_at: Option<TimeMs>,
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    pub created_at: TimeMs,
}

impl Coupon {
    /// Active AND not expired AND usage below the limit, if any.
    pub fn is_valid(&self, now: TimeMs) -> bool {
        if !self.active {
            return false;
        }
        if let Some(expires_at) = self.expires_at {
            if now > expires_at {
                return false;
            }
        }
        if let Some(limit) = self.usage_limit {
            if self.usage_count >= limit {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coupon() -> Coupon {
        Coupon {
            id: "cp1".to_string(),
            code: "SAVE10".to_string(),
            product_id: None,
            active: true,
            expires_at: None,
            usage_limit: None,
            usage_count: 0,
            created_at: TimeMs::new(0),
        }
    }

    #[test]
    fn test_valid_by_default() {
        assert!(coupon().is_valid(TimeMs::new(1_000)));
    }

    #[test]
    fn test_inactive_is_invalid() {
        let mut c = coupon();
        c.active = false;
        assert!(!c.is_valid(TimeMs::new(1_000)));
    }

    #[test]
    fn test_expired_is_invalid() {
        let mut c = coupon();
        c.expires_at = Some(TimeMs::new(500));
        assert!(c.is_valid(TimeMs::new(500)));
        assert!(!c.is_valid(TimeMs::new(501)));
    }

    #[test]
    fn test_usage_limit_exhausted() {
        let mut c = coupon();
        c.usage_limit = Some(3);
        c.usage_count = 2;
        assert!(c.is_valid(TimeMs::new(0)));
        c.usage_count = 3;
        assert!(!c.is_valid(TimeMs::new(0)));
    }
}
