//! Ledger transactions: immutable records of money owed.

use crate::domain::{
    BrandId, ClickId, CreatorId, LinkId, Money, ProductId, TimeMs, TransactionId,
};
use serde::{Deserialize, Serialize};

/// Kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Commission accrued from an attributed purchase.
    Sale,
    /// Fixed CPC accrual for an admitted click.
    Click,
    /// Disbursement to a creator (written by external payout jobs).
    Payout,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "sale",
            TransactionType::Click => "click",
            TransactionType::Payout => "payout",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sale" => Some(TransactionType::Sale),
            "click" => Some(TransactionType::Click),
            "payout" => Some(TransactionType::Payout),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement status of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(TransactionStatus::Completed),
            "pending" => Some(TransactionStatus::Pending),
            "failed" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

/// How the conversion was attributed back to its click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributionSource {
    /// First-party cookie carried the click token to the pixel.
    Cookie,
    /// CPC accrual posted at click time, no conversion involved.
    Direct,
}

impl AttributionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributionSource::Cookie => "cookie",
            AttributionSource::Direct => "direct",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cookie" => Some(AttributionSource::Cookie),
            "direct" => Some(AttributionSource::Direct),
            _ => None,
        }
    }
}

/// One immutable ledger entry.
///
/// At most one Sale transaction exists per click (the exactly-once
/// accrual guarantee). Completed amounts are never mutated; corrections
/// arrive as separate adjustment rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub tx_type: TransactionType,
    pub brand_id: BrandId,
    pub creator_id: CreatorId,
    pub product_id: ProductId,
    pub link_id: LinkId,
    pub click_id: Option<ClickId>,
    pub order_id: Option<String>,
    pub gross: Money,
    pub commission: Money,
    pub source: AttributionSource,
    pub status: TransactionStatus,
    pub created_at: TimeMs,
}
