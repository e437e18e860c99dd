//! Link registry: maps tracking slugs to (creator, product, brand).

use crate::db::Repository;
use crate::domain::{AffiliateLink, CreatorId, ProductId, Slug, TimeMs};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Slug length in characters. 8 alphanumerics from a CSPRNG gives
/// 62^8 (~2^47) possibilities, unguessable at marketplace scale.
const SLUG_LEN: usize = 8;

/// Retry budget for slug unique-index collisions.
const MAX_SLUG_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown creator: {0}")]
    UnknownCreator(String),
    #[error("unknown product: {0}")]
    UnknownProduct(String),
    #[error("could not mint a unique slug after {MAX_SLUG_ATTEMPTS} attempts")]
    SlugExhausted,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Outcome of a create call: the link plus whether it was newly minted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedLink {
    pub link: AffiliateLink,
    pub created: bool,
}

/// Registry of affiliate links. Creation is idempotent per
/// (creator, product) pair; resolution is a unique-index lookup.
pub struct LinkRegistry {
    repo: Arc<Repository>,
}

impl LinkRegistry {
    pub fn new(repo: Arc<Repository>) -> Self {
        LinkRegistry { repo }
    }

    /// Create a link for a (creator, product) pair, or return the existing
    /// one. Slugs are minted from a CSPRNG and retried on unique-index
    /// collision; a lost race on the pair index also resolves to the
    /// existing link.
    ///
    /// # Errors
    /// Fails when the creator or product does not exist, or on database
    /// errors other than the handled unique-index conflicts.
    pub async fn create_link(
        &self,
        creator_id: &CreatorId,
        product_id: &ProductId,
    ) -> Result<CreatedLink, RegistryError> {
        let creator = self
            .repo
            .get_creator(creator_id)
            .await?
            .ok_or_else(|| RegistryError::UnknownCreator(creator_id.to_string()))?;
        let product = self
            .repo
            .get_product(product_id)
            .await?
            .ok_or_else(|| RegistryError::UnknownProduct(product_id.to_string()))?;

        if let Some(existing) = self.repo.get_link_by_pair(creator_id, product_id).await? {
            return Ok(CreatedLink {
                link: existing,
                created: false,
            });
        }

        for _ in 0..MAX_SLUG_ATTEMPTS {
            let link = AffiliateLink::new(
                creator.id.clone(),
                product.id.clone(),
                product.brand_id.clone(),
                mint_slug(),
                TimeMs::now(),
            );

            match self.repo.insert_link(&link).await {
                Ok(()) => {
                    self.repo
                        .increment_product_creators_interested(product_id)
                        .await?;
                    info!(slug = %link.slug, creator = %creator_id, product = %product_id, "Link created");
                    return Ok(CreatedLink {
                        link,
                        created: true,
                    });
                }
                Err(err) if is_unique_violation(&err, "links.slug") => continue,
                Err(err) if is_unique_violation(&err, "links.creator_id") => {
                    // Lost a concurrent create race for the same pair.
                    let existing = self
                        .repo
                        .get_link_by_pair(creator_id, product_id)
                        .await?
                        .ok_or(RegistryError::Db(err))?;
                    return Ok(CreatedLink {
                        link: existing,
                        created: false,
                    });
                }
                Err(err) => return Err(RegistryError::Db(err)),
            }
        }

        Err(RegistryError::SlugExhausted)
    }

    /// Resolve a slug to its link. Hot path of every redirect.
    pub async fn resolve(&self, slug: &Slug) -> Result<Option<AffiliateLink>, sqlx::Error> {
        self.repo.get_link_by_slug(slug).await
    }

    /// Soft-deactivate a link. Returns false if no such link.
    pub async fn deactivate(&self, slug: &Slug) -> Result<bool, sqlx::Error> {
        match self.repo.get_link_by_slug(slug).await? {
            Some(link) => self.repo.set_link_active(&link.id, false).await,
            None => Ok(false),
        }
    }
}

/// Mint a random alphanumeric slug from the thread-local CSPRNG.
fn mint_slug() -> Slug {
    let code: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SLUG_LEN)
        .map(char::from)
        .collect();
    Slug::new(code)
}

/// True when the error is a SQLite unique-index violation mentioning the
/// given column path (e.g. "links.slug").
fn is_unique_violation(err: &sqlx::Error, column: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            let msg = db.message();
            msg.contains("UNIQUE constraint failed") && msg.contains(column)
        }
        _ => false,
    }
}
