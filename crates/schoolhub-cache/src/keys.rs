//! Cache key layout and invalidation helpers.
//!
//! Keys look like `schoolhub:school:<id>` and `schoolhub:schools:list:<hash>`.

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

use crate::RedisCache;

const PREFIX: &str = "schoolhub";

fn key(parts: &[&str]) -> String {
    format!("{}:{}", PREFIX, parts.join(":"))
}

pub mod schools {
    use super::*;

    pub fn by_id(school_id: Uuid) -> String {
        key(&["school", &school_id.to_string()])
    }

    pub fn list(filters_hash: &str) -> String {
        key(&["schools", "list", filters_hash])
    }

    pub fn list_pattern() -> String {
        format!("{}:schools:list:*", PREFIX)
    }
}

pub mod classes {
    use super::*;

    pub fn by_id(class_id: Uuid) -> String {
        key(&["class", &class_id.to_string()])
    }
}

/// Short, stable digest of a filter struct for use in list keys.
pub fn hash_filters<T: Serialize>(filters: &T) -> String {
    let encoded = serde_json::to_vec(filters).unwrap_or_default();
    let digest = Sha256::digest(&encoded);
    hex::encode(&digest[..12])
}

pub mod invalidate {
    use super::*;

    /// Drops a school row and every cached school list.
    pub async fn school(cache: Option<&RedisCache>, school_id: Uuid) {
        let Some(cache) = cache else { return };

        if let Err(e) = cache.delete(&schools::by_id(school_id)).await {
            warn!(error = %e, school.id = %school_id, "Failed to invalidate school cache");
        }
        school_lists(Some(cache)).await;
    }

    pub async fn school_lists(cache: Option<&RedisCache>) {
        let Some(cache) = cache else { return };

        if let Err(e) = cache.delete_matching(&schools::list_pattern()).await {
            warn!(error = %e, "Failed to invalidate school list caches");
        }
    }

    pub async fn class(cache: Option<&RedisCache>, class_id: Uuid) {
        let Some(cache) = cache else { return };

        if let Err(e) = cache.delete(&classes::by_id(class_id)).await {
            warn!(error = %e, class.id = %class_id, "Failed to invalidate class cache");
        }
    }
}
