//! School invitation codes.
//!
//! Each school holds one code per [`JoinRole`]; only bcrypt hashes are
//! stored. The plaintext prefix (`STU-`, `TCH-`, ...) names the role so a
//! submitted code is checked against a single hash.

use schoolhub_cache::{RedisCache, invalidate};
use schoolhub_core::AppError;
use schoolhub_core::secrets::{hash_secret, random_code, verify_secret};
use schoolhub_db::PgPool;
use schoolhub_models::{InvitationCodesResponse, JoinRole, SchoolCodeHashes};
use schoolhub_observability::track_invitation_codes_generated;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::utils::db_errors::map_db_error;

pub const CODE_LENGTH: usize = 8;

pub fn generate_code(role: JoinRole) -> String {
    format!("{}-{}", role.code_prefix(), random_code(CODE_LENGTH))
}

/// Normalizes user input: surrounding whitespace is dropped and letters uppercased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// The role a code was issued for, judged by its prefix alone.
pub fn role_for_code(code: &str) -> Option<JoinRole> {
    let (prefix, rest) = code.split_once('-')?;
    if rest.is_empty() {
        return None;
    }
    JoinRole::ALL
        .into_iter()
        .find(|role| role.code_prefix() == prefix)
}

pub fn hash_for_role(hashes: &SchoolCodeHashes, role: JoinRole) -> Option<&str> {
    match role {
        JoinRole::Student => hashes.student_code_hash.as_deref(),
        JoinRole::Teacher => hashes.teacher_code_hash.as_deref(),
        JoinRole::Staff => hashes.staff_code_hash.as_deref(),
        JoinRole::Parent => hashes.parent_code_hash.as_deref(),
    }
}

async fn hash_blocking(code: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_secret(&code)).await?
}

/// Resolves a submitted code to the role it grants.
///
/// `Ok(None)` means no stored hash matches.
pub async fn match_code(hashes: &SchoolCodeHashes, code: &str) -> Result<Option<JoinRole>, AppError> {
    let code = normalize_code(code);
    let Some(role) = role_for_code(&code) else {
        return Ok(None);
    };
    let Some(hash) = hash_for_role(hashes, role).map(str::to_string) else {
        return Ok(None);
    };

    let matched = tokio::task::spawn_blocking(move || verify_secret(&code, &hash)).await??;
    Ok(matched.then_some(role))
}

pub struct InvitationService;

impl InvitationService {
    /// Replaces all four codes; earlier codes stop working immediately.
    #[instrument(skip(db, cache), fields(school.id = %school_id, db.operation = "UPDATE", db.table = "schools"))]
    pub async fn regenerate_codes(
        db: &PgPool,
        cache: Option<&RedisCache>,
        school_id: Uuid,
    ) -> Result<InvitationCodesResponse, AppError> {
        let codes = InvitationCodesResponse {
            student_code: generate_code(JoinRole::Student),
            teacher_code: generate_code(JoinRole::Teacher),
            staff_code: generate_code(JoinRole::Staff),
            parent_code: generate_code(JoinRole::Parent),
        };

        let (student, teacher, staff, parent) = tokio::try_join!(
            hash_blocking(codes.student_code.clone()),
            hash_blocking(codes.teacher_code.clone()),
            hash_blocking(codes.staff_code.clone()),
            hash_blocking(codes.parent_code.clone()),
        )?;

        let result = sqlx::query(
            "UPDATE schools SET
                student_code_hash = $2,
                teacher_code_hash = $3,
                staff_code_hash = $4,
                parent_code_hash = $5,
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(school_id)
        .bind(student)
        .bind(teacher)
        .bind(staff)
        .bind(parent)
        .execute(db)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("School not found")));
        }

        invalidate::school(cache, school_id).await;
        track_invitation_codes_generated();
        info!(school.id = %school_id, "Invitation codes regenerated");

        Ok(codes)
    }

    #[instrument(skip(db), fields(school.id = %school_id, db.operation = "SELECT", db.table = "schools"))]
    pub async fn code_hashes(db: &PgPool, school_id: Uuid) -> Result<SchoolCodeHashes, AppError> {
        debug!("Loading invitation code hashes");
        sqlx::query_as::<_, SchoolCodeHashes>(
            "SELECT student_code_hash, teacher_code_hash, staff_code_hash, parent_code_hash
             FROM schools WHERE id = $1",
        )
        .bind(school_id)
        .fetch_optional(db)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("School not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_core::secrets::{CODE_ALPHABET, hash_secret_with_cost};

    fn hashes_with(role: JoinRole, code: &str) -> SchoolCodeHashes {
        let hash = Some(hash_secret_with_cost(code, 4).unwrap());
        let mut hashes = SchoolCodeHashes {
            student_code_hash: None,
            teacher_code_hash: None,
            staff_code_hash: None,
            parent_code_hash: None,
        };
        match role {
            JoinRole::Student => hashes.student_code_hash = hash,
            JoinRole::Teacher => hashes.teacher_code_hash = hash,
            JoinRole::Staff => hashes.staff_code_hash = hash,
            JoinRole::Parent => hashes.parent_code_hash = hash,
        }
        hashes
    }

    #[test]
    fn test_generated_code_shape() {
        for role in JoinRole::ALL {
            let code = generate_code(role);
            let (prefix, rest) = code.split_once('-').unwrap();
            assert_eq!(prefix, role.code_prefix());
            assert_eq!(rest.len(), CODE_LENGTH);
            assert!(rest.bytes().all(|b| CODE_ALPHABET.contains(&b)));
            assert_eq!(role_for_code(&code), Some(role));
        }
    }

    #[test]
    fn test_role_for_code_rejects_unknown_prefixes() {
        assert_eq!(role_for_code("ADM-ABCDEFGH"), None);
        assert_eq!(role_for_code("STU-"), None);
        assert_eq!(role_for_code("STUABCDEFGH"), None);
        assert_eq!(role_for_code(&normalize_code("  prt-abcd2345 ")), Some(JoinRole::Parent));
    }

    #[tokio::test]
    async fn test_match_code() {
        let hashes = hashes_with(JoinRole::Teacher, "TCH-ABCD2345");

        assert_eq!(
            match_code(&hashes, "tch-abcd2345").await.unwrap(),
            Some(JoinRole::Teacher)
        );
        assert_eq!(match_code(&hashes, "TCH-ABCD2346").await.unwrap(), None);
        // Right secret, wrong role prefix.
        assert_eq!(match_code(&hashes, "STU-ABCD2345").await.unwrap(), None);
    }
}
