use std::collections::{HashMap, HashSet};

use schoolhub_cache::{RedisCache, invalidate};
use schoolhub_core::{AppError, PaginationMeta};
use schoolhub_db::PgPool;
use schoolhub_models::{
    BulkJoinRequestDto, BulkJoinResponse, JoinRequestFilterParams, JoinRequestItem,
    JoinRequestStatus, JoinRole, JoinWithCodeDto, PaginatedJoinRequestsResponse,
    SchoolJoinRequest,
};
use schoolhub_observability::track_join_requests_created;
use sqlx::{FromRow, Postgres, QueryBuilder};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::modules::schools::invitations::{InvitationService, match_code};
use crate::utils::db_errors::map_db_error;

const JOIN_REQUEST_COLUMNS: &str =
    "id, school_id, role, name, email, phone, user_id, status, created_at, updated_at";

/// Normalizes the batch and drops items whose `(role, email)` or
/// `(role, phone)` already appeared earlier in it.
pub fn dedupe_items(items: &[JoinRequestItem]) -> Vec<JoinRequestItem> {
    let mut seen_emails: HashSet<(JoinRole, String)> = HashSet::new();
    let mut seen_phones: HashSet<(JoinRole, String)> = HashSet::new();
    let mut unique = Vec::with_capacity(items.len());

    for item in items.iter().map(JoinRequestItem::normalized) {
        let email_key = item.email.clone().map(|e| (item.role, e));
        let phone_key = item.phone.clone().map(|p| (item.role, p));

        let duplicate = email_key.as_ref().is_some_and(|k| seen_emails.contains(k))
            || phone_key.as_ref().is_some_and(|k| seen_phones.contains(k));
        if duplicate {
            continue;
        }

        if let Some(key) = email_key {
            seen_emails.insert(key);
        }
        if let Some(key) = phone_key {
            seen_phones.insert(key);
        }
        unique.push(item);
    }

    unique
}

#[derive(Debug, FromRow)]
struct UserContact {
    id: Uuid,
    email: Option<String>,
    phone: Option<String>,
}

/// Existing users keyed by lowercased email and by phone.
#[derive(Debug, Default)]
struct UserIndex {
    by_email: HashMap<String, Uuid>,
    by_phone: HashMap<String, Uuid>,
}

impl UserIndex {
    fn lookup(&self, item: &JoinRequestItem) -> Option<Uuid> {
        item.email
            .as_ref()
            .and_then(|e| self.by_email.get(e))
            .or_else(|| item.phone.as_ref().and_then(|p| self.by_phone.get(p)))
            .copied()
    }
}

async fn load_users(db: &PgPool, items: &[JoinRequestItem]) -> Result<UserIndex, AppError> {
    let emails: Vec<String> = items.iter().filter_map(|i| i.email.clone()).collect();
    let phones: Vec<String> = items.iter().filter_map(|i| i.phone.clone()).collect();

    let users = sqlx::query_as::<_, UserContact>(
        "SELECT id, email, phone FROM users
         WHERE LOWER(email) = ANY($1) OR phone = ANY($2)",
    )
    .bind(&emails)
    .bind(&phones)
    .fetch_all(db)
    .await
    .map_err(map_db_error)?;

    let mut index = UserIndex::default();
    for user in users {
        if let Some(email) = user.email {
            index.by_email.insert(email.to_lowercase(), user.id);
        }
        if let Some(phone) = user.phone {
            index.by_phone.insert(phone, user.id);
        }
    }
    Ok(index)
}

async fn ensure_school_exists(db: &PgPool, school_id: Uuid) -> Result<(), AppError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM schools WHERE id = $1)")
        .bind(school_id)
        .fetch_one(db)
        .await
        .map_err(map_db_error)?;

    if !exists {
        return Err(AppError::not_found(anyhow::anyhow!("School not found")));
    }
    Ok(())
}

pub struct JoinRequestService;

impl JoinRequestService {
    #[instrument(skip(db, dto), fields(school.id = %school_id, requests = dto.requests.len(), db.operation = "INSERT", db.table = "school_join_requests"))]
    pub async fn create_bulk(
        db: &PgPool,
        school_id: Uuid,
        dto: BulkJoinRequestDto,
    ) -> Result<BulkJoinResponse, AppError> {
        if let Some(index) = dto.first_missing_contact() {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "requests[{}] must include an email or a phone",
                index
            )));
        }

        ensure_school_exists(db, school_id).await?;

        let items = dedupe_items(&dto.requests);
        let users = load_users(db, &items).await?;

        debug!(
            submitted = dto.requests.len(),
            unique = items.len(),
            "Inserting join requests"
        );

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO school_join_requests (school_id, role, name, email, phone, user_id) ",
        );
        builder.push_values(&items, |mut row, item| {
            row.push_bind(school_id)
                .push_bind(item.role)
                .push_bind(&item.name)
                .push_bind(&item.email)
                .push_bind(&item.phone)
                .push_bind(users.lookup(item));
        });
        builder.push(" ON CONFLICT DO NOTHING");

        let result = builder
            .build()
            .execute(db)
            .await
            .map_err(map_db_error)?;

        let created = result.rows_affected() as usize;
        let skipped = dto.requests.len() - created;

        track_join_requests_created("bulk", created);
        info!(school.id = %school_id, created, skipped, "Join requests created");

        Ok(BulkJoinResponse { created, skipped })
    }

    #[instrument(skip(db, dto, caller_email), fields(school.id = %school_id, user.id = %user_id, db.operation = "INSERT", db.table = "school_join_requests"))]
    pub async fn join_with_code(
        db: &PgPool,
        school_id: Uuid,
        user_id: Uuid,
        caller_email: &str,
        dto: JoinWithCodeDto,
    ) -> Result<SchoolJoinRequest, AppError> {
        let hashes = InvitationService::code_hashes(db, school_id).await?;
        if hashes.is_empty() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "This school has not issued invitation codes"
            )));
        }

        let role = match_code(&hashes, &dto.code).await?.ok_or_else(|| {
            warn!(school.id = %school_id, "Invalid invitation code submitted");
            AppError::forbidden("Invalid invitation code")
        })?;

        let item = JoinRequestItem {
            role,
            name: dto.name,
            email: dto.email.or_else(|| Some(caller_email.to_string())),
            phone: dto.phone,
        }
        .normalized();

        if !item.has_contact() {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "An email or a phone is required"
            )));
        }

        let pending = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM school_join_requests
                WHERE school_id = $1 AND role = $2 AND status = 'pending' AND user_id = $3
            )",
        )
        .bind(school_id)
        .bind(role)
        .bind(user_id)
        .fetch_one(db)
        .await
        .map_err(map_db_error)?;

        if pending {
            return Err(AppError::conflict(
                "A pending join request already exists for this role",
            ));
        }

        let request = sqlx::query_as::<_, SchoolJoinRequest>(&format!(
            "INSERT INTO school_join_requests (school_id, role, name, email, phone, user_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            JOIN_REQUEST_COLUMNS
        ))
        .bind(school_id)
        .bind(role)
        .bind(&item.name)
        .bind(&item.email)
        .bind(&item.phone)
        .bind(user_id)
        .fetch_one(db)
        .await
        .map_err(map_db_error)?;

        track_join_requests_created("code", 1);
        info!(request.id = %request.id, role = role.as_str(), "Join request submitted with code");

        Ok(request)
    }

    #[instrument(skip(db, filters), fields(school.id = %school_id, db.operation = "SELECT", db.table = "school_join_requests"))]
    pub async fn list(
        db: &PgPool,
        school_id: Uuid,
        filters: JoinRequestFilterParams,
    ) -> Result<PaginatedJoinRequestsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let where_clause = "WHERE school_id = $1
               AND ($2::join_request_status IS NULL OR status = $2)
               AND ($3::join_role IS NULL OR role = $3)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM school_join_requests {}",
            where_clause
        ))
        .bind(school_id)
        .bind(filters.status)
        .bind(filters.role)
        .fetch_one(db)
        .await
        .map_err(map_db_error)?;

        let requests = sqlx::query_as::<_, SchoolJoinRequest>(&format!(
            "SELECT {} FROM school_join_requests {} ORDER BY created_at DESC LIMIT $4 OFFSET $5",
            JOIN_REQUEST_COLUMNS, where_clause
        ))
        .bind(school_id)
        .bind(filters.status)
        .bind(filters.role)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .map_err(map_db_error)?;

        Ok(PaginatedJoinRequestsResponse {
            data: requests,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    /// Accepts or rejects a pending request.
    ///
    /// Acceptance links the request to a user account, attaches members to
    /// the school and bumps the role's counter in the same transaction.
    #[instrument(skip(db, cache), fields(school.id = %school_id, request.id = %request_id, db.operation = "UPDATE", db.table = "school_join_requests"))]
    pub async fn respond(
        db: &PgPool,
        cache: Option<&RedisCache>,
        school_id: Uuid,
        request_id: Uuid,
        decision: JoinRequestStatus,
    ) -> Result<SchoolJoinRequest, AppError> {
        let mut tx = db.begin().await.map_err(map_db_error)?;

        let request = sqlx::query_as::<_, SchoolJoinRequest>(&format!(
            "SELECT {} FROM school_join_requests WHERE id = $1 AND school_id = $2 FOR UPDATE",
            JOIN_REQUEST_COLUMNS
        ))
        .bind(request_id)
        .bind(school_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Join request not found")))?;

        if request.status != JoinRequestStatus::Pending {
            return Err(AppError::conflict("Join request has already been answered"));
        }

        let user_id = match decision {
            JoinRequestStatus::Accepted => {
                let user_id = match request.user_id {
                    Some(id) => id,
                    None => sqlx::query_scalar::<_, Uuid>(
                        "SELECT id FROM users
                         WHERE ($1::text IS NOT NULL AND LOWER(email) = LOWER($1))
                            OR ($2::text IS NOT NULL AND phone = $2)
                         ORDER BY created_at
                         LIMIT 1",
                    )
                    .bind(&request.email)
                    .bind(&request.phone)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(map_db_error)?
                    .ok_or_else(|| {
                        AppError::bad_request(anyhow::anyhow!(
                            "No user account matches this join request"
                        ))
                    })?,
                };

                if request.role.joins_school() {
                    sqlx::query("UPDATE users SET school_id = $2, updated_at = NOW() WHERE id = $1")
                        .bind(user_id)
                        .bind(school_id)
                        .execute(&mut *tx)
                        .await
                        .map_err(map_db_error)?;
                }

                if let Some(column) = request.role.counter_column() {
                    sqlx::query(&format!(
                        "UPDATE schools SET {col} = {col} + 1, updated_at = NOW() WHERE id = $1",
                        col = column
                    ))
                    .bind(school_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_db_error)?;
                }

                Some(user_id)
            }
            JoinRequestStatus::Rejected => request.user_id,
            JoinRequestStatus::Pending => {
                return Err(AppError::unprocessable(anyhow::anyhow!(
                    "status must be accepted or rejected"
                )));
            }
        };

        let updated = sqlx::query_as::<_, SchoolJoinRequest>(&format!(
            "UPDATE school_join_requests SET status = $2, user_id = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            JOIN_REQUEST_COLUMNS
        ))
        .bind(request_id)
        .bind(decision)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        if decision == JoinRequestStatus::Accepted {
            invalidate::school(cache, school_id).await;
        }
        info!(status = ?decision, "Join request answered");

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(role: JoinRole, email: Option<&str>, phone: Option<&str>) -> JoinRequestItem {
        JoinRequestItem {
            role,
            name: "Grace".to_string(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
        }
    }

    #[test]
    fn test_dedupe_collapses_same_contact_and_role() {
        let items = vec![
            item(JoinRole::Teacher, Some("Grace@Example.com"), None),
            item(JoinRole::Teacher, Some("grace@example.com "), None),
            item(JoinRole::Teacher, None, Some("+250788000111")),
            item(JoinRole::Teacher, Some("other@example.com"), Some("+250788000111")),
        ];

        let unique = dedupe_items(&items);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].email.as_deref(), Some("grace@example.com"));
        assert_eq!(unique[1].phone.as_deref(), Some("+250788000111"));
    }

    #[test]
    fn test_dedupe_keeps_same_contact_for_other_roles() {
        let items = vec![
            item(JoinRole::Parent, Some("grace@example.com"), None),
            item(JoinRole::Staff, Some("grace@example.com"), None),
        ];
        assert_eq!(dedupe_items(&items).len(), 2);
    }

    #[test]
    fn test_user_index_prefers_email() {
        let by_email = Uuid::new_v4();
        let by_phone = Uuid::new_v4();
        let mut index = UserIndex::default();
        index.by_email.insert("grace@example.com".to_string(), by_email);
        index.by_phone.insert("+250788000111".to_string(), by_phone);

        let both = item(JoinRole::Student, Some("grace@example.com"), Some("+250788000111"));
        assert_eq!(index.lookup(&both), Some(by_email));

        let phone_only = item(JoinRole::Student, None, Some("+250788000111"));
        assert_eq!(index.lookup(&phone_only), Some(by_phone));

        let unknown = item(JoinRole::Student, Some("nobody@example.com"), None);
        assert_eq!(index.lookup(&unknown), None);
    }
}
