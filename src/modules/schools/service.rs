use std::sync::Arc;

use schoolhub_cache::{RedisCache, hash_filters, invalidate, keys};
use schoolhub_core::{AppError, FileStorage, PaginationMeta};
use schoolhub_db::PgPool;
use schoolhub_models::{
    CreateSchoolDto, PaginatedSchoolsResponse, School, SchoolFilterParams, UpdateSchoolDto,
    UploadImageResponse,
};
use schoolhub_observability::track_school_created;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::utils::db_errors::map_db_error;
use crate::utils::upload::ImageUpload;

pub(crate) const SCHOOL_COLUMNS: &str = "id, name, username, description, school_type, email, \
     phone, website, address, logo, creator_id, academic_profile, total_students, \
     total_teachers, total_staff, total_classes, total_modules, created_at, updated_at";

pub struct SchoolService;

impl SchoolService {
    #[instrument(skip(db, cache, dto), fields(school.username = %dto.username, db.operation = "INSERT", db.table = "schools"))]
    pub async fn create_school(
        db: &PgPool,
        cache: Option<&RedisCache>,
        creator_id: Uuid,
        dto: CreateSchoolDto,
    ) -> Result<School, AppError> {
        debug!(school.name = %dto.name, "Creating new school");

        let school = sqlx::query_as::<_, School>(&format!(
            "INSERT INTO schools (name, username, description, school_type, email, phone, website, address, creator_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {}",
            SCHOOL_COLUMNS
        ))
        .bind(dto.name.trim())
        .bind(&dto.username)
        .bind(&dto.description)
        .bind(dto.school_type)
        .bind(dto.email.as_deref().map(str::to_lowercase))
        .bind(&dto.phone)
        .bind(&dto.website)
        .bind(&dto.address)
        .bind(creator_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            warn!(school.username = %dto.username, "Failed to insert school");
            map_db_error(e)
        })?;

        invalidate::school_lists(cache).await;
        track_school_created();

        info!(school.id = %school.id, school.username = %school.username, "School created");

        Ok(school)
    }

    #[instrument(skip(db, cache, filters), fields(db.operation = "SELECT", db.table = "schools"))]
    pub async fn get_all_schools(
        db: &PgPool,
        cache: Option<&RedisCache>,
        filters: SchoolFilterParams,
    ) -> Result<PaginatedSchoolsResponse, AppError> {
        let cache_key = keys::schools::list(&hash_filters(&filters));

        if let Some(cache) = cache
            && let Some(page) = cache.get::<PaginatedSchoolsResponse>(&cache_key).await
        {
            debug!("School list found in cache");
            return Ok(page);
        }

        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        debug!(
            limit = %limit,
            offset = %offset,
            filter.name = ?filters.name,
            filter.username = ?filters.username,
            filter.school_type = ?filters.school_type,
            "Fetching schools"
        );

        let name_pattern = filters.name.as_ref().map(|n| format!("%{}%", n));
        let username_pattern = filters.username.as_ref().map(|u| format!("%{}%", u));

        let where_clause = "WHERE ($1::text IS NULL OR name ILIKE $1)
               AND ($2::text IS NULL OR username ILIKE $2)
               AND ($3::school_type IS NULL OR school_type = $3)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM schools {}",
            where_clause
        ))
        .bind(&name_pattern)
        .bind(&username_pattern)
        .bind(filters.school_type)
        .fetch_one(db)
        .await
        .map_err(map_db_error)?;

        let schools = sqlx::query_as::<_, School>(&format!(
            "SELECT {} FROM schools {} ORDER BY created_at DESC LIMIT $4 OFFSET $5",
            SCHOOL_COLUMNS, where_clause
        ))
        .bind(&name_pattern)
        .bind(&username_pattern)
        .bind(filters.school_type)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .map_err(map_db_error)?;

        debug!(total = %total, returned = %schools.len(), "Schools fetched");

        let page = PaginatedSchoolsResponse {
            data: schools,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        };

        if let Some(cache) = cache
            && let Err(e) = cache.set(&cache_key, &page).await
        {
            warn!(error = %e, "Failed to cache school list");
        }

        Ok(page)
    }

    #[instrument(skip(db, cache), fields(school.id = %school_id, db.operation = "SELECT", db.table = "schools"))]
    pub async fn get_school(
        db: &PgPool,
        cache: Option<&RedisCache>,
        school_id: Uuid,
    ) -> Result<School, AppError> {
        let cache_key = keys::schools::by_id(school_id);

        if let Some(cache) = cache
            && let Some(school) = cache.get::<School>(&cache_key).await
        {
            debug!("School found in cache");
            return Ok(school);
        }

        let school = sqlx::query_as::<_, School>(&format!(
            "SELECT {} FROM schools WHERE id = $1",
            SCHOOL_COLUMNS
        ))
        .bind(school_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(school.id = %school_id, error = %e, "Database error fetching school");
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("School not found")))?;

        if let Some(cache) = cache
            && let Err(e) = cache.set(&cache_key, &school).await
        {
            warn!(error = %e, "Failed to cache school");
        }

        Ok(school)
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "schools"))]
    pub async fn get_school_by_username(db: &PgPool, username: &str) -> Result<School, AppError> {
        sqlx::query_as::<_, School>(&format!(
            "SELECT {} FROM schools WHERE username = $1",
            SCHOOL_COLUMNS
        ))
        .bind(username.trim().to_lowercase())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("School not found")))
    }

    #[instrument(skip(db, cache, dto), fields(school.id = %school_id, db.operation = "UPDATE", db.table = "schools"))]
    pub async fn update_school(
        db: &PgPool,
        cache: Option<&RedisCache>,
        school_id: Uuid,
        dto: UpdateSchoolDto,
    ) -> Result<School, AppError> {
        let school = sqlx::query_as::<_, School>(&format!(
            "UPDATE schools SET
                name = COALESCE($2, name),
                username = COALESCE($3, username),
                description = COALESCE($4, description),
                school_type = COALESCE($5, school_type),
                email = COALESCE($6, email),
                phone = COALESCE($7, phone),
                website = COALESCE($8, website),
                address = COALESCE($9, address),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            SCHOOL_COLUMNS
        ))
        .bind(school_id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.username)
        .bind(&dto.description)
        .bind(dto.school_type)
        .bind(dto.email.as_deref().map(str::to_lowercase))
        .bind(&dto.phone)
        .bind(&dto.website)
        .bind(&dto.address)
        .fetch_optional(db)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("School not found")))?;

        invalidate::school(cache, school_id).await;
        info!(school.id = %school_id, "School updated");

        Ok(school)
    }

    /// Stores a new logo and removes the previous file once the row points
    /// at the new key.
    #[instrument(skip(db, cache, storage, upload), fields(school.id = %school.id, db.operation = "UPDATE", db.table = "schools"))]
    pub async fn set_logo(
        db: &PgPool,
        cache: Option<&RedisCache>,
        storage: &Arc<dyn FileStorage>,
        school: &School,
        upload: ImageUpload,
    ) -> Result<UploadImageResponse, AppError> {
        let key = upload.storage_key("schools", school.id);
        storage.save(&key, &upload.bytes).await?;

        let updated = sqlx::query("UPDATE schools SET logo = $2, updated_at = NOW() WHERE id = $1")
            .bind(school.id)
            .bind(&key)
            .execute(db)
            .await;

        match updated {
            Ok(result) if result.rows_affected() > 0 => {}
            Ok(_) => {
                discard_file(storage, &key).await;
                return Err(AppError::not_found(anyhow::anyhow!("School not found")));
            }
            Err(e) => {
                discard_file(storage, &key).await;
                return Err(map_db_error(e));
            }
        }

        if let Some(previous) = &school.logo
            && *previous != key
        {
            discard_file(storage, previous).await;
        }

        invalidate::school(cache, school.id).await;
        info!(school.id = %school.id, storage.key = %key, "School logo updated");

        let url = storage.get_url(&key)?;
        Ok(UploadImageResponse { key, url })
    }

    #[instrument(skip(db, cache, storage), fields(school.id = %school.id, db.operation = "UPDATE", db.table = "schools"))]
    pub async fn delete_logo(
        db: &PgPool,
        cache: Option<&RedisCache>,
        storage: &Arc<dyn FileStorage>,
        school: &School,
    ) -> Result<(), AppError> {
        let Some(logo) = &school.logo else {
            debug!("School has no logo");
            return Ok(());
        };

        sqlx::query("UPDATE schools SET logo = NULL, updated_at = NOW() WHERE id = $1")
            .bind(school.id)
            .execute(db)
            .await
            .map_err(map_db_error)?;

        discard_file(storage, logo).await;
        invalidate::school(cache, school.id).await;
        info!(school.id = %school.id, "School logo removed");

        Ok(())
    }
}

/// Best-effort removal; an orphaned file is logged rather than failing the request.
pub(crate) async fn discard_file(storage: &Arc<dyn FileStorage>, key: &str) {
    if let Err(e) = storage.delete(key).await {
        warn!(error = %e, storage.key = %key, "Failed to delete stored file");
    }
}
