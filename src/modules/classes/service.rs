use std::sync::Arc;

use schoolhub_cache::{RedisCache, invalidate, keys};
use schoolhub_core::secrets::random_code;
use schoolhub_core::{AppError, FileStorage, PaginationMeta};
use schoolhub_db::{PgPool, unique_violation};
use schoolhub_models::{
    Class, ClassFilterParams, ClassType, CourseContentModule, CreateClassDto, UpdateClassDto,
    UploadImageResponse,
};
use schoolhub_observability::track_class_created;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::modules::schools::service::discard_file;
use crate::utils::db_errors::{CLASS_CODE_CONSTRAINT, map_db_error};
use crate::utils::upload::ImageUpload;

pub(crate) const CLASS_COLUMNS: &str = "id, name, username, code, class_type, description, image, \
     school_id, creator_id, class_teacher_id, created_at, updated_at";

pub const CLASS_CODE_LENGTH: usize = 8;
pub const MAX_CODE_ATTEMPTS: u32 = 3;

pub fn generate_class_code() -> String {
    random_code(CLASS_CODE_LENGTH)
}

/// A `school_class` only makes sense inside a school.
pub fn check_school_binding(class_type: ClassType, school_id: Option<Uuid>) -> Result<(), AppError> {
    if class_type == ClassType::SchoolClass && school_id.is_none() {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "A school_class must belong to a school"
        )));
    }
    Ok(())
}

pub struct ClassService;

impl ClassService {
    #[instrument(skip(db, dto), fields(class.username = %dto.username, db.operation = "INSERT", db.table = "classes"))]
    pub async fn create_class(
        db: &PgPool,
        creator_id: Uuid,
        dto: CreateClassDto,
    ) -> Result<Class, AppError> {
        check_school_binding(dto.class_type, dto.school_id)?;

        if let Some(teacher_id) = dto.class_teacher_id {
            Self::ensure_user_exists(db, teacher_id).await?;
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let inserted = sqlx::query_as::<_, Class>(&format!(
                "INSERT INTO classes (name, username, code, class_type, description, school_id, creator_id, class_teacher_id)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 RETURNING {}",
                CLASS_COLUMNS
            ))
            .bind(dto.name.trim())
            .bind(&dto.username)
            .bind(generate_class_code())
            .bind(dto.class_type)
            .bind(&dto.description)
            .bind(dto.school_id)
            .bind(creator_id)
            .bind(dto.class_teacher_id)
            .fetch_one(db)
            .await;

            match inserted {
                Ok(class) => {
                    track_class_created(class.class_type.as_str());
                    info!(class.id = %class.id, class.username = %class.username, "Class created");
                    return Ok(class);
                }
                Err(e) if unique_violation(&e) == Some(CLASS_CODE_CONSTRAINT) => {
                    debug!(attempt, "Class code collision, retrying");
                }
                Err(e) => return Err(map_db_error(e)),
            }
        }

        Err(AppError::internal(anyhow::anyhow!(
            "Could not allocate a unique class code after {} attempts",
            MAX_CODE_ATTEMPTS
        )))
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "classes"))]
    pub async fn get_classes(
        db: &PgPool,
        filters: &ClassFilterParams,
    ) -> Result<(Vec<Class>, PaginationMeta), AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let name_pattern = filters.name.as_ref().map(|n| format!("%{}%", n));

        let where_clause = "WHERE ($1::uuid IS NULL OR school_id = $1)
               AND ($2::class_type IS NULL OR class_type = $2)
               AND ($3::text IS NULL OR name ILIKE $3)
               AND ($4::uuid IS NULL OR class_teacher_id = $4)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM classes {}",
            where_clause
        ))
        .bind(filters.school_id)
        .bind(filters.class_type)
        .bind(&name_pattern)
        .bind(filters.class_teacher_id)
        .fetch_one(db)
        .await
        .map_err(map_db_error)?;

        let classes = sqlx::query_as::<_, Class>(&format!(
            "SELECT {} FROM classes {} ORDER BY created_at DESC, name LIMIT $5 OFFSET $6",
            CLASS_COLUMNS, where_clause
        ))
        .bind(filters.school_id)
        .bind(filters.class_type)
        .bind(&name_pattern)
        .bind(filters.class_teacher_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .map_err(map_db_error)?;

        debug!(total = %total, returned = %classes.len(), "Classes fetched");

        Ok((classes, PaginationMeta::from_params(total, &filters.pagination)))
    }

    #[instrument(skip(db, cache), fields(class.id = %class_id, db.operation = "SELECT", db.table = "classes"))]
    pub async fn get_class(
        db: &PgPool,
        cache: Option<&RedisCache>,
        class_id: Uuid,
    ) -> Result<Class, AppError> {
        let cache_key = keys::classes::by_id(class_id);

        if let Some(cache) = cache
            && let Some(class) = cache.get::<Class>(&cache_key).await
        {
            debug!("Class found in cache");
            return Ok(class);
        }

        let class = sqlx::query_as::<_, Class>(&format!(
            "SELECT {} FROM classes WHERE id = $1",
            CLASS_COLUMNS
        ))
        .bind(class_id)
        .fetch_optional(db)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Class not found")))?;

        if let Some(cache) = cache
            && let Err(e) = cache.set(&cache_key, &class).await
        {
            warn!(error = %e, "Failed to cache class");
        }

        Ok(class)
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "classes"))]
    pub async fn get_class_by_username(db: &PgPool, username: &str) -> Result<Class, AppError> {
        sqlx::query_as::<_, Class>(&format!(
            "SELECT {} FROM classes WHERE username = $1",
            CLASS_COLUMNS
        ))
        .bind(username.trim().to_lowercase())
        .fetch_optional(db)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Class not found")))
    }

    #[instrument(skip(db, cache, class, dto), fields(class.id = %class.id, db.operation = "UPDATE", db.table = "classes"))]
    pub async fn update_class(
        db: &PgPool,
        cache: Option<&RedisCache>,
        class: &Class,
        dto: UpdateClassDto,
    ) -> Result<Class, AppError> {
        check_school_binding(
            dto.class_type.unwrap_or(class.class_type),
            dto.school_id.or(class.school_id),
        )?;

        let updated = sqlx::query_as::<_, Class>(&format!(
            "UPDATE classes SET
                name = COALESCE($2, name),
                username = COALESCE($3, username),
                description = COALESCE($4, description),
                class_type = COALESCE($5, class_type),
                school_id = COALESCE($6, school_id),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            CLASS_COLUMNS
        ))
        .bind(class.id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.username)
        .bind(&dto.description)
        .bind(dto.class_type)
        .bind(dto.school_id)
        .fetch_optional(db)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Class not found")))?;

        invalidate::class(cache, class.id).await;
        info!(class.id = %class.id, "Class updated");

        Ok(updated)
    }

    #[instrument(skip(db, cache), fields(class.id = %class_id, db.operation = "UPDATE", db.table = "classes"))]
    pub async fn assign_teacher(
        db: &PgPool,
        cache: Option<&RedisCache>,
        class_id: Uuid,
        teacher_id: Option<Uuid>,
    ) -> Result<Class, AppError> {
        if let Some(teacher_id) = teacher_id {
            Self::ensure_user_exists(db, teacher_id).await?;
        }

        let class = sqlx::query_as::<_, Class>(&format!(
            "UPDATE classes SET class_teacher_id = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            CLASS_COLUMNS
        ))
        .bind(class_id)
        .bind(teacher_id)
        .fetch_optional(db)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Class not found")))?;

        invalidate::class(cache, class_id).await;
        info!(class.id = %class_id, teacher.id = ?teacher_id, "Class teacher assigned");

        Ok(class)
    }

    /// Deletes the class; its modules go with it through the foreign key.
    #[instrument(skip(db, cache, storage, class), fields(class.id = %class.id, db.operation = "DELETE", db.table = "classes"))]
    pub async fn delete_class(
        db: &PgPool,
        cache: Option<&RedisCache>,
        storage: &Arc<dyn FileStorage>,
        class: &Class,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(class.id)
            .execute(db)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Class not found")));
        }

        if let Some(image) = &class.image {
            discard_file(storage, image).await;
        }

        invalidate::class(cache, class.id).await;
        info!(class.id = %class.id, "Class deleted");

        Ok(())
    }

    #[instrument(skip(db, cache, storage, class, upload), fields(class.id = %class.id, db.operation = "UPDATE", db.table = "classes"))]
    pub async fn set_image(
        db: &PgPool,
        cache: Option<&RedisCache>,
        storage: &Arc<dyn FileStorage>,
        class: &Class,
        upload: ImageUpload,
    ) -> Result<UploadImageResponse, AppError> {
        let key = upload.storage_key("classes", class.id);
        storage.save(&key, &upload.bytes).await?;

        let updated = sqlx::query("UPDATE classes SET image = $2, updated_at = NOW() WHERE id = $1")
            .bind(class.id)
            .bind(&key)
            .execute(db)
            .await;

        match updated {
            Ok(result) if result.rows_affected() > 0 => {}
            Ok(_) => {
                discard_file(storage, &key).await;
                return Err(AppError::not_found(anyhow::anyhow!("Class not found")));
            }
            Err(e) => {
                discard_file(storage, &key).await;
                return Err(map_db_error(e));
            }
        }

        if let Some(previous) = &class.image
            && *previous != key
        {
            discard_file(storage, previous).await;
        }

        invalidate::class(cache, class.id).await;
        info!(class.id = %class.id, storage.key = %key, "Class image updated");

        let url = storage.get_url(&key)?;
        Ok(UploadImageResponse { key, url })
    }

    #[instrument(skip(db, cache, storage, class), fields(class.id = %class.id, db.operation = "UPDATE", db.table = "classes"))]
    pub async fn delete_image(
        db: &PgPool,
        cache: Option<&RedisCache>,
        storage: &Arc<dyn FileStorage>,
        class: &Class,
    ) -> Result<(), AppError> {
        let Some(image) = &class.image else {
            debug!("Class has no image");
            return Ok(());
        };

        sqlx::query("UPDATE classes SET image = NULL, updated_at = NOW() WHERE id = $1")
            .bind(class.id)
            .execute(db)
            .await
            .map_err(map_db_error)?;

        discard_file(storage, image).await;
        invalidate::class(cache, class.id).await;

        Ok(())
    }

    #[instrument(skip(db), fields(class.id = %class_id, db.operation = "SELECT", db.table = "course_content_modules"))]
    pub async fn get_class_modules(
        db: &PgPool,
        class_id: Uuid,
    ) -> Result<Vec<CourseContentModule>, AppError> {
        sqlx::query_as::<_, CourseContentModule>(
            "SELECT id, title, code, module_type, class_id, created_at
             FROM course_content_modules
             WHERE class_id = $1
             ORDER BY code",
        )
        .bind(class_id)
        .fetch_all(db)
        .await
        .map_err(map_db_error)
    }

    async fn ensure_user_exists(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(db)
                .await
                .map_err(map_db_error)?;

        if !exists {
            return Err(AppError::not_found(anyhow::anyhow!("Class teacher not found")));
        }
        Ok(())
    }
}
