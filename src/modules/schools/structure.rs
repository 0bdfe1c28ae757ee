//! Persistence of generated academic structures.
//!
//! The plan itself comes from [`plan_academic_structure`]; this module
//! writes it in a single transaction. Classes the school already has (matched
//! by username) are skipped together with their modules, so generating the
//! same selection twice is a no-op. A generated username owned by another
//! school or by a standalone class aborts the run with 409.

use schoolhub_cache::{RedisCache, invalidate};
use schoolhub_core::AppError;
use schoolhub_db::PgPool;
use schoolhub_models::curriculum::PlannedClass;
use schoolhub_models::{AcademicSelection, Class, ClassType, School, plan_academic_structure};
use schoolhub_observability::track_academic_structure_generated;
use sqlx::types::Json;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::modules::classes::service::{CLASS_COLUMNS, MAX_CODE_ATTEMPTS, generate_class_code};
use crate::utils::db_errors::map_db_error;

#[derive(Debug)]
pub struct StructureOutcome {
    pub created: Vec<Class>,
    pub skipped: usize,
    pub modules_created: u64,
}

/// Inserts one generated class, or returns `None` when this school already
/// has it. A username held by a class outside the school is a conflict.
async fn insert_planned_class(
    conn: &mut PgConnection,
    school_id: Uuid,
    creator_id: Uuid,
    planned: &PlannedClass,
) -> Result<Option<Class>, AppError> {
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let inserted = sqlx::query_as::<_, Class>(&format!(
            "INSERT INTO classes (name, username, code, class_type, school_id, creator_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT DO NOTHING
             RETURNING {}",
            CLASS_COLUMNS
        ))
        .bind(&planned.name)
        .bind(&planned.username)
        .bind(generate_class_code())
        .bind(ClassType::SchoolClass)
        .bind(school_id)
        .bind(creator_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_db_error)?;

        if inserted.is_some() {
            return Ok(inserted);
        }

        let owner = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT school_id FROM classes WHERE username = $1",
        )
        .bind(&planned.username)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_db_error)?;

        match owner {
            Some(Some(owner_id)) if owner_id == school_id => return Ok(None),
            Some(_) => {
                return Err(AppError::conflict(format!(
                    "Class username {} is already used outside this school",
                    planned.username
                )));
            }
            None => {}
        }

        debug!(attempt, class.username = %planned.username, "Class code collision, retrying");
    }

    Err(AppError::internal(anyhow::anyhow!(
        "Could not allocate a unique class code after {} attempts",
        MAX_CODE_ATTEMPTS
    )))
}

async fn insert_modules(
    conn: &mut PgConnection,
    class_id: Uuid,
    planned: &PlannedClass,
) -> Result<u64, AppError> {
    if planned.modules.is_empty() {
        return Ok(0);
    }

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO course_content_modules (title, code, module_type, class_id) ");
    builder.push_values(&planned.modules, |mut row, module| {
        row.push_bind(&module.title)
            .push_bind(&module.code)
            .push_bind(module.module_type)
            .push_bind(class_id);
    });
    builder.push(" ON CONFLICT (class_id, code) DO NOTHING");

    let result = builder
        .build()
        .execute(&mut *conn)
        .await
        .map_err(map_db_error)?;

    Ok(result.rows_affected())
}

pub struct StructureService;

impl StructureService {
    #[instrument(skip(db, cache, school, selection), fields(school.id = %school.id, db.operation = "INSERT", db.table = "classes"))]
    pub async fn generate(
        db: &PgPool,
        cache: Option<&RedisCache>,
        school: &School,
        creator_id: Uuid,
        selection: &AcademicSelection,
    ) -> Result<StructureOutcome, AppError> {
        let plan = plan_academic_structure(&school.username, selection)
            .map_err(AppError::bad_request)?;

        debug!(
            planned.classes = plan.classes.len(),
            planned.modules = plan.module_count(),
            "Academic structure planned"
        );

        let mut tx = db.begin().await.map_err(map_db_error)?;

        let mut created = Vec::new();
        let mut skipped = 0;
        let mut modules_created = 0;

        for planned in &plan.classes {
            match insert_planned_class(&mut tx, school.id, creator_id, planned).await? {
                Some(class) => {
                    modules_created += insert_modules(&mut tx, class.id, planned).await?;
                    created.push(class);
                }
                None => skipped += 1,
            }
        }

        sqlx::query(
            "UPDATE schools SET
                academic_profile = $2,
                total_classes = (SELECT COUNT(*) FROM classes WHERE school_id = $1),
                total_modules = (
                    SELECT COUNT(*) FROM course_content_modules m
                    JOIN classes c ON c.id = m.class_id
                    WHERE c.school_id = $1
                ),
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(school.id)
        .bind(Json(&plan.selection))
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        invalidate::school(cache, school.id).await;
        track_academic_structure_generated(created.len(), modules_created as usize);

        info!(
            school.id = %school.id,
            classes.created = created.len(),
            classes.skipped = skipped,
            modules.created = modules_created,
            "Academic structure generated"
        );

        Ok(StructureOutcome {
            created,
            skipped,
            modules_created,
        })
    }
}
