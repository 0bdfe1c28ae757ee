//! School seeding.

use std::time::Instant;

use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StreetName};
use fake::faker::internet::en::SafeEmail;
use rayon::prelude::*;
use schoolhub_models::SchoolType;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use super::models::SchoolSeed;

const BATCH_SIZE: usize = 500;
const MAX_SLUG_LEN: usize = 36;

const SUFFIXES: &[&str] = &["Academy", "High School", "Secondary School", "Technical School"];
const TYPES: &[SchoolType] = &[
    SchoolType::Public,
    SchoolType::Private,
    SchoolType::GovernmentAided,
];

/// Lowercase letters and digits with single hyphens between words.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}

/// Generates school data in parallel using Rayon
pub fn generate_schools(count: usize) -> Vec<SchoolSeed> {
    (0..count)
        .into_par_iter()
        .map(|i| {
            let city: String = CityName().fake();
            let street: String = StreetName().fake();
            let building: String = BuildingNumber().fake();
            let name = format!("{} {}", city, SUFFIXES[i % SUFFIXES.len()]);
            let suffix = &Uuid::new_v4().simple().to_string()[..6];

            SchoolSeed {
                username: format!("{}-{}", slugify(&name), suffix),
                name,
                school_type: TYPES[i % TYPES.len()],
                email: SafeEmail().fake(),
                address: format!("{} {}, {}", building, street, city),
            }
        })
        .collect()
}

/// Seeds `count` schools and returns the ids that were inserted.
pub async fn seed_schools(db: &PgPool, count: usize) -> anyhow::Result<Vec<Uuid>> {
    let start_time = Instant::now();
    println!("📚 Seeding {} schools...", count);

    let schools = generate_schools(count);
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(schools.len());

    for chunk in schools.chunks(BATCH_SIZE) {
        ids.extend(insert_schools_chunk(&mut tx, chunk).await?);
    }
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} schools in {:?}",
        ids.len(),
        start_time.elapsed()
    );
    Ok(ids)
}

async fn insert_schools_chunk(
    tx: &mut Transaction<'_, Postgres>,
    schools: &[SchoolSeed],
) -> anyhow::Result<Vec<Uuid>> {
    if schools.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO schools (name, username, school_type, email, address) ");
    builder.push_values(schools, |mut row, school| {
        row.push_bind(&school.name)
            .push_bind(&school.username)
            .push_bind(school.school_type)
            .push_bind(&school.email)
            .push_bind(&school.address);
    });
    builder.push(" ON CONFLICT (username) DO NOTHING RETURNING id");

    let ids = builder
        .build_query_scalar::<Uuid>()
        .fetch_all(&mut **tx)
        .await?;
    Ok(ids)
}

/// Deletes every school; classes, modules and join requests cascade.
pub async fn clear_schools(db: &PgPool) -> anyhow::Result<u64> {
    let start_time = Instant::now();
    println!("🗑️  Clearing schools...");

    let deleted = sqlx::query("DELETE FROM schools")
        .execute(db)
        .await?
        .rows_affected();

    println!(
        "   ✓ Deleted {} schools in {:?}",
        deleted,
        start_time.elapsed()
    );
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhub_models::validation::validate_username;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Lake  View High School"), "lake-view-high-school");
        assert_eq!(slugify("St. Mary's"), "st-mary-s");
        assert!(slugify(&"a b ".repeat(40)).len() <= MAX_SLUG_LEN);
    }

    #[test]
    fn test_generated_schools_have_valid_usernames() {
        let schools = generate_schools(25);
        assert_eq!(schools.len(), 25);
        for school in &schools {
            assert!(validate_username(&school.username).is_ok(), "{}", school.username);
            assert!(school.username.len() <= 50);
        }
        assert_eq!(schools[1].school_type, SchoolType::Private);
    }
}
