//! Database seeder for Bursar development and testing.
//!
//! Seeds one class with a class teacher, a roster of students with
//! guardians, a small fee catalog and a term of obligations.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use bursar_core::fees::{AuthorizationScope, CreateFeeCategoryInput, FeeFrequency};
use bursar_db::{ClassAssignmentInput, FeeCategoryRepository, LedgerSettings, ObligationRepository};
use bursar_shared::Role;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use bursar_db::entities::{class_teachers, classes, student_guardians, students};

/// Seeded class (consistent across runs).
const CLASS_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0101);
/// Seeded class teacher principal.
const TEACHER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0201);
/// Seeded administrator principal running the catalog setup.
const ADMIN_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);

const ACADEMIC_YEAR: &str = "2025-2026";

const ROSTER: [(&str, &str); 4] = [
    ("Amara", "Okafor"),
    ("Liam", "Chen"),
    ("Sofia", "Haddad"),
    ("Noah", "Fischer"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    println!("Connecting to database...");
    let db = bursar_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    if classes::Entity::find_by_id(CLASS_ID).one(&db).await?.is_some() {
        println!("Seed class already exists, skipping...");
        return Ok(());
    }

    println!("Seeding class and teacher...");
    seed_class(&db).await?;

    println!("Seeding students and guardians...");
    seed_students(&db).await?;

    println!("Seeding fee catalog and obligations...");
    seed_fees(&db).await?;

    println!("Seeding complete!");
    Ok(())
}

async fn seed_class(db: &DatabaseConnection) -> anyhow::Result<()> {
    classes::ActiveModel {
        id: Set(CLASS_ID),
        name: Set("Grade 5 - A".to_string()),
        academic_year: Set(ACADEMIC_YEAR.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?;

    class_teachers::ActiveModel {
        class_id: Set(CLASS_ID),
        teacher_id: Set(TEACHER_ID),
    }
    .insert(db)
    .await?;

    println!("  Class {CLASS_ID} taught by {TEACHER_ID}");
    Ok(())
}

async fn seed_students(db: &DatabaseConnection) -> anyhow::Result<()> {
    for (i, (first, last)) in ROSTER.iter().enumerate() {
        let student_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        students::ActiveModel {
            id: Set(student_id),
            user_id: Set(user_id),
            first_name: Set((*first).to_string()),
            last_name: Set((*last).to_string()),
            admission_number: Set(format!("ADM-2025-{:03}", i + 1)),
            class_id: Set(Some(CLASS_ID)),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await?;

        let guardian_id = Uuid::new_v4();
        student_guardians::ActiveModel {
            student_id: Set(student_id),
            guardian_id: Set(guardian_id),
            relationship: Set(Some("parent".to_string())),
        }
        .insert(db)
        .await?;

        println!("  {first} {last}: student user {user_id}, guardian {guardian_id}");
    }
    Ok(())
}

async fn seed_fees(db: &DatabaseConnection) -> anyhow::Result<()> {
    let admin = AuthorizationScope::new(Role::Admin, ADMIN_ID);
    let catalog = FeeCategoryRepository::new(db.clone());
    let obligations = ObligationRepository::new(db.clone(), LedgerSettings::default());

    let catalog_entries = [
        ("Tuition", dec!(12000.00), FeeFrequency::Semester, true),
        ("Transport", dec!(1500.00), FeeFrequency::Monthly, false),
        ("Library", dec!(250.00), FeeFrequency::Annual, true),
    ];

    let today = Utc::now().date_naive();
    for (offset, (name, amount, frequency, is_mandatory)) in catalog_entries.into_iter().enumerate()
    {
        let category = catalog
            .create(
                &admin,
                CreateFeeCategoryInput {
                    name: name.to_string(),
                    description: None,
                    amount,
                    frequency,
                    is_mandatory,
                    academic_year: Some(ACADEMIC_YEAR.to_string()),
                },
            )
            .await?;

        // Spread due dates so both overdue and upcoming charges exist.
        let days = i64::try_from(offset).unwrap_or(0) * 45 - 40;
        let created = obligations
            .assign_to_class(
                &admin,
                ClassAssignmentInput {
                    fee_category_id: category.id,
                    class_id: CLASS_ID,
                    due_date: today + Duration::days(days),
                    discount_amount: Decimal::ZERO,
                },
                Some("Seeded".to_string()),
            )
            .await?;

        println!("  {name}: {} obligations", created.len());
    }
    Ok(())
}
