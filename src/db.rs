use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::RawHousehold;
use crate::source;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    let households = vec![
        ("3507-KK-0001", "Sutrisno", "Krajan", 850_000, 67, 2, "chronic_illness", "non_permanent", "minimal_assets"),
        ("3507-KK-0002", "Painem", "Krajan", 600_000, 72, 1, "chronic_illness_with_disability", "uninhabitable", "no_assets"),
        ("3507-KK-0003", "Slamet Riyadi", "Krajan", 2_400_000, 41, 3, "healthy", "permanent_adequate", "moderate_assets"),
        ("3507-KK-0004", "Suwarni", "Sukamaju", 1_200_000, 55, 5, "minor_illness", "semi_permanent", "small_assets"),
        ("3507-KK-0005", "Wagiman", "Sukamaju", 950_000, 63, 4, "disability", "non_permanent", "minimal_assets"),
        ("3507-KK-0006", "Darmini", "Sukamaju", 3_100_000, 38, 2, "healthy", "permanent_minor_damage", "large_assets"),
        ("3507-KK-0007", "Kasiyanto", "Tegalsari", 1_500_000, 47, 6, "minor_illness", "semi_permanent", "small_assets"),
        ("3507-KK-0008", "Tukinem", "Tegalsari", 700_000, 80, 0, "chronic_illness", "non_permanent", "no_assets"),
    ];

    let mut written = 0usize;
    for (id, name, dusun, income, age_of_head, dependents, health, housing, assets) in households {
        let household = RawHousehold {
            id: id.to_string(),
            name: name.to_string(),
            dusun: dusun.to_string(),
            income,
            age_of_head,
            dependents,
            health_condition: health.to_string(),
            housing_condition: housing.to_string(),
            asset_ownership: assets.to_string(),
        };
        written += upsert_household(pool, &household).await?;
    }

    tracing::info!(households = written, "seeded households");
    Ok(written)
}

async fn upsert_household(pool: &PgPool, household: &RawHousehold) -> anyhow::Result<usize> {
    let result = sqlx::query(
        r#"
        INSERT INTO bantuan.households
        (id, name, dusun, income, age_of_head, dependents,
         health_condition, housing_condition, asset_ownership, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now())
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name,
            dusun = EXCLUDED.dusun,
            income = EXCLUDED.income,
            age_of_head = EXCLUDED.age_of_head,
            dependents = EXCLUDED.dependents,
            health_condition = EXCLUDED.health_condition,
            housing_condition = EXCLUDED.housing_condition,
            asset_ownership = EXCLUDED.asset_ownership,
            updated_at = now()
        "#,
    )
    .bind(&household.id)
    .bind(&household.name)
    .bind(&household.dusun)
    .bind(household.income)
    .bind(household.age_of_head)
    .bind(household.dependents)
    .bind(&household.health_condition)
    .bind(&household.housing_condition)
    .bind(&household.asset_ownership)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() as usize)
}

/// Every stored household. Ranking always runs over the full collection.
pub async fn fetch_households(pool: &PgPool) -> anyhow::Result<Vec<RawHousehold>> {
    let records = sqlx::query(
        "SELECT id, name, dusun, income, age_of_head, dependents, \
         health_condition, housing_condition, asset_ownership \
         FROM bantuan.households \
         ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    let mut households = Vec::with_capacity(records.len());
    for row in records {
        households.push(RawHousehold {
            id: row.get("id"),
            name: row.get("name"),
            dusun: row.get("dusun"),
            income: row.get("income"),
            age_of_head: row.get("age_of_head"),
            dependents: row.get("dependents"),
            health_condition: row.get("health_condition"),
            housing_condition: row.get("housing_condition"),
            asset_ownership: row.get("asset_ownership"),
        });
    }

    tracing::debug!(households = households.len(), "fetched households");
    Ok(households)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let rows = source::read_import_rows(csv_path)?;
    let households = source::validate_imports(rows, || format!("hh-{}", Uuid::new_v4()))?;
    let mut written = 0usize;

    for household in &households {
        written += upsert_household(pool, household).await?;
    }

    Ok(written)
}
