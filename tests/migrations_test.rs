// tests/migrations_test.rs
//
// Precisam de um Postgres: DATABASE_URL=postgres://... cargo test -- --ignored

use std::borrow::Cow;

use leads_backend::db::{
    migrations::{self, MigrationError},
    LeadRepository, MIGRATOR,
};
use rust_decimal::Decimal;
use sqlx::{
    migrate::{MigrateError, Migration, MigrationType, Migrator},
    PgPool,
};

type Columns = Vec<(String, String, Option<String>, String)>;

#[derive(Debug, PartialEq)]
struct Schema {
    columns: Columns,
    indexes: Vec<(String, String)>,
    triggers: Vec<String>,
}

async fn schema(pool: &PgPool) -> Schema {
    let columns = sqlx::query_as::<_, (String, String, Option<String>, String)>(
        r#"
        SELECT column_name::text, data_type::text, column_default::text, is_nullable::text
        FROM information_schema.columns
        WHERE table_name = 'leads'
        ORDER BY column_name
        "#,
    )
    .fetch_all(pool)
    .await
    .unwrap();

    let indexes = sqlx::query_as::<_, (String, String)>(
        "SELECT indexname::text, indexdef FROM pg_indexes WHERE tablename = 'leads' ORDER BY indexname",
    )
    .fetch_all(pool)
    .await
    .unwrap();

    let triggers = sqlx::query_scalar::<_, String>(
        r#"
        SELECT tgname::text FROM pg_trigger
        WHERE tgrelid = 'leads'::regclass AND NOT tgisinternal
        ORDER BY tgname
        "#,
    )
    .fetch_all(pool)
    .await
    .unwrap();

    Schema { columns, indexes, triggers }
}

// Catálogo com a versão 2 trocada por `sql`
fn with_second(sql: &'static str) -> Migrator {
    let first = MIGRATOR.iter().next().unwrap().clone();
    let second = Migration::new(
        2,
        Cow::Borrowed("add service fields"),
        MigrationType::Simple,
        Cow::Borrowed(sql),
        false,
    );
    Migrator {
        migrations: Cow::Owned(vec![first, second]),
        ignore_missing: false,
        locking: true,
        no_tx: false,
    }
}

#[sqlx::test(migrations = false)]
#[ignore = "precisa de DATABASE_URL apontando para um Postgres"]
async fn running_twice_is_a_no_op(pool: PgPool) {
    assert_eq!(migrations::run(&pool).await.unwrap(), vec![1, 2, 3]);
    let once = schema(&pool).await;

    assert!(migrations::run(&pool).await.unwrap().is_empty());
    assert_eq!(schema(&pool).await, once);

    // Os próprios scripts também são idempotentes
    for migration in MIGRATOR.iter() {
        sqlx::raw_sql(&*migration.sql).execute(&pool).await.unwrap();
    }
    assert_eq!(schema(&pool).await, once);

    assert_eq!(migrations::applied(&pool).await.unwrap(), vec![1, 2, 3]);
    let checksum: Vec<u8> =
        sqlx::query_scalar("SELECT checksum FROM _sqlx_migrations WHERE version = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(checksum, MIGRATOR.iter().next().unwrap().checksum.to_vec());
}

#[sqlx::test(migrations = false)]
#[ignore = "precisa de DATABASE_URL apontando para um Postgres"]
async fn concurrent_runs_apply_each_migration_once(pool: PgPool) {
    let (a, b) = tokio::join!(migrations::run(&pool), migrations::run(&pool));

    let mut results = vec![a.unwrap(), b.unwrap()];
    results.sort();
    assert_eq!(results, vec![vec![], vec![1, 2, 3]]);
    assert_eq!(migrations::applied(&pool).await.unwrap(), vec![1, 2, 3]);
}

#[sqlx::test(migrations = false)]
#[ignore = "precisa de DATABASE_URL apontando para um Postgres"]
async fn indexes_exist(pool: PgPool) {
    migrations::run(&pool).await.unwrap();
    let names: Vec<String> = schema(&pool).await.indexes.into_iter().map(|(n, _)| n).collect();
    for expected in ["idx_leads_created_at", "idx_leads_status", "idx_leads_telegram_id"] {
        assert!(names.iter().any(|n| n == expected), "faltou {}", expected);
    }
}

#[sqlx::test(migrations = false)]
#[ignore = "precisa de DATABASE_URL apontando para um Postgres"]
async fn second_migration_before_first_is_rejected(pool: PgPool) {
    let err = migrations::apply_one(&pool, 2).await.unwrap_err();
    assert!(matches!(err, MigrationError::OutOfOrder { version: 2, missing: 1 }));
    assert!(migrations::applied(&pool).await.unwrap().is_empty());

    // Direto no banco o script também falha: a tabela ainda não existe
    let second = MIGRATOR.iter().nth(1).unwrap();
    assert!(sqlx::raw_sql(&*second.sql).execute(&pool).await.is_err());

    assert!(migrations::apply_one(&pool, 1).await.unwrap());
    assert!(migrations::apply_one(&pool, 2).await.unwrap());
    assert!(!migrations::apply_one(&pool, 2).await.unwrap());
    assert_eq!(migrations::applied(&pool).await.unwrap(), vec![1, 2]);
}

#[sqlx::test(migrations = false)]
#[ignore = "precisa de DATABASE_URL apontando para um Postgres"]
async fn lead_created_before_second_migration_gets_defaults(pool: PgPool) {
    assert_eq!(migrations::run_to(&pool, 1).await.unwrap(), vec![1]);

    let id: i64 = sqlx::query_scalar("INSERT INTO leads (telegram_id, country) VALUES ($1, $2) RETURNING id")
        .bind(4242_i64)
        .bind("TR")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(migrations::run(&pool).await.unwrap(), vec![2, 3]);

    let repo = LeadRepository::new(pool.clone());
    let lead = repo.find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(lead.service_type, "delivery");
    assert_eq!(lead.customs_direction, "");
    assert_eq!(lead.invoice_value, Decimal::ZERO);
    assert_eq!(lead.country, "TR");
}

#[sqlx::test(migrations = false)]
#[ignore = "precisa de DATABASE_URL apontando para um Postgres"]
async fn failed_migration_rolls_back_and_can_be_rerun(pool: PgPool) {
    let broken = with_second(
        "ALTER TABLE leads ADD COLUMN IF NOT EXISTS service_type TEXT NOT NULL DEFAULT 'delivery';
         SELECT * FROM tabela_que_nao_existe;",
    );

    let err = migrations::run_with(&broken, &pool).await.unwrap_err();
    assert!(matches!(
        err,
        MigrationError::Migrate(MigrateError::ExecuteMigration(_, 2))
    ));
    assert_eq!(migrations::applied(&pool).await.unwrap(), vec![1]);

    // Nada da migração quebrada ficou para trás
    let has_service_type: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM information_schema.columns
            WHERE table_name = 'leads' AND column_name = 'service_type'
        )
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(!has_service_type);

    assert_eq!(migrations::run(&pool).await.unwrap(), vec![2, 3]);
}

#[sqlx::test(migrations = false)]
#[ignore = "precisa de DATABASE_URL apontando para um Postgres"]
async fn edited_migration_is_detected(pool: PgPool) {
    migrations::run(&pool).await.unwrap();

    let mut edited = with_second("ALTER TABLE leads ADD COLUMN IF NOT EXISTS service_type TEXT;");
    edited.set_ignore_missing(true);
    let err = migrations::run_with(&edited, &pool).await.unwrap_err();
    assert!(matches!(
        err,
        MigrationError::Migrate(MigrateError::VersionMismatch(2))
    ));
}
