// src/db/migrations.rs

//! Migrações versionadas da tabela `leads`.
//!
//! Os scripts de `migrations/` são embutidos pelo `sqlx::migrate!()`, que
//! cuida do histórico em `_sqlx_migrations`, dos checksums, do advisory lock
//! e de uma transação por migração. Aqui fica só a regra de ordem: o
//! histórico gravado tem que ser um prefixo do catálogo, sem buracos.

use std::borrow::Cow;

use sqlx::{
    migrate::{Migrate, MigrateError, Migrator},
    Connection, PgConnection, PgPool,
};
use thiserror::Error;

pub static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migração {version} exige a {missing} aplicada antes")]
    OutOfOrder { version: i64, missing: i64 },

    #[error("versão {0} não existe no catálogo")]
    UnknownVersion(i64),

    #[error("erro ao migrar: {0}")]
    Migrate(#[from] MigrateError),

    #[error("erro de banco de dados ao migrar: {0}")]
    Database(#[from] sqlx::Error),
}

pub fn versions(migrator: &Migrator) -> Vec<i64> {
    migrator.iter().map(|m| m.version).collect()
}

/// Catálogo embutido cortado até `target`, inclusive.
///
/// Versões já aplicadas além do corte são toleradas, para que rodar até
/// uma versão antiga não seja erro.
pub fn up_to(target: i64) -> Result<Migrator, MigrationError> {
    let end = MIGRATOR
        .iter()
        .position(|m| m.version == target)
        .ok_or(MigrationError::UnknownVersion(target))?
        + 1;

    Ok(Migrator {
        migrations: Cow::Owned(MIGRATOR.migrations[..end].to_vec()),
        ignore_missing: true,
        locking: MIGRATOR.locking,
        no_tx: MIGRATOR.no_tx,
    })
}

/// O que falta aplicar, sem tocar no banco.
///
/// `applied` vem ordenado por versão e precisa ser um prefixo de `catalog`.
pub fn pending(
    catalog: &[i64],
    applied: &[i64],
    ignore_missing: bool,
) -> Result<Vec<i64>, MigrationError> {
    for (idx, &version) in applied.iter().enumerate() {
        match catalog.get(idx) {
            Some(&expected) if expected == version => {}
            Some(&expected) if catalog.contains(&version) => {
                return Err(MigrationError::OutOfOrder {
                    version,
                    missing: expected,
                });
            }
            None if ignore_missing => {}
            _ => return Err(MigrateError::VersionMissing(version).into()),
        }
    }

    Ok(catalog.iter().skip(applied.len()).copied().collect())
}

/// Aplica tudo que estiver pendente. Devolve as versões aplicadas agora.
pub async fn run(pool: &PgPool) -> Result<Vec<i64>, MigrationError> {
    run_with(&MIGRATOR, pool).await
}

pub async fn run_to(pool: &PgPool, target: i64) -> Result<Vec<i64>, MigrationError> {
    run_with(&up_to(target)?, pool).await
}

pub async fn run_with(migrator: &Migrator, pool: &PgPool) -> Result<Vec<i64>, MigrationError> {
    migrate(migrator, pool, false).await
}

/// Aplica uma única versão. Sem efeito se já aplicada; erro se alguma
/// anterior ainda não foi.
pub async fn apply_one(pool: &PgPool, version: i64) -> Result<bool, MigrationError> {
    let done = migrate(&up_to(version)?, pool, true).await?;
    Ok(!done.is_empty())
}

/// Versões gravadas no histórico. Cria a tabela de histórico se preciso.
pub async fn applied(pool: &PgPool) -> Result<Vec<i64>, MigrationError> {
    let mut conn = pool.acquire().await?;
    applied_versions(&mut conn).await
}

async fn migrate(
    migrator: &Migrator,
    pool: &PgPool,
    single: bool,
) -> Result<Vec<i64>, MigrationError> {
    let mut conn = pool.acquire().await?;

    let result = migrate_locked(&mut conn, migrator, single).await;

    // Num erro a sessão pode ter ficado com o advisory lock: a conexão não volta para o pool
    if result.is_err() {
        if let Err(e) = conn.detach().close().await {
            tracing::warn!("Falha ao fechar a conexão das migrações: {}", e);
        }
    }
    result
}

async fn migrate_locked(
    conn: &mut PgConnection,
    migrator: &Migrator,
    single: bool,
) -> Result<Vec<i64>, MigrationError> {
    conn.lock().await?;

    let applied = applied_versions(conn).await?;
    let pending = pending(&versions(migrator), &applied, migrator.ignore_missing)?;

    if single && pending.len() > 1 {
        return Err(MigrationError::OutOfOrder {
            version: pending[pending.len() - 1],
            missing: pending[0],
        });
    }

    // Mesmo sem pendências o sqlx confere os checksums do que já foi aplicado
    migrator.run(&mut *conn).await?;
    conn.unlock().await?;

    if pending.is_empty() {
        tracing::info!(
            "Schema de leads em dia (versão {})",
            applied.last().copied().unwrap_or(0)
        );
    }
    for version in &pending {
        tracing::info!("✅ Migração {:04} aplicada", version);
    }
    Ok(pending)
}

async fn applied_versions(conn: &mut PgConnection) -> Result<Vec<i64>, MigrationError> {
    conn.ensure_migrations_table().await?;
    let applied = conn.list_applied_migrations().await?;
    Ok(applied.into_iter().map(|m| m.version).collect())
}
