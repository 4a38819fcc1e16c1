// src/db/lead_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    models::lead::{Lead, LeadStatus, LeadUpdate, NewLead},
};

// Valor de uma coluna opcional, já pronto para o bind
#[derive(Debug, Clone, PartialEq)]
enum ColumnValue {
    BigInt(i64),
    Text(String),
    Decimal(Decimal),
}

type Columns = Vec<(&'static str, ColumnValue)>;

fn push_text(columns: &mut Columns, name: &'static str, value: &Option<String>) {
    if let Some(v) = value {
        columns.push((name, ColumnValue::Text(v.clone())));
    }
}

fn push_decimal(columns: &mut Columns, name: &'static str, value: Option<Decimal>) {
    if let Some(v) = value {
        columns.push((name, ColumnValue::Decimal(v)));
    }
}

// Só entram no INSERT as colunas informadas; o resto fica com o DEFAULT.
fn insert_columns(lead: &NewLead) -> Columns {
    let mut columns = vec![("telegram_id", ColumnValue::BigInt(lead.telegram_id))];
    push_text(&mut columns, "username", &lead.username);
    push_text(&mut columns, "full_name", &lead.full_name);
    push_text(&mut columns, "service_type", &lead.service_type);
    push_text(&mut columns, "customs_direction", &lead.customs_direction);
    push_text(&mut columns, "country", &lead.country);
    push_text(&mut columns, "city_from", &lead.city_from);
    push_text(&mut columns, "cargo_type", &lead.cargo_type);
    push_decimal(&mut columns, "weight_kg", lead.weight_kg);
    push_decimal(&mut columns, "volume_m3", lead.volume_m3);
    push_decimal(&mut columns, "invoice_value", lead.invoice_value);
    push_text(&mut columns, "urgency", &lead.urgency);
    push_text(&mut columns, "incoterms", &lead.incoterms);
    push_text(&mut columns, "phone", &lead.phone);
    push_text(&mut columns, "comment", &lead.comment);
    columns
}

fn update_columns(update: &LeadUpdate) -> Columns {
    let mut columns = Vec::new();
    push_text(&mut columns, "username", &update.username);
    push_text(&mut columns, "full_name", &update.full_name);
    push_text(&mut columns, "service_type", &update.service_type);
    push_text(&mut columns, "customs_direction", &update.customs_direction);
    push_text(&mut columns, "country", &update.country);
    push_text(&mut columns, "city_from", &update.city_from);
    push_text(&mut columns, "cargo_type", &update.cargo_type);
    push_decimal(&mut columns, "weight_kg", update.weight_kg);
    push_decimal(&mut columns, "volume_m3", update.volume_m3);
    push_decimal(&mut columns, "invoice_value", update.invoice_value);
    push_text(&mut columns, "urgency", &update.urgency);
    push_text(&mut columns, "incoterms", &update.incoterms);
    push_text(&mut columns, "phone", &update.phone);
    push_text(&mut columns, "comment", &update.comment);
    push_text(&mut columns, "status", &update.status);
    columns
}

fn bind_value(builder: &mut QueryBuilder<'_, Postgres>, value: ColumnValue) {
    match value {
        ColumnValue::BigInt(v) => builder.push_bind(v),
        ColumnValue::Text(v) => builder.push_bind(v),
        ColumnValue::Decimal(v) => builder.push_bind(v),
    };
}

// O repositório de leads, único ponto que fala SQL com a tabela 'leads'.
// Escritas e buscas pontuais recebem o executor (pool, conexão ou transação);
// a leitura da tabela inteira usa o pool próprio.
#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insere um lead e devolve a linha completa (com id e defaults).
    pub async fn create<'e, E>(&self, executor: E, lead: &NewLead) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let columns = insert_columns(lead);
        let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();

        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO leads (");
        builder.push(names.join(", "));
        builder.push(") VALUES (");
        for (i, (_, value)) in columns.into_iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            bind_value(&mut builder, value);
        }
        builder.push(") RETURNING *");

        let created = builder
            .build_query_as::<Lead>()
            .fetch_one(executor)
            .await?;

        Ok(created)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(lead)
    }

    /// Últimos leads, independente do status.
    pub async fn list_recent<'e, E>(&self, executor: E, limit: i64) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leads = sqlx::query_as::<_, Lead>(
            "SELECT * FROM leads ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(leads)
    }

    pub async fn list_by_status<'e, E>(
        &self,
        executor: E,
        status: LeadStatus,
        limit: i64,
    ) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Usa idx_leads_status
        let leads = sqlx::query_as::<_, Lead>(
            r#"
            SELECT * FROM leads
            WHERE status = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(leads)
    }

    /// Leads anteriores do mesmo usuário do Telegram
    pub async fn list_by_telegram_id<'e, E>(
        &self,
        executor: E,
        telegram_id: i64,
    ) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let leads = sqlx::query_as::<_, Lead>(
            "SELECT * FROM leads WHERE telegram_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(telegram_id)
        .fetch_all(executor)
        .await?;

        Ok(leads)
    }

    pub async fn list_all(&self) -> Result<Vec<Lead>, AppError> {
        let leads = sqlx::query_as::<_, Lead>("SELECT * FROM leads ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(leads)
    }

    /// Aplica os campos informados e sempre renova updated_at.
    /// `None` quando o id não existe.
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: i64,
        update: &LeadUpdate,
    ) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE leads SET ");
        for (name, value) in update_columns(update) {
            builder.push(name).push(" = ");
            bind_value(&mut builder, value);
            builder.push(", ");
        }
        // clock_timestamp() e não NOW(): NOW() é fixo dentro da transação
        builder.push("updated_at = clock_timestamp()");
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING *");

        let lead = builder
            .build_query_as::<Lead>()
            .fetch_optional(executor)
            .await?;

        Ok(lead)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: i64,
        status: LeadStatus,
    ) -> Result<Option<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads
            SET status = $1, updated_at = clock_timestamp()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(lead)
    }
}
