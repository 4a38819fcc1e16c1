// src/services/lead_service.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    db::LeadRepository,
    models::lead::{Lead, LeadStatus, LeadUpdate, NewLead},
    services::export,
};

#[derive(Clone)]
pub struct LeadService {
    repo: LeadRepository,
}

impl LeadService {
    pub fn new(repo: LeadRepository) -> Self {
        Self { repo }
    }

    pub async fn create_lead<'e, E>(&self, executor: E, payload: NewLead) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Valida antes de tocar no banco
        payload.check()?;

        let lead = self.repo.create(executor, &payload).await?;

        tracing::info!(
            "🆕 Lead #{} salvo [{} / {}]",
            lead.id,
            lead.country,
            lead.city_from
        );
        Ok(lead)
    }

    pub async fn get_lead<'e, E>(&self, executor: E, id: i64) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, id)
            .await?
            .ok_or(AppError::LeadNotFound(id))
    }

    /// Atualização parcial. Id inexistente é erro (LeadNotFound), não no-op.
    pub async fn update_lead<'e, E>(
        &self,
        executor: E,
        id: i64,
        mut payload: LeadUpdate,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if payload.is_empty() {
            return Err(AppError::EmptyUpdate);
        }
        payload.check()?;

        // Grava sempre a forma canônica ("won" -> "WON")
        if let Some(raw) = payload.status.take() {
            let status: LeadStatus = raw.parse()?;
            payload.status = Some(status.as_str().to_string());
        }

        let lead = self
            .repo
            .update(executor, id, &payload)
            .await?
            .ok_or(AppError::LeadNotFound(id))?;

        tracing::info!("✏️ Lead #{} atualizado", lead.id);
        Ok(lead)
    }

    pub async fn change_status<'e, E>(
        &self,
        executor: E,
        id: i64,
        raw_status: &str,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let status: LeadStatus = raw_status.parse()?;

        let lead = self
            .repo
            .update_status(executor, id, status)
            .await?
            .ok_or(AppError::LeadNotFound(id))?;

        tracing::info!("🔄 Lead #{} -> {}", lead.id, status);
        Ok(lead)
    }

    /// Com status: só os leads daquele status. Sem status: os mais recentes.
    pub async fn list_leads<'e, E>(
        &self,
        executor: E,
        status: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        match status {
            Some(raw) => {
                let status: LeadStatus = raw.parse()?;
                self.repo.list_by_status(executor, status, limit).await
            }
            None => self.repo.list_recent(executor, limit).await,
        }
    }

    pub async fn list_for_telegram_user<'e, E>(
        &self,
        executor: E,
        telegram_id: i64,
    ) -> Result<Vec<Lead>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_by_telegram_id(executor, telegram_id).await
    }

    /// Todos os leads em CSV, do mais novo para o mais antigo.
    pub async fn export_csv(&self) -> Result<(usize, Vec<u8>), AppError> {
        let leads = self.repo.list_all().await?;
        let bytes = export::leads_to_csv(&leads)?;

        tracing::info!("📊 Exportação com {} leads", leads.len());
        Ok((leads.len(), bytes))
    }
}
