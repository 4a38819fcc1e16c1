// src/models/lead.rs

use std::{borrow::Cow, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::common::error::AppError;

// Representa uma linha da tabela 'leads'
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: i64,
    pub telegram_id: i64,

    pub username: String,
    pub full_name: String,

    pub country: String,
    pub city_from: String,
    pub cargo_type: String,

    pub weight_kg: Decimal,
    pub volume_m3: Decimal,

    pub urgency: String,
    pub incoterms: String,
    pub phone: String,
    pub comment: String,

    // Texto livre no banco; escrito só com valores de LeadStatus
    pub status: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Migração 0002
    pub service_type: String,
    pub customs_direction: String,
    pub invoice_value: Decimal,
}

// --- STATUS ---

/// Ciclo de vida de um lead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LeadStatus {
    #[default]
    New,
    InProgress,
    Won,
    Lost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 4] = [
        LeadStatus::New,
        LeadStatus::InProgress,
        LeadStatus::Won,
        LeadStatus::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "NEW",
            LeadStatus::InProgress => "IN_PROGRESS",
            LeadStatus::Won => "WON",
            LeadStatus::Lost => "LOST",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Aceita "in_progress", " won " etc. (o admin digita à mão)
impl FromStr for LeadStatus {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_uppercase();
        LeadStatus::ALL
            .into_iter()
            .find(|s| s.as_str() == normalized)
            .ok_or_else(|| AppError::InvalidStatus(raw.to_string()))
    }
}

// --- ENTRADA ---

/// Dados para criar um lead. Só `telegram_id` é obrigatório;
/// os campos ausentes ficam com o default da coluna.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub telegram_id: i64,

    #[validate(length(max = 64, message = "Username muito longo."))]
    pub username: Option<String>,
    #[validate(length(max = 256, message = "Nome muito longo."))]
    pub full_name: Option<String>,

    pub service_type: Option<String>,
    pub customs_direction: Option<String>,

    pub country: Option<String>,
    pub city_from: Option<String>,
    pub cargo_type: Option<String>,

    pub weight_kg: Option<Decimal>,
    pub volume_m3: Option<Decimal>,
    pub invoice_value: Option<Decimal>,

    pub urgency: Option<String>,
    pub incoterms: Option<String>,

    #[validate(length(max = 32, message = "Telefone muito longo."))]
    pub phone: Option<String>,
    #[validate(length(max = 2000, message = "Comentário muito longo."))]
    pub comment: Option<String>,
}

impl NewLead {
    pub fn new(telegram_id: i64) -> Self {
        Self {
            telegram_id,
            ..Default::default()
        }
    }

    /// Regras do derive + quantidades que cabem na coluna.
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        check_quantity(&mut errors, "weight_kg", self.weight_kg, WEIGHT_KG);
        check_quantity(&mut errors, "volume_m3", self.volume_m3, VOLUME_M3);
        check_quantity(&mut errors, "invoice_value", self.invoice_value, INVOICE_VALUE);
        if errors.errors().is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Atualização parcial. `None` = não mexe na coluna.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LeadUpdate {
    #[validate(length(max = 64, message = "Username muito longo."))]
    pub username: Option<String>,
    #[validate(length(max = 256, message = "Nome muito longo."))]
    pub full_name: Option<String>,

    pub service_type: Option<String>,
    pub customs_direction: Option<String>,

    pub country: Option<String>,
    pub city_from: Option<String>,
    pub cargo_type: Option<String>,

    pub weight_kg: Option<Decimal>,
    pub volume_m3: Option<Decimal>,
    pub invoice_value: Option<Decimal>,

    pub urgency: Option<String>,
    pub incoterms: Option<String>,

    #[validate(length(max = 32, message = "Telefone muito longo."))]
    pub phone: Option<String>,
    #[validate(length(max = 2000, message = "Comentário muito longo."))]
    pub comment: Option<String>,

    // Validado contra LeadStatus no service
    pub status: Option<String>,
}

impl LeadUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.full_name.is_none()
            && self.service_type.is_none()
            && self.customs_direction.is_none()
            && self.country.is_none()
            && self.city_from.is_none()
            && self.cargo_type.is_none()
            && self.weight_kg.is_none()
            && self.volume_m3.is_none()
            && self.invoice_value.is_none()
            && self.urgency.is_none()
            && self.incoterms.is_none()
            && self.phone.is_none()
            && self.comment.is_none()
            && self.status.is_none()
    }

    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        check_quantity(&mut errors, "weight_kg", self.weight_kg, WEIGHT_KG);
        check_quantity(&mut errors, "volume_m3", self.volume_m3, VOLUME_M3);
        check_quantity(&mut errors, "invoice_value", self.invoice_value, INVOICE_VALUE);
        if errors.errors().is_empty() { Ok(()) } else { Err(errors) }
    }
}

// Precisão e escala das colunas NUMERIC(p, s)
const WEIGHT_KG: (u32, u32) = (10, 2);
const VOLUME_M3: (u32, u32) = (10, 3);
const INVOICE_VALUE: (u32, u32) = (12, 2);

// O Postgres arredonda casas a mais em silêncio e estoura (22003) acima da precisão.
fn check_quantity(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<Decimal>,
    (precision, scale): (u32, u32),
) {
    let Some(v) = value else { return };

    let (code, message) = if v < Decimal::ZERO {
        ("non_negative", "O valor não pode ser negativo.".to_string())
    } else if v.normalize().scale() > scale {
        ("scale", format!("No máximo {} casas decimais.", scale))
    } else if v >= Decimal::from(10_i64.pow(precision - scale)) {
        ("range", format!("O valor precisa ser menor que 10^{}.", precision - scale))
    } else {
        return;
    };

    let mut error = ValidationError::new(code);
    error.message = Some(Cow::from(message));
    errors.add(field, error);
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusPayload {
    pub status: String,
}

/// Filtros de GET /api/leads
#[derive(Debug, Default, Deserialize)]
pub struct ListLeadsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub const DEFAULT_LIST_LIMIT: i64 = 10;
pub const MAX_LIST_LIMIT: i64 = 500;

impl ListLeadsQuery {
    pub fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
    }
}
