// src/services/export.rs

use crate::{common::error::AppError, models::lead::Lead};

// BOM para o Excel abrir o CSV como UTF-8
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const CSV_COLUMNS: [&str; 19] = [
    "id",
    "telegram_id",
    "username",
    "full_name",
    "service_type",
    "customs_direction",
    "country",
    "city_from",
    "cargo_type",
    "weight_kg",
    "volume_m3",
    "invoice_value",
    "urgency",
    "incoterms",
    "phone",
    "comment",
    "status",
    "created_at",
    "updated_at",
];

pub fn leads_to_csv(leads: &[Lead]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer.write_record(CSV_COLUMNS)?;

    for lead in leads {
        writer.write_record([
            lead.id.to_string(),
            lead.telegram_id.to_string(),
            lead.username.clone(),
            lead.full_name.clone(),
            lead.service_type.clone(),
            lead.customs_direction.clone(),
            lead.country.clone(),
            lead.city_from.clone(),
            lead.cargo_type.clone(),
            lead.weight_kg.to_string(),
            lead.volume_m3.to_string(),
            lead.invoice_value.to_string(),
            lead.urgency.clone(),
            lead.incoterms.clone(),
            lead.phone.clone(),
            lead.comment.clone(),
            lead.status.clone(),
            lead.created_at.to_rfc3339(),
            lead.updated_at.to_rfc3339(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::from(anyhow::anyhow!("Falha ao finalizar o CSV: {}", e)))
}
