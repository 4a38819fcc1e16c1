// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Status inválido: {0}")]
    InvalidStatus(String),

    #[error("Nenhum campo para atualizar")]
    EmptyUpdate,

    #[error("Lead {0} não encontrado")]
    LeadNotFound(i64),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro ao gerar CSV: {0}")]
    Csv(#[from] csv::Error),

    // Qualquer outro erro inesperado, com o contexto do anyhow.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Devolve os detalhes de cada campo inválido.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidStatus(ref raw) => {
                let body = Json(json!({
                    "error": format!("Status inválido: '{}'. Permitidos: NEW, IN_PROGRESS, WON, LOST.", raw),
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::EmptyUpdate => (StatusCode::BAD_REQUEST, "Nenhum campo para atualizar."),
            AppError::LeadNotFound(_) => (StatusCode::NOT_FOUND, "Lead não encontrado."),

            // DatabaseError, Csv e InternalServerError viram 500.
            // O detalhe fica só no log.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
