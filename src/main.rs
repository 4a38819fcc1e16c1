// src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use leads_backend::{
    config::{AppState, Config},
    db::migrations,
    routes::build_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Sem config não há nem nível de log: falha direto.
    let config = Config::from_env().context("Falha ao carregar a configuração")?;

    // RUST_LOG tem prioridade sobre LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    tracing::info!("Iniciando o serviço de leads…");

    let app_state = AppState::new(&config)
        .await
        .context("Falha ao inicializar o estado da aplicação")?;

    // Migração falhou = o serviço não sobe
    if config.run_migrations {
        let applied = migrations::run(&app_state.db_pool)
            .await
            .context("Falha ao rodar as migrações do banco de dados")?;
        tracing::info!("✅ Migrações executadas ({} novas)", applied.len());
    } else {
        tracing::warn!("RUN_MIGRATIONS desligado, schema não verificado");
    }

    let db_pool = app_state.db_pool.clone();
    let app = build_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", config.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Erro no servidor Axum")?;

    db_pool.close().await;
    tracing::info!("Conexão com o banco encerrada");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao escutar o sinal de desligamento: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Desligando…");
}
