use std::{collections::HashMap, error::Error, sync::Arc};

use quizbot::{
    ai_store::AiWorkspace,
    catalog::store::Catalog,
    config::{self, Config},
    runtime::SessionRegistry,
    schema::schema,
    state::QuizState,
    AnalysisBoard,
};
use teloxide::{
    dispatching::dialogue::InMemStorage,
    error_handlers::IgnoringErrorHandlerSafe,
    prelude::*,
    update_listeners::webhooks::{self, Options},
};
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_line_number(true)
        .with_target(false)
        .finish();
    tracing_log::LogTracer::init()?;
    tracing::subscriber::set_global_default(subscriber)?;

    let catalog = match &config.question_bank {
        Some(path) => {
            let json = tokio::fs::read_to_string(path).await?;
            let catalog = Catalog::from_json(&json)?;
            tracing::info!(
                path = %path.display(),
                topics = catalog.topics().len(),
                questions = catalog.quizzes_count(),
                "question bank loaded"
            );
            catalog
        }
        None => {
            tracing::warn!("QUESTION_BANK_PATH is not set, starting with an empty catalog");
            Catalog::new()
        }
    };

    let bot = Bot::new(config::teloxide_token()?);
    tracing::info!("Starting bot...");

    let board: AnalysisBoard = tokio::sync::Mutex::new(HashMap::new());

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![
            InMemStorage::<QuizState>::new(),
            Arc::new(catalog),
            Arc::new(SessionRegistry::new()),
            Arc::new(AiWorkspace::new()),
            Arc::new(board),
            config.session
        ])
        .enable_ctrlc_handler()
        .build();

    match config.webhook {
        Some(webhook) => {
            let listener = webhooks::axum(bot, Options::new(webhook.addr, webhook.url)).await?;
            dispatcher
                .dispatch_with_listener(listener, Arc::new(IgnoringErrorHandlerSafe))
                .await
        }
        None => dispatcher.dispatch().await,
    }

    Ok(())
}
