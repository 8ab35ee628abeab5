use std::collections::HashMap;

use analysis::AnalysisStore;
use state::QuizState;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::Dialogue, types::ChatId};

pub mod ai_store;
pub mod analysis;
pub mod answer;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod generate;
pub mod keyboard;
pub mod runner;
pub mod runtime;
pub mod schema;
pub mod session;
pub mod shuffle;
pub mod source;
pub mod state;
pub mod timer;

type UserDialogue = Dialogue<QuizState, InMemStorage<QuizState>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

/// Finished-quiz analysis, one store per chat.
pub type AnalysisBoard = tokio::sync::Mutex<HashMap<ChatId, AnalysisStore>>;
