use std::{error::Error, sync::Arc};

use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        DpHandlerDescription, UpdateFilterExt, UpdateHandler,
    },
    dptree::{self, Handler},
    payloads::SendMessageSetters,
    prelude::{DependencyMap, Requester},
    types::{Message, Update},
    Bot,
};
use tracing::instrument;

use crate::{
    ai_store::AiWorkspace,
    catalog::store::{Catalog, RetrieveTopic},
    commands::{self, cancel, help, start, Command},
    keyboard::{topics_keyboard, SHOW_RESULTS, TAKE_QUIZ},
    runner,
    state::QuizState,
    AnalysisBoard, HandlerResult, UserDialogue,
};

type SchemeHandler =
    Handler<'static, DependencyMap, Result<(), Box<dyn Error + Send + Sync + 'static>>, DpHandlerDescription>;

pub fn schema() -> UpdateHandler<Box<dyn Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start))
        .branch(case![Command::Cancel].endpoint(cancel))
        .branch(case![Command::Results].endpoint(commands::results))
        .branch(case![Command::Generate(prompt)].endpoint(runner::generate));

    let handler = Update::filter_message()
        .branch(command_handler)
        .branch(case![QuizState::Start].endpoint(choose_what_to_do))
        .branch(running_scheme())
        .endpoint(invalid_state);

    dialogue::enter::<Update, InMemStorage<QuizState>, QuizState, _>()
        .branch(handler)
        .branch(callback_query_scheme())
}

#[instrument(level = "info", skip_all, fields(chat = %msg.chat.id))]
async fn choose_what_to_do(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    catalog: Arc<Catalog>,
    ai: Arc<AiWorkspace>,
    board: Arc<AnalysisBoard>,
) -> HandlerResult {
    match msg.text() {
        Some(TAKE_QUIZ) => {
            let topics = catalog.retrieve_all_topic_titles().await?;
            if topics.is_empty() {
                bot.send_message(msg.chat.id, "No available quizzes.")
                    .await?;
            } else {
                tracing::info!(count = topics.len(), "listing topics");
                bot.send_message(msg.chat.id, "Please, choose available quiz:")
                    .reply_markup(topics_keyboard(&topics))
                    .await?;
                dialogue.update(QuizState::Selection).await?;
            }
        }
        Some(SHOW_RESULTS) => {
            commands::results(bot, msg, catalog, ai, board).await?;
        }
        other => {
            tracing::info!(?other, "unexpected choice");
            bot.send_message(msg.chat.id, "Invalid input. Please try again.")
                .await?;
        }
    }

    Ok(())
}

#[instrument(level = "debug")]
fn running_scheme() -> SchemeHandler {
    use dptree::case;
    Update::filter_message()
        .branch(case![QuizState::Selection].endpoint(runner::selection))
        .branch(case![QuizState::ReadyToRun { source }].endpoint(runner::running_ready))
}

#[instrument(level = "debug")]
fn callback_query_scheme() -> SchemeHandler {
    use dptree::case;
    Update::filter_callback_query().branch(
        case![QuizState::Running {
            session_id,
            source
        }]
        .endpoint(runner::take_answer),
    )
}

#[instrument(level = "info", skip_all, fields(chat = %msg.chat.id))]
async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    tracing::info!(text = ?msg.text(), "invalid input");
    bot.send_message(
        msg.chat.id,
        "Unable to handle the message. Enter /help to see usages.",
    )
    .await?;
    Ok(())
}
