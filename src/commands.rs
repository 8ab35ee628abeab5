use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{Message, ParseMode},
    utils::{command::BotCommands, html},
    Bot,
};

use crate::{
    ai_store::AiWorkspace,
    analysis::seconds_to_minutes,
    catalog::store::Catalog,
    keyboard::action_keyboard,
    runtime::SessionRegistry,
    state::QuizState,
    AnalysisBoard, HandlerResult, UserDialogue,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "start the bot.")]
    Start,
    #[command(description = "abandon the current quiz.")]
    Cancel,
    #[command(description = "show results of finished quizzes.")]
    Results,
    #[command(description = "generate a quiz about a topic, e.g. /generate rust traits.")]
    Generate(String),
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

pub(crate) async fn cancel(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    registry: Arc<SessionRegistry>,
) -> HandlerResult {
    release(&dialogue, &registry, &msg).await?;

    bot.send_message(msg.chat.id, "Cancelling dialogue")
        .reply_markup(action_keyboard())
        .await?;
    dialogue.update(QuizState::Start).await?;
    Ok(())
}

pub(crate) async fn start(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    registry: Arc<SessionRegistry>,
) -> HandlerResult {
    release(&dialogue, &registry, &msg).await?;

    bot.send_message(msg.chat.id, "Please choose what to do:")
        .reply_markup(action_keyboard())
        .await?;
    dialogue.update(QuizState::Start).await?;
    Ok(())
}

/// Stops the quiz the chat is running, if any.
async fn release(dialogue: &UserDialogue, registry: &SessionRegistry, msg: &Message) -> HandlerResult {
    if let Some(state) = dialogue.get().await? {
        if state.release(registry).await {
            tracing::info!(chat = %msg.chat.id, session_id = ?state.session_id(), "quiz abandoned");
        }
    }
    Ok(())
}

pub(crate) async fn results(
    bot: Bot,
    msg: Message,
    catalog: Arc<Catalog>,
    ai: Arc<AiWorkspace>,
    board: Arc<AnalysisBoard>,
) -> HandlerResult {
    let records = match board.lock().await.get(&msg.chat.id) {
        Some(store) => store
            .iter()
            .map(|(key, record)| (*key, record.clone()))
            .collect::<Vec<_>>(),
        None => Vec::new(),
    };

    let mut lines = Vec::with_capacity(records.len());
    for (key, record) in records {
        let title = match catalog.topic(&key) {
            Some(topic) => topic.title().to_owned(),
            None => ai
                .topic(&key)
                .await
                .unwrap_or_else(|| "Generated quiz".to_string()),
        };
        lines.push(format!(
            "<b>{}</b>: {} points, {}/{} correct in {}",
            html::escape(&title),
            record.totals.score,
            record.correct_count(),
            record.results.len(),
            seconds_to_minutes(record.totals.elapsed_secs)
        ));
    }
    let text = if lines.is_empty() {
        "No finished quizzes yet.".to_string()
    } else {
        lines.join("\n")
    };

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
