use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::GetChatId,
    prelude::*,
    types::{CallbackQuery, ChatId, Message, ParseMode, ReplyMarkup},
    utils::html,
};
use tokio::sync::mpsc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    ai_store::AiWorkspace,
    analysis::{seconds_to_minutes, AnalysisRecord},
    catalog::store::{Catalog, RetrieveTopic},
    config::SessionConfig,
    error::SessionError,
    generate,
    keyboard::{action_keyboard, question_keyboard, yes_no_keyboard, Action, QuestionView},
    runtime::{SessionHandle, SessionRegistry},
    session::{Progress, QuizSession, TimerEvent},
    shuffle::RandomShuffler,
    source::QuizSource,
    state::QuizState,
    AnalysisBoard, HandlerResult, UserDialogue,
};

#[instrument(level = "info", skip_all, fields(chat = %msg.chat.id))]
pub(crate) async fn selection(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    catalog: Arc<Catalog>,
    config: SessionConfig,
) -> HandlerResult {
    match msg.text() {
        Some(title) => match catalog.retrieve_topic(title).await? {
            Some(topic) => {
                tracing::info!(%topic, "topic selected");
                let source = QuizSource::Database {
                    topic_id: *topic.id(),
                };
                dialogue.update(QuizState::ReadyToRun { source }).await?;
                bot.send_message(
                    msg.chat.id,
                    confirmation(topic.title(), topic.description(), topic.quizzes().len(), &config),
                )
                .parse_mode(ParseMode::Html)
                .reply_markup(yes_no_keyboard())
                .await?;
            }
            None => {
                tracing::info!(title, "topic not found");
                bot.send_message(msg.chat.id, format!("Topic '{}' not found.", title))
                    .await?;
            }
        },
        None => {
            bot.send_message(msg.chat.id, "Please choose a topic from the list.")
                .await?;
        }
    }
    Ok(())
}

/// `/generate <prompt>`: builds a quiz for the prompt and offers to start it.
#[instrument(level = "info", skip_all, fields(chat = %msg.chat.id, %prompt))]
pub(crate) async fn generate(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    prompt: String,
    catalog: Arc<Catalog>,
    ai: Arc<AiWorkspace>,
    registry: Arc<SessionRegistry>,
    config: SessionConfig,
) -> HandlerResult {
    if let Some(state) = dialogue.get().await? {
        if state.release(&registry).await {
            tracing::info!("running quiz abandoned for a generated one");
        }
    }

    match generate::generate(catalog.as_ref(), &ai, &prompt).await {
        Ok(quiz) => {
            tracing::info!(conversation_id = %quiz.conversation_id, questions = quiz.quizzes.len(), "quiz generated");
            let source = QuizSource::AiGenerated {
                conversation_id: quiz.conversation_id,
            };
            dialogue.update(QuizState::ReadyToRun { source }).await?;
            bot.send_message(msg.chat.id, html::escape(&quiz.message))
                .await?;
            bot.send_message(
                msg.chat.id,
                confirmation(&quiz.topic, &quiz.description, quiz.quizzes.len(), &config),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(yes_no_keyboard())
            .await?;
        }
        Err(err) => {
            tracing::info!(%err, "generation failed");
            dialogue.update(QuizState::Start).await?;
            bot.send_message(msg.chat.id, err.to_string())
                .reply_markup(action_keyboard())
                .await?;
        }
    }
    Ok(())
}

#[instrument(level = "info", skip_all, fields(chat = %msg.chat.id, source = ?source))]
pub(crate) async fn running_ready(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    source: QuizSource,
    catalog: Arc<Catalog>,
    ai: Arc<AiWorkspace>,
    registry: Arc<SessionRegistry>,
    config: SessionConfig,
) -> HandlerResult {
    match msg.text() {
        Some("Yes") | Some("Yes✔️") => {
            let resolved = {
                let ai_quizzes = ai.quizzes.lock().await;
                source.resolve(catalog.as_ref(), &ai_quizzes).await
            };
            let questions = match resolved {
                Ok(questions) => questions,
                Err(err) => {
                    tracing::warn!(%err, "quiz cannot start");
                    bot.send_message(msg.chat.id, "Sorry, no questions for that quiz available.")
                        .reply_markup(action_keyboard())
                        .await?;
                    dialogue.update(QuizState::Start).await?;
                    return Ok(());
                }
            };

            let session = QuizSession::start(questions, config, Box::new(RandomShuffler))?;
            let (events, timeouts) = mpsc::unbounded_channel();
            let handle = registry.insert(SessionHandle::spawn(session, events)).await;
            forward_timer_events(bot.clone(), msg.chat.id, timeouts);
            tracing::info!(session_id = %handle.id(), "quiz started");

            bot.send_message(msg.chat.id, "Let's begin!")
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            send_question(&bot, msg.chat.id, &handle).await?;
            dialogue
                .update(QuizState::Running {
                    session_id: *handle.id(),
                    source,
                })
                .await?;
        }
        Some("No") | Some("No❌") => {
            tracing::info!("quiz declined");
            bot.send_message(msg.chat.id, "OK. Quitting quiz...")
                .await?;
            dialogue.update(QuizState::Start).await?;
            bot.send_message(msg.chat.id, "What do you want to do now?")
                .reply_markup(action_keyboard())
                .await?;
        }
        _ => {
            bot.send_message(
                msg.chat.id,
                "Please, enter a valid answer <b>Yes</b> or <b>No</b>.",
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip_all, fields(%session_id, data = ?q.data))]
pub(crate) async fn take_answer(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    (session_id, source): (Uuid, QuizSource),
    registry: Arc<SessionRegistry>,
    board: Arc<AnalysisBoard>,
    config: SessionConfig,
) -> HandlerResult {
    let Some(chat_id) = q.chat_id() else {
        return Ok(());
    };

    let Some(handle) = registry.get(&session_id).await else {
        bot.answer_callback_query(&q.id)
            .text("This quiz is no longer running.")
            .await?;
        dialogue.update(QuizState::Start).await?;
        return Ok(());
    };

    let Some(action) = q.data.as_deref().and_then(Action::parse) else {
        bot.answer_callback_query(&q.id).await?;
        return Ok(());
    };

    match action {
        Action::Toggle { question, answer } => {
            let outcome = handle.select_option(question, answer).await.map(|_| ());
            refresh(&bot, &q, chat_id, &handle, outcome).await?;
        }
        Action::Move { question, from, to } => {
            let outcome = handle.reorder_options(question, from, to).await;
            refresh(&bot, &q, chat_id, &handle, outcome).await?;
        }
        Action::Next { question } => {
            let progress = match handle.advance(question).await {
                Ok(progress) => progress,
                Err(err) => {
                    tracing::info!(%err, "submission rejected");
                    reject(&bot, &q, &err).await?;
                    return Ok(());
                }
            };
            bot.answer_callback_query(&q.id).await?;

            if let Some(message) = &q.message {
                bot.edit_message_reply_markup(chat_id, message.id())
                    .await?;
            }

            match progress {
                Progress::Next { last_correct, .. } => {
                    let verdict = if last_correct { "Correct ✅" } else { "Incorrect ❌" };
                    bot.send_message(chat_id, verdict).await?;
                    send_question(&bot, chat_id, &handle).await?;
                }
                Progress::Completed(record) => {
                    registry.remove(&session_id).await;
                    dialogue.update(QuizState::Start).await?;
                    let text = report(&record, &config);
                    board
                        .lock()
                        .await
                        .entry(chat_id)
                        .or_default()
                        .set(source.key(), record);

                    bot.send_message(chat_id, "Congratulations! You completed the quiz!")
                        .await?;
                    bot.send_message(chat_id, text)
                        .parse_mode(ParseMode::Html)
                        .await?;
                    bot.send_message(chat_id, "What do you want to do now?")
                        .reply_markup(action_keyboard())
                        .await?;
                }
            }
        }
    }

    Ok(())
}

/// Title, size and rules of a quiz, shown before it starts.
fn confirmation(title: &str, description: &str, questions: usize, config: &SessionConfig) -> String {
    format!(
        "<b>{}</b>\n<i>{}</i>\n\n{}\n\nAre you ready to begin? (Yes/No)",
        html::escape(title),
        html::escape(description),
        html::escape(&config.rules(questions))
    )
}

/// Answers a tap the session refused with a short notice.
async fn reject(bot: &Bot, q: &CallbackQuery, err: &SessionError) -> HandlerResult {
    let notice = match err {
        SessionError::InvalidMutationWhileLocked(_) => "⏰ Time is up! Press Next to continue.".to_string(),
        SessionError::StaleQuestion { .. } => "That question is already answered.".to_string(),
        other => other.to_string(),
    };
    bot.answer_callback_query(&q.id).text(notice).await?;
    Ok(())
}

/// Acknowledges an answer tap and redraws the question, or explains why the
/// tap was ignored.
async fn refresh(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    handle: &SessionHandle,
    outcome: Result<(), SessionError>,
) -> HandlerResult {
    if let Err(err) = outcome {
        tracing::debug!(%err, "answer rejected");
        return reject(bot, q, &err).await;
    }
    bot.answer_callback_query(&q.id).await?;

    let (Some(message), Some(view)) = (&q.message, handle.read(QuestionView::capture).await) else {
        return Ok(());
    };
    if let Err(err) = bot
        .edit_message_text(chat_id, message.id(), view.message())
        .parse_mode(ParseMode::Html)
        .reply_markup(question_keyboard(&view))
        .await
    {
        tracing::warn!(%err, "failed to redraw question");
    }
    Ok(())
}

async fn send_question(bot: &Bot, chat_id: ChatId, handle: &SessionHandle) -> HandlerResult {
    let Some(view) = handle.read(QuestionView::capture).await else {
        return Ok(());
    };

    bot.send_message(chat_id, view.message())
        .parse_mode(ParseMode::Html)
        .reply_markup(question_keyboard(&view))
        .await?;
    Ok(())
}

/// Posts a notice whenever a question runs out of time. Ends with the session.
fn forward_timer_events(bot: Bot, chat_id: ChatId, mut timeouts: mpsc::UnboundedReceiver<TimerEvent>) {
    tokio::spawn(async move {
        while let Some(TimerEvent::TimeUp { question_index }) = timeouts.recv().await {
            let notice = format!(
                "⏰ Time is up for question #{}! Press Next to continue.",
                question_index + 1
            );
            if let Err(err) = bot.send_message(chat_id, notice).await {
                tracing::warn!(%err, %chat_id, "failed to send timeout notice");
            }
        }
    });
}

fn report(record: &AnalysisRecord, config: &SessionConfig) -> String {
    let mut lines = vec![record.summary(config), String::new()];
    for (i, result) in record.results.iter().enumerate() {
        let picked = result
            .selected()
            .iter()
            .map(|answer| html::escape(answer.text()))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "{}. {} {}\n   Your answer: {} ({})",
            i + 1,
            if result.is_correct() { "✅" } else { "❌" },
            html::escape(result.question().text()),
            if picked.is_empty() { "-".to_string() } else { picked },
            seconds_to_minutes(result.elapsed_secs())
        ));
    }
    lines.join("\n")
}
