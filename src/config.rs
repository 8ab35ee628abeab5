use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::Level;
use url::Url;

pub const DEFAULT_TIME_LIMIT_SECS: u32 = 60;
pub const DEFAULT_SCORE_PER_CORRECT: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
    #[error("{0} should be set")]
    Missing(&'static str),
    #[error("NGROK_URL and NGROK_ADDR must be set together")]
    PartialWebhook,
}

/// The two constants a quiz session consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub time_limit_secs: u32,
    pub score_per_correct: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            score_per_correct: DEFAULT_SCORE_PER_CORRECT,
        }
    }
}

impl SessionConfig {
    /// Points available in a quiz of `questions` questions.
    pub fn max_score(&self, questions: usize) -> u32 {
        self.score_per_correct.saturating_mul(questions as u32)
    }

    /// Time available in a quiz of `questions` questions, in seconds.
    pub fn time_budget_secs(&self, questions: usize) -> u32 {
        self.time_limit_secs.saturating_mul(questions as u32)
    }

    /// What a player is told before starting.
    pub fn rules(&self, questions: usize) -> String {
        format!(
            "{} questions • {} seconds per question\n\
             ⏱ The timer starts when you begin the quiz.\n\
             🧮 Each correct answer is worth {} points, {} in total. \
             There's no penalty for incorrect answers.",
            questions,
            self.time_limit_secs,
            self.score_per_correct,
            self.max_score(questions)
        )
    }
}

#[derive(Debug, Clone)]
pub struct Webhook {
    pub url: Url,
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub session: SessionConfig,
    pub log_level: Level,
    pub question_bank: Option<PathBuf>,
    pub webhook: Option<Webhook>,
}

impl Config {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let session = SessionConfig {
            time_limit_secs: parse_or(&lookup, "TIME_LIMIT_PER_QUESTION", DEFAULT_TIME_LIMIT_SECS)?,
            score_per_correct: parse_or(&lookup, "SCORE_PER_CORRECT_ANSWER", DEFAULT_SCORE_PER_CORRECT)?,
        };
        let log_level = parse_or(&lookup, "LOG_LEVEL", Level::ERROR)?;
        let question_bank = lookup("QUESTION_BANK_PATH").map(PathBuf::from);

        let url = parse_opt::<Url>(&lookup, "NGROK_URL")?;
        let addr = parse_opt::<SocketAddr>(&lookup, "NGROK_ADDR")?;
        let webhook = match (url, addr) {
            (Some(url), Some(addr)) => Some(Webhook { url, addr }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialWebhook),
        };

        Ok(Self {
            session,
            log_level,
            question_bank,
            webhook,
        })
    }
}

/// The bot token is only needed by the binary.
pub fn teloxide_token() -> Result<String, ConfigError> {
    std::env::var("TELOXIDE_TOKEN").map_err(|_| ConfigError::Missing("TELOXIDE_TOKEN"))
}

fn parse_opt<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| ConfigError::Invalid { name, value })
        })
        .transpose()
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    Ok(parse_opt(lookup, name)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(config.log_level, Level::ERROR);
        assert!(config.question_bank.is_none());
        assert!(config.webhook.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("TIME_LIMIT_PER_QUESTION", "30"),
            ("SCORE_PER_CORRECT_ANSWER", "10"),
            ("LOG_LEVEL", "debug"),
            ("QUESTION_BANK_PATH", "bank.json"),
            ("NGROK_URL", "https://example.ngrok.app"),
            ("NGROK_ADDR", "127.0.0.1:8443"),
        ]))
        .unwrap();

        assert_eq!(config.session.time_limit_secs, 30);
        assert_eq!(config.session.score_per_correct, 10);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.question_bank, Some(PathBuf::from("bank.json")));
        assert!(config.webhook.is_some());
    }

    #[test]
    fn rejects_bad_values() {
        let err = Config::from_lookup(lookup(&[("TIME_LIMIT_PER_QUESTION", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "TIME_LIMIT_PER_QUESTION", .. }));

        let err = Config::from_lookup(lookup(&[("NGROK_ADDR", "127.0.0.1:8443")])).unwrap_err();
        assert!(matches!(err, ConfigError::PartialWebhook));
    }

    #[test]
    fn rules_state_time_and_points() {
        let config = SessionConfig {
            time_limit_secs: 30,
            score_per_correct: 5,
        };
        assert_eq!(config.max_score(4), 20);
        assert_eq!(config.time_budget_secs(4), 120);
        assert_eq!(
            config.rules(4),
            "4 questions • 30 seconds per question\n\
             ⏱ The timer starts when you begin the quiz.\n\
             🧮 Each correct answer is worth 5 points, 20 in total. \
             There's no penalty for incorrect answers."
        );
    }
}
