use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, instrument, warn};

use crate::{
    backend::QueueBackend,
    config::ServiceConfig,
    limiter::EnqueueRateLimiter,
    manager::QueueManager,
    types::{CallerKey, ChannelKey, Entry},
    QueueError,
};

/// A BattleTag: one leading letter, 2-11 further letters/digits, `#`, 1-7 digits
static BTAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\pL[\pL\pN]{2,11}#\d{1,7}$").expect("BattleTag pattern is valid")
});

/// One inbound chat command, as handed over by the chat-protocol layer
///
/// `can_moderate` is the chat layer's permission verdict for this caller in
/// this channel; the service performs no authorization of its own.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub channel: ChannelKey,
    pub caller: CallerKey,
    pub args: String,
    pub can_moderate: bool,
}

/// Translates chat commands into queue, manager and limiter operations
///
/// This is the only place errors become user-facing text. Recoverable
/// outcomes (`AlreadyQueued`, `NotFound`, bad arguments) get specific
/// replies; infrastructure errors are logged with detail and answered with a
/// generic failure.
pub struct CommandRouter {
    manager: Arc<QueueManager>,
    limiter: EnqueueRateLimiter,
    config: ServiceConfig,
}

impl CommandRouter {
    pub fn new(manager: Arc<QueueManager>, config: ServiceConfig) -> Self {
        Self {
            limiter: EnqueueRateLimiter::new(config.enqueue_cooldown),
            manager,
            config,
        }
    }

    /// `!enqueue <tag>`: join the caller's channel queue
    #[instrument(skip(self, req), fields(channel = %req.channel, caller = %req.caller))]
    pub async fn enqueue(&self, req: &CommandRequest) -> String {
        let tag = req.args.split_whitespace().next().unwrap_or("");
        if tag.is_empty() {
            return "No BattleTag specified. Try `!enqueue example#1234`.".to_string();
        }
        if !valid_battle_tag(tag) {
            return format!("BattleTag {tag:?} appears to be invalid.");
        }

        let queue = self.manager.lookup(&req.channel);

        match queue.position(&req.caller).await {
            Ok(Some(position)) => return already_queued_reply(&req.caller, tag, Some(position)),
            Ok(None) => {}
            Err(err) => return self.backend_failure("enqueue", &req.channel, err),
        }

        if self.limiter.triggered(&req.channel, &req.caller) {
            let minutes = self.config.enqueue_cooldown.as_secs() / 60;
            return format!(
                "You may enqueue at most once every {minutes} minutes, {}. \
                 Please try again later.",
                mention(&req.caller)
            );
        }

        match queue.enqueue(Entry::new(req.caller.clone(), tag)).await {
            Ok(()) => {
                self.limiter.record_enqueue(&req.channel, &req.caller, Utc::now());
                match queue.len().await {
                    Ok(size) => format!(
                        "Successfully added {tag} to the scrimmages queue in position {size}."
                    ),
                    Err(err) => {
                        warn!(error = %err, "enqueued but could not read queue size");
                        format!("Successfully added {tag} to the scrimmages queue.")
                    }
                }
            }
            // Lost the race with a concurrent enqueue by the same caller
            Err(QueueError::AlreadyQueued(_)) => {
                let position = queue.position(&req.caller).await.ok().flatten();
                already_queued_reply(&req.caller, tag, position)
            }
            Err(err) => self.backend_failure("enqueue", &req.channel, err),
        }
    }

    /// `!dequeue`: leave the caller's channel queue
    #[instrument(skip(self, req), fields(channel = %req.channel, caller = %req.caller))]
    pub async fn dequeue(&self, req: &CommandRequest) -> String {
        let queue = self.manager.lookup(&req.channel);

        match queue.remove(&req.caller).await {
            Ok(entry) => format!(
                "Successfully removed {} from the scrimmages queue.",
                entry.tag
            ),
            Err(err) if err.is_not_found() => {
                "You are not in the scrimmages queue.".to_string()
            }
            Err(err) => self.backend_failure("dequeue", &req.channel, err),
        }
    }

    /// `!queue <subcommand> [args]`: list/clear/take and help
    #[instrument(skip(self, req), fields(channel = %req.channel, caller = %req.caller))]
    pub async fn queue(&self, req: &CommandRequest) -> String {
        let mut pieces = req.args.splitn(2, ' ');
        let subcommand = pieces.next().unwrap_or("");
        let rest = pieces.next().unwrap_or("");

        let queue = self.manager.lookup(&req.channel);

        match subcommand {
            "" | "help" => queue_help(),
            "clear" => self.queue_clear(req, queue.as_ref()).await,
            "list" | "show" => self.queue_list(&req.channel, queue.as_ref()).await,
            "take" | "pick" | "grab" => {
                self.queue_take(req, queue.as_ref(), rest).await
            }
            "enqueue" | "add" => "Try `!enqueue` instead.".to_string(),
            "dequeue" | "remove" | "del" | "delete" => "Try `!dequeue` instead.".to_string(),
            other => format!("Unhandled scrimmages queue command: {other:?}"),
        }
    }

    async fn queue_clear(&self, req: &CommandRequest, queue: &dyn QueueBackend) -> String {
        if !req.can_moderate {
            warn!("unauthorized queue clear attempt");
            return "Permission denied.".to_string();
        }

        match queue.clear().await {
            Ok(()) => {
                self.limiter.clear_channel(&req.channel);
                "Scrimmages queue cleared.".to_string()
            }
            Err(err) => self.backend_failure("clear", &req.channel, err),
        }
    }

    async fn queue_list(&self, channel: &ChannelKey, queue: &dyn QueueBackend) -> String {
        match queue.list().await {
            Ok(entries) if entries.is_empty() => "The scrimmages queue is empty.".to_string(),
            Ok(entries) => {
                let tags: Vec<&str> = entries.iter().map(|e| e.tag.as_str()).collect();
                format!(
                    "The scrimmages queue contains {} BattleTags: {}.",
                    tags.len(),
                    tags.join(", ")
                )
            }
            Err(err) => self.backend_failure("list", channel, err),
        }
    }

    async fn queue_take(
        &self,
        req: &CommandRequest,
        queue: &dyn QueueBackend,
        args: &str,
    ) -> String {
        if !req.can_moderate {
            warn!("unauthorized queue take attempt");
            return "Permission denied.".to_string();
        }

        let count = match args.split_whitespace().next() {
            None => self.config.default_take,
            Some(raw) => match raw.parse::<usize>() {
                Ok(count) => count,
                Err(_) => return format!("Invalid take argument {raw:?}."),
            },
        };

        let taken = match queue.dequeue(count).await {
            Ok(taken) => taken,
            Err(err) => return self.backend_failure("take", &req.channel, err),
        };

        let mut reply = format!("Took {} BattleTags from the scrimmages queue", taken.len());
        if taken.is_empty() {
            reply.push('.');
        } else {
            let tags: Vec<&str> = taken.iter().map(|e| e.tag.as_str()).collect();
            reply.push_str(&format!(": {}.", tags.join(", ")));
        }
        match queue.len().await {
            Ok(remaining) => {
                reply.push_str(&format!(" {remaining} BattleTags remain in the queue."));
            }
            Err(err) => warn!(error = %err, "took entries but could not read queue size"),
        }

        reply
    }

    fn backend_failure(&self, op: &str, channel: &ChannelKey, err: QueueError) -> String {
        error!(%channel, error = %err, "queue {op} failed");
        format!("Error talking to the scrimmages queue, {op} not applied. Please try again later.")
    }
}

fn queue_help() -> String {
    "Manipulates the scrimmages queue.\n\
     `!dequeue` -- remove yourself from the scrimmages queue\n\
     `!enqueue MyBattleTag#1234` -- add your BattleTag to the scrimmages queue\n\
     `!queue clear` -- clear the scrimmages queue\n\
     `!queue list` -- list the BattleTags in the scrimmages queue\n\
     `!queue take <n>` -- remove the first `n` BattleTags from the scrimmages queue"
        .to_string()
}

fn already_queued_reply(caller: &CallerKey, tag: &str, position: Option<u64>) -> String {
    match position {
        Some(position) => format!(
            "User {} is already queued as {tag:?} in position {position}.",
            mention(caller)
        ),
        None => format!("User {} is already queued as {tag:?}.", mention(caller)),
    }
}

/// Chat-layer mention markup for a caller
fn mention(caller: &CallerKey) -> String {
    format!("<@!{caller}>")
}

fn valid_battle_tag(tag: &str) -> bool {
    BTAG_RE.is_match(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_battle_tags() {
        for tag in ["example#1234", "Ab1#1", "Señor99#1234567", "abc#7"] {
            assert!(valid_battle_tag(tag), "{tag} should be valid");
        }
    }

    #[test]
    fn test_invalid_battle_tags() {
        for tag in [
            "",
            "example",
            "#1234",
            "1example#1234",     // must start with a letter
            "ab#12",             // body too short
            "waytoolongname#12", // body too long
            "example#12345678",  // too many digits
            "example#",
            "exa mple#123",
        ] {
            assert!(!valid_battle_tag(tag), "{tag} should be invalid");
        }
    }

    #[test]
    fn test_mention_markup() {
        assert_eq!(mention(&"12345".into()), "<@!12345>");
    }
}
