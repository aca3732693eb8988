use std::sync::Arc;

use super::notifier::{NoticeLevel, Notifier};
use crate::providers::executor::TaskHandle;

pub trait CommandHandler: Send + Sync {
    /// Runs the command. Work that continues in the background is returned
    /// as a handle.
    fn execute(&self, label: &str, args: &[&str], notifier: Arc<dyn Notifier>)
    -> Option<TaskHandle>;

    /// Suggestions for the last element of `args`.
    fn complete(&self, args: &[&str]) -> Vec<String>;
}

pub struct RegisteredCommand {
    pub name: String,
    pub description: String,
    pub usage: String,
    pub aliases: Vec<String>,
    handler: Box<dyn CommandHandler>,
}

impl RegisteredCommand {
    fn answers_to(&self, label: &str) -> bool {
        self.name.eq_ignore_ascii_case(label)
            || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(label))
    }
}

/// Maps command names and aliases to handlers.
#[derive(Default)]
pub struct CommandRouter {
    commands: Vec<RegisteredCommand>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: &str,
        description: &str,
        usage: &str,
        aliases: &[&str],
        handler: Box<dyn CommandHandler>,
    ) {
        tracing::debug!(command = name, ?aliases, "registered command");
        self.commands.push(RegisteredCommand {
            name: name.to_string(),
            description: description.to_string(),
            usage: usage.to_string(),
            aliases: aliases.iter().map(|alias| alias.to_string()).collect(),
            handler,
        });
    }

    pub fn commands(&self) -> &[RegisteredCommand] {
        &self.commands
    }

    /// Splits `line` on whitespace and dispatches it. A leading `/` is ignored.
    pub fn dispatch(&self, line: &str, notifier: Arc<dyn Notifier>) -> Option<TaskHandle> {
        let mut words = line.trim().trim_start_matches('/').split_whitespace();
        let label = words.next()?;
        let args: Vec<&str> = words.collect();
        self.dispatch_args(label, &args, notifier)
    }

    pub fn dispatch_args(
        &self,
        label: &str,
        args: &[&str],
        notifier: Arc<dyn Notifier>,
    ) -> Option<TaskHandle> {
        match self.find(label) {
            Some(command) => command.handler.execute(label, args, notifier),
            None => {
                notifier.notify(NoticeLevel::Error, &format!("Unknown command: {}", label));
                None
            }
        }
    }

    /// Completion candidates for a partially typed line. A trailing space
    /// starts a new, empty argument.
    pub fn complete(&self, line: &str) -> Vec<String> {
        let line = line.trim_start().trim_start_matches('/');
        let mut words: Vec<&str> = line.split_whitespace().collect();
        if line.is_empty() || line.ends_with(char::is_whitespace) {
            words.push("");
        }
        match words.as_slice() {
            [] => Vec::new(),
            [label] => self
                .commands
                .iter()
                .map(|command| command.name.clone())
                .filter(|name| name.starts_with(&label.to_lowercase()))
                .collect(),
            [label, args @ ..] => self
                .find(label)
                .map(|command| command.handler.complete(args))
                .unwrap_or_default(),
        }
    }

    fn find(&self, label: &str) -> Option<&RegisteredCommand> {
        self.commands.iter().find(|command| command.answers_to(label))
    }
}
