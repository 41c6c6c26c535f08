//! Interactive sessions

use std::sync::Arc;
use stepwise_memory::{Preferences, StepMemory};
use uuid::Uuid;

use crate::{
    controller::{Controller, SessionOutcome},
    Result,
};

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Clear step memory, keep preferences
    Reset,
    /// End the session
    Exit,
    /// A problem to solve
    Solve(String),
}

impl SessionCommand {
    /// Interpret a line; blank lines yield `None`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            None
        } else if line.eq_ignore_ascii_case("reset") {
            Some(Self::Reset)
        } else if line.eq_ignore_ascii_case("exit") {
            Some(Self::Exit)
        } else {
            Some(Self::Solve(line.to_string()))
        }
    }
}

/// What handling a command produced
#[derive(Debug, Clone)]
pub enum SessionReply {
    Solved(SessionOutcome),
    Reset,
    Exit,
}

/// A problem-solving session
///
/// The session owns its step memory; nothing else mutates it. Memory carries
/// over between problems until a reset.
pub struct Session {
    id: Uuid,
    controller: Arc<Controller>,
    memory: StepMemory,
    preferences: Preferences,
}

impl Session {
    pub fn new(controller: Arc<Controller>) -> Self {
        let id = Uuid::new_v4();
        tracing::info!("Started session {}", id);
        Self {
            id,
            controller,
            memory: StepMemory::new(),
            preferences: Preferences::new(),
        }
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn memory(&self) -> &StepMemory {
        &self.memory
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Name to show the user, from preferences or configuration
    pub fn agent_name(&self) -> &str {
        self.preferences
            .agent_name()
            .unwrap_or(&self.controller.config().agent_name)
    }

    /// Solve one problem with the session's memory and preferences
    pub async fn solve(&mut self, query: &str) -> Result<SessionOutcome> {
        let prefs = (!self.preferences.is_empty()).then_some(&self.preferences);
        self.controller
            .solve(&self.id.to_string(), query, &mut self.memory, prefs)
            .await
    }

    /// Clear step memory; the persisted log gets a reset marker
    pub async fn reset(&mut self) {
        self.memory.reset();
        if let Some(store) = self.controller.step_log() {
            if let Err(e) = store.append_reset(&self.id.to_string()).await {
                tracing::warn!("Failed to record reset for session {}: {}", self.id, e);
            }
        }
    }

    pub async fn handle(&mut self, command: SessionCommand) -> Result<SessionReply> {
        match command {
            SessionCommand::Reset => {
                self.reset().await;
                Ok(SessionReply::Reset)
            }
            SessionCommand::Exit => {
                tracing::info!("Ending session {}", self.id);
                Ok(SessionReply::Exit)
            }
            SessionCommand::Solve(query) => self.solve(&query).await.map(SessionReply::Solved),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(SessionCommand::parse("  "), None);
        assert_eq!(SessionCommand::parse("RESET"), Some(SessionCommand::Reset));
        assert_eq!(SessionCommand::parse("exit\n"), Some(SessionCommand::Exit));
        assert_eq!(
            SessionCommand::parse(" compound 100 at 5% "),
            Some(SessionCommand::Solve("compound 100 at 5%".to_string()))
        );
    }
}
