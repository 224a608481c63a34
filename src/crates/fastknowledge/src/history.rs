//! Conversation history and the history-to-messages formatter.

use crate::error::Result;
use crate::prompt::{render, PromptStore, RenderVars};
use llm::{ChatMessage, Role};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// One history turn as received from a client. The role is checked when the
/// entry is converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

impl HistoryEntry {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Convert to a [`ChatMessage`], rejecting unknown roles.
    pub fn to_message(&self) -> Result<ChatMessage> {
        let role: Role = self.role.parse()?;
        Ok(ChatMessage::new(role, self.content.clone()))
    }
}

/// Chronological message list holding at most `max_len` messages.
///
/// Pushing past the bound drops the oldest message.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationHistory {
    messages: VecDeque<ChatMessage>,
    max_len: usize,
}

impl ConversationHistory {
    pub fn new(max_len: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(max_len),
            max_len,
        }
    }

    /// Build from client entries, keeping the last `max_len`.
    ///
    /// Every entry's role is checked, including entries that get dropped.
    pub fn from_entries(entries: &[HistoryEntry], max_len: usize) -> Result<Self> {
        let messages = entries
            .iter()
            .map(HistoryEntry::to_message)
            .collect::<Result<Vec<_>>>()?;

        let mut history = Self::new(max_len);
        for message in messages {
            history.push(message);
        }
        Ok(history)
    }

    pub fn push(&mut self, message: ChatMessage) {
        if self.max_len == 0 {
            return;
        }
        while self.messages.len() >= self.max_len {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }
}

/// Turns history plus a named template into the message list sent to a model.
#[derive(Debug, Clone)]
pub struct HistoryFormatter {
    prompts: Arc<PromptStore>,
    max_history: usize,
}

impl HistoryFormatter {
    pub fn new(prompts: Arc<PromptStore>, max_history: usize) -> Self {
        Self {
            prompts,
            max_history,
        }
    }

    pub fn prompts(&self) -> &Arc<PromptStore> {
        &self.prompts
    }

    /// History messages (content taken literally) followed by the rendered
    /// `scenario/template_name` template as the final user message.
    pub fn format(
        &self,
        scenario: &str,
        template_name: &str,
        history: &[HistoryEntry],
        vars: &RenderVars<'_>,
    ) -> Result<Vec<ChatMessage>> {
        let history = ConversationHistory::from_entries(history, self.max_history)?;
        let template = self.prompts.get(scenario, template_name)?;

        let mut messages: Vec<ChatMessage> = history.iter().cloned().collect();
        messages.push(ChatMessage::user(render(&template, vars)));
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KnowledgeError;
    use crate::prompt::PromptTemplates;
    use std::collections::HashMap;

    fn formatter(max_history: usize) -> HistoryFormatter {
        let mut llm_chat = HashMap::new();
        llm_chat.insert("default".to_string(), "{{ input }}".to_string());
        llm_chat.insert("py".to_string(), "Write python.\n{{ input }}".to_string());
        let mut templates = PromptTemplates::new();
        templates.insert("llm_chat".to_string(), llm_chat);

        HistoryFormatter::new(Arc::new(PromptStore::from_templates(templates)), max_history)
    }

    fn vars<'a>(input: &'a str) -> RenderVars<'a> {
        let mut vars = RenderVars::new();
        vars.insert("input", input);
        vars
    }

    #[test]
    fn test_history_order_and_roles_preserved() {
        let history = vec![
            HistoryEntry::new("user", "Let's play a word chain: dragon"),
            HistoryEntry::new("assistant", "nightingale"),
        ];

        let messages = formatter(10).format("llm_chat", "default", &history, &vars("elephant")).unwrap();

        assert_eq!(
            messages,
            vec![
                ChatMessage::user("Let's play a word chain: dragon"),
                ChatMessage::assistant("nightingale"),
                ChatMessage::user("elephant"),
            ]
        );
    }

    #[test]
    fn test_history_content_not_rendered() {
        let history = vec![HistoryEntry::new("user", "what does {{ input }} mean?")];
        let messages = formatter(10).format("llm_chat", "default", &history, &vars("x")).unwrap();
        assert_eq!(messages[0].content(), "what does {{ input }} mean?");
    }

    #[test]
    fn test_unknown_role_fails() {
        let history = vec![
            HistoryEntry::new("user", "hi"),
            HistoryEntry::new("tool", "{}"),
        ];
        let err = formatter(10).format("llm_chat", "default", &history, &vars("x")).unwrap_err();
        assert!(matches!(err, KnowledgeError::UnsupportedRole(role) if role == "tool"));
    }

    #[test]
    fn test_unknown_role_fails_even_when_truncated_away() {
        let history = vec![
            HistoryEntry::new("robot", "beep"),
            HistoryEntry::new("user", "hi"),
        ];
        assert!(formatter(1).format("llm_chat", "default", &history, &vars("x")).is_err());
    }

    #[test]
    fn test_only_last_messages_kept() {
        let history: Vec<_> = (0..5)
            .map(|i| HistoryEntry::new(if i % 2 == 0 { "user" } else { "assistant" }, format!("m{}", i)))
            .collect();

        let messages = formatter(2).format("llm_chat", "py", &history, &vars("sort a list")).unwrap();

        let contents: Vec<&str> = messages.iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["m3", "m4", "Write python.\nsort a list"]);
    }

    #[test]
    fn test_missing_template() {
        let err = formatter(10).format("llm_chat", "nope", &[], &vars("x")).unwrap_err();
        assert!(matches!(err, KnowledgeError::TemplateNotFound { .. }));
    }

    #[test]
    fn test_conversation_history_fifo() {
        let mut history = ConversationHistory::new(2);
        history.push(ChatMessage::user("a"));
        history.push(ChatMessage::assistant("b"));
        history.push(ChatMessage::user("c"));

        let contents: Vec<&str> = history.iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["b", "c"]);
        assert_eq!(history.max_len(), 2);
    }

    #[test]
    fn test_zero_length_history_keeps_nothing() {
        let mut history = ConversationHistory::new(0);
        history.push(ChatMessage::user("a"));
        assert!(history.is_empty());
    }
}
