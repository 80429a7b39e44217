//! The conversation thread and its request/reply cycle.
//!
//! A [`ConversationStore`] is either idle or waiting on exactly one reply.
//! Submitting hands back a [`PendingReply`] ticket; the caller runs the remote
//! call wherever it likes and gives the ticket back through
//! [`ConversationStore::complete_reply`], which appends exactly one assistant
//! message and returns the store to idle.

use crate::client::RemoteGenerationClient;
use crate::error::RemoteError;
use crate::state::{Message, MessageId, Sender};

pub const GREETING: &str = "Hello! I am your AI Assistant. How can I help you today?";
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// An outstanding reply request. Consumed when the reply is recorded.
#[derive(Debug)]
pub struct PendingReply {
    request_id: u64,
    prompt: String,
}

impl PendingReply {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn request_id(&self) -> u64 {
        self.request_id
    }
}

#[derive(Debug)]
pub struct ConversationStore {
    messages: Vec<Message>,
    pending_input: String,
    in_flight: Option<u64>,
    next_message_id: u64,
    next_request_id: u64,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        let mut store = Self {
            messages: Vec::new(),
            pending_input: String::new(),
            in_flight: None,
            next_message_id: 0,
            next_request_id: 0,
        };
        store.append(Sender::Assistant, GREETING);
        store
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn draft(&self) -> &str {
        &self.pending_input
    }

    pub fn is_waiting_for_reply(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True when a send would do something.
    pub fn can_submit(&self) -> bool {
        !self.is_waiting_for_reply() && !self.pending_input.trim().is_empty()
    }

    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    /// Append the user's message and open a reply request.
    ///
    /// Returns `None` without touching any state when `text` is blank or a
    /// reply is already in flight.
    pub fn submit_user_message(&mut self, text: &str) -> Option<PendingReply> {
        let trimmed = text.trim();
        if trimmed.is_empty() || self.is_waiting_for_reply() {
            return None;
        }

        self.append(Sender::User, trimmed);
        self.pending_input.clear();

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.in_flight = Some(request_id);

        tracing::debug!(request_id, "reply requested");

        Some(PendingReply {
            request_id,
            prompt: trimmed.to_string(),
        })
    }

    /// Submit whatever is in the draft.
    pub fn submit_draft(&mut self) -> Option<PendingReply> {
        let draft = self.pending_input.clone();
        self.submit_user_message(&draft)
    }

    /// Record the outcome of a reply request. Failures become the fallback
    /// message; the error itself only goes to the log.
    ///
    /// Returns false if `ticket` is not the request currently in flight.
    pub fn complete_reply(
        &mut self,
        ticket: PendingReply,
        result: Result<String, RemoteError>,
    ) -> bool {
        if self.in_flight != Some(ticket.request_id) {
            tracing::warn!(
                request_id = ticket.request_id,
                in_flight = ?self.in_flight,
                "ignoring reply for a request that is not in flight"
            );
            return false;
        }

        match result {
            Ok(reply) => {
                tracing::info!(
                    request_id = ticket.request_id,
                    reply_chars = reply.chars().count(),
                    "reply received"
                );
                self.append(Sender::Assistant, reply);
            }
            Err(err) => {
                tracing::error!(request_id = ticket.request_id, "reply request failed: {err}");
                self.append(Sender::Assistant, FALLBACK_REPLY);
            }
        }

        self.in_flight = None;
        true
    }

    /// Submit `text`, wait for the client and record the reply.
    ///
    /// Returns the assistant message, or `None` if the submission was a no-op.
    pub async fn submit_and_wait<C>(&mut self, client: &C, text: &str) -> Option<&Message>
    where
        C: RemoteGenerationClient + ?Sized,
    {
        let ticket = self.submit_user_message(text)?;
        let result = client.generate_reply(ticket.prompt()).await;
        self.complete_reply(ticket, result);
        self.last_message()
    }

    fn append(&mut self, sender: Sender, text: impl Into<String>) {
        let id = MessageId(self.next_message_id);
        self.next_message_id += 1;
        self.messages.push(Message::new(id, sender, text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeClient;
    use std::collections::HashSet;

    #[test]
    fn test_starts_with_greeting() {
        let store = ConversationStore::new();
        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.messages()[0].sender(), Sender::Assistant);
        assert_eq!(store.messages()[0].text(), GREETING);
        assert!(!store.is_waiting_for_reply());
    }

    #[test]
    fn test_submit_appends_user_message_and_waits() {
        let mut store = ConversationStore::new();
        store.update_draft("  Hello  ");

        let ticket = store.submit_draft().expect("submission accepted");

        assert_eq!(ticket.prompt(), "Hello");
        assert_eq!(store.messages().len(), 2);
        let last = store.last_message().unwrap();
        assert_eq!(last.sender(), Sender::User);
        assert_eq!(last.text(), "Hello");
        assert!(store.is_waiting_for_reply());
        assert_eq!(store.draft(), "");
    }

    #[test]
    fn test_success_appends_reply_and_returns_to_idle() {
        let mut store = ConversationStore::new();
        let ticket = store.submit_user_message("Hello").unwrap();

        assert!(store.complete_reply(ticket, Ok("Hi there!".to_string())));

        assert_eq!(store.messages().len(), 3);
        let last = store.last_message().unwrap();
        assert_eq!(last.sender(), Sender::Assistant);
        assert_eq!(last.text(), "Hi there!");
        assert!(!store.is_waiting_for_reply());
    }

    #[test]
    fn test_failure_appends_fallback() {
        let mut store = ConversationStore::new();
        let ticket = store.submit_user_message("Hello").unwrap();

        store.complete_reply(ticket, Err(RemoteError::Timeout));

        assert_eq!(store.messages().len(), 3);
        assert_eq!(store.last_message().unwrap().text(), FALLBACK_REPLY);
        assert_eq!(store.last_message().unwrap().sender(), Sender::Assistant);
        assert!(!store.is_waiting_for_reply());
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut store = ConversationStore::new();
        store.update_draft(" \n\t ");

        assert!(!store.can_submit());
        assert!(store.submit_draft().is_none());
        assert!(store.submit_user_message("").is_none());
        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.draft(), " \n\t ");
        assert!(!store.is_waiting_for_reply());
    }

    #[test]
    fn test_second_submit_while_waiting_is_ignored() {
        let mut store = ConversationStore::new();
        let _ticket = store.submit_user_message("first").unwrap();
        store.update_draft("second");

        assert!(store.submit_draft().is_none());
        assert_eq!(store.messages().len(), 2);
        assert_eq!(store.draft(), "second");
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut store = ConversationStore::new();
        let first = store.submit_user_message("first").unwrap();
        let stale = PendingReply {
            request_id: first.request_id() + 1,
            prompt: "ghost".to_string(),
        };

        assert!(!store.complete_reply(stale, Ok("nope".to_string())));
        assert!(store.is_waiting_for_reply());
        assert_eq!(store.messages().len(), 2);

        assert!(store.complete_reply(first, Ok("yes".to_string())));
        assert_eq!(store.messages().len(), 3);
    }

    #[test]
    fn test_message_ids_are_distinct_and_log_never_shrinks() {
        let mut store = ConversationStore::new();
        let mut previous_len = store.messages().len();

        let outcomes = [
            Ok("a".to_string()),
            Err(RemoteError::MissingApiKey),
            Ok("c".to_string()),
        ];
        for (i, outcome) in outcomes.into_iter().enumerate() {
            let ticket = store.submit_user_message(&format!("question {i}")).unwrap();
            assert!(store.messages().len() > previous_len);
            previous_len = store.messages().len();

            store.complete_reply(ticket, outcome);
            assert!(store.messages().len() > previous_len);
            previous_len = store.messages().len();
        }

        let ids: HashSet<_> = store.messages().iter().map(|m| m.id()).collect();
        assert_eq!(ids.len(), store.messages().len());
        assert_eq!(ids.len(), 7);
    }

    #[tokio::test]
    async fn test_submit_and_wait_issues_one_call_with_trimmed_text() {
        let client = FakeClient::replying(["Hi there!"]);
        let mut store = ConversationStore::new();

        let reply = store.submit_and_wait(&client, "  Hello ").await.unwrap();
        assert_eq!(reply.text(), "Hi there!");

        assert_eq!(client.prompts(), vec!["Hello".to_string()]);
        assert_eq!(store.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_submit_and_wait_blank_issues_no_call() {
        let client = FakeClient::replying(["unused"]);
        let mut store = ConversationStore::new();

        assert!(store.submit_and_wait(&client, "   ").await.is_none());
        assert!(client.prompts().is_empty());
        assert_eq!(store.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_and_wait_network_failure_yields_fallback() {
        let client = FakeClient::failing();
        let mut store = ConversationStore::new();

        let reply = store.submit_and_wait(&client, "Hello").await.unwrap();
        assert_eq!(reply.text(), FALLBACK_REPLY);
        assert_eq!(store.messages().len(), 3);
        assert!(!store.is_waiting_for_reply());
    }
}
