//! DialogueClient trait definition

use async_trait::async_trait;

use super::{DialogueError, DialogueReply, DialogueRequest};

/// Stateless dialogue client - each call is independent
///
/// The service keeps no conversation state between calls; the orchestrator
/// resends the full transcript every time and the service alone decides when
/// the exchange should end.
#[async_trait]
pub trait DialogueClient: Send + Sync {
    /// Request the next prompt for the given transcript
    async fn next_prompt(&self, request: DialogueRequest) -> Result<DialogueReply, DialogueError>;
}

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tracing::debug;

    use super::*;

    /// Scripted dialogue client for unit tests
    pub struct MockDialogueClient {
        replies: Vec<DialogueReply>,
        call_count: AtomicUsize,
    }

    impl MockDialogueClient {
        pub fn new(replies: Vec<DialogueReply>) -> Self {
            Self {
                replies,
                call_count: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DialogueClient for MockDialogueClient {
        async fn next_prompt(&self, request: DialogueRequest) -> Result<DialogueReply, DialogueError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            debug!(%idx, message_count = request.messages.len(), "MockDialogueClient::next_prompt");
            self.replies
                .get(idx)
                .cloned()
                .ok_or_else(|| DialogueError::InvalidReply("no more scripted replies".to_string()))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::dialogue::SessionStage;

        fn request() -> DialogueRequest {
            DialogueRequest {
                messages: vec![],
                session_state: SessionStage::Beginning,
            }
        }

        #[tokio::test]
        async fn mock_returns_scripted_replies_in_order() {
            let client = MockDialogueClient::new(vec![
                DialogueReply {
                    question: "How are you feeling?".to_string(),
                    should_end: false,
                    reasoning: String::new(),
                },
                DialogueReply {
                    question: String::new(),
                    should_end: true,
                    reasoning: "settled".to_string(),
                },
            ]);

            let first = client.next_prompt(request()).await.unwrap();
            assert_eq!(first.question, "How are you feeling?");

            let second = client.next_prompt(request()).await.unwrap();
            assert!(second.should_end);

            assert_eq!(client.call_count(), 2);
        }

        #[tokio::test]
        async fn mock_errors_when_exhausted() {
            let client = MockDialogueClient::new(vec![]);
            assert!(client.next_prompt(request()).await.is_err());
        }
    }
}
