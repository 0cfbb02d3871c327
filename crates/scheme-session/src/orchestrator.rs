use tracing::warn;

use crate::client::ChatBackend;
use crate::state::{reduce, Action, AppState, Command};
use crate::view;

/// Drives [`reduce`] and performs the model calls it requests, one at a time.
pub struct Orchestrator<B> {
    state: AppState,
    backend: B,
}

impl<B: ChatBackend> Orchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            state: AppState::default(),
            backend,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Apply `action`, then any follow-up action produced by a model call,
    /// until the state settles.
    pub async fn dispatch(&mut self, action: Action) {
        let mut pending = Some(action);
        while let Some(action) = pending.take() {
            let (state, command) = reduce(std::mem::take(&mut self.state), action);
            self.state = state;
            if let Some(command) = command {
                pending = Some(self.run(command).await);
            }
        }
    }

    async fn run(&self, command: Command) -> Action {
        match command {
            Command::CallModel {
                purpose,
                messages,
                max_tokens,
            } => match self.backend.complete(&messages, max_tokens).await {
                Ok(content) => purpose.succeeded(content),
                Err(e) => {
                    warn!(?purpose, error = %e, "model call failed");
                    purpose.failed(e.to_string())
                }
            },
        }
    }

    pub fn render(&self) -> String {
        view::render(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Instant;

    use reqwest::StatusCode;
    use scheme_common::chat::ChatMessage;

    use super::*;
    use crate::client::ClientError;
    use crate::form::Field;
    use crate::state::{Screen, TranscriptEntry};

    struct Scripted {
        replies: Mutex<Vec<Result<String, ClientError>>>,
        calls: Mutex<Vec<(Vec<ChatMessage>, u32)>>,
    }

    impl Scripted {
        fn new(mut replies: Vec<Result<String, ClientError>>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl ChatBackend for Scripted {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            max_tokens: u32,
        ) -> Result<String, ClientError> {
            self.calls
                .lock()
                .unwrap()
                .push((messages.to_vec(), max_tokens));
            self.replies
                .lock()
                .unwrap()
                .pop()
                .expect("scripted reply available")
        }
    }

    #[tokio::test]
    async fn chat_round_trip_through_backend() {
        let backend = Scripted::new(vec![
            Ok("Namaste! How can I help?".to_string()),
            Err(ClientError::Api {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: "Rate limit reached".to_string(),
            }),
        ]);
        let mut app = Orchestrator::new(backend);

        app.dispatch(Action::SendChat {
            text: "hi".to_string(),
        })
        .await;
        app.dispatch(Action::SendChat {
            text: "again".to_string(),
        })
        .await;

        let chat = &app.state().chat;
        assert!(!chat.awaiting);
        // system, user, assistant, user: the failed turn added no reply
        assert_eq!(chat.history.len(), 4);
        assert!(matches!(
            chat.transcript.last(),
            Some(TranscriptEntry::Error { .. })
        ));

        let calls = app.backend().calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0.len(), 4);
    }

    #[tokio::test]
    async fn invalid_step_makes_no_call() {
        let mut app = Orchestrator::new(Scripted::new(Vec::new()));
        app.dispatch(Action::Next {
            now: Instant::now(),
        })
        .await;
        assert_eq!(app.state().screen, Screen::default());
        assert!(app.state().is_highlighted(Field::State));
        assert!(app.backend().calls.lock().unwrap().is_empty());
        assert!(app.render().contains("field-invalid"));
    }
}
