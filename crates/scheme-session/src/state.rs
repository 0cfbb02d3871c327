use std::time::{Duration, Instant};

use scheme_common::chat::ChatMessage;
use scheme_format::{build_accordion, escape_html};
use tracing::debug;

use crate::errors::user_message;
use crate::form::{Field, FormDraft, FormStep};
use crate::prompt::{scheme_prompt, CHAT_SYSTEM_PROMPT};

pub const SUBMIT_MAX_TOKENS: u32 = 2048;
pub const CHAT_MAX_TOKENS: u32 = 1024;

/// How long invalid fields stay highlighted after a blocked step change.
pub const VALIDATION_CUE: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Form(FormStep),
    /// Waiting for the submission reply; the form stays on `FormStep`.
    Submitting(FormStep),
    Results(Results),
}

impl Default for Screen {
    fn default() -> Self {
        Self::Form(FormStep::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Results {
    pub raw: String,
    pub html: String,
}

/// Fields highlighted after a failed step change. Purely visual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationCue {
    pub fields: Vec<Field>,
    pub raised_at: Instant,
}

impl ValidationCue {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) >= VALIDATION_CUE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    User { html: String },
    Assistant { html: String },
    /// Placeholder while a reply is pending.
    Typing,
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatState {
    /// What the model sees. Failed turns never add to it.
    pub history: Vec<ChatMessage>,
    /// What the user sees.
    pub transcript: Vec<TranscriptEntry>,
    pub awaiting: bool,
}

impl Default for ChatState {
    fn default() -> Self {
        Self {
            history: vec![ChatMessage::system(CHAT_SYSTEM_PROMPT)],
            transcript: Vec::new(),
            awaiting: false,
        }
    }
}

impl ChatState {
    fn clear_typing(&mut self) {
        self.transcript.retain(|e| *e != TranscriptEntry::Typing);
        self.awaiting = false;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub form: FormDraft,
    pub screen: Screen,
    pub cue: Option<ValidationCue>,
    pub error: Option<String>,
    pub chat: ChatState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetField { field: Field, value: String },
    ToggleCategory(String),
    ToggleSupportNeed(String),
    Next { now: Instant },
    Back,
    Submit { now: Instant },
    SubmissionSucceeded { content: String },
    SubmissionFailed { message: String },
    SendChat { text: String },
    ChatSucceeded { content: String },
    ChatFailed { message: String },
    Tick { now: Instant },
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Submission,
    Chat,
}

impl Purpose {
    pub fn succeeded(self, content: String) -> Action {
        match self {
            Self::Submission => Action::SubmissionSucceeded { content },
            Self::Chat => Action::ChatSucceeded { content },
        }
    }

    pub fn failed(self, message: String) -> Action {
        match self {
            Self::Submission => Action::SubmissionFailed { message },
            Self::Chat => Action::ChatFailed { message },
        }
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CallModel {
        purpose: Purpose,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
    },
}

/// Apply one action. Pure: the only outside effect is the returned command.
///
/// Replies are applied in the order they arrive; a late reply to an older
/// submission overwrites a newer one.
pub fn reduce(mut state: AppState, action: Action) -> (AppState, Option<Command>) {
    let mut command = None;
    match action {
        Action::SetField { field, value } => {
            state.form.set(field, value);
            state.clear_cue_for(field);
        }
        Action::ToggleCategory(category) => {
            state.form.toggle_category(category);
            state.clear_cue_for(Field::Category);
        }
        Action::ToggleSupportNeed(need) => state.form.toggle_support_need(need),
        Action::Next { now } => {
            if let Screen::Form(step) = state.screen {
                if state.check_step(step, now) {
                    if let Some(next) = step.next() {
                        debug!(from = step.number(), to = next.number(), "form step advanced");
                        state.screen = Screen::Form(next);
                    }
                }
            }
        }
        Action::Back => {
            if let Screen::Form(step) = state.screen {
                if let Some(previous) = step.previous() {
                    state.screen = Screen::Form(previous);
                    state.cue = None;
                }
            }
        }
        Action::Submit { now } => {
            if state.screen == Screen::Form(FormStep::Needs)
                && state.check_step(FormStep::Needs, now)
            {
                match state.form.to_profile() {
                    Ok(profile) => {
                        debug!(state = %profile.state, "submitting profile");
                        state.screen = Screen::Submitting(FormStep::Needs);
                        state.error = None;
                        command = Some(Command::CallModel {
                            purpose: Purpose::Submission,
                            messages: vec![ChatMessage::user(scheme_prompt(&profile))],
                            max_tokens: SUBMIT_MAX_TOKENS,
                        });
                    }
                    Err(fields) => {
                        state.cue = Some(ValidationCue {
                            fields,
                            raised_at: now,
                        });
                    }
                }
            }
        }
        Action::SubmissionSucceeded { content } => {
            debug!(bytes = content.len(), "submission reply received");
            state.error = None;
            state.screen = Screen::Results(Results {
                html: build_accordion(&content),
                raw: content,
            });
        }
        Action::SubmissionFailed { message } => {
            debug!(error = %message, "submission failed");
            let step = match state.screen {
                Screen::Submitting(step) | Screen::Form(step) => step,
                Screen::Results(_) => FormStep::Needs,
            };
            state.screen = Screen::Form(step);
            state.error = Some(user_message(&message));
        }
        Action::SendChat { text } => {
            let text = text.trim();
            if !text.is_empty() && !state.chat.awaiting {
                state.chat.history.push(ChatMessage::user(text));
                state.chat.transcript.push(TranscriptEntry::User {
                    html: format!("<p>{}</p>", escape_html(text).replace('\n', "<br>")),
                });
                state.chat.transcript.push(TranscriptEntry::Typing);
                state.chat.awaiting = true;
                command = Some(Command::CallModel {
                    purpose: Purpose::Chat,
                    messages: state.chat.history.clone(),
                    max_tokens: CHAT_MAX_TOKENS,
                });
            }
        }
        Action::ChatSucceeded { content } => {
            state.chat.clear_typing();
            state.chat.transcript.push(TranscriptEntry::Assistant {
                html: build_accordion(&content),
            });
            state.chat.history.push(ChatMessage::assistant(content));
        }
        Action::ChatFailed { message } => {
            debug!(error = %message, "chat turn failed");
            state.chat.clear_typing();
            state.chat.transcript.push(TranscriptEntry::Error {
                message: user_message(&message),
            });
        }
        Action::Tick { now } => {
            if state.cue.as_ref().is_some_and(|cue| cue.is_expired(now)) {
                state.cue = None;
            }
        }
        Action::Reset => {
            state.form = FormDraft::default();
            state.screen = Screen::default();
            state.cue = None;
            state.error = None;
        }
    }
    (state, command)
}

impl AppState {
    /// Validate `step`, raising a cue on failure.
    fn check_step(&mut self, step: FormStep, now: Instant) -> bool {
        match self.form.validate_step(step) {
            Ok(()) => {
                self.cue = None;
                true
            }
            Err(fields) => {
                debug!(step = step.number(), invalid = fields.len(), "form step blocked");
                self.cue = Some(ValidationCue {
                    fields,
                    raised_at: now,
                });
                false
            }
        }
    }

    fn clear_cue_for(&mut self, field: Field) {
        if let Some(cue) = &mut self.cue {
            cue.fields.retain(|&f| f != field);
            if cue.fields.is_empty() {
                self.cue = None;
            }
        }
    }

    pub fn is_highlighted(&self, field: Field) -> bool {
        self.cue.as_ref().is_some_and(|cue| cue.fields.contains(&field))
    }
}
