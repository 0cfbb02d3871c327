use scheme_format::escape_html;

use crate::form::FormStep;
use crate::state::{AppState, ChatState, Screen, TranscriptEntry};

pub fn render(state: &AppState) -> String {
    let mut out = String::from(r#"<main class="scheme-finder">"#);
    if let Some(error) = &state.error {
        out.push_str(&format!(
            r#"<div class="error-banner" role="alert">{}</div>"#,
            escape_html(error)
        ));
    }
    match &state.screen {
        Screen::Form(step) => out.push_str(&render_form(state, *step, false)),
        Screen::Submitting(step) => out.push_str(&render_form(state, *step, true)),
        Screen::Results(results) => out.push_str(&format!(
            concat!(
                r#"<section class="results">{}"#,
                r#"<button type="button" class="reset">Start over</button>"#,
                "</section>"
            ),
            results.html
        )),
    }
    out.push_str(&render_chat(&state.chat));
    out.push_str("</main>");
    out
}

fn attr(value: &str) -> String {
    escape_html(value).replace('"', "&quot;")
}

fn render_form(state: &AppState, step: FormStep, busy: bool) -> String {
    let mut out = format!(
        r#"<form class="profile-form" data-step="{}"{}>"#,
        step.number(),
        if busy { r#" aria-busy="true""# } else { "" }
    );
    out.push_str(&format!(
        r#"<div class="step-indicator">Step {} of {}</div>"#,
        step.number(),
        FormStep::COUNT
    ));

    for &field in step.fields() {
        let class = if state.is_highlighted(field) {
            "field field-invalid"
        } else {
            "field"
        };
        out.push_str(&format!(
            concat!(
                r#"<label class="{class}" for="{name}"><span>{label}</span>"#,
                r#"<input id="{name}" name="{name}" value="{value}"{required}></label>"#
            ),
            class = class,
            name = field.name(),
            label = field.label(),
            value = attr(&state.form.value(field)),
            required = if field.is_required() { " required" } else { "" },
        ));
    }

    if step.previous().is_some() {
        out.push_str(r#"<button type="button" class="back">Back</button>"#);
    }
    let primary = match (step.next(), busy) {
        (_, true) => r#"<button type="submit" class="submit" disabled>Finding schemes…</button>"#,
        (Some(_), false) => r#"<button type="button" class="next">Next</button>"#,
        (None, false) => r#"<button type="submit" class="submit">Find schemes</button>"#,
    };
    out.push_str(primary);
    out.push_str("</form>");
    out
}

fn render_chat(chat: &ChatState) -> String {
    let mut out = String::from(r#"<section class="chat"><div class="chat-messages">"#);
    for entry in &chat.transcript {
        let message = match entry {
            TranscriptEntry::User { html } => format!(r#"<div class="message user">{html}</div>"#),
            TranscriptEntry::Assistant { html } => {
                format!(r#"<div class="message assistant">{html}</div>"#)
            }
            TranscriptEntry::Typing => concat!(
                r#"<div class="message assistant typing" aria-label="Assistant is typing">"#,
                "<span></span><span></span><span></span></div>"
            )
            .to_string(),
            TranscriptEntry::Error { message } => format!(
                r#"<div class="message error">{}</div>"#,
                escape_html(message)
            ),
        };
        out.push_str(&message);
    }
    out.push_str("</div>");
    out.push_str(&format!(
        r#"<textarea class="chat-input" placeholder="Ask about a scheme"{}></textarea>"#,
        if chat.awaiting { " disabled" } else { "" }
    ));
    out.push_str("</section>");
    out
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::form::Field;
    use crate::state::{reduce, Action, Results};

    #[test]
    fn first_step_shows_personal_fields() {
        let html = render(&AppState::default());
        assert!(html.contains("Step 1 of 3"));
        assert!(html.contains(r#"name="state""#));
        assert!(html.contains(r#"name="gender""#));
        assert!(!html.contains(r#"name="income""#));
        assert!(!html.contains(r#"class="back""#));
        assert!(html.contains(r#"class="next""#));
    }

    #[test]
    fn values_are_escaped_in_attributes() {
        let (state, _) = reduce(
            AppState::default(),
            Action::SetField {
                field: Field::State,
                value: r#"Tamil "Nadu" <x>"#.to_string(),
            },
        );
        let html = render(&state);
        assert!(html.contains(r#"value="Tamil &quot;Nadu&quot; &lt;x&gt;""#));
    }

    #[test]
    fn invalid_fields_are_marked() {
        let (state, _) = reduce(AppState::default(), Action::Next { now: Instant::now() });
        let html = render(&state);
        assert_eq!(html.matches("field field-invalid").count(), 3);
    }

    #[test]
    fn submitting_disables_the_button() {
        let state = AppState {
            screen: Screen::Submitting(FormStep::Needs),
            ..AppState::default()
        };
        let html = render(&state);
        assert!(html.contains(r#"aria-busy="true""#));
        assert!(html.contains("disabled>Finding schemes"));
    }

    #[test]
    fn results_replace_the_form() {
        let state = AppState {
            screen: Screen::Results(Results {
                raw: String::new(),
                html: "<p>done</p>".to_string(),
            }),
            error: Some("old <error>".to_string()),
            ..AppState::default()
        };
        let html = render(&state);
        assert!(html.contains(r#"<section class="results"><p>done</p>"#));
        assert!(!html.contains("profile-form"));
        assert!(html.contains("old &lt;error&gt;"));
    }

    #[test]
    fn typing_placeholder_and_disabled_input_while_waiting() {
        let (state, _) = reduce(
            AppState::default(),
            Action::SendChat {
                text: "hello".to_string(),
            },
        );
        let html = render(&state);
        assert!(html.contains("typing"));
        assert!(html.contains(r#"placeholder="Ask about a scheme" disabled"#));
    }
}
