//! Server-rendered HTML for a `PageView`

use super::{escape_html, PageView};
use crate::session::Role;
use std::fmt::Write;

const STYLE: &str = r"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; min-height: 100vh; }
aside { width: 16rem; padding: 1.5rem; background: #f4f5f7; }
main { flex: 1; padding: 1.5rem 2rem; max-width: 48rem; }
.msg { padding: 0.75rem 1rem; border-radius: 0.5rem; margin: 0.75rem 0; }
.msg.user { background: #e8f0fe; }
.msg.assistant { background: #f6f6f6; }
.error { background: #fdecea; color: #611a15; padding: 0.75rem 1rem; border-radius: 0.5rem; white-space: pre-line; }
.hint { border-left: 3px solid #4a90d9; padding-left: 0.75rem; margin: 0.5rem 0; }
form.chat { display: flex; gap: 0.5rem; margin-top: 1rem; }
form.chat input[type=text] { flex: 1; padding: 0.5rem; }
";

/// Full HTML document for the page
pub fn render_document(page: &PageView) -> String {
    let title = page.title.unwrap_or(super::APP_NAME);
    let mut out = String::with_capacity(4096);
    let _ = write!(
        out,
        "<!doctype html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{}</title><style>{STYLE}</style></head><body>",
        escape_html(title)
    );

    let action = format!("/s/{}", escape_html(&page.session_id));

    if let Some(selector) = &page.mode_selector {
        let _ = write!(
            out,
            "<aside><h2>Mode</h2><form method=\"post\" action=\"{action}\">"
        );
        for option in &selector.options {
            let checked = if option.value == selector.selected {
                " checked"
            } else {
                ""
            };
            let _ = write!(
                out,
                "<label><input type=\"radio\" name=\"mode\" value=\"{}\"{checked}> {}</label><br>",
                option.value,
                escape_html(option.label)
            );
        }
        out.push_str("<button type=\"submit\">Switch</button></form></aside>");
    }

    out.push_str("<main>");
    if let Some(title) = page.title {
        let _ = write!(out, "<h1>{}</h1>", escape_html(title));
    }

    if let Some(greeting) = &page.greeting {
        let _ = write!(
            out,
            "<div class=\"msg assistant\"><p>{}</p>",
            escape_html(greeting.text)
        );
        for hint in &greeting.hints {
            let _ = write!(
                out,
                "<div class=\"hint\"><strong>{}</strong>: {}<br><em>Example: {}</em></div>",
                escape_html(hint.label),
                escape_html(hint.description),
                escape_html(hint.example)
            );
        }
        out.push_str("</div>");
    }

    for message in &page.messages {
        let class = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        let _ = write!(out, "<div class=\"msg {class}\">{}</div>", message.html);
    }

    if let Some(error) = &page.error {
        let _ = write!(
            out,
            "<div class=\"error\" role=\"alert\">{} {}</div>",
            error.icon,
            escape_html(&error.message)
        );
    }

    if page.accepts_input {
        let mode = page
            .mode_selector
            .as_ref()
            .map(|s| s.selected.as_str())
            .unwrap_or_default();
        let _ = write!(
            out,
            "<form class=\"chat\" method=\"post\" action=\"{action}\">\
             <input type=\"hidden\" name=\"mode\" value=\"{mode}\">\
             <input type=\"text\" name=\"message\" placeholder=\"{}\" autofocus>\
             <button type=\"submit\">Send</button></form>",
            escape_html(page.input_placeholder)
        );
    }

    out.push_str("</main></body></html>");
    out
}
