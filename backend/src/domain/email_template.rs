//! HTML templates for transactional email.
//!
//! Templates are compiled into the binary and use `{{key}}` placeholders.
//! Every substituted value is HTML-escaped.

use super::{EmailKind, EmailTemplateData};

const NEW_USER_HTML: &str = include_str!("../../templates/new_user.html");
const PASSWORD_RESET_HTML: &str = include_str!("../../templates/password_reset.html");

/// Subject and HTML body ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    /// Subject line.
    pub subject: &'static str,
    /// HTML body.
    pub html_body: String,
}

/// Subject line used for each kind of email.
#[must_use]
pub const fn subject_for(kind: EmailKind) -> &'static str {
    match kind {
        EmailKind::NewUser => "Welcome to WhenWorks",
        EmailKind::PasswordReset => "Your WhenWorks Password Was Reset",
    }
}

/// Render the template for `kind` with `data`.
///
/// # Examples
/// ```
/// use whenworks::domain::{EmailKind, EmailTemplateData, render_email};
///
/// let data = EmailTemplateData {
///     name: "Ada".into(),
///     username: "ada".into(),
///     password: "Abc123Xyz789".into(),
/// };
/// let email = render_email(EmailKind::NewUser, &data);
/// assert_eq!(email.subject, "Welcome to WhenWorks");
/// assert!(email.html_body.contains("Abc123Xyz789"));
/// ```
#[must_use]
pub fn render_email(kind: EmailKind, data: &EmailTemplateData) -> RenderedEmail {
    let template = match kind {
        EmailKind::NewUser => NEW_USER_HTML,
        EmailKind::PasswordReset => PASSWORD_RESET_HTML,
    };
    let vars = [
        ("name", data.name.as_str()),
        ("username", data.username.as_str()),
        ("password", data.password.as_str()),
    ];
    RenderedEmail {
        subject: subject_for(kind),
        html_body: render_placeholders(template, &vars),
    }
}

/// Replace `{{key}}` placeholders in a single pass so substituted values are
/// never re-scanned. Unknown keys are left as-is.
fn render_placeholders(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = after[..end].trim();
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(&escape_html(value)),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
