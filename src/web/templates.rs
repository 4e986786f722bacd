//! Pages rendered inside the sign-in popup.

use std::time::Duration;

use maud::{html, Markup, PreEscaped, DOCTYPE};
use serde_json::json;

use crate::auth::UserProfile;

/// Message type the opener listens for.
pub const LOGIN_SUCCESS_EVENT: &str = "GOOGLE_LOGIN_SUCCESS";

/// Text shown when the callback cannot complete.
pub const LOGIN_FAILURE_MESSAGE: &str = "Error. Close and try again.";

fn popup_layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - UGC Blog" }
            }
            body {
                (content)
            }
        }
    }
}

/// Serialize a value for embedding inside an inline `<script>`.
///
/// `<` only occurs inside JSON strings, where `\u003c` decodes to the same
/// character, so no payload can close the script element.
fn script_json(value: &serde_json::Value) -> String {
    value.to_string().replace('<', "\\u003c")
}

/// Render the page that posts the profile to the opener and closes itself.
///
/// The message is only delivered to `client_origin`. `nonce` is the value the
/// opener supplied when it opened the popup, echoed back so it can match the
/// message to its own attempt.
#[must_use]
pub fn render_login_success(
    profile: &UserProfile,
    nonce: Option<&str>,
    client_origin: &str,
    close_delay: Duration,
) -> Markup {
    let message = json!({
        "type": LOGIN_SUCCESS_EVENT,
        "user": profile,
        "nonce": nonce,
    });
    let script = format!(
        "(function () {{\n  var message = {message};\n  if (window.opener) {{\n    window.opener.postMessage(message, {origin});\n  }}\n  setTimeout(function () {{ window.close(); }}, {delay});\n}})();",
        message = script_json(&message),
        origin = script_json(&json!(client_origin)),
        delay = close_delay.as_millis(),
    );

    popup_layout(
        "Signed in",
        html! {
            h2 { "Success! Closing..." }
            script { (PreEscaped(script)) }
        },
    )
}

/// Render the generic failure page.
#[must_use]
pub fn render_login_failure() -> Markup {
    popup_layout(
        "Sign-in failed",
        html! {
            p { (LOGIN_FAILURE_MESSAGE) }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> UserProfile {
        UserProfile {
            display_name: name.to_string(),
            photo_url: "https://img.example.com/a.png".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[test]
    fn test_success_page_contains_payload() {
        let page = render_login_success(
            &profile("Ada"),
            Some("n-1"),
            "http://localhost:3000",
            Duration::from_millis(1000),
        )
        .into_string();

        assert!(page.contains(r#""type":"GOOGLE_LOGIN_SUCCESS""#));
        assert!(page.contains(r#""displayName":"Ada""#));
        assert!(page.contains(r#""photoURL":"https://img.example.com/a.png""#));
        assert!(page.contains(r#""email":"ada@example.com""#));
        assert!(page.contains(r#""nonce":"n-1""#));
        assert!(page.contains(r#"postMessage(message, "http://localhost:3000")"#));
        assert!(page.contains("}, 1000);"));
        assert!(page.contains("Success! Closing..."));
    }

    #[test]
    fn test_success_page_escapes_script_breakout() {
        let page = render_login_success(
            &profile(r#"</script><script>alert("x")</script>"#),
            None,
            "http://localhost:3000",
            Duration::from_millis(500),
        )
        .into_string();

        // Only the page's own script element is closed.
        assert_eq!(page.matches("</script>").count(), 1);
        assert!(page.contains(r"\u003c/script>"));
        assert!(page.contains(r#""nonce":null"#));
    }

    #[test]
    fn test_failure_page() {
        let page = render_login_failure().into_string();
        assert!(page.contains("Error. Close and try again."));
        assert!(!page.contains("<script>"));
    }
}
