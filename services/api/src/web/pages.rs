//! services/api/src/web/pages.rs
//!
//! Server-rendered HTML pages. Dynamic values are escaped before they are
//! interpolated; the only raw markup on any page is the explanation fragment
//! produced by the explainer itself.

use axum::http::StatusCode;
use axum::response::Html;
use mood_journal_core::domain::{AnalysisOutcome, ExplanationResult, TrackItem, UserProfile};

/// Minimal HTML escaping for user- and provider-supplied strings.
pub(crate) fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn page_shell(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            background-color: #fafafa;
            color: #222;
            line-height: 1.6;
            max-width: 760px;
            margin: 0 auto;
            padding: 24px;
        }}
        h1 {{
            font-size: 28px;
            margin-bottom: 12px;
        }}
        textarea {{
            width: 100%;
            min-height: 140px;
            font-size: 15px;
            padding: 8px;
        }}
        .submit-button {{
            display: inline-block;
            margin-top: 12px;
            padding: 10px 18px;
            font-size: 15px;
        }}
        .explanation {{
            background-color: #fff;
            border: 1px solid #ddd;
            border-radius: 6px;
            padding: 14px;
            margin: 14px 0;
        }}
        .tracks li {{
            margin-bottom: 6px;
        }}
        .muted {{
            color: #777;
            font-size: 13px;
        }}
    </style>
</head>
<body>
{body}
</body>
</html>
"#
    )
}

/// GET / - the welcome screen shown before authentication.
pub fn welcome_page() -> String {
    page_shell(
        "Welcome to The Journaling Application",
        r#"<h1>Welcome to The Journaling Application</h1>
<h2>Why do I need to login?</h2>
<p>To recommend music that fits how you feel, the application analyzes your
journal entry and looks up matching playlists on Spotify. That lookup needs
you to log in to your Spotify account.</p>
<h2>What happens to my data?</h2>
<p>Your journal entry is analyzed and then discarded; nothing is stored. The
authentication key used to reach Spotify is a session key that is cleared
after each analysis and expires with your browser session. No private account
details are read.</p>
<p>If you're not comfortable, feel free to close the application.</p>
<p><a class="submit-button" href="/login">Verify with Spotify</a></p>"#,
    )
}

/// GET /analysis - the journal entry form.
pub fn analysis_form_page() -> String {
    page_shell(
        "Journal Analysis",
        r#"<h1>How are you feeling today?</h1>
<form method="post" action="/analysis">
    <textarea name="input_value" placeholder="Write your journal entry here..."></textarea>
    <button class="submit-button" type="submit">Analyze</button>
</form>"#,
    )
}

fn render_track(track: &TrackItem) -> String {
    let title = escape_html(&track.name);
    let artists = escape_html(&track.artists.join(", "));
    let label = if artists.is_empty() {
        title
    } else {
        format!("{} - {}", title, artists)
    };
    match &track.url {
        Some(url) => format!(
            "<li><a href=\"{}\">{}</a></li>",
            escape_html(url),
            label
        ),
        None => format!("<li>{}</li>", label),
    }
}

/// POST /analysis - the rendered analysis results.
pub fn results_page(outcome: &AnalysisOutcome) -> String {
    let mut body = String::from("<h1>Your Analysis</h1>\n");

    if outcome.top_emotion.is_empty() {
        body.push_str("<p>Please enter some text in the journal.</p>\n");
    } else {
        body.push_str(&format!(
            "<p>Top emotion: <strong>{}</strong></p>\n",
            escape_html(&outcome.top_emotion)
        ));

        match &outcome.explanation {
            ExplanationResult::Html(markup) => body.push_str(markup),
            ExplanationResult::Text(message) => body.push_str(&format!(
                "<div class=\"explanation\"><p>{}</p></div>\n",
                escape_html(message)
            )),
            ExplanationResult::None => {}
        }

        if outcome.tracks.is_empty() {
            body.push_str("<p>No recommendation available right now.</p>\n");
        } else {
            body.push_str("<h2>Recommended for you</h2>\n<ul class=\"tracks\">\n");
            for track in &outcome.tracks {
                body.push_str(&render_track(track));
                body.push('\n');
            }
            body.push_str("</ul>\n");
        }

        if !outcome.explanation_kind.is_empty() {
            body.push_str(&format!(
                "<p class=\"muted\">Explanation type: {}</p>\n",
                escape_html(&outcome.explanation_kind)
            ));
        }
    }

    body.push_str("<p><a href=\"/analysis\">Analyze another entry</a></p>");
    page_shell("Analysis Results", &body)
}

/// GET /home - the authenticated user's public profile.
pub fn home_page(profile: &UserProfile) -> String {
    let name = profile
        .display_name
        .as_deref()
        .unwrap_or(profile.id.as_str());
    page_shell(
        "Home",
        &format!(
            r#"<h1>Hello, {}!</h1>
<p>You are connected to Spotify.</p>
<p><a class="submit-button" href="/analysis">Go to analysis</a></p>"#,
            escape_html(name)
        ),
    )
}

pub fn not_found_page() -> String {
    page_shell(
        "Page Not Found",
        r#"<h1>404 - Page Not Found</h1>
<p>The page you're looking for doesn't exist. <a href="/">Back to start</a></p>"#,
    )
}

pub fn server_error_page() -> String {
    page_shell(
        "Something Went Wrong",
        r#"<h1>500 - Something Went Wrong</h1>
<p>We couldn't analyze your entry right now. Please try again later.
<a href="/">Back to start</a></p>"#,
    )
}

//=========================================================================================
// Handlers for the purely static routes
//=========================================================================================

/// GET /
pub async fn welcome_handler() -> Html<String> {
    Html(welcome_page())
}

/// Fallback for unknown routes.
pub async fn not_found_handler() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html(not_found_page()))
}
