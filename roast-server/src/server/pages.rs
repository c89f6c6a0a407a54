use crate::common::RoastResult;

const STYLE: &str = r#"
        body {
            margin: 0;
            padding: 0;
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
            background: linear-gradient(135deg, #1DB954 0%, #121212 100%);
            display: flex;
            justify-content: center;
            align-items: center;
            min-height: 100vh;
        }
        .container {
            background: white;
            border-radius: 12px;
            padding: 48px;
            box-shadow: 0 8px 32px rgba(0, 0, 0, 0.1);
            text-align: center;
            max-width: 560px;
        }
        h1 {
            color: #1F2937;
            margin: 0 0 12px 0;
            font-size: 28px;
            font-weight: 600;
        }
        p {
            color: #4B5563;
            margin: 0 0 16px 0;
            line-height: 1.6;
        }
        .button {
            display: inline-block;
            background: #1DB954;
            color: white;
            border-radius: 999px;
            padding: 12px 28px;
            text-decoration: none;
            font-weight: 600;
        }
        .error {
            background: #FEE2E2;
            border-radius: 8px;
            padding: 12px;
            color: #991B1B;
            margin-bottom: 24px;
        }
        .artist-image {
            width: 160px;
            height: 160px;
            border-radius: 50%;
            object-fit: cover;
            margin-bottom: 24px;
        }
        .artists {
            list-style: none;
            padding: 0;
            color: #6B7280;
        }
        .roast {
            text-align: left;
        }
        .footer {
            color: #9CA3AF;
            font-size: 14px;
            margin-top: 24px;
        }
"#;

const LANDING_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Spotify Roast</title>
    <style>{STYLE}</style>
</head>
<body>
    <div class="container">
        {ERROR}
        <h1>Get your music taste roasted</h1>
        <p>Connect your Spotify account and we'll tell you what your top artists say about you. It won't be nice.</p>
        <a class="button" href="/login">Roast me</a>
    </div>
</body>
</html>"#;

const ROAST_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Your Spotify Roast</title>
    <style>{STYLE}</style>
</head>
<body>
    <div class="container">
        {IMAGE}
        <h1>Your roast</h1>
        <ul class="artists">{ARTISTS}</ul>
        <div class="roast">{ROAST}</div>
        <a class="button" href="/logout">Log out</a>
        <div class="footer">Powered by Spotify and Gemini</div>
    </div>
</body>
</html>"#;

/// Landing page, with an error banner when a previous attempt failed.
pub fn landing_page(error: Option<&str>) -> String {
    let banner = error
        .filter(|e| !e.is_empty())
        .map(|e| format!(r#"<div class="error">{}</div>"#, escape(e)))
        .unwrap_or_default();

    LANDING_HTML_TEMPLATE
        .replace("{STYLE}", STYLE)
        .replace("{ERROR}", &banner)
}

pub fn roast_page(result: &RoastResult) -> String {
    let image = result
        .image
        .as_deref()
        .map(|url| {
            format!(
                r#"<img class="artist-image" src="{}" alt="Top artist">"#,
                escape(url)
            )
        })
        .unwrap_or_default();

    let artists: String = result
        .artists
        .iter()
        .map(|artist| format!("<li>{}</li>", escape(artist)))
        .collect();

    let roast: String = result
        .text
        .split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(|paragraph| format!("<p>{}</p>", escape(paragraph).replace('\n', "<br>")))
        .collect();

    // Substituted content is escaped, so no placeholder can reappear in it.
    ROAST_HTML_TEMPLATE
        .replace("{STYLE}", STYLE)
        .replace("{IMAGE}", &image)
        .replace("{ARTISTS}", &artists)
        .replace("{ROAST}", &roast)
}

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '{' => escaped.push_str("&#123;"),
            '}' => escaped.push_str("&#125;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
