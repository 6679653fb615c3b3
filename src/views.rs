//! Server-side HTML pages.
//!
//! Three pieces: a shared [`layout`], the [`index_page`] listing every scraped
//! article, and the [`saved_page`] listing saved articles with their notes.
//! Browsers can only submit `GET` and `POST`, so the forms that need `PUT` or
//! `DELETE` post to `?_method=...` and rely on the route layer's override.
//!
//! Every interpolated value goes through [`escape_html`].

use crate::models::{Article, SavedArticle};

const STYLESHEET: &str = "/style.css";

/// Escape text for use in HTML element content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap page content in the common document shell and navigation bar.
pub fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="{STYLESHEET}">
</head>
<body>
<nav>
<a href="/">Home</a>
<a href="/saved">Saved Articles</a>
<a href="/scrape">Scrape New Articles</a>
</nav>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>
"#,
        title = escape_html(title),
    )
}

/// Every scraped article, each with a button to save it.
pub fn index_page(articles: &[Article]) -> String {
    if articles.is_empty() {
        return layout(
            "News Scraper",
            r#"<p class="empty">No articles yet. <a href="/scrape">Scrape some.</a></p>"#,
        );
    }

    let items: String = articles
        .iter()
        .map(|article| {
            let action = if article.saved {
                r#"<span class="badge">Saved</span>"#.to_string()
            } else {
                format!(
                    r#"<form action="/saved/{id}?_method=PUT" method="POST"><button type="submit">Save Article</button></form>"#,
                    id = article.id,
                )
            };
            format!(
                "<li class=\"article\">\n<a href=\"{link}\" target=\"_blank\" rel=\"noopener\">{title}</a>\n{action}\n</li>\n",
                link = escape_html(&article.link),
                title = escape_html(&article.title),
            )
        })
        .collect();

    layout("News Scraper", &format!("<ul class=\"articles\">\n{items}</ul>"))
}

/// Saved articles with their notes, a note form, and an unsave button.
pub fn saved_page(saved: &[SavedArticle]) -> String {
    if saved.is_empty() {
        return layout(
            "Saved Articles",
            r#"<p class="empty">Nothing saved yet.</p>"#,
        );
    }

    let items: String = saved.iter().map(saved_article).collect();
    layout(
        "Saved Articles",
        &format!("<ul class=\"articles\">\n{items}</ul>"),
    )
}

fn saved_article(entry: &SavedArticle) -> String {
    let article = &entry.article;

    let notes = if entry.notes.is_empty() {
        r#"<p class="empty">No notes for this article yet.</p>"#.to_string()
    } else {
        let rows: String = entry
            .notes
            .iter()
            .map(|note| {
                format!(
                    r#"<li class="note">{body}<form action="/saved/delete/{id}?_method=DELETE" method="POST"><button type="submit">Delete Note</button></form></li>
"#,
                    body = escape_html(&note.body),
                    id = note.id,
                )
            })
            .collect();
        format!("<ul class=\"notes\">\n{rows}</ul>")
    };

    format!(
        r#"<li class="article">
<a href="{link}" target="_blank" rel="noopener">{title}</a>
{notes}
<form action="/saved/notes/{id}" method="POST">
<textarea name="body" placeholder="New note"></textarea>
<button type="submit">Save Note</button>
</form>
<form action="/delete/{id}?_method=PUT" method="POST"><button type="submit">Delete From Saved</button></form>
</li>
"#,
        link = escape_html(&article.link),
        title = escape_html(&article.title),
        id = article.id,
    )
}
