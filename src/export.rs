//! HTML rendering of the comment sidebar.
//!
//! User supplied strings (author names, comment text) are escaped with
//! [`render_text`] exactly once, here.

use std::fmt::Write as _;

use crate::controller::{EMPTY_MESSAGE, SidebarContent, SidebarRow};
use crate::text::render_text;

/// Sidebar markup: one `div.comment` per row, or a placeholder paragraph.
pub fn sidebar_html(content: &SidebarContent) -> String {
    match content {
        SidebarContent::Loading => String::new(),
        SidebarContent::Error(message) => {
            format!("<p class='danger'>{}</p>", render_text(message))
        }
        SidebarContent::Empty => format!("<p class='muted'>{EMPTY_MESSAGE}</p>"),
        SidebarContent::Rows(rows) => rows.iter().map(row_html).collect(),
    }
}

fn row_html(row: &SidebarRow) -> String {
    let class = if row.resolved {
        "comment resolved"
    } else {
        "comment"
    };
    format!(
        "<div class='{class}' id='{}'><span class='comment-number'>({})</span> \
         <span class='comment-author'>{}:</span> {}</div>",
        render_text(&row.id),
        row.number,
        render_text(&row.author_name),
        render_text(&row.text),
    )
}

/// A standalone page listing the comments of one document.
pub fn document_html(title: &str, content: &SidebarContent) -> String {
    let mut out = String::new();
    let title = render_text(title);
    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html><head><meta charset='utf-8'>");
    let _ = writeln!(out, "<title>{title} - comments</title></head>");
    let _ = writeln!(out, "<body><h1>{title}</h1>");
    let _ = writeln!(out, "<div class='comments-list'>{}</div>", sidebar_html(content));
    let _ = writeln!(out, "</body></html>");
    out
}

/// Sanitize a filename for cross-platform compatibility
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // Leading/trailing spaces and dots are problematic on Windows
    let trimmed = replaced.trim_matches(|c| c == ' ' || c == '.');
    let limited: String = trimmed.chars().take(200).collect();

    if limited.is_empty() {
        "untitled".to_string()
    } else {
        limited
    }
}
