//! Reminder alert formatting.
//!
//! Two renderings of the same alert: MarkdownV2 (sent first) and plain text
//! (the fallback when Telegram rejects the entity parse).

use chrono::{DateTime, Utc};

use remindd_core::{Category, Reminder};

/// Emoji marker per reminder category.
pub fn category_emoji(category: Category) -> &'static str {
    match category {
        Category::Task => "✅",
        Category::Event => "📅",
        Category::Meeting => "👥",
        Category::Appointment => "🏥",
        Category::Birthday => "🎂",
        Category::Deadline => "⚠️",
    }
}

/// Escape special characters for Telegram MarkdownV2.
///
/// MarkdownV2 requires escaping: `_ * [ ] ( ) ~ ` # + - = | { } . !`
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '#' | '+' | '-' | '=' | '|' | '{'
            | '}' | '.' | '!' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

fn due_stamp(due_at: DateTime<Utc>) -> String {
    due_at.format("%Y-%m-%d %H:%M").to_string()
}

fn title_case(category: Category) -> String {
    let s = category.to_string();
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => s,
    }
}

/// MarkdownV2 alert. User-supplied text is escaped; the markup itself is not.
pub fn render_markdown(reminder: &Reminder, now: DateTime<Utc>) -> String {
    let overdue = now > reminder.due_at;
    let urgency = if overdue { "🚨" } else { "🔔" };
    let stamp = escape_markdown_v2(&due_stamp(reminder.due_at));
    let status = if overdue {
        format!("⏰ *OVERDUE* \\(was due {stamp}\\)")
    } else {
        format!("⏰ *DUE NOW* \\({stamp}\\)")
    };
    let description = reminder
        .description
        .as_deref()
        .unwrap_or("No description provided");

    format!(
        "{urgency} *REMINDER ALERT* {urgency}\n\
         \n\
         {emoji} *{title}*\n\
         \n\
         📝 *Description:*\n\
         {description}\n\
         \n\
         {status}\n\
         \n\
         🏷️ *Type:* {category}\n\
         \n\
         ━━━━━━━━━━━━━━━━━━━━━━━━━",
        emoji = category_emoji(reminder.category),
        title = escape_markdown_v2(&reminder.title),
        description = escape_markdown_v2(description),
        category = escape_markdown_v2(&title_case(reminder.category)),
    )
}

/// Plain-text fallback: same content, no markup, nothing escaped.
pub fn render_plain(reminder: &Reminder, now: DateTime<Utc>) -> String {
    let overdue = now > reminder.due_at;
    let urgency = if overdue { "🚨" } else { "🔔" };
    let stamp = due_stamp(reminder.due_at);
    let status = if overdue {
        format!("⏰ OVERDUE (was due {stamp})")
    } else {
        format!("⏰ DUE NOW ({stamp})")
    };
    let description = reminder
        .description
        .as_deref()
        .unwrap_or("No description provided");

    format!(
        "{urgency} REMINDER ALERT {urgency}\n\
         \n\
         {emoji} {title}\n\
         \n\
         📝 Description:\n\
         {description}\n\
         \n\
         {status}\n\
         \n\
         🏷️ Type: {category}\n\
         \n\
         ━━━━━━━━━━━━━━━━━━━━━━━━━",
        emoji = category_emoji(reminder.category),
        title = reminder.title,
        category = title_case(reminder.category),
    )
}
