//! Markdown trip report for one session.
//!
//! The report leads with the most recent search that returned places: its
//! location and category, the recommendation text and a table of the top
//! places. The rest of the conversation follows, de-duplicated, limited to
//! the latest messages and with long messages shortened.

use chrono::{DateTime, Utc};

use buddy_core::{PlaceResult, Role, SessionId, Turn};

/// Places listed in the report table.
pub const MAX_REPORT_PLACES: usize = 10;
/// Follow-up messages kept in the conversation section.
pub const MAX_REPORT_MESSAGES: usize = 15;
const USER_MESSAGE_LIMIT: usize = 500;
const ASSISTANT_MESSAGE_LIMIT: usize = 800;

/// Render a session as a Markdown report.
pub fn render_report(session_id: &SessionId, turns: &[Turn], generated_at: DateTime<Utc>) -> String {
    let mut markdown = String::new();

    markdown.push_str("# Travel Buddy Recommendations\n\n");
    markdown.push_str(&format!(
        "**Generated on:** {}\n",
        generated_at.format("%B %d, %Y at %H:%M UTC")
    ));
    markdown.push_str(&format!("**Session:** {}\n\n", session_id));

    let search = latest_search(turns);

    match search.map(|i| &turns[i]) {
        Some(turn) => {
            if let Some(query) = &turn.query {
                markdown.push_str(&format!("**Location:** {}\n", query.location));
                markdown.push_str(&format!(
                    "**Search Type:** {}\n\n",
                    query.category.display_name()
                ));
            }

            markdown.push_str("## Recommendations\n\n");
            markdown.push_str(turn.content.trim());
            markdown.push_str("\n\n");

            let places = turn.places.as_deref().unwrap_or_default();
            markdown.push_str(&format!(
                "## Places ({})\n\n",
                places.len().min(MAX_REPORT_PLACES)
            ));
            markdown.push_str("| # | Name | Rating | Price Level | Address |\n");
            markdown.push_str("|---|------|--------|-------------|---------|\n");
            for (i, place) in places.iter().take(MAX_REPORT_PLACES).enumerate() {
                markdown.push_str(&place_row(i + 1, place));
            }
            markdown.push('\n');
        }
        None => markdown.push_str("_No place search has been run in this session yet._\n\n"),
    }

    markdown.push_str("## Conversation\n\n");
    let follow_up = follow_up_messages(turns, search);
    if follow_up.is_empty() {
        markdown.push_str("_No follow-up conversation yet._\n\n");
    }
    for turn in follow_up {
        let (speaker, limit) = match turn.role {
            Role::User => ("You", USER_MESSAGE_LIMIT),
            Role::Assistant => ("Travel Buddy", ASSISTANT_MESSAGE_LIMIT),
        };
        markdown.push_str(&format!(
            "**{}** ({}):\n\n{}\n\n",
            speaker,
            turn.timestamp.format("%H:%M"),
            shorten(turn.content.trim(), limit)
        ));
    }

    markdown.push_str("---\n\n");
    markdown.push_str(
        "_Generated by Travel Buddy. Ratings, prices and opening hours change; \
         confirm with each place before you go._\n",
    );
    markdown
}

/// Index of the latest assistant turn that listed places.
fn latest_search(turns: &[Turn]) -> Option<usize> {
    turns
        .iter()
        .rposition(|t| t.role == Role::Assistant && t.places.is_some())
}

/// Every turn except the reported search exchange, with consecutive
/// repeats dropped, keeping the latest [`MAX_REPORT_MESSAGES`].
fn follow_up_messages(turns: &[Turn], search: Option<usize>) -> Vec<&Turn> {
    let mut skip = Vec::new();
    if let Some(i) = search {
        skip.push(i);
        if i > 0 && turns[i - 1].role == Role::User {
            skip.push(i - 1);
        }
    }

    let mut kept: Vec<&Turn> = Vec::new();
    for (i, turn) in turns.iter().enumerate() {
        if skip.contains(&i) {
            continue;
        }
        let repeat = kept
            .last()
            .is_some_and(|prev| prev.role == turn.role && prev.content.trim() == turn.content.trim());
        if !repeat {
            kept.push(turn);
        }
    }

    let start = kept.len().saturating_sub(MAX_REPORT_MESSAGES);
    kept.split_off(start)
}

fn place_row(rank: usize, place: &PlaceResult) -> String {
    let rating = match (place.rating, place.user_ratings_total) {
        (Some(r), Some(n)) => format!("{:.1} ({} reviews)", r, n),
        (Some(r), None) => format!("{:.1}", r),
        (None, _) => "N/A".to_string(),
    };
    format!(
        "| {} | {} | {} | {} | {} |\n",
        rank,
        cell(&place.name),
        rating,
        place.price_symbol().unwrap_or_else(|| "N/A".to_string()),
        cell(&place.address)
    )
}

/// Keep table cells on one line and away from the column separator.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn shorten(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}
