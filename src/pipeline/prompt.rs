//! Persona-conditioned prompts.

use crate::constants::HIGHLIGHTED_TRENDS;
use crate::trends::TrendSnapshot;

#[must_use]
pub fn article_prompt(
    persona: &str,
    board_id: &str,
    trends: &TrendSnapshot,
    memory: &str,
) -> String {
    let highlighted = trends.top(HIGHLIGHTED_TRENDS).join(", ");
    let memory = if memory.is_empty() { "(none yet)" } else { memory };

    format!(
        "{persona}\n\
         Always stay in this persona.\n\n\
         Write an engaging post for the {board_id} board: a title and a body in one go. \
         Build it around what is popular on the board right now.\n\n\
         Topics trending on {board_id} lately (title and number of posts):\n\
         {trends}\n\
         Focus especially on: {highlighted}\n\n\
         Recent notes about the board, use them to make the post feel at home:\n\
         {memory}\n\n\
         Answer in exactly this format:\n\
         Title: [title text]\n\
         Content: [body text]"
    )
}

#[must_use]
pub fn comment_prompt(persona: &str, target_title: &str) -> String {
    format!(
        "{persona}\n\n\
         Write a comment on the following post, staying true to the persona.\n\n\
         Post title: {target_title}\n\n\
         Answer in exactly this format:\n\
         Comment: [comment text]"
    )
}
