//! Character-budget truncation shared by node labelling and embedding input.
//!
//! Budgets are counted in characters, not bytes, so multi-byte text never
//! gets cut mid-scalar.

const ELLIPSIS: &str = "...";

/// A whitespace break is only taken when it falls in the last ~30% of the
/// budget; earlier breaks would throw away too much of the label.
const MIN_BREAK_FRACTION: f64 = 0.7;

/// Truncate `text` to at most `budget` characters for use as a node label.
///
/// Already-short text is returned unchanged. Otherwise the text is cut to
/// `budget - 3` characters and an ellipsis is appended; when the last
/// whitespace of the cut falls late enough, the break moves back to it so
/// the label ends on a whole word.
pub fn truncate_label(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }

    let cut = budget.saturating_sub(ELLIPSIS.len());
    if cut == 0 {
        return text.chars().take(budget).collect();
    }

    let prefix: String = text.chars().take(cut).collect();
    let floor = (budget as f64 * MIN_BREAK_FRACTION) as usize;

    if let Some(pos) = last_whitespace(&prefix) {
        if pos >= floor {
            let head: String = prefix.chars().take(pos).collect();
            return format!("{}{}", head.trim_end(), ELLIPSIS);
        }
    }

    format!("{}{}", prefix, ELLIPSIS)
}

/// Truncate `text` to at most `budget` characters before embedding,
/// preferring a word boundary. No ellipsis marker: the result feeds a
/// model, not a human.
pub fn truncate_at_word(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }

    let prefix: String = text.chars().take(budget).collect();
    let floor = (budget as f64 * MIN_BREAK_FRACTION) as usize;

    if let Some(pos) = last_whitespace(&prefix) {
        if pos >= floor {
            let head: String = prefix.chars().take(pos).collect();
            return head.trim_end().to_string();
        }
    }

    prefix
}

/// Character position of the last whitespace in `text`, if any.
fn last_whitespace(text: &str) -> Option<usize> {
    let mut last = None;
    for (pos, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            last = Some(pos);
        }
    }
    last
}
