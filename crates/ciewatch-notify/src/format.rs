//! Operator-facing message text.

use std::borrow::Cow;
use std::fmt::Display;

use ciewatch_core::NewSlot;

/// Bot API limit on a message's length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// One message listing every new slot of a cycle, or `None` if there are none.
#[must_use]
pub fn format_new_slots(slots: &[NewSlot]) -> Option<String> {
    if slots.is_empty() {
        return None;
    }
    let lines: Vec<String> = slots
        .iter()
        .map(|slot| {
            format!(
                "- {} | {} | {}",
                slot.record.office_name, slot.record.office_address, slot.record.date_text
            )
        })
        .collect();
    Some(format!("🔔 Nouveaux créneaux dispos :\n\n{}", lines.join("\n\n")))
}

#[must_use]
pub fn format_error(error: &dyn Display) -> String {
    format!("❌ Erreur : {error}")
}

/// Cut `text` to [`MAX_MESSAGE_CHARS`], marking the cut with an ellipsis.
#[must_use]
pub fn truncate_message(text: &str) -> Cow<'_, str> {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return Cow::Borrowed(text);
    }
    let mut cut: String = text.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    cut.push('…');
    Cow::Owned(cut)
}
