//! Human-readable labels for metric keys

use crate::constants::SESSION_LABEL_CHARS;
use crate::types::{Count, MetricKey};

/// Render the output label of a key.
///
/// `_final_count` is not part of the label; callers print it alongside.
/// A key whose trailing payload component is empty falls back to its raw
/// `category:payload` form.
pub fn format_key(key: &MetricKey, _final_count: Count) -> String {
    match key {
        MetricKey::Action { action } if !action.is_empty() => format!("Acción [{}]", action),
        MetricKey::Page { page } if !page.is_empty() => format!("Página [{}]", page),
        MetricKey::Hour { hour } if !hour.is_empty() => format!("Hora [{}:00]", hour),
        MetricKey::Session { session_id } if !session_id.is_empty() => {
            format!("Sesión [{}...]", session_prefix(session_id))
        }
        MetricKey::ActionPage { action, page } if !page.is_empty() => {
            format!("Acción-Página [{} en {}]", action, page)
        }
        MetricKey::HourAction { hour, action } if !action.is_empty() => {
            format!("Hora-Acción [{}:00 - {}]", hour, action)
        }
        _ => key.to_string(),
    }
}

/// First characters of a session id, fewer if it is shorter
fn session_prefix(session_id: &str) -> &str {
    match session_id.char_indices().nth(SESSION_LABEL_CHARS) {
        Some((idx, _)) => &session_id[..idx],
        None => session_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[test]
    fn test_labels_per_category() {
        assert_eq!(format_key(&MetricKey::Action { action: s("click") }, 2), "Acción [click]");
        assert_eq!(format_key(&MetricKey::Page { page: s("/home") }, 2), "Página [/home]");
        assert_eq!(format_key(&MetricKey::Hour { hour: s("09") }, 2), "Hora [09:00]");
        assert_eq!(
            format_key(
                &MetricKey::ActionPage {
                    action: s("click"),
                    page: s("/home")
                },
                2
            ),
            "Acción-Página [click en /home]"
        );
        assert_eq!(
            format_key(
                &MetricKey::HourAction {
                    hour: s("09"),
                    action: s("click")
                },
                2
            ),
            "Hora-Acción [09:00 - click]"
        );
    }

    #[test]
    fn test_session_truncated_to_eight_chars() {
        let long = MetricKey::Session {
            session_id: s("abcdefghij"),
        };
        assert_eq!(format_key(&long, 1), "Sesión [abcdefgh...]");

        let short = MetricKey::Session {
            session_id: s("abc"),
        };
        assert_eq!(format_key(&short, 1), "Sesión [abc...]");

        let exact = MetricKey::Session {
            session_id: s("12345678"),
        };
        assert_eq!(format_key(&exact, 1), "Sesión [12345678...]");
    }

    #[test]
    fn test_session_truncation_is_char_based() {
        let key = MetricKey::Session {
            session_id: s("ñññññññññ"),
        };
        assert_eq!(format_key(&key, 1), "Sesión [ññññññññ...]");
    }

    #[test]
    fn test_delimiters_in_payload_are_preserved() {
        let key = MetricKey::ActionPage {
            action: s("add_to_cart"),
            page: s("/shop:item_1"),
        };
        assert_eq!(format_key(&key, 1), "Acción-Página [add_to_cart en /shop:item_1]");

        let key = MetricKey::HourAction {
            hour: s("unknown"),
            action: s("form_submit"),
        };
        assert_eq!(format_key(&key, 1), "Hora-Acción [unknown:00 - form_submit]");
    }

    #[test]
    fn test_count_does_not_change_label() {
        let key = MetricKey::Page { page: s("/") };
        assert_eq!(format_key(&key, 1), format_key(&key, 1000));
    }

    #[test]
    fn test_empty_trailing_payload_falls_back_to_raw_key() {
        assert_eq!(format_key(&MetricKey::Action { action: s("") }, 1), "action:");
        assert_eq!(
            format_key(&MetricKey::Session { session_id: s("") }, 1),
            "session:"
        );
        assert_eq!(
            format_key(
                &MetricKey::ActionPage {
                    action: s("view"),
                    page: s("")
                },
                1
            ),
            "action_page:view_"
        );
        // Only the trailing component matters
        assert_eq!(
            format_key(
                &MetricKey::ActionPage {
                    action: s(""),
                    page: s("/")
                },
                1
            ),
            "Acción-Página [ en /]"
        );
    }
}
