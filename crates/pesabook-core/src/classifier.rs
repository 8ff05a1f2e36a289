//! Message relevance gate
//!
//! Decides whether an inbound text blob is a mobile-money notification at
//! all. False positives are fine - the parser simply fails to find the
//! required fields. False negatives drop the message silently; with no
//! ground truth for "is this a financial SMS" that is the accepted
//! trade-off.

/// Sender short codes and alphanumeric names used by the vendor
const KNOWN_SENDERS: &[&str] = &["MPESA", "M-PESA", "MPESA-B", "SAFARICOM"];

/// Content keywords that mark a message as relevant regardless of sender
const CONTENT_KEYWORDS: &[&str] = &["ksh", "m-pesa", "mpesa", "confirmed"];

/// Returns true if the message should be handed to the field extractor.
///
/// Pure, no side effects: matches the sender against the known vendor
/// sender set, or the text (case-insensitive) against a fixed keyword set.
pub fn is_relevant(sender_id: &str, text: &str) -> bool {
    let sender = sender_id.trim().to_uppercase();
    if KNOWN_SENDERS.contains(&sender.as_str()) {
        return true;
    }

    let lower = text.to_lowercase();
    CONTENT_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sender_is_relevant() {
        assert!(is_relevant("MPESA", "anything at all"));
        assert!(is_relevant("m-pesa", "anything at all"));
    }

    #[test]
    fn test_keyword_match_is_relevant() {
        assert!(is_relevant("12345", "QR345678 Confirmed. Ksh500 sent"));
        assert!(is_relevant("FRIEND", "you owe me ksh200"));
    }

    #[test]
    fn test_plain_chatter_is_irrelevant() {
        assert!(!is_relevant("0712345678", "See you at lunch tomorrow"));
        assert!(!is_relevant("BANKCO", "Your statement is ready"));
    }
}
