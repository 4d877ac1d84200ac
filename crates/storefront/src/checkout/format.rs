//! Input reformatting helpers.
//!
//! These are presentation-only transforms applied as the shopper types:
//! digits are regrouped, nothing is validated. A card number that fails the
//! Luhn check or an expiry in the past formats just as happily - checking
//! is the payment backend's job.

/// Maximum digits kept by the phone formatter: 3 + 3 + 7.
const PHONE_MAX_DIGITS: usize = 13;

/// Maximum digits kept by the card formatter.
const CARD_MAX_DIGITS: usize = 16;

/// Regroup a phone number as `(xxx) xxx-xxxxxxx`, with shorter prefixes for
/// partial input.
#[must_use]
pub fn format_phone(input: &str) -> String {
    let digits: String = input
        .chars()
        .filter(char::is_ascii_digit)
        .take(PHONE_MAX_DIGITS)
        .collect();

    match digits.len() {
        0..=3 => digits,
        4..=6 => {
            let (area, rest) = digits.split_at(3);
            format!("({area}) {rest}")
        }
        _ => {
            let (area, rest) = digits.split_at(3);
            let (prefix, line) = rest.split_at(3);
            format!("({area}) {prefix}-{line}")
        }
    }
}

/// Regroup a card number into space-separated groups of four digits.
#[must_use]
pub fn format_card_number(input: &str) -> String {
    let digits: Vec<char> = input
        .chars()
        .filter(char::is_ascii_digit)
        .take(CARD_MAX_DIGITS)
        .collect();

    digits
        .chunks(4)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Regroup an expiry date as `MM/YY`.
#[must_use]
pub fn format_expiry(input: &str) -> String {
    let digits: String = input
        .chars()
        .filter(char::is_ascii_digit)
        .take(4)
        .collect();

    if digits.len() <= 2 {
        digits
    } else {
        let (month, year) = digits.split_at(2);
        format!("{month}/{year}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_full_input() {
        assert_eq!(format_phone("2345550123456"), "(234) 555-0123456");
        assert_eq!(format_phone("2345550123"), "(234) 555-0123");
    }

    #[test]
    fn test_phone_partial_prefixes() {
        assert_eq!(format_phone(""), "");
        assert_eq!(format_phone("2"), "2");
        assert_eq!(format_phone("234"), "234");
        assert_eq!(format_phone("2345"), "(234) 5");
        assert_eq!(format_phone("234555"), "(234) 555");
        assert_eq!(format_phone("2345550"), "(234) 555-0");
    }

    #[test]
    fn test_phone_strips_non_digits_and_truncates() {
        assert_eq!(format_phone("(234) 555-0123"), "(234) 555-0123");
        assert_eq!(format_phone("+1 234-555-0123 ext 99"), "(123) 455-5012399");
    }

    #[test]
    fn test_card_number_grouping() {
        assert_eq!(format_card_number("4242424242424242"), "4242 4242 4242 4242");
        assert_eq!(format_card_number("42424"), "4242 4");
        assert_eq!(format_card_number("4242-4242-4242-4242-99"), "4242 4242 4242 4242");
        assert_eq!(format_card_number(""), "");
    }

    #[test]
    fn test_expiry_grouping() {
        assert_eq!(format_expiry("1"), "1");
        assert_eq!(format_expiry("12"), "12");
        assert_eq!(format_expiry("123"), "12/3");
        assert_eq!(format_expiry("12/26"), "12/26");
        assert_eq!(format_expiry("12267"), "12/26");
    }

    #[test]
    fn test_no_validity_checking() {
        // Nonsense months and impossible cards still format.
        assert_eq!(format_expiry("9999"), "99/99");
        assert_eq!(format_card_number("0000000000000000"), "0000 0000 0000 0000");
    }
}
