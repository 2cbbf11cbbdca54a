//! Currency amounts as they appear in API responses: the raw number alongside
//! a human readable string.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};
use serde::{Deserialize, Serialize};

/// A monetary amount paired with its display string, e.g. `1234.5` and
/// `"$1,234.50"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    /// The unformatted amount.
    pub raw: f64,
    /// The amount rendered as a currency string.
    pub formatted: String,
}

impl Money {
    /// Wrap `amount` along with its formatted rendering.
    pub fn new(amount: f64) -> Self {
        Self {
            raw: amount,
            formatted: format_currency(amount),
        }
    }
}

/// Render `number` as a currency string with a dollar sign, thousands
/// separators and two decimal places.
pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    let mut formatted_string = if number < 0.0 {
        negative_fmt.fmt_string(number.abs())
    } else if number > 0.0 {
        positive_fmt.fmt_string(number)
    } else {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        "$0.00".to_owned()
    };

    // numfmt omits the last trailing zero, so we must add it ourselves
    // For example, "12.30" is rendered as "12.3" so we append "0".
    if formatted_string.as_bytes()[formatted_string.len() - 3] != b'.' {
        formatted_string = format!("{formatted_string}0");
    }

    formatted_string
}

#[cfg(test)]
mod money_tests {
    use super::{Money, format_currency};

    #[test]
    fn formats_zero() {
        assert_eq!(format_currency(0.0), "$0.00");
    }

    #[test]
    fn formats_with_thousands_separator() {
        assert_eq!(format_currency(1234.5), "$1,234.50");
    }

    #[test]
    fn formats_negative_amounts() {
        assert_eq!(format_currency(-42.0), "-$42.00");
    }

    #[test]
    fn keeps_trailing_zero() {
        assert_eq!(format_currency(12.3), "$12.30");
    }

    #[test]
    fn money_pairs_raw_and_formatted() {
        let money = Money::new(99.99);

        assert_eq!(money.raw, 99.99);
        assert_eq!(money.formatted, "$99.99");
    }
}
