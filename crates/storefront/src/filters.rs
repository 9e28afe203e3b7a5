//! Display formatting for prices.

use aurelia_core::{Language, Price};

/// Format a price for display, with no decimals.
///
/// - Spanish (es-CL): `$18.900`
/// - Korean (ko-KR): `CLP 18,900`
///
/// Negative amounts get a leading `-` (e.g., a discount line).
#[must_use]
pub fn format_price(price: Price, lang: Language) -> String {
    let amount = price.amount();
    let sign = if amount < 0 { "-" } else { "" };
    let magnitude = amount.unsigned_abs();
    match lang {
        Language::Es => format!(
            "{sign}{}{}",
            Price::CURRENCY.symbol(),
            group_thousands(magnitude, '.')
        ),
        Language::Ko => format!(
            "{sign}{} {}",
            Price::CURRENCY.code(),
            group_thousands(magnitude, ',')
        ),
    }
}

fn group_thousands(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}
