/// Money is represented as integer cents to avoid floating-point precision issues.
/// Balances are never negative, but the type stays signed so arithmetic on
/// user input can be validated before it touches an account.
pub type Cents = i64;

/// Format cents as a human-readable amount.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Returns true if `field` is a non-empty run of ASCII digits.
/// This is the shape every stored cent amount must have.
pub fn is_cents_field(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}
