// Indonesian Rupiah display and input parsing

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("price {input:?} is too large")]
pub struct PriceTooLarge {
    pub input: String,
}

/// Format a price as `Rp 1.500.000`, rounded to whole rupiah
///
/// A missing price shows as `Rp 0`.
pub fn format_idr(amount: Option<f64>) -> String {
    let amount = match amount {
        Some(a) if a.is_finite() => a.round(),
        _ => return "Rp 0".to_string(),
    };

    let digits = format!("{}", amount.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if amount < 0.0 {
        format!("-Rp {}", grouped)
    } else {
        format!("Rp {}", grouped)
    }
}

/// Parse user input such as `Rp 1.500.000`; every non-digit is ignored
///
/// Empty or digit-free input parses as 0. A number that does not fit in
/// u64 is rejected rather than wrapped or zeroed.
pub fn parse_idr(value: &str) -> Result<u64, PriceTooLarge> {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Ok(0);
    }
    digits.parse().map_err(|_| PriceTooLarge {
        input: value.to_string(),
    })
}
