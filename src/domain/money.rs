use thiserror::Error;

/// Format a monetary value for display, e.g. 1234.5 -> "R$ 1234,50".
/// Values are rounded to two decimals.
pub fn format_currency(value: f64) -> String {
    format!("R$ {:.2}", value).replace('.', ",")
}

/// Parse user input into a number. Both "12.5" and "12,5" are accepted.
pub fn parse_amount(input: &str) -> Result<f64, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    let value: f64 = input
        .replace(',', ".")
        .parse()
        .map_err(|_| ParseAmountError::InvalidFormat(input.to_string()))?;

    if !value.is_finite() {
        return Err(ParseAmountError::InvalidFormat(input.to_string()));
    }
    Ok(value)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    #[error("empty value")]
    Empty,

    #[error("invalid number: {0}")]
    InvalidFormat(String),
}
