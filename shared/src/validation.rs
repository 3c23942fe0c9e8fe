//! Input validation helpers shared by the backend services

use rust_decimal::Decimal;

/// Validate a quantity coming from a request: a positive integer
pub fn validate_qty(qty: i32) -> Result<(), &'static str> {
    if qty <= 0 {
        return Err("qty must be a positive integer");
    }
    Ok(())
}

/// Validate a price (cp/sp): non-negative
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("price must be a non-negative number");
    }
    Ok(())
}

/// Validate a paid amount: non-negative (zero is an unpaid credit sale)
pub fn validate_paid_amount(paid: Decimal) -> Result<(), &'static str> {
    if paid < Decimal::ZERO {
        return Err("paid_amount must be a number >= 0");
    }
    Ok(())
}

/// Validate a customer phone number: 7-15 digits, optional leading +
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let trimmed = phone.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err("phone must contain digits only");
    }
    if digits.len() < 7 || digits.len() > 15 {
        return Err("phone must be 7 to 15 digits");
    }
    Ok(())
}

/// Validate a required name-like field is non-empty after trimming
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("name cannot be empty");
    }
    Ok(())
}
