use rust_decimal::Decimal;

/// Base currency used when none is configured
pub const DEFAULT_BASE_CURRENCY: &str = "SGD";

/// Symbol recorded for income that is not tied to a security
pub const CASH_SYMBOL: &str = "CASH";

/// Positions whose absolute quantity is below this threshold are closed (1e-4)
pub const CLOSED_QUANTITY_THRESHOLD: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Returns true when a position with this quantity counts as closed.
pub fn is_quantity_closed(quantity: Decimal) -> bool {
    quantity.abs() < CLOSED_QUANTITY_THRESHOLD
}
