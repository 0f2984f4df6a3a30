//! # Debt Module
//!
//! Pure aggregation over a client's open sales. These values are derived
//! on demand from the live sale set and never stored; the store-side
//! `DebtAggregator` fetches the open sales and delegates the math here.

use crate::money::Money;
use crate::types::Sale;

/// Total outstanding balance across open sales.
pub fn total_debt(open_sales: &[Sale]) -> Money {
    open_sales
        .iter()
        .filter(|s| s.is_open())
        .map(Sale::amount_pending)
        .sum()
}

/// Total returnable containers still owed across open sales.
pub fn total_owed_returnables(open_sales: &[Sale]) -> u32 {
    open_sales
        .iter()
        .filter(|s| s.is_open())
        .map(|s| s.total_owed_returnables)
        .sum()
}
