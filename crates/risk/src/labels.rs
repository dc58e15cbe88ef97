use core_types::OrderSide;

/// "share" or "shares", depending on the count.
pub fn share_noun(quantity: u64) -> &'static str {
    if quantity == 1 { "share" } else { "shares" }
}

/// Text of the submit control, e.g. `Buy 5 Shares` or `Sell 1 Share`.
pub fn order_button_label(side: OrderSide, quantity: u64) -> String {
    let noun = if quantity == 1 { "Share" } else { "Shares" };
    format!("{} {} {}", side, quantity, noun)
}

/// Buys show what the order costs; sells show what the position is worth.
pub fn total_label(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "Total Cost",
        OrderSide::Sell => "Total Value",
    }
}
