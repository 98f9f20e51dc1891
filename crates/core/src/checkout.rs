use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::cart::{round_money, CartLine};
use crate::domain::customer::CustomerData;
use crate::domain::shipping::ShippingQuote;
use crate::store::SessionState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckoutLine {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub original_unit_price: Decimal,
    pub discounted: bool,
    pub line_total: Decimal,
}

impl From<&CartLine> for CheckoutLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.to_string(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            original_unit_price: line.original_unit_price,
            discounted: line.is_discounted(),
            line_total: round_money(line.line_total()),
        }
    }
}

/// Read-only view of the checkout page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckoutSummary {
    pub lines: Vec<CheckoutLine>,
    pub total: Decimal,
    pub customer: Option<CustomerData>,
    pub quote: Option<ShippingQuote>,
}

impl CheckoutSummary {
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            lines: state.lines.iter().map(CheckoutLine::from).collect(),
            total: state.total(),
            customer: state.customer.clone(),
            quote: state.quote.clone(),
        }
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Cart total plus the quoted shipping price, once a quote exists.
    pub fn grand_total(&self) -> Option<Decimal> {
        self.quote.as_ref().map(|quote| round_money(self.total + quote.price))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::CheckoutSummary;
    use crate::domain::cart::CartLine;
    use crate::domain::product::ProductId;
    use crate::domain::shipping::ShippingQuote;
    use crate::store::SessionState;

    fn line(unit_cents: i64, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId(4),
            name: "Kettle".to_string(),
            unit_price: Decimal::new(unit_cents, 2),
            quantity,
            original_unit_price: Decimal::new(unit_cents, 2),
            discount_percentage: Decimal::ZERO,
            thumbnail: String::new(),
        }
    }

    #[test]
    fn summary_totals_single_line() {
        let state = SessionState { lines: vec![line(1_999, 2)], ..SessionState::default() };

        let summary = CheckoutSummary::from_state(&state);

        assert_eq!(summary.total.to_string(), "39.98");
        assert_eq!(summary.lines[0].line_total, Decimal::new(3_998, 2));
        assert!(!summary.lines[0].discounted);
        assert_eq!(summary.item_count(), 2);
        assert_eq!(summary.grand_total(), None);
    }

    #[test]
    fn grand_total_includes_quoted_shipping() {
        let state = SessionState {
            lines: vec![line(1_000, 1), line(250, 4)],
            quote: Some(ShippingQuote::new(Decimal::new(3_490, 0), "Uder")),
            ..SessionState::default()
        };

        let summary = CheckoutSummary::from_state(&state);

        assert_eq!(summary.total, Decimal::new(2_000, 2));
        assert_eq!(summary.grand_total(), Some(Decimal::new(351_000, 2)));
    }
}
