use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::product::{CatalogProduct, ProductId};

const MONEY_DP: u32 = 2;

/// One product entry in the session cart.
///
/// `unit_price` is the discounted price per unit; the catalog price and the
/// discount percentage are kept alongside so the checkout view can show the
/// struck-through original and the quote request can report the discount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub original_unit_price: Decimal,
    pub discount_percentage: Decimal,
    pub thumbnail: String,
}

impl CartLine {
    pub fn from_product(product: &CatalogProduct, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.title.clone(),
            unit_price: discounted_unit_price(product.price, product.discount_percentage),
            quantity,
            original_unit_price: product.price,
            discount_percentage: product.discount_percentage,
            thumbnail: product.thumbnail.clone(),
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Money saved on this line: `original_unit_price * quantity * pct / 100`.
    pub fn discount_amount(&self) -> Decimal {
        self.original_unit_price
            * Decimal::from(self.quantity)
            * clamp_percentage(self.discount_percentage)
            / Decimal::ONE_HUNDRED
    }

    pub fn is_discounted(&self) -> bool {
        self.discount_percentage > Decimal::ZERO
    }
}

/// `round(price * (1 - pct / 100), 2)`, with the percentage clamped to `0..=100`
/// so the result never exceeds `price`.
pub fn discounted_unit_price(price: Decimal, discount_percentage: Decimal) -> Decimal {
    let factor = Decimal::ONE - clamp_percentage(discount_percentage) / Decimal::ONE_HUNDRED;
    round_money(price * factor)
}

pub fn cart_total(lines: &[CartLine]) -> Decimal {
    round_money(lines.iter().map(CartLine::line_total).sum())
}

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

fn clamp_percentage(percentage: Decimal) -> Decimal {
    percentage.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{cart_total, discounted_unit_price, CartLine};
    use crate::domain::product::{CatalogProduct, ProductId};

    fn line(unit_price: Decimal, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId(1),
            name: "Lamp".to_string(),
            unit_price,
            quantity,
            original_unit_price: unit_price,
            discount_percentage: Decimal::ZERO,
            thumbnail: String::new(),
        }
    }

    #[test]
    fn discounted_price_rounds_to_cents() {
        // 9.99 * 0.9283 = 9.273717
        assert_eq!(
            discounted_unit_price(Decimal::new(999, 2), Decimal::new(717, 2)),
            Decimal::new(927, 2)
        );
        assert_eq!(discounted_unit_price(Decimal::new(100, 0), Decimal::ZERO), Decimal::new(100, 0));
        assert_eq!(discounted_unit_price(Decimal::new(100, 0), Decimal::ONE_HUNDRED), Decimal::ZERO);
    }

    #[test]
    fn discounted_price_never_exceeds_catalog_price() {
        let prices = [0_i64, 1, 99, 1_999, 54_321, 1_000_000];
        for price_cents in prices {
            let price = Decimal::new(price_cents, 2);
            for step in 0..=400 {
                let pct = Decimal::new(step, 0) / Decimal::new(4, 0);
                let unit = discounted_unit_price(price, pct);
                assert!(unit <= price, "{unit} > {price} at {pct}%");
                assert!(unit >= Decimal::ZERO);
                assert!(unit.scale() <= 2);
            }
        }
    }

    #[test]
    fn out_of_range_percentages_are_clamped() {
        let price = Decimal::new(5_000, 2);
        assert_eq!(discounted_unit_price(price, Decimal::new(-10, 0)), price);
        assert_eq!(discounted_unit_price(price, Decimal::new(150, 0)), Decimal::ZERO);
    }

    #[test]
    fn checkout_total_sums_line_totals() {
        let total = cart_total(&[line(Decimal::new(1_999, 2), 2)]);
        assert_eq!(total.to_string(), "39.98");

        let total = cart_total(&[line(Decimal::new(1_999, 2), 2), line(Decimal::new(50, 2), 3)]);
        assert_eq!(total, Decimal::new(4_148, 2));
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn line_from_product_carries_original_pricing() {
        let product = CatalogProduct {
            id: ProductId(12),
            title: "Desk".to_string(),
            price: Decimal::new(20_000, 2),
            discount_percentage: Decimal::new(10, 0),
            thumbnail: "thumb.png".to_string(),
            stock: 10,
            rating: Decimal::new(45, 1),
            dimensions: None,
        };

        let line = CartLine::from_product(&product, 3);

        assert_eq!(line.unit_price, Decimal::new(18_000, 2));
        assert_eq!(line.original_unit_price, Decimal::new(20_000, 2));
        assert_eq!(line.line_total(), Decimal::new(54_000, 2));
        assert_eq!(line.discount_amount(), Decimal::new(6_000, 2));
        assert!(line.is_discounted());
    }
}
