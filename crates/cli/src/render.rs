//! Plain-text views of the session for terminal output.

use cartsim_core::checkout::CheckoutSummary;
use cartsim_core::flows::Page;
use cartsim_core::notice::Notice;

pub fn page_title(page: Page) -> &'static str {
    match page {
        Page::Home => "home",
        Page::Checkout => "checkout",
        Page::Shipping => "shipping",
    }
}

pub fn render_notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|notice| format!("[{}] {}", notice.level.as_str(), notice.message))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_summary(summary: &CheckoutSummary) -> String {
    if summary.lines.is_empty() {
        return "cart is empty".to_string();
    }

    let mut lines = vec![format!(
        "cart: {} products, {} items",
        summary.lines.len(),
        summary.item_count()
    )];
    for line in &summary.lines {
        let price = if line.discounted {
            format!("$ {:.2} (was $ {:.2})", line.unit_price, line.original_unit_price)
        } else {
            format!("$ {:.2}", line.unit_price)
        };
        lines.push(format!(
            "- #{} {} x{} @ {} = $ {:.2}",
            line.product_id, line.name, line.quantity, price, line.line_total
        ));
    }
    lines.push(format!("total: $ {:.2}", summary.total));

    if let Some(customer) = &summary.customer {
        lines.push(format!(
            "ship to: {}, {}, {} ({})",
            customer.name, customer.shipping_street, customer.commune, customer.phone
        ));
    }
    if let Some(quote) = &summary.quote {
        lines.push(format!("shipping: {} $ {:.2}", quote.courier, quote.price));
    }
    if let Some(grand_total) = summary.grand_total() {
        lines.push(format!("grand total: $ {grand_total:.2}"));
    }

    lines.join("\n")
}
