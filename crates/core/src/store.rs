use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::cart::{cart_total, CartLine};
use crate::domain::customer::CustomerData;
use crate::domain::shipping::ShippingQuote;

/// Everything the storefront knows about the current session.
///
/// Lives only in memory; a new session starts from `SessionState::default()`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub lines: Vec<CartLine>,
    pub customer: Option<CustomerData>,
    pub quote: Option<ShippingQuote>,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl SessionState {
    pub fn is_cart_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total(&self) -> Decimal {
        cart_total(&self.lines)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartAction {
    SetCart(Vec<CartLine>),
    ClearCart,
    SetCustomerData(CustomerData),
    SetShippingQuote(ShippingQuote),
    SetLoading(bool),
    SetError(Option<String>),
}

impl CartAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetCart(_) => "set_cart",
            Self::ClearCart => "clear_cart",
            Self::SetCustomerData(_) => "set_customer_data",
            Self::SetShippingQuote(_) => "set_shipping_quote",
            Self::SetLoading(_) => "set_loading",
            Self::SetError(_) => "set_error",
        }
    }
}

/// Applies one action to a session state.
///
/// Cross-field invariants are not checked here: a quote may be stored while
/// the cart is empty. Guarding that is the storefront's job.
pub fn reduce(state: SessionState, action: CartAction) -> SessionState {
    match action {
        CartAction::SetCart(lines) => {
            SessionState { lines, loading: false, last_error: None, ..state }
        }
        CartAction::ClearCart => SessionState::default(),
        CartAction::SetCustomerData(customer) => SessionState { customer: Some(customer), ..state },
        CartAction::SetShippingQuote(quote) => {
            SessionState { quote: Some(quote), loading: false, last_error: None, ..state }
        }
        CartAction::SetLoading(loading) => SessionState { loading, ..state },
        CartAction::SetError(last_error) => SessionState { last_error, loading: false, ..state },
    }
}

/// Owner of one session's state. Page flows receive it by `&mut`.
#[derive(Clone, Debug, Default)]
pub struct CartStore {
    state: SessionState,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: SessionState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn dispatch(&mut self, action: CartAction) -> &SessionState {
        let name = action.name();
        let current = std::mem::take(&mut self.state);
        self.state = reduce(current, action);
        debug!(
            event_name = "cart.store.dispatched",
            action = name,
            lines = self.state.lines.len(),
            loading = self.state.loading,
            has_quote = self.state.quote.is_some(),
            "cart action applied"
        );
        &self.state
    }
}
