use std::mem;

use tracing::{debug, info, warn};

use crate::catalog::{fetch_random_cart, CartRandomness, CatalogSource};
use crate::checkout::CheckoutSummary;
use crate::domain::customer::CustomerData;
use crate::errors::CartError;
use crate::flows::{
    FlowContext, FlowEngine, FlowEvent, FlowState, FlowTransitionError, Page, ShopFlow,
    TransitionOutcome,
};
use crate::notice::Notice;
use crate::quoting::{build_quote_request, QuoteService};
use crate::store::{CartAction, CartStore, SessionState};

pub const CART_GENERATED: &str = "Random cart generated!";
pub const CART_NOT_GENERATED: &str = "Could not generate a cart. Try again.";
pub const GENERATION_IN_PROGRESS: &str = "A cart is already being generated.";
pub const GENERATE_FIRST: &str = "Generate a cart first.";
pub const CART_CLEARED: &str = "Cart cleared and back to the start page.";
pub const ENTER_SHIPPING_FIRST: &str = "Please enter your shipping details first.";
pub const SHIPPING_SAVED: &str = "Shipping details saved.";
pub const NOTHING_TO_QUOTE: &str = "There are no products in the cart to quote shipping for.";

/// One shopper session: the page they are on, their cart and the notices
/// produced by their last actions.
///
/// Every operation reports problems as notices instead of returning errors;
/// remote failures are also recorded in `SessionState::last_error`.
pub struct Storefront<C, Q, R> {
    catalog: C,
    quotes: Q,
    randomness: R,
    store: CartStore,
    engine: FlowEngine<ShopFlow>,
    flow_state: FlowState,
    notices: Vec<Notice>,
}

impl<C, Q, R> Storefront<C, Q, R>
where
    C: CatalogSource,
    Q: QuoteService,
    R: CartRandomness,
{
    pub fn new(catalog: C, quotes: Q, randomness: R) -> Self {
        Self::with_store(catalog, quotes, randomness, CartStore::new())
    }

    /// Resumes a session from an existing store; the page is derived from
    /// whether the cart has lines.
    pub fn with_store(catalog: C, quotes: Q, randomness: R, store: CartStore) -> Self {
        let engine = FlowEngine::new(ShopFlow);
        let flow_state = if store.state().is_cart_empty() {
            engine.initial_state()
        } else {
            FlowState::Populated
        };
        Self { catalog, quotes, randomness, store, engine, flow_state, notices: Vec::new() }
    }

    pub fn state(&self) -> &SessionState {
        self.store.state()
    }

    pub fn flow_state(&self) -> FlowState {
        self.flow_state
    }

    pub fn page(&self) -> Page {
        self.flow_state.page()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        mem::take(&mut self.notices)
    }

    pub fn checkout_summary(&self) -> CheckoutSummary {
        CheckoutSummary::from_state(self.store.state())
    }

    /// Replaces the cart with a random one drawn from the catalog.
    pub async fn generate_cart(&mut self) -> Page {
        if self.store.state().loading {
            self.notify(Notice::info(GENERATION_IN_PROGRESS));
            return self.page();
        }
        if self.page() != Page::Home {
            self.reject(self.invalid(FlowEvent::CartGenerated));
            return self.page();
        }

        self.store.dispatch(CartAction::SetLoading(true));
        self.store.dispatch(CartAction::SetError(None));

        match fetch_random_cart(&self.catalog, &mut self.randomness).await {
            Ok(lines) if !lines.is_empty() => {
                let count = lines.len();
                self.store.dispatch(CartAction::SetCart(lines));
                info!(
                    event_name = "storefront.cart.generated",
                    lines = count,
                    total = %self.store.state().total(),
                    "random cart placed in session"
                );
                self.notify(Notice::success(CART_GENERATED));
                if let Err(error) = self.advance(FlowEvent::CartGenerated) {
                    self.reject(error);
                }
            }
            Ok(_) => {
                self.store.dispatch(CartAction::SetLoading(false));
                self.notify(Notice::error(CART_NOT_GENERATED));
            }
            Err(error) => {
                let message = self.record_failure("storefront.cart.failed", &error);
                self.notify(Notice::error(message));
            }
        }

        self.page()
    }

    pub fn open_checkout(&mut self) -> Page {
        match self.advance(FlowEvent::CheckoutRequested) {
            Ok(_) => {}
            Err(CartError::Flow(FlowTransitionError::EmptyCart { .. })) => {
                self.notify(Notice::error(GENERATE_FIRST));
            }
            Err(error) => self.reject(error),
        }
        self.page()
    }

    /// Leaves the cart untouched.
    pub fn back_to_home(&mut self) -> Page {
        if let Err(error) = self.advance(FlowEvent::HomeRequested) {
            self.reject(error);
        }
        self.page()
    }

    pub fn clear_cart(&mut self) -> Page {
        self.store.dispatch(CartAction::ClearCart);
        info!(event_name = "storefront.cart.cleared", "session cart cleared");
        self.notify(Notice::success(CART_CLEARED));
        if let Err(error) = self.advance(FlowEvent::CartCleared) {
            self.reject(error);
        }
        self.page()
    }

    /// Moves from checkout to the shipping form. Without stored shipping
    /// details the shopper is told to fill them in, and still moved there.
    pub fn open_shipping(&mut self) -> Page {
        match self.advance(FlowEvent::ShippingRequested) {
            Ok(_) => {
                if self.store.state().customer.is_none() {
                    self.notify(Notice::error(ENTER_SHIPPING_FIRST));
                }
            }
            Err(error) => self.reject(error),
        }
        self.page()
    }

    /// Stores the shipping form without requesting a quote.
    pub fn save_customer_data(&mut self, customer: CustomerData) -> Page {
        let missing = customer.missing_fields();
        if !missing.is_empty() {
            self.reject_fields(&missing);
            return self.page();
        }

        self.store.dispatch(CartAction::SetCustomerData(customer.trimmed()));
        self.notify(Notice::success(SHIPPING_SAVED));
        self.page()
    }

    /// Submits the cart and shipping form to the quote service.
    ///
    /// Blank fields and an empty cart are caught before any request is made
    /// and leave `last_error` alone.
    pub async fn request_quote(&mut self, customer: CustomerData) -> Page {
        let missing = customer.missing_fields();
        if !missing.is_empty() {
            self.reject_fields(&missing);
            return self.page();
        }

        if self.store.state().is_cart_empty() {
            self.notify(Notice::error(NOTHING_TO_QUOTE));
            if let Err(error) = self.advance(FlowEvent::HomeRequested) {
                self.reject(error);
            }
            return self.page();
        }

        if self.flow_state != FlowState::ShippingEntry {
            self.reject(self.invalid(FlowEvent::QuoteReceived));
            return self.page();
        }

        let customer = customer.trimmed();
        self.store.dispatch(CartAction::SetLoading(true));
        self.store.dispatch(CartAction::SetError(None));
        self.store.dispatch(CartAction::SetCustomerData(customer.clone()));

        let request = build_quote_request(&self.store.state().lines, &customer);
        match self.quotes.quote_shipping(&request).await {
            Ok(quote) => {
                let message = format!("Shipping with {} - $ {:.2}", quote.courier, quote.price);
                info!(
                    event_name = "storefront.quote.received",
                    courier = %quote.courier,
                    price = %quote.price,
                    lines = request.products.len(),
                    "shipping quote stored"
                );
                self.store.dispatch(CartAction::SetShippingQuote(quote));
                self.notify(Notice::success(message));
                if let Err(error) = self.advance(FlowEvent::QuoteReceived) {
                    self.reject(error);
                }
            }
            Err(error) => {
                let message = self.record_failure("storefront.quote.failed", &error);
                self.notify(Notice::error(format!("No shipments available: {message}")));
            }
        }

        if self.store.state().loading {
            self.store.dispatch(CartAction::SetLoading(false));
        }
        self.page()
    }

    fn advance(&mut self, event: FlowEvent) -> Result<TransitionOutcome, CartError> {
        let context = FlowContext::from_session(self.store.state());
        let outcome = self.engine.apply(&self.flow_state, &event, &context)?;
        debug!(
            event_name = "storefront.flow.transitioned",
            from = ?outcome.from,
            to = ?outcome.to,
            event = ?outcome.event,
            "page flow advanced"
        );
        self.flow_state = outcome.to;
        Ok(outcome)
    }

    fn invalid(&self, event: FlowEvent) -> CartError {
        CartError::Flow(FlowTransitionError::InvalidTransition { state: self.flow_state, event })
    }

    /// Releases `loading`; only remote failures are kept in `last_error`.
    fn record_failure(&mut self, event_name: &'static str, error: &CartError) -> String {
        let message = error.user_message();
        if error.is_remote() {
            self.store.dispatch(CartAction::SetError(Some(message.clone())));
        } else {
            self.store.dispatch(CartAction::SetLoading(false));
        }
        warn!(event_name, error_class = error.error_class(), error = %message, "remote call failed");
        message
    }

    fn reject(&mut self, error: CartError) {
        debug!(
            event_name = "storefront.action.rejected",
            error_class = error.error_class(),
            error = %error,
            "action rejected"
        );
        self.notify(Notice::error(error.user_message()));
    }

    fn reject_fields(&mut self, missing: &[&str]) {
        debug!(
            event_name = "storefront.customer.invalid",
            missing = %missing.join(","),
            "shipping form incomplete"
        );
        self.notify(Notice::error(CartError::validation(missing).user_message()));
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
