use thiserror::Error;

use crate::flows::states::{
    FlowAction, FlowContext, FlowEvent, FlowState, Page, TransitionOutcome,
};

pub trait FlowDefinition {
    fn initial_state(&self) -> FlowState;
    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// Home → checkout → shipping → quoted navigation of the storefront.
#[derive(Clone, Debug, Default)]
pub struct ShopFlow;

impl FlowDefinition for ShopFlow {
    fn initial_state(&self) -> FlowState {
        FlowState::Empty
    }

    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_shop(current, event, context)
    }
}

#[derive(Clone, Debug, Default)]
pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> FlowState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event, context)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("cart is empty; cannot apply {event:?} from {state:?}")]
    EmptyCart { state: FlowState, event: FlowEvent },
    #[error("customer data is missing; cannot apply {event:?} from {state:?}")]
    MissingCustomer { state: FlowState, event: FlowEvent },
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: FlowState, event: FlowEvent },
}

fn transition_shop(
    current: &FlowState,
    event: &FlowEvent,
    context: &FlowContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use FlowEvent::{
        CartCleared, CartGenerated, CheckoutRequested, HomeRequested, QuoteReceived,
        ShippingRequested,
    };
    use FlowState::{CheckoutReview, Empty, Populated, Quoted, ShippingEntry};

    let require_cart = || {
        if context.cart_is_empty {
            Err(FlowTransitionError::EmptyCart { state: *current, event: *event })
        } else {
            Ok(())
        }
    };

    let (to, page) = match (current, event) {
        (_, CartCleared) => (Empty, Page::Home),
        (_, HomeRequested) => {
            if context.cart_is_empty {
                (Empty, Page::Home)
            } else {
                (Populated, Page::Home)
            }
        }
        (Empty | Populated, CartGenerated) => {
            require_cart()?;
            (Populated, Page::Home)
        }
        (Populated | ShippingEntry, CheckoutRequested) => {
            require_cart()?;
            (CheckoutReview, Page::Checkout)
        }
        (CheckoutReview | Quoted, ShippingRequested) => (ShippingEntry, Page::Shipping),
        (ShippingEntry, QuoteReceived) => {
            require_cart()?;
            if !context.has_customer {
                return Err(FlowTransitionError::MissingCustomer {
                    state: *current,
                    event: *event,
                });
            }
            (Quoted, Page::Checkout)
        }
        _ => {
            return Err(FlowTransitionError::InvalidTransition { state: *current, event: *event });
        }
    };

    Ok(TransitionOutcome {
        from: *current,
        to,
        event: *event,
        actions: vec![FlowAction::Navigate(page)],
    })
}

#[cfg(test)]
mod tests {
    use crate::flows::engine::{FlowEngine, FlowTransitionError, ShopFlow};
    use crate::flows::states::{FlowAction, FlowContext, FlowEvent, FlowState, Page};

    fn with_cart() -> FlowContext {
        FlowContext { cart_is_empty: false, has_customer: false }
    }

    fn with_cart_and_customer() -> FlowContext {
        FlowContext { cart_is_empty: false, has_customer: true }
    }

    #[test]
    fn shop_flow_happy_path_reaches_quoted_checkout() {
        let engine = FlowEngine::new(ShopFlow);
        let mut state = engine.initial_state();
        assert_eq!(state, FlowState::Empty);

        state = engine
            .apply(&state, &FlowEvent::CartGenerated, &with_cart())
            .expect("empty -> populated")
            .to;
        state = engine
            .apply(&state, &FlowEvent::CheckoutRequested, &with_cart())
            .expect("populated -> checkout")
            .to;
        state = engine
            .apply(&state, &FlowEvent::ShippingRequested, &with_cart())
            .expect("checkout -> shipping")
            .to;
        assert_eq!(state.page(), Page::Shipping);

        let quoted = engine
            .apply(&state, &FlowEvent::QuoteReceived, &with_cart_and_customer())
            .expect("shipping -> quoted");

        assert_eq!(quoted.to, FlowState::Quoted);
        assert_eq!(quoted.actions, vec![FlowAction::Navigate(Page::Checkout)]);
        assert_eq!(quoted.to.page(), Page::Checkout);
    }

    #[test]
    fn quoted_checkout_can_requote() {
        let engine = FlowEngine::<ShopFlow>::default();
        let outcome = engine
            .apply(&FlowState::Quoted, &FlowEvent::ShippingRequested, &with_cart_and_customer())
            .expect("quoted -> shipping");
        assert_eq!(outcome.to, FlowState::ShippingEntry);
    }

    #[test]
    fn empty_generation_is_rejected() {
        let engine = FlowEngine::<ShopFlow>::default();
        let error = engine
            .apply(&FlowState::Empty, &FlowEvent::CartGenerated, &FlowContext::default())
            .expect_err("empty cart must not populate");
        assert!(matches!(error, FlowTransitionError::EmptyCart { .. }));
    }

    #[test]
    fn checkout_requires_a_cart() {
        let engine = FlowEngine::<ShopFlow>::default();
        let context = FlowContext { cart_is_empty: true, has_customer: false };
        let error = engine
            .apply(&FlowState::Populated, &FlowEvent::CheckoutRequested, &context)
            .expect_err("checkout with empty cart");
        assert!(matches!(
            error,
            FlowTransitionError::EmptyCart {
                state: FlowState::Populated,
                event: FlowEvent::CheckoutRequested
            }
        ));
    }

    #[test]
    fn quote_requires_customer_data() {
        let engine = FlowEngine::<ShopFlow>::default();
        let error = engine
            .apply(&FlowState::ShippingEntry, &FlowEvent::QuoteReceived, &with_cart())
            .expect_err("quote without customer");
        assert!(matches!(error, FlowTransitionError::MissingCustomer { .. }));
    }

    #[test]
    fn invalid_transition_is_rejected() {
        let engine = FlowEngine::<ShopFlow>::default();
        let error = engine
            .apply(&FlowState::Empty, &FlowEvent::ShippingRequested, &with_cart())
            .expect_err("home cannot jump to shipping");
        assert!(matches!(
            error,
            FlowTransitionError::InvalidTransition {
                state: FlowState::Empty,
                event: FlowEvent::ShippingRequested
            }
        ));

        let error = engine
            .apply(&FlowState::CheckoutReview, &FlowEvent::QuoteReceived, &with_cart())
            .expect_err("quotes only arrive on the shipping page");
        assert!(matches!(error, FlowTransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn clear_and_home_are_always_available() {
        let engine = FlowEngine::<ShopFlow>::default();
        let states = [
            FlowState::Empty,
            FlowState::Populated,
            FlowState::CheckoutReview,
            FlowState::ShippingEntry,
            FlowState::Quoted,
        ];

        for state in states {
            let cleared = engine
                .apply(&state, &FlowEvent::CartCleared, &FlowContext::default())
                .expect("clear is always allowed");
            assert_eq!(cleared.to, FlowState::Empty);

            let home = engine
                .apply(&state, &FlowEvent::HomeRequested, &with_cart())
                .expect("home is always allowed");
            assert_eq!(home.to, FlowState::Populated);

            let home_empty = engine
                .apply(&state, &FlowEvent::HomeRequested, &FlowContext::default())
                .expect("home with empty cart");
            assert_eq!(home_empty.to, FlowState::Empty);
        }
    }

    #[test]
    fn replay_is_deterministic_for_same_event_sequence() {
        let engine = FlowEngine::<ShopFlow>::default();
        let events = [
            FlowEvent::CartGenerated,
            FlowEvent::CheckoutRequested,
            FlowEvent::ShippingRequested,
            FlowEvent::QuoteReceived,
            FlowEvent::HomeRequested,
        ];

        let run = || {
            let mut state = engine.initial_state();
            let mut trail = Vec::new();
            for event in &events {
                let outcome = engine
                    .apply(&state, event, &with_cart_and_customer())
                    .expect("deterministic run");
                trail.push(outcome.actions);
                state = outcome.to;
            }
            (state, trail)
        };

        assert_eq!(run(), run());
        assert_eq!(run().0, FlowState::Populated);
    }
}
