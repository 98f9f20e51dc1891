use serde::{Deserialize, Serialize};

use crate::store::SessionState;

/// Screen the user is looking at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Page {
    Home,
    Checkout,
    Shipping,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    Empty,
    Populated,
    CheckoutReview,
    ShippingEntry,
    Quoted,
}

impl FlowState {
    pub fn page(&self) -> Page {
        match self {
            Self::Empty | Self::Populated => Page::Home,
            Self::CheckoutReview | Self::Quoted => Page::Checkout,
            Self::ShippingEntry => Page::Shipping,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEvent {
    CartGenerated,
    CheckoutRequested,
    ShippingRequested,
    QuoteReceived,
    HomeRequested,
    CartCleared,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlowContext {
    pub cart_is_empty: bool,
    pub has_customer: bool,
}

impl FlowContext {
    pub fn from_session(state: &SessionState) -> Self {
        Self { cart_is_empty: state.lines.is_empty(), has_customer: state.customer.is_some() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    Navigate(Page),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: FlowState,
    pub to: FlowState,
    pub event: FlowEvent,
    pub actions: Vec<FlowAction>,
}
