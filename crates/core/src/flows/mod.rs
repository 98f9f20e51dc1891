pub mod engine;
pub mod states;

pub use engine::{FlowDefinition, FlowEngine, FlowTransitionError, ShopFlow};
pub use states::{FlowAction, FlowContext, FlowEvent, FlowState, Page, TransitionOutcome};
