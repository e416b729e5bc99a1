//! Abstract states and the queries analyses run on reached sets of them.

use std::{any::Any, fmt::Debug, sync::Arc};

use crate::cfa::CfaNodeId;

use super::{iter_preorder, AsAny, PreorderIter, Wrappable};

pub trait AbstractState: AsAny + Debug + Send + Sync + 'static {
    fn wrapped_states(&self) -> &[Arc<dyn AbstractState>] {
        &[]
    }

    /// Whether this state violates the property under verification.
    fn is_target(&self) -> bool {
        false
    }

    /// The program location this state belongs to, if it tracks one.
    fn location(&self) -> Option<CfaNodeId> {
        None
    }
}

impl Wrappable for dyn AbstractState {
    fn wrapped(&self) -> &[Arc<Self>] {
        self.wrapped_states()
    }

    fn any_ref(&self) -> &dyn Any {
        self.as_any()
    }
}

pub fn as_iter(state: &dyn AbstractState) -> PreorderIter<'_, dyn AbstractState> {
    iter_preorder(state)
}

/// The state of type `S` nearest to `state` in pre-order, `state` included.
pub fn extract_state_by_type<S: AbstractState>(state: &dyn AbstractState) -> Option<&S> {
    super::extract_by_type::<S, dyn AbstractState>(state)
}

pub fn project_to_type<'a, S: AbstractState>(
    states: impl IntoIterator<Item = &'a dyn AbstractState>,
) -> impl Iterator<Item = &'a S> {
    super::project_to_type::<S, dyn AbstractState>(states)
}

/// Whether any state in the tree is a target state.
pub fn is_target_state(state: &dyn AbstractState) -> bool {
    as_iter(state).any(|s| s.is_target())
}

pub fn filter_target_states<'a>(
    states: impl IntoIterator<Item = &'a dyn AbstractState>,
) -> impl Iterator<Item = &'a dyn AbstractState> {
    states.into_iter().filter(|s| is_target_state(*s))
}

/// The first location found in pre-order.
pub fn extract_location(state: &dyn AbstractState) -> Option<CfaNodeId> {
    as_iter(state).find_map(|s| s.location())
}

pub fn extract_locations<'a>(
    states: impl IntoIterator<Item = &'a dyn AbstractState>,
) -> impl Iterator<Item = CfaNodeId> {
    states.into_iter().filter_map(extract_location)
}
