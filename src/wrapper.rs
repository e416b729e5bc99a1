//! # Wrapper Unwrapping
//!
//! Analyses compose: a composite state owns the states of its component
//! analyses, an ARG state owns the composite, and so on. Every such tree is
//! navigated through one capability, [`Wrappable`], which exposes the
//! directly wrapped children. A single-child wrapper is the
//! `wrapped().len() == 1` case; nothing treats it specially.
//!
//! The traversal helpers here are generic over the wrapped trait object
//! (`dyn AbstractState`, `dyn Precision`, `dyn ConfigurableProgramAnalysis`)
//! and are all pure: they borrow the tree and never mutate it, so they can
//! run concurrently on shared trees.

use std::{any::Any, sync::Arc};

pub mod cpas;
pub mod precisions;
pub mod states;

/// Upcast to `&dyn Any`, implemented for every sized `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A node of a wrapper tree.
pub trait Wrappable {
    fn wrapped(&self) -> &[Arc<Self>];

    /// The concrete node, for downcasting.
    fn any_ref(&self) -> &dyn Any;
}

/// Pre-order walk over a wrapper tree, root first. Cloning forks the walk at
/// its current position.
pub struct PreorderIter<'a, T: ?Sized> {
    stack: Vec<&'a T>,
}

impl<T: ?Sized> Clone for PreorderIter<'_, T> {
    fn clone(&self) -> Self {
        PreorderIter {
            stack: self.stack.clone(),
        }
    }
}

impl<'a, T: ?Sized + Wrappable> Iterator for PreorderIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // reversed so the first child is visited next
        self.stack
            .extend(node.wrapped().iter().rev().map(|child| &**child));
        Some(node)
    }
}

pub fn iter_preorder<T: ?Sized + Wrappable>(root: &T) -> PreorderIter<'_, T> {
    PreorderIter { stack: vec![root] }
}

/// The first node of type `U` in pre-order, the root included.
pub fn extract_by_type<U: Any, T: ?Sized + Wrappable>(root: &T) -> Option<&U> {
    iter_preorder(root).find_map(|node| node.any_ref().downcast_ref::<U>())
}

/// [`extract_by_type`] applied to each root; roots without a match are
/// skipped.
pub fn project_to_type<'a, U: Any, T: ?Sized + Wrappable + 'a>(
    roots: impl IntoIterator<Item = &'a T>,
) -> impl Iterator<Item = &'a U> {
    roots.into_iter().filter_map(extract_by_type::<U, T>)
}
