//! Syntax tree abstraction for the tsb semantic core.
//!
//! Parsing is an external concern. This crate only defines the shape of the
//! tree the core consumes: an arena of nodes addressed by stable
//! [`NodeIndex`] values, each with a byte [`Span`](tsb_common::Span), a
//! modifier set and kind-specific data. Trees arrive either as JSON produced
//! by an external parser or are assembled in code with [`TreeBuilder`].

mod arena;
mod base;
mod builder;
mod kind;
mod node;

pub use arena::NodeArena;
pub use base::{NodeIndex, NodeList};
pub use builder::TreeBuilder;
pub use kind::SyntaxKind;
pub use node::{BinaryOperator, ModifierFlags, Node, NodeData, Slot};
