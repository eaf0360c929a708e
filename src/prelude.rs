//! Traits which, typically, may be imported without concern: `use clarg::prelude::*`.

pub use crate::constraint::Constraint;
pub use crate::field::{Collectable, Settable};
