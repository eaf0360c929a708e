//! `clarg` tokenizes and resolves command lines through a handler/group
//! paradigm: destinations are plain variables, arguments bind to them through
//! a [`Handler`], and multiple handlers share one command line through a
//! [`Group`].
//!
//! ```
//! use clarg::{Argument, Group, Handler, Scalar, Switch};
//!
//! let mut verbose = false;
//! let mut count: u32 = 0;
//! let handler = Handler::new()
//!     .add(Argument::flag("v,verbose", Switch::new(&mut verbose, true)).unwrap())
//!     .unwrap()
//!     .add(
//!         Argument::value("n,number", Scalar::new(&mut count))
//!             .unwrap()
//!             .help("How many times to run."),
//!     )
//!     .unwrap();
//! let mut group = Group::new("demo").register("main", handler).unwrap();
//!
//! group.eval_arguments(&["--verbose", "-n", "3"]).unwrap();
//!
//! drop(group);
//! assert!(verbose);
//! assert_eq!(count, 3);
//! ```
mod constant;
mod constraint;
mod errors;
mod field;
mod group;
mod handler;
mod interface;
mod key;
mod model;
mod printer;
mod registry;
mod sources;
mod tokens;
pub mod prelude;

pub use constraint::{Constraint, MutuallyExclusive, RequiredTogether, ValueRelation};
pub use errors::{ConfigError, ParseError};
pub use field::{AssignError, Collectable, Collection, OptionalValue, Scalar, Settable, Switch};
pub use group::{Evaluation, Group};
pub use handler::{Argument, Handler};
pub use key::ArgumentKey;
pub use model::{Cardinality, ValueMode};

#[cfg(test)]
pub(crate) mod test {
    macro_rules! assert_contains {
        ($base:expr, $sub:expr) => {{
            let base = &$base;
            assert!(
                base.contains($sub),
                "'{b}' does not contain '{s}'",
                b = base,
                s = $sub,
            );
        }};
    }

    pub(crate) use assert_contains;
}
