use std::cell::RefCell;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::rc::Rc;
use std::str::FromStr;

use thiserror::Error;

/// Behaviour to assign a destination variable from command line text.
///
/// This sits at the bottom of the resolver object graph so that destinations
/// of differing types may all be driven through a single registry.
pub trait Settable {
    /// Declare that the argument was matched, without a value.
    fn set(&mut self) -> Result<(), AssignError> {
        Ok(())
    }

    /// Declare that the argument was matched in inverted form (via the `!`
    /// control token).
    fn set_inverted(&mut self) -> Result<(), AssignError> {
        Err(AssignError::InversionUnsupported)
    }

    /// Assign a textual value to the destination.
    fn assign(&mut self, token: &str) -> Result<(), AssignError>;

    /// Human readable description of the expected destination type.
    fn describe_expected_type(&self) -> &'static str;

    /// Whether this destination accepts a continuation of separate values.
    fn takes_multiple(&self) -> bool {
        false
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssignError {
    #[error("cannot convert '{token}' to {expected}.")]
    Conversion { token: String, expected: String },

    #[error("inversion is not supported.")]
    InversionUnsupported,
}

/// Behaviour to collect values into a container (ex: `Vec<T>`, `HashSet<T>`).
pub trait Collectable<T> {
    /// Add an item to the collection.
    fn add(&mut self, item: T);
}

impl<T> Collectable<T> for Vec<T> {
    fn add(&mut self, item: T) {
        self.push(item);
    }
}

impl<T: Eq + std::hash::Hash> Collectable<T> for HashSet<T> {
    fn add(&mut self, item: T) {
        self.insert(item);
    }
}

/// A destination holding a single value of type `T`.
pub struct Scalar<'a, T> {
    variable: Rc<RefCell<&'a mut T>>,
}

impl<'a, T> Scalar<'a, T> {
    /// Create a scalar destination.
    pub fn new(variable: &'a mut T) -> Self {
        Self {
            variable: Rc::new(RefCell::new(variable)),
        }
    }
}

impl<'a, T> Settable for Scalar<'a, T>
where
    T: FromStr,
{
    fn assign(&mut self, token: &str) -> Result<(), AssignError> {
        let value = T::from_str(token).map_err(|_| AssignError::Conversion {
            token: token.to_string(),
            expected: std::any::type_name::<T>().to_string(),
        })?;
        **self.variable.borrow_mut() = value;
        Ok(())
    }

    fn describe_expected_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A destination that takes no value; matching assigns a pre-configured target.
///
/// An inverted target may be configured to support the `!` control token.
pub struct Switch<'a, T> {
    variable: Rc<RefCell<&'a mut T>>,
    target: Option<T>,
    inverted_target: Option<T>,
    invertible: bool,
}

impl<'a, T> Switch<'a, T> {
    /// Create a switch destination.
    pub fn new(variable: &'a mut T, target: T) -> Self {
        Self {
            variable: Rc::new(RefCell::new(variable)),
            target: Some(target),
            inverted_target: None,
            invertible: false,
        }
    }

    /// Create a switch destination that also supports inversion.
    pub fn with_inverted(variable: &'a mut T, target: T, inverted_target: T) -> Self {
        Self {
            variable: Rc::new(RefCell::new(variable)),
            target: Some(target),
            inverted_target: Some(inverted_target),
            invertible: true,
        }
    }
}

impl<'a, T> Settable for Switch<'a, T> {
    // Repeated occurrences are caught by the post-parse cardinality sweep;
    // only the first occurrence moves the target.
    fn set(&mut self) -> Result<(), AssignError> {
        if let Some(target) = self.target.take() {
            **self.variable.borrow_mut() = target;
        }
        Ok(())
    }

    fn set_inverted(&mut self) -> Result<(), AssignError> {
        if !self.invertible {
            return Err(AssignError::InversionUnsupported);
        }

        if let Some(target) = self.inverted_target.take() {
            **self.variable.borrow_mut() = target;
        }
        Ok(())
    }

    fn assign(&mut self, _token: &str) -> Result<(), AssignError> {
        unreachable!("internal error - must not assign on a Switch");
    }

    fn describe_expected_type(&self) -> &'static str {
        ""
    }
}

/// A destination mapping onto [`Option`], taking a single value.
pub struct OptionalValue<'a, T> {
    variable: Rc<RefCell<&'a mut Option<T>>>,
}

impl<'a, T> OptionalValue<'a, T> {
    /// Create an optional destination.
    pub fn new(variable: &'a mut Option<T>) -> Self {
        Self {
            variable: Rc::new(RefCell::new(variable)),
        }
    }
}

impl<'a, T> Settable for OptionalValue<'a, T>
where
    T: FromStr,
{
    fn assign(&mut self, token: &str) -> Result<(), AssignError> {
        let value = T::from_str(token).map_err(|_| AssignError::Conversion {
            token: token.to_string(),
            expected: std::any::type_name::<T>().to_string(),
        })?;
        self.variable.borrow_mut().replace(value);
        Ok(())
    }

    fn describe_expected_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A destination collecting multiple values into any [`Collectable`].
pub struct Collection<'a, C, T>
where
    C: 'a + Collectable<T>,
{
    variable: Rc<RefCell<&'a mut C>>,
    _phantom: PhantomData<T>,
}

impl<'a, C, T> Collection<'a, C, T>
where
    C: 'a + Collectable<T>,
{
    /// Create a collection destination.
    pub fn new(variable: &'a mut C) -> Self {
        Self {
            variable: Rc::new(RefCell::new(variable)),
            _phantom: PhantomData,
        }
    }
}

impl<'a, C, T> Settable for Collection<'a, C, T>
where
    T: FromStr,
    C: 'a + Collectable<T>,
{
    fn assign(&mut self, token: &str) -> Result<(), AssignError> {
        let value = T::from_str(token).map_err(|_| AssignError::Conversion {
            token: token.to_string(),
            expected: std::any::type_name::<T>().to_string(),
        })?;
        (**self.variable.borrow_mut()).add(value);
        Ok(())
    }

    fn describe_expected_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn takes_multiple(&self) -> bool {
        true
    }
}
