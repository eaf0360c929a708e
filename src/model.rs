/// Whether an argument accepts a value on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    /// The argument never takes a value (ex: `--verbose`).
    None,
    /// The argument may take a value, but does not require one.
    Optional,
    /// The argument must be followed by a value.
    Required,
    /// The argument consumes the rest of the command line verbatim.
    /// Evaluation stops at this argument; the remainder is handed off as a single string.
    Command,
}

impl std::fmt::Display for ValueMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The allowed range of how many times an argument may be supplied.
///
/// The default is "at most once" (`Cardinality::at_most(1)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cardinality {
    min: usize,
    max: Option<usize>,
}

impl Cardinality {
    /// Precisely `n` occurrences.
    pub fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    /// Up to `n` occurrences, including zero.
    pub fn at_most(n: usize) -> Self {
        Self { min: 0, max: Some(n) }
    }

    /// At least `n` occurrences, unbounded above.
    pub fn at_least(n: usize) -> Self {
        Self { min: n, max: None }
    }

    /// Between `min` and `max` occurrences, inclusive.
    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub(crate) fn min(&self) -> usize {
        self.min
    }

    pub(crate) fn max(&self) -> Option<usize> {
        self.max
    }

    pub(crate) fn accepts(&self, observed: usize) -> bool {
        observed >= self.min
            && match self.max {
                Some(max) => observed <= max,
                None => true,
            }
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::at_most(1)
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) if self.min == max => write!(f, "[{}]", self.min),
            Some(max) => write!(f, "[{}, {max}]", self.min),
            None => write!(f, "[{}, ∞)", self.min),
        }
    }
}

#[cfg(test)]
use rand::{distributions::Standard, prelude::Distribution, Rng};

#[cfg(test)]
impl Distribution<Cardinality> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Cardinality {
        match rng.gen_range(0..3) {
            0 => {
                let max: u8 = rng.gen();
                Cardinality::between(rng.gen_range(0..=max) as usize, max as usize)
            }
            1 => Cardinality::at_least(rng.gen::<u8>() as usize),
            2 => Cardinality::exactly(rng.gen::<u8>() as usize),
            _ => unreachable!("internal error - impossible gen_range()"),
        }
    }
}
