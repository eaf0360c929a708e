use crate::constraint::Constraint;
use crate::errors::{ConfigError, ParseError};
use crate::field::Settable;
use crate::key::ArgumentKey;
use crate::model::{Cardinality, ValueMode};
use crate::printer::UsageEntry;
use crate::registry::{ArgumentDescriptor, Registry};
use crate::tokens::{ControlToken, Element, ElementKind, TokenStream};

/// The result of offering one element to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EvalOutcome {
    /// The element was recognized and acted upon.
    Consumed,
    /// The element was recognized and terminates evaluation (command handoff).
    /// End-of-parse checks are skipped.
    Last,
    /// The element does not belong to this handler.
    Unknown,
}

/// One argument under construction, fed to [`Handler::add`].
///
/// The argument name (used in error and usage text) is the long form when one
/// exists, otherwise the short form.
///
/// ### Example
/// ```
/// use clarg::{Argument, Handler, Switch};
///
/// let mut verbose = false;
/// let mut handler = Handler::new()
///     .add(Argument::flag("v,verbose", Switch::new(&mut verbose, true)).unwrap())
///     .unwrap();
/// handler.eval_arguments(&["--verbose"]).unwrap();
/// drop(handler);
/// assert!(verbose);
/// ```
pub struct Argument<'a> {
    key: Option<ArgumentKey>,
    name: String,
    settable: Box<dyn Settable + 'a>,
    value_mode: ValueMode,
    cardinality: Cardinality,
    mandatory: bool,
    help: Option<String>,
}

impl<'a> Argument<'a> {
    fn keyed(
        spec: &str,
        settable: impl Settable + 'a,
        value_mode: ValueMode,
    ) -> Result<Self, ConfigError> {
        let key = ArgumentKey::from_spec(spec)?;
        let name = match key.long() {
            Some(long) => long.to_string(),
            None => key
                .short()
                .expect("internal error - a key without a long form must have a short form")
                .to_string(),
        };
        let cardinality = if settable.takes_multiple() {
            Cardinality::at_least(0)
        } else {
            Cardinality::default()
        };
        Ok(Self {
            key: Some(key),
            name,
            settable: Box::new(settable),
            value_mode,
            cardinality,
            mandatory: false,
            help: None,
        })
    }

    /// An argument that takes no value (ex: `--verbose`).
    pub fn flag(spec: &str, settable: impl Settable + 'a) -> Result<Self, ConfigError> {
        Self::keyed(spec, settable, ValueMode::None)
    }

    /// An argument that must be followed by a value (ex: `--count 5`).
    pub fn value(spec: &str, settable: impl Settable + 'a) -> Result<Self, ConfigError> {
        Self::keyed(spec, settable, ValueMode::Required)
    }

    /// An argument that may be followed by a value, but does not require one.
    pub fn optional_value(spec: &str, settable: impl Settable + 'a) -> Result<Self, ConfigError> {
        Self::keyed(spec, settable, ValueMode::Optional)
    }

    /// A positional argument, matched by stream position rather than by key.
    pub fn free(name: impl Into<String>, settable: impl Settable + 'a) -> Self {
        let cardinality = if settable.takes_multiple() {
            Cardinality::at_least(0)
        } else {
            Cardinality::default()
        };
        Self {
            key: None,
            name: name.into(),
            settable: Box::new(settable),
            value_mode: ValueMode::Required,
            cardinality,
            mandatory: false,
            help: None,
        }
    }

    /// Switch this argument to command handoff: upon match, the rest of the
    /// command line is assigned verbatim (space-joined) and evaluation stops.
    pub fn command(mut self) -> Self {
        self.value_mode = ValueMode::Command;
        self
    }

    /// Require that this argument appear at least once.
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Restrict how many times this argument may appear.
    pub fn cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Attach usage text.
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help.replace(text.into());
        self
    }

    fn into_parts(self) -> (Option<ArgumentKey>, ArgumentDescriptor<'a>) {
        let descriptor = ArgumentDescriptor::new(
            self.name,
            self.settable,
            self.value_mode,
            self.cardinality,
            self.mandatory,
            self.help,
        );
        (self.key, descriptor)
    }
}

/// A value element is expected next, for the descriptor at `index`.
#[derive(Debug, Clone, Copy)]
struct Pending {
    index: usize,
    required: bool,
}

/// Transient per-evaluation state, cleared by [`Handler::reset`].
#[derive(Debug, Default)]
struct ParseState {
    pending: Option<Pending>,
    // Index of a multi-value descriptor still accepting bare values.
    continuation: Option<usize>,
    // Armed by the `!` control token, consumed by the next match.
    inverted: bool,
    active_sub: Option<usize>,
}

/// The resolver: matches a stream of elements against registered arguments
/// and drives their destinations.
///
/// A handler evaluates standalone via [`Handler::eval_arguments`], or as one
/// member of a [`Group`](crate::Group). Standalone, an unrecognized element
/// is a hard [`ParseError::UnknownArgument`]; in a group it means "offer the
/// element to the next handler".
pub struct Handler<'a> {
    registry: Registry<'a>,
    free_value: Option<ArgumentDescriptor<'a>>,
    sub_handlers: Vec<(ArgumentKey, Handler<'a>)>,
    constraints: Vec<Box<dyn Constraint + 'a>>,
    bracket_open: Option<Box<dyn FnMut() -> Result<(), ParseError> + 'a>>,
    bracket_close: Option<Box<dyn FnMut() -> Result<(), ParseError> + 'a>>,
    state: ParseState,
    // Whether this handler (as a sub-handler) was activated during the parse.
    entered: bool,
}

impl<'a> std::fmt::Debug for Handler<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("registry", &self.registry)
            .field("free_value", &self.free_value)
            .field("sub_handlers", &self.sub_handlers)
            .field("state", &self.state)
            .field("entered", &self.entered)
            .finish()
    }
}

impl<'a> Default for Handler<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Handler<'a> {
    pub fn new() -> Self {
        Self {
            registry: Registry::default(),
            free_value: None,
            sub_handlers: Vec::default(),
            constraints: Vec::default(),
            bracket_open: None,
            bracket_close: None,
            state: ParseState::default(),
            entered: false,
        }
    }

    /// Register an argument.
    pub fn add(mut self, argument: Argument<'a>) -> Result<Self, ConfigError> {
        match argument.value_mode {
            ValueMode::None | ValueMode::Command => {
                let above_one = argument.cardinality.min() > 1
                    || argument.cardinality.max().map_or(true, |max| max > 1);
                if above_one {
                    return Err(ConfigError::InvalidValueModeCardinality {
                        name: argument.name.clone(),
                        mode: argument.value_mode.to_string(),
                    });
                }
            }
            ValueMode::Optional | ValueMode::Required => {}
        }

        let (key, descriptor) = argument.into_parts();

        match key {
            Some(key) => {
                if self.sub_key_collides(&key) {
                    return Err(ConfigError::DuplicateKey(key.to_string()));
                }
                self.registry.add(key, descriptor)?;
            }
            None => {
                if let Some(existing) = &self.free_value {
                    return Err(ConfigError::DuplicateFreeValue(existing.name().to_string()));
                }
                self.free_value = Some(descriptor);
            }
        }

        Ok(self)
    }

    /// Register a nested handler, activated by its key and offered every
    /// subsequent element until it declines one.
    pub fn sub_handler(mut self, spec: &str, handler: Handler<'a>) -> Result<Self, ConfigError> {
        let key = ArgumentKey::from_spec(spec)?;

        if self.registry.collides_with(&key) || self.sub_key_collides(&key) {
            return Err(ConfigError::DuplicateKey(key.to_string()));
        }

        self.sub_handlers.push((key, handler));
        Ok(self)
    }

    /// Register a cross-argument constraint.
    pub fn constraint(mut self, constraint: impl Constraint + 'a) -> Self {
        self.constraints.push(Box::new(constraint));
        self
    }

    /// Register a callback for the standalone `(` control token.
    pub fn on_bracket_open(
        mut self,
        callback: impl FnMut() -> Result<(), ParseError> + 'a,
    ) -> Self {
        self.bracket_open.replace(Box::new(callback));
        self
    }

    /// Register a callback for the standalone `)` control token.
    pub fn on_bracket_close(
        mut self,
        callback: impl FnMut() -> Result<(), ParseError> + 'a,
    ) -> Self {
        self.bracket_close.replace(Box::new(callback));
        self
    }

    fn sub_key_collides(&self, key: &ArgumentKey) -> bool {
        self.sub_handlers.iter().any(|(k, _)| k.collides(key))
    }

    /// Every key claimed by this handler, including nested ones.
    pub(crate) fn all_keys(&self) -> Vec<ArgumentKey> {
        let mut keys: Vec<ArgumentKey> = self.registry.keys().cloned().collect();

        for (key, sub) in &self.sub_handlers {
            keys.push(key.clone());
            keys.extend(sub.all_keys());
        }

        keys
    }

    pub(crate) fn usage_entries(&self) -> Vec<UsageEntry> {
        let mut entries: Vec<UsageEntry> = self
            .registry
            .descriptors()
            .map(|(key, descriptor)| UsageEntry::keyed(key, descriptor))
            .collect();

        if let Some(free) = &self.free_value {
            entries.push(UsageEntry::free(free));
        }

        for (_, sub) in &self.sub_handlers {
            entries.extend(sub.usage_entries());
        }

        entries
    }

    /// Evaluate a full argument list (excluding argv[0]).
    pub fn eval_arguments(&mut self, tokens: &[&str]) -> Result<(), ParseError> {
        let mut stream = TokenStream::new(tokens.iter().map(|token| token.to_string()).collect());
        self.eval_stream(&mut stream)
    }

    pub(crate) fn eval_stream(&mut self, stream: &mut TokenStream) -> Result<(), ParseError> {
        while let Some(element) = stream.next_element() {
            match self.eval_single(&element, stream)? {
                EvalOutcome::Consumed => {}
                EvalOutcome::Last => return Ok(()),
                EvalOutcome::Unknown => {
                    return Err(ParseError::UnknownArgument(identity(&element)));
                }
            }
        }

        self.finish()
    }

    /// Offer one element. The stream is consulted for lookahead state (packed
    /// suffixes, command handoff) but never advanced past the offered element
    /// unless the element matched.
    pub(crate) fn eval_single(
        &mut self,
        element: &Element,
        stream: &mut TokenStream,
    ) -> Result<EvalOutcome, ParseError> {
        if let Some(index) = self.state.active_sub {
            match self.sub_handlers[index].1.eval_single(element, stream)? {
                EvalOutcome::Unknown => {
                    // The nested handler declined; resume matching locally.
                    self.state.active_sub = None;
                }
                outcome => return Ok(outcome),
            }
        }

        if let Some(pending) = self.state.pending {
            if let ElementKind::Value(value) = &element.kind {
                self.state.pending = None;
                return self.feed_value(pending.index, value);
            }

            if pending.required {
                return Err(ParseError::MissingValue(
                    self.registry.get(pending.index).name().to_string(),
                ));
            }

            // Optional mode with no value: the argument is still set.
            self.state.pending = None;
            self.registry.get_mut(pending.index).apply_set(false)?;
        }

        match &element.kind {
            ElementKind::Value(value) => self.eval_value(value, stream),
            ElementKind::Short(short) => {
                if let Some(index) = self.find_sub(|key| key.short() == Some(*short)) {
                    return Ok(self.enter_sub(index));
                }

                match self.registry.find_short(*short) {
                    Some(index) => self.matched(index, element, stream),
                    None => Ok(EvalOutcome::Unknown),
                }
            }
            ElementKind::Long(name) => {
                if let Some(index) = self.find_sub(|key| key.long() == Some(name.as_str())) {
                    return Ok(self.enter_sub(index));
                }

                match self.registry.find_long(name)? {
                    Some(index) => self.matched(index, element, stream),
                    None => Ok(EvalOutcome::Unknown),
                }
            }
            ElementKind::Control(control) => self.eval_control(*control),
        }
    }

    /// End-of-stream checks. Only run when evaluation was not terminated by
    /// a command handoff.
    pub(crate) fn finish(&mut self) -> Result<(), ParseError> {
        if let Some(pending) = self.state.pending.take() {
            if pending.required {
                return Err(ParseError::MissingValue(
                    self.registry.get(pending.index).name().to_string(),
                ));
            }

            self.registry.get_mut(pending.index).apply_set(false)?;
        }

        if self.state.inverted {
            return Err(ParseError::InvalidInversion("!".to_string()));
        }

        self.registry.check_mandatory_cardinality()?;

        if let Some(free) = &self.free_value {
            free.check_mandatory_cardinality()?;
        }

        for (_, sub) in &mut self.sub_handlers {
            if sub.entered {
                sub.finish()?;
            }
        }

        for constraint in &self.constraints {
            constraint.check_end_condition()?;
        }

        Ok(())
    }

    /// Clear all parse-time state, for evaluation isolation.
    pub fn reset(&mut self) {
        self.registry.reset();

        if let Some(free) = &mut self.free_value {
            free.reset();
        }

        for (_, sub) in &mut self.sub_handlers {
            sub.reset();
            sub.entered = false;
        }

        for constraint in &mut self.constraints {
            constraint.reset();
        }

        self.state = ParseState::default();
    }

    fn find_sub(&self, predicate: impl Fn(&ArgumentKey) -> bool) -> Option<usize> {
        self.sub_handlers.iter().position(|(key, _)| predicate(key))
    }

    fn enter_sub(&mut self, index: usize) -> EvalOutcome {
        #[cfg(feature = "tracing_debug")]
        tracing::debug!("delegating to sub-handler {}", self.sub_handlers[index].0);

        self.sub_handlers[index].1.entered = true;
        self.state.active_sub = Some(index);
        EvalOutcome::Consumed
    }

    fn eval_value(&mut self, value: &str, stream: &mut TokenStream) -> Result<EvalOutcome, ParseError> {
        if let Some(index) = self.state.continuation {
            return self.feed_value(index, value);
        }

        match &mut self.free_value {
            Some(free) => {
                if free.value_mode() == ValueMode::Command {
                    let remainder = stream.args_as_string(true);
                    free.record_occurrence();
                    free.apply_value(&remainder)?;
                    stream.drain();
                    return Ok(EvalOutcome::Last);
                }

                free.record_occurrence();
                free.apply_value(value)?;
                Ok(EvalOutcome::Consumed)
            }
            None => Ok(EvalOutcome::Unknown),
        }
    }

    fn eval_control(&mut self, control: ControlToken) -> Result<EvalOutcome, ParseError> {
        match control {
            ControlToken::BracketOpen => match &mut self.bracket_open {
                Some(callback) => {
                    callback()?;
                    Ok(EvalOutcome::Consumed)
                }
                None => Ok(EvalOutcome::Unknown),
            },
            ControlToken::BracketClose => match &mut self.bracket_close {
                Some(callback) => {
                    callback()?;
                    Ok(EvalOutcome::Consumed)
                }
                None => Ok(EvalOutcome::Unknown),
            },
            ControlToken::Invert => {
                self.state.inverted = true;
                Ok(EvalOutcome::Consumed)
            }
        }
    }

    /// A flag element matched the descriptor at `index`.
    fn matched(
        &mut self,
        index: usize,
        element: &Element,
        stream: &mut TokenStream,
    ) -> Result<EvalOutcome, ParseError> {
        self.state.continuation = None;

        let key = self.registry.key(index).clone();
        let inverted = std::mem::take(&mut self.state.inverted);

        #[cfg(feature = "tracing_debug")]
        tracing::debug!("matched '{}' (inverted: {inverted})", key);

        self.registry.get_mut(index).record_occurrence();
        self.notify_identified(&key)?;

        if inverted {
            // Inversion replaces the value; a destination that cannot be
            // inverted reports InvalidInversion here.
            self.registry.get_mut(index).apply_set(true)?;
            return Ok(EvalOutcome::Consumed);
        }

        match self.registry.get(index).value_mode() {
            ValueMode::None => {
                self.registry.get_mut(index).apply_set(false)?;
                Ok(EvalOutcome::Consumed)
            }
            ValueMode::Command => {
                let remainder = stream.args_as_string(false);
                self.registry.get_mut(index).apply_value(&remainder)?;
                self.notify_value(&key, &remainder)?;
                stream.drain();
                Ok(EvalOutcome::Last)
            }
            mode @ (ValueMode::Required | ValueMode::Optional) => {
                if matches!(element.kind, ElementKind::Short(_)) {
                    self.claim_packed_suffix(stream);
                }

                self.state.pending = Some(Pending {
                    index,
                    required: mode == ValueMode::Required,
                });
                Ok(EvalOutcome::Consumed)
            }
        }
    }

    /// The unread suffix of a packed short token becomes the matched flag's
    /// value iff it cannot be a run of further registered short flags.
    fn claim_packed_suffix(&mut self, stream: &mut TokenStream) {
        if let Some(suffix) = stream.packed_suffix() {
            let first = suffix
                .chars()
                .next()
                .expect("internal error - a non-empty suffix must have a first character");

            if first == crate::constant::EQUALS || !self.registry.has_short(first) {
                stream.remainder_as_value();
            }
        }
    }

    fn feed_value(&mut self, index: usize, value: &str) -> Result<EvalOutcome, ParseError> {
        let key = self.registry.key(index).clone();
        let descriptor = self.registry.get_mut(index);
        descriptor.apply_value(value)?;

        if descriptor.takes_multiple() {
            // Each continuation value counts as an occurrence.
            if self.state.continuation.replace(index) == Some(index) {
                self.registry.get_mut(index).record_occurrence();
            }
        }

        self.notify_value(&key, value)?;
        Ok(EvalOutcome::Consumed)
    }

    fn notify_identified(&mut self, key: &ArgumentKey) -> Result<(), ParseError> {
        for constraint in &mut self.constraints {
            constraint.argument_identified(key);
            constraint.execute()?;
        }

        Ok(())
    }

    fn notify_value(&mut self, key: &ArgumentKey, value: &str) -> Result<(), ParseError> {
        for constraint in &mut self.constraints {
            constraint.value_identified(key, value);
            constraint.execute()?;
        }

        Ok(())
    }
}

/// The user-facing identity of an element, for "unknown argument" reporting.
pub(crate) fn identity(element: &Element) -> String {
    match &element.kind {
        ElementKind::Value(_) | ElementKind::Control(_) => element.raw.clone(),
        ElementKind::Short(short) => short.to_string(),
        ElementKind::Long(name) => name.clone(),
    }
}
