use crate::constant::{HELP_NAME, HELP_SHORT};
use crate::errors::{ConfigError, ParseError};
use crate::handler::{identity, EvalOutcome, Handler};
use crate::interface::{ConsoleInterface, UserInterface};
use crate::key::ArgumentKey;
use crate::printer::Printer;
use crate::sources;
use crate::tokens::{Element, ElementKind, TokenStream};

/// How a group evaluation concluded (absent a parse error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// The full stream was consumed and all end-of-parse checks passed.
    Complete,
    /// Help was requested (`-h`/`--help`); no end-of-parse checks were run.
    Help,
    /// A command handoff terminated evaluation early; no end-of-parse checks
    /// were run.
    Command,
}

/// The orchestrator: a named, ordered collection of handlers sharing one
/// command line.
///
/// Each element is offered to the handlers in registration order (the most
/// recent consumer first, so that a value lands on the handler whose flag
/// just matched); the first to consume it wins. An element no handler
/// recognizes is a [`ParseError::UnknownArgument`].
///
/// The group claims `-h`/`--help` for itself.
pub struct Group<'a> {
    program: String,
    handlers: Vec<(String, Handler<'a>)>,
    help_key: ArgumentKey,
    interface: Box<dyn UserInterface>,
    use_arguments_file: bool,
    environment: Option<String>,
    last_consumer: Option<usize>,
}

impl<'a> std::fmt::Debug for Group<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("program", &self.program)
            .field("handlers", &self.handlers)
            .field("use_arguments_file", &self.use_arguments_file)
            .field("environment", &self.environment)
            .field("last_consumer", &self.last_consumer)
            .finish()
    }
}

impl<'a> Group<'a> {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            handlers: Vec::default(),
            help_key: ArgumentKey::from_forms(Some(HELP_SHORT), Some(HELP_NAME.to_string())),
            interface: Box::new(ConsoleInterface::default()),
            use_arguments_file: false,
            environment: None,
            last_consumer: None,
        }
    }

    /// Register a handler under a symbolic name (used to group the usage
    /// listing). Names must be unique; no argument key may be claimed twice
    /// across the group.
    pub fn register(mut self, name: impl Into<String>, handler: Handler<'a>) -> Result<Self, ConfigError> {
        let name = name.into();

        if self.handlers.iter().any(|(n, _)| n == &name) {
            return Err(ConfigError::DuplicateHandler(name));
        }

        for key in handler.all_keys() {
            if key.collides(&self.help_key)
                || self.handlers.iter().any(|(_, h)| {
                    h.all_keys().iter().any(|existing| existing.collides(&key))
                })
            {
                return Err(ConfigError::DuplicateKey(key.to_string()));
            }
        }

        self.handlers.push((name, handler));
        Ok(self)
    }

    /// Consult `$HOME/.progargs/<program>.pa` before the literal command
    /// line: each non-blank, non-`#` line is evaluated as one argument set.
    pub fn arguments_file(mut self) -> Self {
        self.use_arguments_file = true;
        self
    }

    /// Consult an environment variable (the program name uppercased, `-`
    /// mapped to `_`) before the literal command line.
    pub fn environment(mut self) -> Self {
        self.environment = Some(sources::environment_name(&self.program));
        self
    }

    /// Consult an explicitly named environment variable before the literal
    /// command line.
    pub fn environment_named(mut self, name: impl Into<String>) -> Self {
        self.environment = Some(name.into());
        self
    }

    #[cfg(test)]
    fn interface(mut self, interface: impl UserInterface + 'static) -> Self {
        self.interface = Box::new(interface);
        self
    }

    /// Evaluate pre-parse sources and the argument list (excluding argv[0]).
    pub fn eval_arguments(&mut self, tokens: &[&str]) -> Result<Evaluation, ParseError> {
        if self.use_arguments_file {
            for set in sources::arguments_file(&self.program) {
                if let Some(evaluation) = self.eval_partial(set)? {
                    return Ok(evaluation);
                }
            }
        }

        if let Some(name) = self.environment.clone() {
            if let Some(set) = sources::environment_arguments(&name) {
                if let Some(evaluation) = self.eval_partial(set)? {
                    return Ok(evaluation);
                }
            }
        }

        let literal = tokens.iter().map(|token| token.to_string()).collect();

        if let Some(evaluation) = self.eval_partial(literal)? {
            return Ok(evaluation);
        }

        for (_, handler) in &mut self.handlers {
            handler.finish()?;
        }

        Ok(Evaluation::Complete)
    }

    /// Evaluate the process command line the convenience way: print every
    /// error (prefixed with the program name) and exit non-zero; print usage
    /// and exit zero on help.
    pub fn eval_or_exit(&mut self) {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let tokens: Vec<&str> = args.iter().map(AsRef::as_ref).collect();

        if let Err(code) = self.eval_tokens_or_code(&tokens) {
            std::process::exit(code);
        }
    }

    fn eval_tokens_or_code(&mut self, tokens: &[&str]) -> Result<Evaluation, i32> {
        match self.eval_arguments(tokens) {
            Ok(Evaluation::Help) => {
                self.print_usage();
                Err(0)
            }
            Ok(evaluation) => Ok(evaluation),
            Err(error) => {
                self.interface
                    .print_error(format!("{}: {error}", self.program));
                Err(1)
            }
        }
    }

    /// Render the usage listing to the configured interface.
    pub fn print_usage(&self) {
        self.usage_printer().print_usage(self.interface.as_ref());
    }

    fn usage_printer(&self) -> Printer {
        let sections = self
            .handlers
            .iter()
            .map(|(name, handler)| (name.clone(), handler.usage_entries()))
            .collect();
        Printer::terminal(&self.program, sections)
    }

    /// Clear all parse-time state, for evaluation isolation.
    pub fn reset(&mut self) {
        for (_, handler) in &mut self.handlers {
            handler.reset();
        }

        self.last_consumer = None;
    }

    /// Evaluate one argument set without the end-of-parse checks.
    /// `Some(..)` means evaluation terminated and must not continue.
    fn eval_partial(&mut self, args: Vec<String>) -> Result<Option<Evaluation>, ParseError> {
        let mut stream = TokenStream::new(args);

        while let Some(element) = stream.next_element() {
            if self.is_help(&element) {
                return Ok(Some(Evaluation::Help));
            }

            match self.offer(&element, &mut stream)? {
                EvalOutcome::Consumed => {}
                EvalOutcome::Last => return Ok(Some(Evaluation::Command)),
                EvalOutcome::Unknown => {
                    return Err(ParseError::UnknownArgument(identity(&element)));
                }
            }
        }

        Ok(None)
    }

    fn is_help(&self, element: &Element) -> bool {
        match &element.kind {
            ElementKind::Short(short) => self.help_key.short() == Some(*short),
            ElementKind::Long(name) => self.help_key.long() == Some(name.as_str()),
            _ => false,
        }
    }

    fn offer(
        &mut self,
        element: &Element,
        stream: &mut TokenStream,
    ) -> Result<EvalOutcome, ParseError> {
        let mut order: Vec<usize> = (0..self.handlers.len()).collect();

        if let Some(last) = self.last_consumer {
            order.retain(|index| *index != last);
            order.insert(0, last);
        }

        for index in order {
            match self.handlers[index].1.eval_single(element, stream)? {
                EvalOutcome::Unknown => continue,
                outcome => {
                    self.last_consumer = Some(index);
                    return Ok(outcome);
                }
            }
        }

        Ok(EvalOutcome::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Scalar, Switch};
    use crate::handler::Argument;
    use crate::interface::util::{channel_interface, InMemoryInterface};
    use crate::test::assert_contains;

    #[test]
    fn routes_across_handlers() {
        // Setup
        let (mut count, mut file) = (0u32, String::default());
        let counts = Handler::new()
            .add(Argument::value("n,number", Scalar::new(&mut count)).unwrap())
            .unwrap();
        let files = Handler::new()
            .add(Argument::value("f,file", Scalar::new(&mut file)).unwrap())
            .unwrap();
        let mut group = Group::new("prog")
            .register("counts", counts)
            .unwrap()
            .register("files", files)
            .unwrap();

        // Execute
        let evaluation = group
            .eval_arguments(&["-f", "input.txt", "-n", "5"])
            .unwrap();

        // Verify
        assert_eq!(evaluation, Evaluation::Complete);
        drop(group);
        assert_eq!(count, 5);
        assert_eq!(file, "input.txt");
    }

    #[test]
    fn unknown_across_all_handlers() {
        let mut verbose = false;
        let handler = Handler::new()
            .add(Argument::flag("v", Switch::new(&mut verbose, true)).unwrap())
            .unwrap();
        let mut group = Group::new("prog").register("main", handler).unwrap();

        assert_eq!(
            group.eval_arguments(&["-x"]).unwrap_err(),
            ParseError::UnknownArgument("x".to_string())
        );
    }

    #[test]
    fn duplicate_handler_name() {
        let error = Group::new("prog")
            .register("main", Handler::new())
            .unwrap()
            .register("main", Handler::new())
            .unwrap_err();

        assert_eq!(error, ConfigError::DuplicateHandler("main".to_string()));
    }

    #[test]
    fn cross_handler_key_collision() {
        let (mut a, mut b) = (false, false);
        let first = Handler::new()
            .add(Argument::flag("v,verbose", Switch::new(&mut a, true)).unwrap())
            .unwrap();
        let second = Handler::new()
            .add(Argument::flag("v,velocity", Switch::new(&mut b, true)).unwrap())
            .unwrap();

        let error = Group::new("prog")
            .register("first", first)
            .unwrap()
            .register("second", second)
            .unwrap_err();

        assert_eq!(error, ConfigError::DuplicateKey("-v, --velocity".to_string()));
    }

    #[test]
    fn help_key_reserved() {
        let mut host = String::default();
        let handler = Handler::new()
            .add(Argument::value("h,host", Scalar::new(&mut host)).unwrap())
            .unwrap();

        let error = Group::new("prog").register("main", handler).unwrap_err();

        assert_eq!(error, ConfigError::DuplicateKey("-h, --host".to_string()));
    }

    #[test]
    fn help_intercepted() {
        let mut verbose = false;
        let handler = Handler::new()
            .add(Argument::flag("v", Switch::new(&mut verbose, true)).unwrap())
            .unwrap();
        let mut group = Group::new("prog").register("main", handler).unwrap();

        assert_eq!(
            group.eval_arguments(&["--help"]).unwrap(),
            Evaluation::Help
        );
        group.reset();
        assert_eq!(
            group.eval_arguments(&["-h"]).unwrap(),
            Evaluation::Help
        );
    }

    #[test]
    fn command_handoff_stops_group() {
        let (mut verbose, mut command) = (false, String::default());
        let flags = Handler::new()
            .add(
                Argument::flag("v", Switch::new(&mut verbose, true))
                    .unwrap()
                    .mandatory(),
            )
            .unwrap();
        let exec = Handler::new()
            .add(
                Argument::value("e,exec", Scalar::new(&mut command))
                    .unwrap()
                    .command(),
            )
            .unwrap();
        let mut group = Group::new("prog")
            .register("flags", flags)
            .unwrap()
            .register("exec", exec)
            .unwrap();

        // The handoff skips the end-of-parse sweep, so the missing mandatory
        // '-v' is not reported.
        let evaluation = group
            .eval_arguments(&["--exec", "cmd", "arg1", "arg2"])
            .unwrap();

        assert_eq!(evaluation, Evaluation::Command);
        drop(group);
        assert_eq!(command, "cmd arg1 arg2");
    }

    #[test]
    fn mandatory_checked_across_group() {
        let mut count = 0u32;
        let handler = Handler::new()
            .add(
                Argument::value("n", Scalar::new(&mut count))
                    .unwrap()
                    .mandatory(),
            )
            .unwrap();
        let mut group = Group::new("prog").register("main", handler).unwrap();

        assert_eq!(
            group.eval_arguments(&[]).unwrap_err(),
            ParseError::MissingMandatory("n".to_string())
        );
    }

    #[test]
    fn environment_source() {
        let mut count = 0u32;
        let handler = Handler::new()
            .add(Argument::value("n,number", Scalar::new(&mut count)).unwrap())
            .unwrap();
        let mut group = Group::new("prog")
            .environment_named("CLARG_GROUP_ENVIRONMENT_SOURCE_TEST")
            .register("main", handler)
            .unwrap();

        std::env::set_var("CLARG_GROUP_ENVIRONMENT_SOURCE_TEST", "--number 7");
        let result = group.eval_arguments(&[]);
        std::env::remove_var("CLARG_GROUP_ENVIRONMENT_SOURCE_TEST");

        assert_eq!(result.unwrap(), Evaluation::Complete);
        drop(group);
        assert_eq!(count, 7);
    }

    #[test]
    fn usage_listing() {
        let (mut count, mut file) = (0u32, String::default());
        let counts = Handler::new()
            .add(
                Argument::value("n,number", Scalar::new(&mut count))
                    .unwrap()
                    .mandatory()
                    .help("How many times to run."),
            )
            .unwrap();
        let files = Handler::new()
            .add(Argument::value("f,file", Scalar::new(&mut file)).unwrap())
            .unwrap();
        let interface = InMemoryInterface::default();
        let group = Group::new("prog")
            .register("counts", counts)
            .unwrap()
            .register("files", files)
            .unwrap();

        group.usage_printer().print_usage(&interface);

        let message = interface.consume_message();
        assert!(message.starts_with("usage: prog [-h] -n, --number <u32> [-f, --file <String>]"));
        assert_contains!(message, "counts:");
        assert_contains!(message, "How many times to run.");
        assert_contains!(message, "files:");
    }

    #[test]
    fn exit_code_on_help() {
        let (sender, receiver) = channel_interface();
        let mut verbose = false;
        let handler = Handler::new()
            .add(Argument::flag("v", Switch::new(&mut verbose, true)).unwrap())
            .unwrap();
        let mut group = Group::new("prog")
            .interface(sender)
            .register("main", handler)
            .unwrap();

        let result = group.eval_tokens_or_code(&["--help"]);

        assert_eq!(result, Err(0));
        drop(group);
        let (message, error) = receiver.consume();
        assert_contains!(message.unwrap(), "usage: prog [-h] [-v]");
        assert_eq!(error, None);
    }

    #[test]
    fn exit_code_on_error() {
        let (sender, receiver) = channel_interface();
        let mut verbose = false;
        let handler = Handler::new()
            .add(Argument::flag("v", Switch::new(&mut verbose, true)).unwrap())
            .unwrap();
        let mut group = Group::new("prog")
            .interface(sender)
            .register("main", handler)
            .unwrap();

        let result = group.eval_tokens_or_code(&["-x"]);

        assert_eq!(result, Err(1));
        drop(group);
        let (message, error) = receiver.consume();
        assert_eq!(message, None);
        assert_eq!(error.unwrap(), "prog: Unknown argument 'x'.");
    }

    #[test]
    fn debug_output() {
        let group = Group::new("prog").register("main", Handler::new()).unwrap();

        assert_contains!(format!("{group:?}"), "prog");
    }

    #[test]
    fn packed_suffix_claimed_by_owning_handler() {
        // The suffix check consults only the registry of the handler that
        // matched the flag, so another handler's '-v' is taken as the value.
        let (mut file, mut verbose) = (String::default(), false);
        let files = Handler::new()
            .add(Argument::value("f", Scalar::new(&mut file)).unwrap())
            .unwrap();
        let flags = Handler::new()
            .add(Argument::flag("v", Switch::new(&mut verbose, true)).unwrap())
            .unwrap();
        let mut group = Group::new("prog")
            .register("files", files)
            .unwrap()
            .register("flags", flags)
            .unwrap();

        group.eval_arguments(&["-fv"]).unwrap();

        drop(group);
        assert_eq!(file, "v");
        assert!(!verbose);
    }

    #[test]
    fn inversion_not_shared_across_handlers() {
        // The '!' arms the first handler in offer order; a match in another
        // handler does not consume it, leaving it dangling at end of stream.
        let (mut alpha, mut beta) = (Option::<bool>::None, Option::<bool>::None);
        let first = Handler::new()
            .add(
                Argument::flag("a", Switch::with_inverted(&mut alpha, Some(true), Some(false)))
                    .unwrap(),
            )
            .unwrap();
        let second = Handler::new()
            .add(
                Argument::flag("b", Switch::with_inverted(&mut beta, Some(true), Some(false)))
                    .unwrap(),
            )
            .unwrap();
        let mut group = Group::new("prog")
            .register("first", first)
            .unwrap()
            .register("second", second)
            .unwrap();

        assert_eq!(
            group.eval_arguments(&["!", "-b"]).unwrap_err(),
            ParseError::InvalidInversion("!".to_string())
        );
        drop(group);
        assert_eq!(alpha, None);
        assert_eq!(beta, Some(true));
    }

    #[test]
    fn reset_between_evaluations() {
        let mut count = 0u32;
        let handler = Handler::new()
            .add(Argument::value("n", Scalar::new(&mut count)).unwrap())
            .unwrap();
        let mut group = Group::new("prog").register("main", handler).unwrap();

        group.eval_arguments(&["-n", "1"]).unwrap();
        group.reset();
        group.eval_arguments(&["-n", "2"]).unwrap();

        drop(group);
        assert_eq!(count, 2);
    }
}
