/// Destination for user-facing text: usage output and error lines.
///
/// Production code uses [`ConsoleInterface`]; tests swap in an in-memory
/// implementation to capture the output.
pub(crate) trait UserInterface {
    fn print(&self, message: String);
    fn print_error(&self, message: String);
}

#[derive(Default)]
pub(crate) struct ConsoleInterface {}

impl UserInterface for ConsoleInterface {
    fn print(&self, message: String) {
        println!("{message}");
    }

    fn print_error(&self, message: String) {
        eprintln!("{message}");
    }
}

#[cfg(test)]
pub(crate) mod util {
    use super::UserInterface;
    use std::cell::RefCell;
    use std::sync::mpsc;

    #[derive(Default)]
    pub(crate) struct InMemoryInterface {
        message: RefCell<Option<Vec<String>>>,
        error: RefCell<Option<Vec<String>>>,
    }

    impl UserInterface for InMemoryInterface {
        fn print(&self, message: String) {
            // print() may be called many times; concatenate the messages.
            self.message
                .borrow_mut()
                .get_or_insert_with(Vec::default)
                .push(message);
        }

        fn print_error(&self, message: String) {
            self.error
                .borrow_mut()
                .get_or_insert_with(Vec::default)
                .push(message);
        }
    }

    impl InMemoryInterface {
        pub(crate) fn consume(self) -> (Option<String>, Option<String>) {
            let InMemoryInterface { message, error } = self;

            (
                message.take().map(|messages| messages.join("\n")),
                error.take().map(|errors| errors.join("\n")),
            )
        }

        pub(crate) fn consume_message(self) -> String {
            let (message, error) = self.consume();
            assert_eq!(error, None);
            message.unwrap()
        }

        pub(crate) fn consume_error(self) -> String {
            let (message, error) = self.consume();
            assert_eq!(message, None);
            error.unwrap()
        }
    }

    /// A connected interface pair: the sender side is handed to the code
    /// under test (it is `'static`, unlike a borrowed [`InMemoryInterface`]),
    /// the receiver side collects the output.
    pub(crate) fn channel_interface() -> (SenderInterface, ReceiverInterface) {
        let (message_tx, message_rx) = mpsc::channel();
        let (error_tx, error_rx) = mpsc::channel();

        (
            SenderInterface {
                message_tx,
                error_tx,
            },
            ReceiverInterface {
                message_rx,
                error_rx,
            },
        )
    }

    pub(crate) struct SenderInterface {
        message_tx: mpsc::Sender<Option<String>>,
        error_tx: mpsc::Sender<Option<String>>,
    }

    impl Drop for SenderInterface {
        fn drop(&mut self) {
            self.message_tx.send(None).unwrap();
            self.error_tx.send(None).unwrap();
        }
    }

    impl UserInterface for SenderInterface {
        fn print(&self, message: String) {
            self.message_tx.send(Some(message)).unwrap();
        }

        fn print_error(&self, message: String) {
            self.error_tx.send(Some(message)).unwrap();
        }
    }

    pub(crate) struct ReceiverInterface {
        message_rx: mpsc::Receiver<Option<String>>,
        error_rx: mpsc::Receiver<Option<String>>,
    }

    impl ReceiverInterface {
        /// Blocks until the sender side is dropped.
        pub(crate) fn consume(self) -> (Option<String>, Option<String>) {
            (
                Self::drain(self.message_rx),
                Self::drain(self.error_rx),
            )
        }

        fn drain(receiver: mpsc::Receiver<Option<String>>) -> Option<String> {
            let mut collected: Option<Vec<String>> = None;

            while let Ok(Some(item)) = receiver.recv() {
                collected.get_or_insert_with(Vec::default).push(item);
            }

            collected.map(|items| items.join("\n"))
        }
    }
}
