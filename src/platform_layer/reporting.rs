/*
 * The unhandled-error channel. A handler that panics while a message is being
 * dispatched is caught at the native callback boundary and reported here,
 * exactly once per panic, before control returns to the platform.
 *
 * A reporter can be installed per UI thread (the `Application` installs one
 * that shows a message box). Without one, reports go to the log. Reporting never
 * panics: a reporter that panics itself is contained and logged.
 */

use super::types::{Handle, Message};

use std::any::Any;
use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnhandledError {
    pub handle: Handle,
    pub message: Message,
    pub description: String,
}

type Reporter = Rc<dyn Fn(&UnhandledError)>;

thread_local! {
    static REPORTER: RefCell<Option<Reporter>> = const { RefCell::new(None) };
}

/// Installs the reporter for the calling thread, replacing any previous one.
pub fn set_unhandled_error_reporter(reporter: impl Fn(&UnhandledError) + 'static) {
    REPORTER.with(|slot| *slot.borrow_mut() = Some(Rc::new(reporter)));
}

pub fn clear_unhandled_error_reporter() {
    REPORTER.with(|slot| *slot.borrow_mut() = None);
}

pub fn report_unhandled(error: &UnhandledError) {
    log::error!(
        "Reporting: unhandled panic in handler for {:?}, message {:#06x}: {}",
        error.handle,
        error.message.id,
        error.description
    );
    // Clone out so a reporter may replace itself without a nested borrow.
    let reporter = REPORTER.with(|slot| slot.borrow().clone());
    if let Some(reporter) = reporter {
        if catch_unwind(AssertUnwindSafe(|| reporter(error))).is_err() {
            log::error!("Reporting: the unhandled-error reporter panicked; report dropped.");
        }
    }
}

/// Extracts readable text from a panic payload.
pub fn panic_description(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn sample_error() -> UnhandledError {
        UnhandledError {
            handle: Handle::from_raw(7).unwrap(),
            message: Message::new(0x8001, 0, 0),
            description: "boom".to_string(),
        }
    }

    #[test]
    fn installed_reporter_receives_the_error() {
        let seen = Rc::new(Cell::new(0));
        let seen_in_reporter = Rc::clone(&seen);
        set_unhandled_error_reporter(move |error| {
            assert_eq!(error.description, "boom");
            seen_in_reporter.set(seen_in_reporter.get() + 1);
        });

        report_unhandled(&sample_error());

        assert_eq!(seen.get(), 1);
        clear_unhandled_error_reporter();
    }

    #[test]
    fn panicking_reporter_is_contained() {
        set_unhandled_error_reporter(|_| panic!("reporter failure"));
        report_unhandled(&sample_error());
        clear_unhandled_error_reporter();
    }

    #[test]
    fn panic_description_reads_str_and_string_payloads() {
        let payload = catch_unwind(|| panic!("static text")).unwrap_err();
        assert_eq!(panic_description(payload.as_ref()), "static text");

        let payload = catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
        assert_eq!(panic_description(payload.as_ref()), "formatted 42");
    }
}
