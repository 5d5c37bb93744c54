use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

thread_local! {
    /// Backtrace taken by the hook at the panic site, before unwinding.
    static PANIC_TRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// A panic caught by [`catch`].
pub(crate) struct Caught {
    pub message: String,
    /// Stack of the panicking frame. `None` only if the hook could not record it.
    pub backtrace: Option<Backtrace>,
}

impl fmt::Display for Caught {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(trace) = &self.backtrace {
            write!(f, "\n{trace}")?;
        }
        Ok(())
    }
}

/// Chains a hook in front of the current one that records the panic-site backtrace
/// for this thread. Installed once per process.
fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let _ = PANIC_TRACE.try_with(|slot| {
                if let Ok(mut slot) = slot.try_borrow_mut() {
                    *slot = Some(Backtrace::force_capture());
                }
            });
            previous(info);
        }));
    });
}

fn take_trace() -> Option<Backtrace> {
    PANIC_TRACE.try_with(|slot| slot.borrow_mut().take()).ok().flatten()
}

/// Runs `f`, turning a panic into a [`Caught`] that carries the stack of the frame
/// that panicked.
pub(crate) fn catch<T>(f: impl FnOnce() -> T) -> Result<T, Caught> {
    install_hook();
    take_trace();
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| Caught {
        message: panic_message(payload.as_ref()).to_owned(),
        backtrace: take_trace(),
    })
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use std::backtrace::BacktraceStatus;

    use super::*;

    #[inline(never)]
    fn fail_deep(depth: u32) -> u32 {
        if depth == 0 {
            panic!("bottom reached");
        }
        fail_deep(depth - 1) + 1
    }

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let s = panic::catch_unwind(|| panic!("static")).unwrap_err();
        assert_eq!(panic_message(s.as_ref()), "static");

        let n = 3;
        let owned = panic::catch_unwind(|| panic!("owned {n}")).unwrap_err();
        assert_eq!(panic_message(owned.as_ref()), "owned 3");
    }

    #[test]
    fn catch_records_trace_at_panic_site() {
        let caught = catch(|| fail_deep(3)).err().unwrap();
        assert_eq!(caught.message, "bottom reached");

        // Forced at the panic site, so present even without RUST_BACKTRACE.
        let trace = caught.backtrace.unwrap();
        assert_eq!(trace.status(), BacktraceStatus::Captured);
    }

    #[test]
    fn catch_passes_values_through_and_leaves_no_trace() {
        assert_eq!(catch(|| 7).ok(), Some(7));
        assert!(take_trace().is_none());
    }

    #[test]
    fn trace_does_not_leak_into_later_catch() {
        let _ = panic::catch_unwind(|| fail_deep(0));
        let caught = catch(|| panic!("fresh")).err().unwrap();
        assert_eq!(caught.message, "fresh");
        assert!(take_trace().is_none());
    }
}
