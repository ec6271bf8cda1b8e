//! Containment of collaborator panics
//!
//! Collaborators (enhancers, OCR engines, redactors) are trait objects that
//! may be supplied by callers. A panic inside one is converted into an
//! ordinary stage failure instead of unwinding through the pipeline.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run `f`, turning a panic into `Err` with the panic message
pub fn catch_fault<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_fault_passes_value_through() {
        assert_eq!(catch_fault(|| 41 + 1), Ok(42));
    }

    #[test]
    fn test_catch_fault_captures_str_panic() {
        let result: Result<(), String> = catch_fault(|| panic!("engine exploded"));
        assert_eq!(result.unwrap_err(), "panicked: engine exploded");
    }

    #[test]
    fn test_catch_fault_captures_formatted_panic() {
        let code = 7;
        let result: Result<(), String> = catch_fault(|| panic!("exit code {code}"));
        assert_eq!(result.unwrap_err(), "panicked: exit code 7");
    }
}
