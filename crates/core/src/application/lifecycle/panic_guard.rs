// Panic isolation for processors and hooks
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Extract a readable message from a panic payload
pub(super) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Await `fut` in place, turning a panic into its message.
///
/// Used for hook calls, which borrow the record and cannot be spawned.
pub(super) async fn catch_panic<F: Future>(fut: F) -> Result<F::Output, String> {
    AssertUnwindSafe(fut).catch_unwind().await.map_err(panic_message)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn explode() -> u32 {
        panic!("hook blew up")
    }

    #[test]
    fn test_panic_message_str() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
    }

    #[test]
    fn test_panic_message_string() {
        assert_eq!(panic_message(Box::new(String::from("kaboom"))), "kaboom");
    }

    #[test]
    fn test_panic_message_unknown() {
        assert_eq!(panic_message(Box::new(42_u32)), "Unknown panic");
    }

    #[tokio::test]
    async fn test_catch_panic_passes_output_through() {
        assert_eq!(catch_panic(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_panic_returns_message() {
        assert_eq!(catch_panic(explode()).await, Err("hook blew up".to_string()));
    }
}
