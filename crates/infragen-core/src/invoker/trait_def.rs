//! The `GenerationInvoker` trait -- one capability, two protocols.
//!
//! The direct and session strategies both implement this trait. It is
//! object-safe so the server can hold a single `Arc<dyn GenerationInvoker>`
//! chosen from configuration at startup.

use async_trait::async_trait;

use super::types::{GenerationOutcome, InvocationMode};

/// Produces a [`GenerationOutcome`] for an assembled prompt.
///
/// # Errors
///
/// `invoke` never returns an error: backend failures, transport failures and
/// runs that end in a non-completed status are all reported as
/// `GenerationOutcome::failure`. Callers therefore never need a separate
/// error path.
#[async_trait]
pub trait GenerationInvoker: Send + Sync {
    /// Protocol this invoker drives.
    fn mode(&self) -> InvocationMode;

    /// Run one generation to its terminal state.
    async fn invoke(&self, prompt: &str) -> GenerationOutcome;
}

// Compile-time assertion: GenerationInvoker must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn GenerationInvoker) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoInvoker;

    #[async_trait]
    impl GenerationInvoker for EchoInvoker {
        fn mode(&self) -> InvocationMode {
            InvocationMode::Direct
        }

        async fn invoke(&self, prompt: &str) -> GenerationOutcome {
            GenerationOutcome::success(prompt)
        }
    }

    #[tokio::test]
    async fn invoker_is_usable_as_trait_object() {
        let invoker: Box<dyn GenerationInvoker> = Box::new(EchoInvoker);
        assert_eq!(invoker.mode(), InvocationMode::Direct);
        let outcome = invoker.invoke("hello").await;
        assert_eq!(outcome.text(), Some("hello"));
    }
}
