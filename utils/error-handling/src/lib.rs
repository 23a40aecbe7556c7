/// What the loop that hit an error does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorBranch {
    Break,
    Continue,
}

/// # Description
/// Unwraps a `Result` inside a loop of an async task. On error the error is converted with
/// `into()` and passed, together with `$sender`, to the user defined
/// `crate::status::handle_error(&Sender, E) -> ErrorBranch`, which reports it. The returned
/// [`ErrorBranch`] decides whether the enclosing loop breaks or continues.
///
/// NOTE: can only be used inside a loop of an async function.
///
/// # Example
/// ```ignore
/// loop {
///     let message = handle_result!(status_tx, receiver.recv().await);
/// }
/// ```
#[macro_export]
macro_rules! handle_result {
    ($sender:expr, $res:expr) => {
        match $res {
            Ok(val) => val,
            Err(e) => match crate::status::handle_error(&$sender, e.into()).await {
                $crate::ErrorBranch::Break => break,
                $crate::ErrorBranch::Continue => continue,
            },
        }
    };
}
