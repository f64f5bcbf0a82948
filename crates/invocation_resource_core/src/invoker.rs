use crate::contract::InvocationRequest;

/// Raw result of a call that reached the function.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InvocationOutcome {
    pub payload: Vec<u8>,
    /// Set when the function executed but reported an error.
    pub function_error: Option<String>,
}

/// Synchronous request/response invocation of a remote function.
///
/// `Err` carries an opaque transport failure. Implementations must not retry.
pub trait FunctionInvoker {
    fn invoke(&self, request: &InvocationRequest) -> Result<InvocationOutcome, String>;
}
