#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use invocation_resource_core::contract::InvocationRequest;
use invocation_resource_core::invoker::{FunctionInvoker, InvocationOutcome};

pub const RESULT_PAYLOAD: &str = "result-val";

/// Records every request and answers from a queue of scripted replies.
/// An empty queue answers with a successful [`RESULT_PAYLOAD`].
pub struct RecordingInvoker {
    requests: Mutex<Vec<InvocationRequest>>,
    replies: Mutex<VecDeque<Result<InvocationOutcome, String>>>,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
        }
    }

    pub fn expect_transport_error(&self, message: &str) {
        self.push_reply(Err(message.to_string()));
    }

    pub fn expect_function_error(&self) {
        self.push_reply(Ok(InvocationOutcome {
            payload: RESULT_PAYLOAD.as_bytes().to_vec(),
            function_error: Some("lambda-return-expected-error".to_string()),
        }));
    }

    pub fn expect_success(&self, payload: &str) {
        self.push_reply(Ok(InvocationOutcome {
            payload: payload.as_bytes().to_vec(),
            function_error: None,
        }));
    }

    pub fn requests(&self) -> Vec<InvocationRequest> {
        self.requests.lock().expect("poisoned mutex").clone()
    }

    /// Returns the requests recorded since the last call and forgets them.
    pub fn take_requests(&self) -> Vec<InvocationRequest> {
        std::mem::take(&mut *self.requests.lock().expect("poisoned mutex"))
    }

    fn push_reply(&self, reply: Result<InvocationOutcome, String>) {
        self.replies
            .lock()
            .expect("poisoned mutex")
            .push_back(reply);
    }
}

impl FunctionInvoker for RecordingInvoker {
    fn invoke(&self, request: &InvocationRequest) -> Result<InvocationOutcome, String> {
        self.requests
            .lock()
            .expect("poisoned mutex")
            .push(request.clone());
        self.replies
            .lock()
            .expect("poisoned mutex")
            .pop_front()
            .unwrap_or_else(|| {
                Ok(InvocationOutcome {
                    payload: RESULT_PAYLOAD.as_bytes().to_vec(),
                    function_error: None,
                })
            })
    }
}
