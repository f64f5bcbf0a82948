use serde_json::json;

use crate::contract::{
    new_resource_id, payload_fingerprint, validate_config, InvocationRequest, ResourceConfig,
    ResourceState,
};
use crate::error::LifecycleError;
use crate::invoker::FunctionInvoker;
use crate::logging::{log_error, log_info};

const COMPONENT: &str = "lifecycle_handler";
const NEW_RESOURCE_LABEL: &str = "new resource";

/// Runs create, update, read and delete for one resource at a time.
///
/// Every call performs at most one invocation and never retries. The handler
/// does not diff: whoever calls [`LifecycleHandler::create_or_update`] has
/// already decided the resource must be re-applied.
pub struct LifecycleHandler<'a> {
    invoker: &'a dyn FunctionInvoker,
}

impl<'a> LifecycleHandler<'a> {
    pub fn new(invoker: &'a dyn FunctionInvoker) -> Self {
        Self { invoker }
    }

    /// Invokes the configured function and returns the state to commit.
    ///
    /// `prior` is never modified; on error the caller keeps it as is.
    pub fn create_or_update(
        &self,
        config: &ResourceConfig,
        prior: Option<&ResourceState>,
    ) -> Result<ResourceState, LifecycleError> {
        validate_config(config)?;

        let resource = prior
            .map(|state| state.id.as_str())
            .unwrap_or(NEW_RESOURCE_LABEL);
        let response = self.call(
            resource,
            &config.invocation_request(),
            config.conceal_result,
        )?;

        let id = prior
            .map(|state| state.id.clone())
            .unwrap_or_else(new_resource_id);
        Ok(ResourceState::from_applied(id, config, &response))
    }

    /// Reports the tracked state unchanged. Remote functions expose no way to
    /// describe their past effects, so there is nothing to refresh from.
    pub fn read(&self, state: &ResourceState) -> ResourceState {
        state.clone()
    }

    /// Runs the finalizer, if any. On error the resource still exists and the
    /// caller must keep its state.
    pub fn delete(&self, state: &ResourceState) -> Result<(), LifecycleError> {
        let Some(finalizer) = &state.finalizer else {
            return Ok(());
        };

        let response = self.call(
            &state.id,
            &finalizer.invocation_request(),
            state.conceal_result,
        )?;
        if !state.conceal_result {
            log_info(
                COMPONENT,
                "finalizer_response",
                json!({
                    "resource_id": state.id.clone(),
                    "function_name": finalizer.function_name.clone(),
                    "response": String::from_utf8_lossy(&response),
                }),
            );
        }
        Ok(())
    }

    fn call(
        &self,
        resource: &str,
        request: &InvocationRequest,
        conceal_result: bool,
    ) -> Result<Vec<u8>, LifecycleError> {
        log_info(
            COMPONENT,
            "invocation_started",
            json!({
                "resource": resource,
                "function_name": request.function_name.clone(),
                "qualifier": request.qualifier.clone(),
                "payload_sha256": payload_fingerprint(&request.payload),
            }),
        );

        let outcome = match self.invoker.invoke(request) {
            Ok(value) => value,
            Err(message) => {
                log_error(
                    COMPONENT,
                    "invocation_failed",
                    json!({
                        "resource": resource,
                        "function_name": request.function_name.clone(),
                        "cause": "transport",
                        "error": message.clone(),
                    }),
                );
                return Err(LifecycleError::Transport {
                    resource: resource.to_string(),
                    function_name: request.function_name.clone(),
                    message,
                });
            }
        };

        if let Some(function_error) = outcome.function_error {
            log_error(
                COMPONENT,
                "invocation_failed",
                json!({
                    "resource": resource,
                    "function_name": request.function_name.clone(),
                    "cause": "function",
                    "function_error": function_error.clone(),
                }),
            );
            return Err(LifecycleError::Function {
                function_name: request.function_name.clone(),
                function_error,
                output: String::from_utf8_lossy(&outcome.payload).into_owned(),
            });
        }

        log_info(
            COMPONENT,
            "invocation_succeeded",
            json!({
                "resource": resource,
                "function_name": request.function_name.clone(),
                "response_bytes": outcome.payload.len(),
                "response_concealed": conceal_result,
            }),
        );
        Ok(outcome.payload)
    }
}
