use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::types::InvocationType;
use invocation_resource_core::contract::InvocationRequest;
use invocation_resource_core::invoker::{FunctionInvoker, InvocationOutcome};

/// Request/response Lambda invocation over the AWS SDK.
///
/// Must be called from inside a multi-threaded tokio runtime.
#[derive(Clone)]
pub struct AwsLambdaInvoker {
    lambda_client: aws_sdk_lambda::Client,
}

impl AwsLambdaInvoker {
    pub fn new(lambda_client: aws_sdk_lambda::Client) -> Self {
        Self { lambda_client }
    }
}

impl FunctionInvoker for AwsLambdaInvoker {
    fn invoke(&self, request: &InvocationRequest) -> Result<InvocationOutcome, String> {
        let client = self.lambda_client.clone();
        let function_name = request.function_name.clone();
        let qualifier = request.qualifier.clone();
        let request_payload = request.payload.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .invoke()
                    .function_name(function_name)
                    .qualifier(qualifier)
                    .invocation_type(InvocationType::RequestResponse)
                    .set_payload(Some(request_payload.into()))
                    .send()
                    .await
                    .map(|output| InvocationOutcome {
                        payload: output
                            .payload()
                            .map(|blob| blob.as_ref().to_vec())
                            .unwrap_or_default(),
                        function_error: output.function_error().map(str::to_string),
                    })
                    .map_err(|error| DisplayErrorContext(&error).to_string())
            })
        })
    }
}
