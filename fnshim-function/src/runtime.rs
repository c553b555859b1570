//! Lambda runtime adapter
//!
//! Runs the handler under the Lambda Runtime API, the way the function is
//! hosted in production. The handler never fails, so every invocation posts
//! a response.

use lambda_runtime::{service_fn, Context, Error, LambdaEvent};
use std::sync::Arc;
use tracing::{debug, info};

use crate::event::{HandlerResponse, InvocationContext, InvocationEvent};
use crate::handler::FunctionHandler;

/// Poll the Runtime API for invocations until the runtime shuts down
pub async fn run(handler: Arc<FunctionHandler>) -> Result<(), Error> {
    info!(function = %handler.name(), "Starting Lambda runtime loop");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<serde_json::Value>| {
        let handler = handler.clone();
        async move { Ok::<HandlerResponse, Error>(invoke(&handler, event).await) }
    }))
    .await
}

async fn invoke(handler: &FunctionHandler, event: LambdaEvent<serde_json::Value>) -> HandlerResponse {
    let LambdaEvent { payload, context } = event;
    let context = invocation_context(handler.name(), &context);
    handler.handle(to_event(payload), context).await
}

/// Any JSON is accepted; payloads that are not event-shaped become an empty event
fn to_event(payload: serde_json::Value) -> InvocationEvent {
    serde_json::from_value(payload).unwrap_or_else(|e| {
        debug!(error = %e, "Payload is not an HTTP event");
        InvocationEvent::default()
    })
}

fn invocation_context(function_name: &str, context: &Context) -> InvocationContext {
    InvocationContext {
        aws_request_id: context.request_id.clone(),
        function_name: function_name.to_string(),
        invoked_function_arn: Some(context.invoked_function_arn.clone())
            .filter(|arn| !arn.is_empty()),
        deadline_ms: i64::try_from(context.deadline).unwrap_or(i64::MAX),
    }
}
