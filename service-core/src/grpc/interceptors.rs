//! gRPC interceptors for request correlation.

use tonic::{Request, Status};

/// gRPC metadata key for W3C traceparent header.
pub const TRACEPARENT_KEY: &str = "traceparent";

/// gRPC metadata key for request ID.
pub const REQUEST_ID_KEY: &str = "x-request-id";

/// Interceptor that guarantees every incoming request carries an `x-request-id`.
///
/// A caller-supplied id is kept as-is; otherwise a UUIDv4 is generated and
/// written into the request metadata so handlers can read it back with
/// [`extract_request_id`].
///
/// # Example
///
/// ```ignore
/// let svc = MyServiceServer::with_interceptor(service, trace_context_interceptor);
/// ```
#[allow(clippy::result_large_err)]
pub fn trace_context_interceptor(mut request: Request<()>) -> Result<Request<()>, Status> {
    if let Some(traceparent) = request.metadata().get(TRACEPARENT_KEY)
        && let Ok(traceparent_str) = traceparent.to_str()
    {
        tracing::debug!(traceparent = %traceparent_str, "Received trace context");
    }

    if extract_request_id(&request).is_none() {
        let request_id = uuid::Uuid::new_v4().to_string();
        inject_request_id(&mut request, &request_id);
    }

    Ok(request)
}

/// Attach a request ID to outgoing (or intercepted) request metadata.
pub fn inject_request_id<T>(request: &mut Request<T>, request_id: &str) {
    if let Ok(value) = request_id.parse() {
        request.metadata_mut().insert(REQUEST_ID_KEY, value);
    }
}

/// Extract request ID from gRPC request metadata.
pub fn extract_request_id<T>(request: &Request<T>) -> Option<String> {
    request
        .metadata()
        .get(REQUEST_ID_KEY)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_and_extract_request_id() {
        let mut request = Request::new(());
        inject_request_id(&mut request, "test-request-123");

        let extracted = extract_request_id(&request);
        assert_eq!(extracted, Some("test-request-123".to_string()));
    }

    #[test]
    fn test_interceptor_keeps_caller_request_id() {
        let mut request = Request::new(());
        inject_request_id(&mut request, "caller-id");

        let request = trace_context_interceptor(request).unwrap();
        assert_eq!(extract_request_id(&request).as_deref(), Some("caller-id"));
    }

    #[test]
    fn test_interceptor_generates_missing_request_id() {
        let request = trace_context_interceptor(Request::new(())).unwrap();
        let request_id = extract_request_id(&request).expect("request id should be set");
        assert!(uuid::Uuid::parse_str(&request_id).is_ok());
    }
}
