// Middleware system for request/response processing

use crate::logging::{debug, info, trace, warn};
use crate::{Error, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by handlers and the remainder of a middleware chain
pub type ResponseFuture = Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>;

/// Type alias for the next handler in the middleware chain
pub type Next = Box<dyn FnOnce(HttpRequest) -> ResponseFuture + Send>;

/// Type alias for handler functions
pub type HandlerFn = Arc<dyn Fn(HttpRequest) -> ResponseFuture + Send + Sync>;

/// Wrap an async closure as a [`HandlerFn`]
pub fn handler<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

/// Middleware trait for processing requests before they reach the handler
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Process the request and optionally pass to next middleware
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error>;
}

/// Middleware chain executor
#[derive(Clone)]
pub struct MiddlewareChain {
    middlewares: Arc<Vec<Arc<dyn Middleware>>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Arc::new(Vec::new()),
        }
    }

    /// Add a middleware to the chain
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        let mut mws = (*self.middlewares).clone();
        mws.push(Arc::new(middleware));
        self.middlewares = Arc::new(mws);
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Execute the middleware chain with a handler
    pub async fn apply(&self, req: HttpRequest, handler: HandlerFn) -> Result<HttpResponse, Error> {
        debug!(
            middleware_count = self.middlewares.len(),
            path = %req.path,
            method = %req.method,
            "Executing middleware chain"
        );
        self.execute_from(0, req, handler).await
    }

    /// Execute the chain and turn any error into its plain-text response
    pub async fn respond(&self, req: HttpRequest, handler: HandlerFn) -> HttpResponse {
        match self.apply(req, handler).await {
            Ok(response) => response,
            Err(err) => {
                warn!(status = err.status_code(), error = %err, "Request failed");
                err.into_response()
            }
        }
    }

    fn execute_from(&self, index: usize, req: HttpRequest, handler: HandlerFn) -> ResponseFuture {
        if index >= self.middlewares.len() {
            trace!("Middleware chain complete, calling handler");
            handler(req)
        } else {
            let middleware = self.middlewares[index].clone();
            let chain = self.clone();
            let handler_clone = handler.clone();

            trace!(middleware_index = index, "Executing middleware");
            Box::pin(async move {
                middleware
                    .handle(
                        req,
                        Box::new(move |req| chain.execute_from(index + 1, req, handler_clone)),
                    )
                    .await
            })
        }
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Request/response logging middleware
///
/// Emits one event when a request enters the chain and one when its
/// response (or error) leaves it.
pub struct LoggingMiddleware {
    /// Log request bodies
    pub log_request_body: bool,
    /// Maximum body size to log (in bytes)
    pub max_body_size: usize,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self {
            log_request_body: false,
            max_body_size: 1024,
        }
    }

    pub fn with_request_body(mut self, enable: bool) -> Self {
        self.log_request_body = enable;
        self
    }

    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    fn body_preview(&self, body: &[u8]) -> String {
        if body.len() > self.max_body_size {
            format!(
                "{}... ({} bytes)",
                String::from_utf8_lossy(&body[..self.max_body_size]),
                body.len()
            )
        } else {
            String::from_utf8_lossy(body).to_string()
        }
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        let start = std::time::Instant::now();
        let method = req.method.clone();
        let path = req.path.clone();

        if self.log_request_body && !req.body.is_empty() {
            info!(
                method = %method,
                path = %path,
                body = %self.body_preview(&req.body),
                "HTTP request received"
            );
        } else {
            info!(method = %method, path = %path, "HTTP request received");
        }

        let result = next(req).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => info!(
                method = %method,
                path = %path,
                status = response.status,
                duration_ms = duration.as_millis() as u64,
                "HTTP response sent"
            ),
            Err(e) => warn!(
                method = %method,
                path = %path,
                status = e.status_code(),
                error = %e,
                duration_ms = duration.as_millis() as u64,
                "HTTP request failed"
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TagMiddleware(&'static str);

    #[async_trait]
    impl Middleware for TagMiddleware {
        async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
            let mut response = next(req).await?;
            let trail = match response.header("X-Trail") {
                Some(existing) => format!("{},{}", existing, self.0),
                None => self.0.to_string(),
            };
            response.set_header("X-Trail", trail);
            Ok(response)
        }
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let mut chain = MiddlewareChain::new();
        chain.use_middleware(TagMiddleware("outer"));
        chain.use_middleware(TagMiddleware("inner"));
        assert_eq!(chain.len(), 2);

        let response = chain
            .apply(
                HttpRequest::new("GET".into(), "/".into()),
                handler(|_req| async { Ok(HttpResponse::ok()) }),
            )
            .await
            .unwrap();

        // Responses unwind from the innermost middleware outwards
        assert_eq!(response.header("X-Trail"), Some("inner,outer"));
    }

    #[tokio::test]
    async fn test_empty_chain_calls_handler() {
        let chain = MiddlewareChain::default();
        assert!(chain.is_empty());

        let response = chain
            .apply(
                HttpRequest::new("GET".into(), "/".into()),
                handler(|_req| async { Ok(HttpResponse::no_content()) }),
            )
            .await
            .unwrap();
        assert_eq!(response.status, 204);
    }

    #[tokio::test]
    async fn test_respond_converts_errors() {
        let mut chain = MiddlewareChain::new();
        chain.use_middleware(LoggingMiddleware::new().with_request_body(true));

        let response = chain
            .respond(
                HttpRequest::new("POST".into(), "/".into()).with_body("payload"),
                handler(|_req| async { Err(Error::Forbidden("nope".into())) }),
            )
            .await;
        assert_eq!(response.status, 403);
    }

    #[test]
    fn test_body_preview_truncates() {
        let logging = LoggingMiddleware::new().with_max_body_size(4);
        assert_eq!(logging.body_preview(b"abcdefgh"), "abcd... (8 bytes)");
        assert_eq!(logging.body_preview(b"abc"), "abc");
    }
}
