//! Cache-Control middleware for JSON responses

use super::{Middleware, Next, NextFuture};
use crate::request::ContractRequest;
use axum::http::header::{self, InvalidHeaderValue};
use axum::http::HeaderValue;

/// Sets `Cache-Control` on every JSON response of the route
#[derive(Debug, Clone)]
pub struct CacheControl {
    value: HeaderValue,
}

impl CacheControl {
    pub fn new(directives: &str) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            value: HeaderValue::from_str(directives)?,
        })
    }
}

impl Middleware for CacheControl {
    fn handle(&self, request: ContractRequest, next: Next) -> NextFuture<'static> {
        let value = self.value.clone();
        Box::pin(async move {
            let mut response = next.run(request).await?;
            if response.json_body().is_some() {
                response.headers.insert(header::CACHE_CONTROL, value);
            }
            Ok(response)
        })
    }

    fn name(&self) -> &str {
        "CacheControl"
    }
}
