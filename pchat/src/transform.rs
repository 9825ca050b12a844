//! Request and response content transforms.
//!
//! The two sides deliberately differ in persistence: a request transform sees
//! a copy of the outbound messages and its edits are never written back to
//! history, while a response transform's output replaces the assistant
//! content both in history and in the returned outcome.

use std::future::Future;

use pcommon::BoxFuture;
use pprovider::Message;

/// Rewrites the outbound message list right before a provider call.
/// Applied to a copy; the live history is untouched.
pub trait RequestTransform: Send + Sync {
    fn transform<'a>(&'a self, messages: Vec<Message>) -> BoxFuture<'a, Vec<Message>>;
}

/// Rewrites assistant content after a provider call. The result is persisted.
pub trait ResponseTransform: Send + Sync {
    fn transform<'a>(&'a self, content: String) -> BoxFuture<'a, String>;
}

pub struct FnRequestTransform<F> {
    transform: F,
}

impl<F, Fut> FnRequestTransform<F>
where
    F: Fn(Vec<Message>) -> Fut + Send + Sync,
    Fut: Future<Output = Vec<Message>> + Send + 'static,
{
    pub fn new(transform: F) -> Self {
        Self { transform }
    }
}

impl<F, Fut> RequestTransform for FnRequestTransform<F>
where
    F: Fn(Vec<Message>) -> Fut + Send + Sync,
    Fut: Future<Output = Vec<Message>> + Send + 'static,
{
    fn transform<'a>(&'a self, messages: Vec<Message>) -> BoxFuture<'a, Vec<Message>> {
        Box::pin((self.transform)(messages))
    }
}

pub struct FnResponseTransform<F> {
    transform: F,
}

impl<F, Fut> FnResponseTransform<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = String> + Send + 'static,
{
    pub fn new(transform: F) -> Self {
        Self { transform }
    }
}

impl<F, Fut> ResponseTransform for FnResponseTransform<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = String> + Send + 'static,
{
    fn transform<'a>(&'a self, content: String) -> BoxFuture<'a, String> {
        Box::pin((self.transform)(content))
    }
}
