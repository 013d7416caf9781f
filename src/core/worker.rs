//! Worker traits: the user-supplied unit of execution.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::core::context::Context;
use crate::core::error::AppResult;
use crate::core::ticket::Body;

/// Executes the payload of a claimed ticket.
///
/// An `Err` does not fail the ticket: the pool records the error's display
/// string in `error_msg` and still moves the ticket to `Complete`.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_jobq::core::{AppResult, Body, Context, Worker};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Worker for Echo {
///     async fn work(&self, _ctx: &Context, body: &Body) -> AppResult<()> {
///         let text: String = body.decode()?;
///         tracing::info!(%text, "echo");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// Run the work for one ticket.
    ///
    /// `ctx` is cancelled when the pool shuts down; long-running work should
    /// watch it and return early.
    async fn work(&self, ctx: &Context, body: &Body) -> AppResult<()>;
}

/// Worker that receives an already-decoded payload.
///
/// Wrap it in [`Typed`] to register it with a pool.
#[async_trait]
pub trait TypedWorker: Send + Sync + 'static {
    /// Payload type the ticket body decodes into.
    type Payload: DeserializeOwned + Send;

    /// Run the work for one decoded payload.
    async fn work(&self, ctx: &Context, payload: Self::Payload) -> AppResult<()>;
}

/// Adapter from [`TypedWorker`] to [`Worker`].
///
/// A body that does not decode is reported as the worker error, so the ticket
/// still completes with `error_msg` set.
#[derive(Debug, Clone)]
pub struct Typed<W>(pub W);

#[async_trait]
impl<W: TypedWorker> Worker for Typed<W> {
    async fn work(&self, ctx: &Context, body: &Body) -> AppResult<()> {
        let payload = body.decode::<W::Payload>()?;
        self.0.work(ctx, payload).await
    }
}

/// Worker backed by an async closure.
pub struct WorkerFn<F, Fut> {
    f: F,
    _fut: PhantomData<fn() -> Fut>,
}

impl<F, Fut> WorkerFn<F, Fut>
where
    F: Fn(Context, Body) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    /// Wrap a closure taking an owned context and body.
    pub const fn new(f: F) -> Self {
        Self {
            f,
            _fut: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut> Worker for WorkerFn<F, Fut>
where
    F: Fn(Context, Body) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    async fn work(&self, ctx: &Context, body: &Body) -> AppResult<()> {
        (self.f)(ctx.clone(), body.clone()).await
    }
}
