//! Poll a job until its ticket completes.
//!
//! Completion detection is poll-based: latency is at most one interval plus
//! the time of a store read.

use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::config::WaitConfig;
use crate::core::context::Context;
use crate::core::error::JobResult;
use crate::core::store::Job;
use crate::core::ticket::Ticket;

/// Floor applied to the poll interval; tokio rejects a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Block until the job's ticket is `Complete`.
///
/// A worker error does not make this fail; inspect the ticket's `error_msg`
/// (or use [`wait_ticket`]) to tell success from failure.
///
/// # Errors
///
/// Returns the context's `Cancelled`/`DeadlineExceeded` error if it ends
/// first (immediately, if it is already done), or any store error from
/// reading the ticket.
pub async fn wait<J>(ctx: &Context, interval: Duration, job: &J) -> JobResult<()>
where
    J: Job + ?Sized,
{
    wait_ticket(ctx, interval, job).await.map(|_| ())
}

/// [`wait`] using the configured poll interval.
///
/// # Errors
///
/// Same as [`wait`].
pub async fn wait_with<J>(ctx: &Context, config: &WaitConfig, job: &J) -> JobResult<()>
where
    J: Job + ?Sized,
{
    wait(ctx, config.poll_interval(), job).await
}

/// Like [`wait`], returning the completed ticket.
///
/// The first read happens right away; later reads follow `interval`.
///
/// # Errors
///
/// Same as [`wait`].
pub async fn wait_ticket<J>(ctx: &Context, interval: Duration, job: &J) -> JobResult<Ticket>
where
    J: Job + ?Sized,
{
    ctx.check()?;

    let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            err = ctx.done() => return Err(err),
            _ = ticker.tick() => {
                let ticket = job.ticket(ctx).await?;
                if ticket.is_complete() {
                    return Ok(ticket);
                }
            }
        }
    }
}
