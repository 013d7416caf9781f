//! Claim and execution loops.

use std::collections::HashMap;
use std::future::pending;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::core::audit::{build_audit_event, AuditAction};
use crate::core::context::Context;
use crate::core::store::TicketManager;
use crate::core::ticket::Ticket;
use crate::core::worker::Worker;
use crate::util::clock::now_ms;

use super::{PoolCounters, PoolError, SharedAudit};

/// Everything one execution loop owns.
pub(super) struct ExecutionLoop<S> {
    pub topic: String,
    pub index: usize,
    pub worker: Arc<dyn Worker>,
    pub rx: flume::Receiver<Ticket>,
    pub store: Arc<S>,
    pub counters: Arc<PoolCounters>,
    pub audit: SharedAudit,
    /// Bound on the final write-back when the pool context is already done.
    pub grace: Duration,
}

fn record(audit: &SharedAudit, ticket: &Ticket, action: AuditAction, detail: Option<String>) {
    if let Some(sink) = audit {
        sink.lock().record(build_audit_event(ticket, action, detail));
    }
}

/// Pull tickets for `topics` and route them until `ctx` is done.
///
/// Each pull only asks for topics whose dispatch queue has room. This loop is
/// the only sender, so the following send never waits on a busy topic.
///
/// Returns an error only for conditions that make the pool unusable.
pub(super) async fn claim_loop<S: TicketManager>(
    ctx: &Context,
    store: &S,
    topics: &[String],
    queues: &HashMap<String, flume::Sender<Ticket>>,
    idle_backoff: Duration,
    counters: &PoolCounters,
    audit: &SharedAudit,
) -> Result<(), PoolError> {
    let notifier = store.notifier();
    let mut ready: Vec<String> = Vec::with_capacity(topics.len());

    loop {
        if ctx.is_done() {
            return Ok(());
        }

        // Only claim for topics with queue room; a busy topic must not park the loop.
        ready.clear();
        ready.extend(
            topics
                .iter()
                .filter(|topic| queues.get(*topic).is_none_or(|queue| !queue.is_full()))
                .cloned(),
        );
        if ready.is_empty() {
            tokio::select! {
                _ = ctx.done() => return Ok(()),
                () = tokio::time::sleep(idle_backoff) => {}
            }
            continue;
        }

        // Created before the pull so a schedule racing with it still wakes us.
        let notified = notifier.as_deref().map(tokio::sync::Notify::notified);

        let ticket = match store.pull(ctx, &ready).await {
            Ok(ticket) => ticket,
            Err(err) if err.is_cancellation() => return Ok(()),
            Err(err) => {
                if !err.is_not_found() {
                    warn!(error = %err, "pull failed; backing off");
                }
                let wake = async {
                    match notified {
                        Some(notified) => notified.await,
                        None => pending::<()>().await,
                    }
                };
                tokio::select! {
                    _ = ctx.done() => return Ok(()),
                    () = tokio::time::sleep(idle_backoff) => {}
                    () = wake => {}
                }
                continue;
            }
        };

        counters.claimed_tickets.fetch_add(1, Ordering::Relaxed);
        record(audit, &ticket, AuditAction::Claimed, None);

        let Some(queue) = queues.get(&ticket.topic) else {
            error!(
                ticket_id = %ticket.id,
                topic = %ticket.topic,
                "claimed ticket has no dispatch queue"
            );
            return Err(PoolError::UnroutableTopic(ticket.topic));
        };

        let ticket_id = ticket.id.clone();
        let topic = ticket.topic.clone();
        debug!(ticket_id = %ticket_id, topic = %topic, "ticket claimed");

        tokio::select! {
            biased;
            _ = ctx.done() => {
                warn!(
                    ticket_id = %ticket_id,
                    topic = %topic,
                    "pool stopped before dispatch; ticket left in PROCESSING"
                );
                return Ok(());
            }
            sent = queue.send_async(ticket) => {
                if sent.is_err() {
                    return Err(PoolError::Internal(format!(
                        "dispatch queue for `{topic}` closed"
                    )));
                }
            }
        }
    }
}

/// Consume one topic's dispatch queue until `ctx` is done.
pub(super) async fn execution_loop<S: TicketManager>(ctx: Context, exec: ExecutionLoop<S>) {
    debug!(topic = %exec.topic, worker = exec.index, "execution loop started");
    loop {
        let ticket = tokio::select! {
            biased;
            _ = ctx.done() => break,
            received = exec.rx.recv_async() => match received {
                Ok(ticket) => ticket,
                Err(_) => break,
            },
        };

        exec.counters.active_tickets.fetch_add(1, Ordering::Relaxed);
        process_ticket(&ctx, &exec, ticket).await;
        exec.counters.active_tickets.fetch_sub(1, Ordering::Relaxed);
    }
    debug!(topic = %exec.topic, worker = exec.index, "execution loop exiting");
}

/// Start, run, and complete one claimed ticket.
async fn process_ticket<S: TicketManager>(
    ctx: &Context,
    exec: &ExecutionLoop<S>,
    mut ticket: Ticket,
) {
    ticket.mark_started(now_ms());
    let ticket = match exec.store.update(ctx, ticket.clone()).await {
        Ok(stored) => stored,
        Err(err) => {
            error!(
                ticket_id = %ticket.id,
                topic = %exec.topic,
                error = %err,
                "failed to persist ticket start; dropping ticket"
            );
            exec.counters.update_failures.fetch_add(1, Ordering::Relaxed);
            record(&exec.audit, &ticket, AuditAction::UpdateFailed, Some(err.to_string()));
            return;
        }
    };
    record(&exec.audit, &ticket, AuditAction::Started, None);

    let outcome = exec.worker.work(ctx, &ticket.body).await;
    let error_msg = match outcome {
        Ok(()) => None,
        Err(err) => {
            warn!(
                ticket_id = %ticket.id,
                topic = %exec.topic,
                worker = exec.index,
                error = %err,
                "worker returned error"
            );
            exec.counters.failed_tickets.fetch_add(1, Ordering::Relaxed);
            Some(err.to_string())
        }
    };

    let mut ticket = ticket;
    ticket.mark_complete(error_msg, now_ms());

    // Work that finished during shutdown still gets its outcome recorded.
    let write_ctx = if ctx.is_done() {
        Context::background().with_timeout(exec.grace)
    } else {
        ctx.clone()
    };

    match exec.store.update(&write_ctx, ticket.clone()).await {
        Ok(stored) => {
            exec.counters.completed_tickets.fetch_add(1, Ordering::Relaxed);
            debug!(
                ticket_id = %stored.id,
                topic = %exec.topic,
                failed = stored.error_msg.is_some(),
                "ticket complete"
            );
            record(&exec.audit, &stored, AuditAction::Completed, stored.error_msg.clone());
        }
        Err(err) => {
            error!(
                ticket_id = %ticket.id,
                topic = %exec.topic,
                error = %err,
                "failed to persist ticket completion; outcome lost"
            );
            exec.counters.update_failures.fetch_add(1, Ordering::Relaxed);
            record(&exec.audit, &ticket, AuditAction::UpdateFailed, Some(err.to_string()));
        }
    }
}
