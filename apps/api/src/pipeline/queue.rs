//! In-process pipeline queue. Sync triggers enqueue contexts; a dispatcher
//! task drains the channel and runs one pipeline per candidate.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info};

use super::context::PipelineContext;
use crate::state::AppState;

#[derive(Clone)]
pub struct PipelineQueue {
    tx: UnboundedSender<PipelineContext>,
}

impl PipelineQueue {
    pub fn new() -> (Self, UnboundedReceiver<PipelineContext>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Hands a candidate to the dispatcher. Returns false if the dispatcher
    /// is gone, which only happens during shutdown.
    pub fn enqueue(&self, ctx: PipelineContext) -> bool {
        let candidate = ctx.candidate.name.clone();
        match self.tx.send(ctx) {
            Ok(()) => true,
            Err(_) => {
                error!(candidate = %candidate, "pipeline dispatcher unavailable");
                false
            }
        }
    }
}

/// Spawns the dispatcher loop. Each dequeued candidate runs in its own
/// task so one slow analysis does not serialize the queue.
pub fn spawn_dispatcher(state: AppState, mut rx: UnboundedReceiver<PipelineContext>) {
    tokio::spawn(async move {
        info!("pipeline dispatcher started");
        while let Some(ctx) = rx.recv().await {
            let state = state.clone();
            tokio::spawn(async move {
                let candidate = ctx.candidate.name.clone();
                if let Err(e) = super::run(&state, ctx).await {
                    error!(candidate = %candidate, error = %e, "pipeline run failed");
                }
            });
        }
        info!("pipeline dispatcher stopped");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enqueue_delivers_in_order() {
        let (queue, mut rx) = PipelineQueue::new();
        let mut a = PipelineContext::default();
        a.candidate.name = "A".to_string();
        let mut b = PipelineContext::default();
        b.candidate.name = "B".to_string();

        assert!(queue.enqueue(a));
        assert!(queue.enqueue(b));
        assert_eq!(rx.recv().await.unwrap().candidate.name, "A");
        assert_eq!(rx.recv().await.unwrap().candidate.name, "B");
    }

    #[tokio::test]
    async fn test_enqueue_reports_closed_channel() {
        let (queue, rx) = PipelineQueue::new();
        drop(rx);
        assert!(!queue.enqueue(PipelineContext::default()));
    }
}
