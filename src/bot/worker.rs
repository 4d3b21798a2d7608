//! Background worker that posts automated replies.
//!
//! Sending a message only queues a job; the reply is appended later through
//! [`MessageStore::append`], the same path human messages take.
//!
//! Every room gets its own lane: replies in one room come out in the order
//! they were queued, while a slow reply never holds up another room.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use super::generator::ReplyGenerator;
use crate::auth::Identity;
use crate::chat::{Message, MessageStore};
use crate::clock::Clock;

/// A request for one automated reply.
#[derive(Debug, Clone)]
pub struct ReplyJob {
    /// Room to reply in.
    pub room_id: String,
    /// History snapshot taken when the job was queued, oldest first.
    pub history: Vec<Message>,
}

/// Shared pieces every lane needs.
#[derive(Clone)]
struct LaneContext {
    store: Arc<MessageStore>,
    clock: Arc<dyn Clock>,
    generator: Arc<dyn ReplyGenerator>,
    delay: Duration,
}

/// Run one room's jobs in order until its queue closes.
async fn run_lane(ctx: LaneContext, mut jobs: mpsc::UnboundedReceiver<ReplyJob>) {
    let bot = Identity::bot();
    while let Some(job) = jobs.recv().await {
        if !ctx.delay.is_zero() {
            tokio::time::sleep(ctx.delay).await;
        }

        let reply = ctx.generator.generate(&job.history).await;
        let message = Message::new(bot.clone(), reply, ctx.clock.now());
        match ctx.store.append(&job.room_id, message).await {
            Ok(_) => debug!(room_id = %job.room_id, "Automated reply posted"),
            Err(e) => error!(room_id = %job.room_id, "Failed to post automated reply: {}", e),
        }
    }
}

/// Dispatches reply jobs to per-room lanes on tokio tasks.
pub struct ReplyWorker {
    sender: Mutex<Option<mpsc::UnboundedSender<ReplyJob>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ReplyWorker {
    /// Start the worker.
    ///
    /// Each job waits `delay`, asks `generator` for a reply and appends it as
    /// the automated participant.
    pub fn spawn(
        store: Arc<MessageStore>,
        clock: Arc<dyn Clock>,
        generator: Arc<dyn ReplyGenerator>,
        delay: Duration,
    ) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<ReplyJob>();
        let ctx = LaneContext {
            store,
            clock,
            generator,
            delay,
        };

        let handle = tokio::spawn(async move {
            info!("Reply worker started (delay: {} ms)", delay.as_millis());
            let mut lanes: HashMap<String, mpsc::UnboundedSender<ReplyJob>> = HashMap::new();
            let mut tasks = JoinSet::new();

            while let Some(job) = receiver.recv().await {
                let lane = lanes.entry(job.room_id.clone()).or_insert_with(|| {
                    let (lane, jobs) = mpsc::unbounded_channel();
                    tasks.spawn(run_lane(ctx.clone(), jobs));
                    lane
                });
                if let Err(e) = lane.send(job) {
                    error!(room_id = %e.0.room_id, "Reply lane is gone, dropping job");
                }
            }

            // Closing every lane lets each finish its queue, then exit
            drop(lanes);
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    error!("Reply lane failed: {}", e);
                }
            }
            info!("Reply worker stopped");
        });

        Self {
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Queue a job. Returns false once the worker has been shut down.
    pub async fn submit(&self, job: ReplyJob) -> bool {
        match self.sender.lock().await.as_ref() {
            Some(sender) => sender.send(job).is_ok(),
            None => false,
        }
    }

    /// Stop accepting jobs and wait for queued ones in every room to finish.
    pub async fn shutdown(&self) {
        self.sender.lock().await.take();
        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(e) = handle.await {
                error!("Reply worker task failed: {}", e);
            }
        }
    }
}
