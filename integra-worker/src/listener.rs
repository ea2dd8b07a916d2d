//! Broker listener and worker pool.
//!
//! One cycle: connect (retrying forever), open a channel, apply prefetch,
//! declare the work queue, start consuming, then run the workers until the
//! delivery stream closes. Stream closure is the only drain signal: workers
//! finish their in-flight delivery, the pool joins, and the listener loops
//! back to reconnect after a fixed pause. Workers carry no cancellation
//! plumbing.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use futures::{FutureExt, StreamExt};
use lapin::options::{BasicAckOptions, BasicNackOptions};
use lapin::Consumer;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use integra_shared::constants::{
    IDLE_LOG_THRESHOLD, PANIC_EXIT_CODE, RECONNECT_DELAY, WORK_QUEUE,
};
use integra_shared::errors::panic_message;
use integra_shared::messaging::BrokerClient;

use crate::dispatcher::Dispatcher;

pub struct Listener {
    broker: Arc<BrokerClient>,
    dispatcher: Arc<Dispatcher>,
    workers: usize,
}

impl Listener {
    pub fn new(broker: Arc<BrokerClient>, dispatcher: Arc<Dispatcher>, workers: usize) -> Self {
        Self {
            broker,
            dispatcher,
            workers,
        }
    }

    /// Runs the consume/drain/reconnect cycle. Never returns under normal
    /// operation.
    pub async fn run(&self) {
        info!(
            workers = self.workers,
            broker = self.broker.url_redacted(),
            "starting listener"
        );

        loop {
            let channel = match self.broker.channel().await {
                Ok(channel) => channel,
                Err(err) => {
                    warn!(error = %err, retry_in = ?RECONNECT_DELAY, "failed to open channel");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                    continue;
                }
            };

            if let Err(err) = self.broker.set_prefetch(&channel, self.workers as u16).await {
                warn!(error = %err, retry_in = ?RECONNECT_DELAY, "failed to set prefetch");
                tokio::time::sleep(RECONNECT_DELAY).await;
                continue;
            }

            if let Err(err) = self.broker.declare_queue(&channel, WORK_QUEUE).await {
                warn!(error = %err, retry_in = ?RECONNECT_DELAY, "failed to declare work queue");
                tokio::time::sleep(RECONNECT_DELAY).await;
                continue;
            }

            let consumer = match self.broker.consume(&channel, WORK_QUEUE).await {
                Ok(consumer) => consumer,
                Err(err) => {
                    warn!(error = %err, retry_in = ?RECONNECT_DELAY, "failed to start consuming");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                    continue;
                }
            };

            info!(queue = WORK_QUEUE, workers = self.workers, "listener active");

            let shared = Arc::new(Mutex::new(consumer));
            let handles: Vec<_> = (0..self.workers)
                .map(|id| {
                    let consumer = Arc::clone(&shared);
                    let dispatcher = Arc::clone(&self.dispatcher);
                    tokio::spawn(worker_loop(id, consumer, dispatcher))
                })
                .collect();

            join_all(handles).await;

            warn!(
                retry_in = ?RECONNECT_DELAY,
                "delivery stream closed; all workers drained, reconnecting"
            );
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }
}

/// One worker: pulls deliveries from the shared stream until it closes.
/// Every delivery gets exactly one ack or nack; a panic escaping handler
/// recovery terminates the process for the supervisor to restart.
async fn worker_loop(id: usize, consumer: Arc<Mutex<Consumer>>, dispatcher: Arc<Dispatcher>) {
    info!(worker = id, "worker started");

    let mut message_count: u64 = 0;
    let mut idle_since = Instant::now();

    loop {
        let next = {
            let mut stream = consumer.lock().await;
            stream.next().await
        };

        let delivery = match next {
            Some(Ok(delivery)) => delivery,
            Some(Err(err)) => {
                warn!(worker = id, error = %err, "delivery stream error");
                continue;
            }
            None => break,
        };

        let idle = idle_since.elapsed();
        if idle > IDLE_LOG_THRESHOLD {
            info!(worker = id, idle = ?idle, "first delivery after idle period");
        }

        message_count += 1;
        debug!(worker = id, message = message_count, "processing delivery");

        let outcome = AssertUnwindSafe(dispatcher.dispatch(&delivery.data))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(())) => {
                debug!(worker = id, message = message_count, "delivery processed");
            }
            Ok(Err(err)) => {
                error!(
                    worker = id,
                    message = message_count,
                    error = %err,
                    "delivery processing failed"
                );
            }
            Err(panic) => {
                // Handlers neutralize their own panics; one reaching this
                // point means corrupted program state.
                error!(
                    worker = id,
                    panic = %panic_message(panic.as_ref()),
                    "worker panicked outside handler recovery; exiting for supervisor restart"
                );
                std::process::exit(PANIC_EXIT_CODE);
            }
        }

        if let Err(err) = delivery.acker.ack(BasicAckOptions::default()).await {
            error!(
                worker = id,
                message = message_count,
                error = %err,
                "ack failed; sending nack without requeue"
            );
            match delivery
                .acker
                .nack(BasicNackOptions {
                    requeue: false,
                    ..Default::default()
                })
                .await
            {
                Ok(()) => info!(worker = id, message = message_count, "nack sent"),
                Err(nack_err) => error!(
                    worker = id,
                    message = message_count,
                    error = %nack_err,
                    "nack failed"
                ),
            }
        }

        idle_since = Instant::now();
    }

    info!(
        worker = id,
        processed = message_count,
        "worker stopped: delivery stream closed"
    );
}
