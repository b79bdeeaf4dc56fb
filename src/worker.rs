//! Bus worker loop
//!
//! Reads bus messages from a [`Transport`], feeds replies to the [`BusClient`]
//! and answers requests through the [`Dispatcher`], each on its own task.
//! Everything destined for the bus (outbound agent requests and replies to
//! callers) goes through one channel drained by this loop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::agent::AgentClient;
use crate::bus::{BusClient, BusMessage, Transport};
use crate::cache::CacheStore;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::store::Repository;

/// A single worker instance serving one bus connection
pub struct Worker<T, S, A, C> {
    transport: T,
    dispatcher: Dispatcher<S, A, C>,
    bus: Arc<BusClient>,
    outbound_tx: mpsc::UnboundedSender<BusMessage>,
    outbound_rx: mpsc::UnboundedReceiver<BusMessage>,
}

impl<T, S, A, C> Worker<T, S, A, C>
where
    T: Transport,
    S: Repository + 'static,
    A: AgentClient + 'static,
    C: CacheStore + 'static,
{
    /// Create a worker
    ///
    /// `outbound_rx` must be the receiving side of the channel `bus` writes to.
    pub fn new(
        transport: T,
        dispatcher: Dispatcher<S, A, C>,
        bus: Arc<BusClient>,
        outbound_tx: mpsc::UnboundedSender<BusMessage>,
        outbound_rx: mpsc::UnboundedReceiver<BusMessage>,
    ) -> Self {
        Self {
            transport,
            dispatcher,
            bus,
            outbound_tx,
            outbound_rx,
        }
    }

    /// Serve until the input side of the transport ends
    ///
    /// Requests still in flight when the input ends are allowed to finish and
    /// their replies are written before the transport is closed.
    ///
    /// # Errors
    /// Returns error if writing to the transport fails
    pub async fn run(mut self) -> Result<()> {
        let mut inbound = self.transport.read_messages();
        let mut in_flight = JoinSet::new();
        let mut input_open = true;

        loop {
            tokio::select! {
                message = inbound.recv(), if input_open => match message {
                    Some(Ok(BusMessage::Request(request))) => {
                        let dispatcher = self.dispatcher.clone();
                        let outbound = self.outbound_tx.clone();
                        in_flight.spawn(async move {
                            let reply = dispatcher.handle(request).await;
                            if outbound.send(BusMessage::Reply(reply)).is_err() {
                                log::warn!("Worker stopped before reply could be sent");
                            }
                        });
                    }
                    Some(Ok(BusMessage::Reply(reply))) => self.bus.handle_reply(reply).await,
                    Some(Err(e)) => log::warn!("Dropping unreadable bus message: {e}"),
                    None => {
                        log::info!("Bus input closed, waiting for {} in-flight requests", in_flight.len());
                        input_open = false;
                    }
                },
                Some(message) = self.outbound_rx.recv() => {
                    self.transport.write(&message).await?;
                }
                Some(joined) = in_flight.join_next() => {
                    if let Err(e) = joined {
                        log::error!("Request task failed: {e}");
                    }
                }
                else => break,
            }

            if !input_open && in_flight.is_empty() {
                break;
            }
        }

        while let Ok(message) = self.outbound_rx.try_recv() {
            self.transport.write(&message).await?;
        }
        self.transport.close().await
    }
}
