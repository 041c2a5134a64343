/*
 * SPDX-FileCopyrightText: Copyright (c) 2021-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: LicenseRef-NvidiaProprietary
 *
 * NVIDIA CORPORATION, its affiliates and licensors retain all intellectual
 * property and proprietary rights in and to this material, related
 * documentation and any modifications thereto. Any use, reproduction,
 * disclosure or distribution of this material and related documentation
 * without an express license agreement from NVIDIA CORPORATION or
 * its affiliates is strictly prohibited.
 */
use std::io;
use std::net::SocketAddr;
use std::process::Stdio;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use carbide_uuid::machine::MachineId;
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use opentelemetry::KeyValue;
use russh::ChannelMsg;
use tokio::net::TcpStream;
use tokio::sync::{MutexGuard, broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::bmc::client_pool::BmcPoolMetrics;
use crate::bmc::connection::{self, AtomicConnectionState, ConnectionDetails};
use crate::bmc::message_proxy::{
    ConnectionChangeMessage, ExecReply, ToBmcMessage, ToFrontendMessage,
};
use crate::config::Config;
use crate::console_logger;
use crate::shutdown_handle::ShutdownHandle;
use crate::ssh_server::ServerMetrics;

/// Spawn a connection to the given BMC in the background, returning a handle. Connections will
/// be retried indefinitely, with exponential backoff, until a shutdown is signaled (ie. by dropping
/// the ClientHandle.)
pub fn spawn(
    connection_details: ConnectionDetails,
    config: Arc<Config>,
    metrics: Arc<BmcPoolMetrics>,
) -> ClientHandle {
    // Shutdown handle for the retry loop that is retrying this connection
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    // Channel frontends can use to send messages to the BMC
    let (to_bmc_msg_tx, to_bmc_msg_rx) = mpsc::channel::<ToBmcMessage>(1);
    // Channel that broadcasts messages to any subscribed frontends
    let (broadcast_to_frontend_tx, broadcast_to_frontend_rx) =
        broadcast::channel::<ToFrontendMessage>(4096);

    // Always consume messages from the frontend broadcast channel, even if there are no frontends.
    dev_null(broadcast_to_frontend_rx);

    let connection_state = Arc::new(AtomicConnectionState::default());
    let machine_id = connection_details.machine_id();
    let kind = connection_details.kind();

    let metrics_attrs = vec![KeyValue::new("machine_id", machine_id.to_string())];
    metrics.bmc_recovery_attempts.record(0, &metrics_attrs);
    metrics.bmc_rx_errors_total.add(0, &metrics_attrs);
    metrics.bmc_tx_errors_total.add(0, &metrics_attrs);
    metrics.bmc_bytes_received_total.add(0, &metrics_attrs);

    let bmc_client = BmcClient {
        connection_details,
        config,
        connection_state: connection_state.clone(),
        broadcast_to_frontend_tx: broadcast_to_frontend_tx.clone(),
        shutdown_rx,
        to_bmc_msg_rx,
        metrics,
    };

    let join_handle = tokio::spawn(bmc_client.run());

    ClientHandle {
        to_bmc_msg_tx,
        broadcast_to_frontend_tx,
        machine_id,
        shutdown_tx,
        join_handle,
        connection_state,
        kind,
    }
}

struct BmcClient {
    connection_details: ConnectionDetails,
    config: Arc<Config>,
    connection_state: Arc<AtomicConnectionState>,
    shutdown_rx: oneshot::Receiver<()>,
    broadcast_to_frontend_tx: broadcast::Sender<ToFrontendMessage>,
    to_bmc_msg_rx: mpsc::Receiver<ToBmcMessage>,
    metrics: Arc<BmcPoolMetrics>,
}

impl BmcClient {
    async fn run(mut self) {
        let machine_id = self.connection_details.machine_id();
        let metrics_attrs = vec![KeyValue::new("machine_id", machine_id.to_string())];

        // Spawn a task to write logs for this console, if configured.
        let logger_handle = if self.config.console_logging_enabled {
            Some(console_logger::spawn(
                machine_id,
                self.connection_details.addr(),
                self.broadcast_to_frontend_tx.subscribe(),
                self.config.clone(),
            ))
        } else {
            None
        };

        // Keep track of when we were last disconnected, for relaying status
        let last_disconnect_time: Arc<RwLock<Option<DateTime<Utc>>>> = Default::default();

        // Spawn a message relay for communicating status to the user if the BMC is
        // disconnected.
        let bmc_msg_tx_placeholder = BmcMessageTxPlaceholder::default();
        let bmc_message_relay = relay_input_to_bmc(
            self.broadcast_to_frontend_tx.clone(),
            self.connection_state.clone(),
            self.to_bmc_msg_rx,
            bmc_msg_tx_placeholder.clone(),
            last_disconnect_time.clone(),
        );

        // Keep track of the instant we do the next retry, and not the duration to wait: This helps
        // it so that if we wait a long time for a host to be up, we don't wait longer than we need
        // to. (e.g. if retry time is 1 minute, and the machine takes 5 minutes to be up, we don't
        // want to wait 6 minutes.)
        let mut next_retry = Instant::now();
        let mut was_disconnected = false;

        // Connect and reconnect, in a loop, until the client is shut down.
        let mut retries = 0;
        'retry: loop {
            // Every retry after the first time, emit a disconnected message
            if was_disconnected {
                self.broadcast_to_frontend_tx
                    .send(ToFrontendMessage::ConnectionChanged(
                        ConnectionChangeMessage::Disconnected,
                    ))
                    .ok();
                *last_disconnect_time.write().expect("lock poisoned") = Some(Utc::now());
            } else {
                was_disconnected = true;
            }

            self.metrics
                .bmc_recovery_attempts
                .record(retries, metrics_attrs.as_slice());
            if retries == 0 {
                self.connection_state.store(connection::State::Connecting);
            } else {
                self.connection_state
                    .store(connection::State::ConnectionError);
            }
            retries += 1;

            // Wait for the host to be up, so we avoid long backoff times when the BMC is just down.
            // This way, the moment it comes back up, we can start trying again straight away.
            if let Err(error) = wait_until_host_is_up(
                self.connection_details.addr(),
                self.connection_details.kind(),
                self.connection_details.machine_id(),
                &mut self.shutdown_rx,
            )
            .await
            {
                tracing::error!(%machine_id, %error, "error checking BMC port");
                continue 'retry;
            }

            // Only sleep for the remaining retry time after we did the TCP halfopen check.
            let sleep_duration = {
                let now = Instant::now();
                if next_retry > now {
                    next_retry - now
                } else {
                    Duration::ZERO
                }
            };

            tokio::time::sleep(sleep_duration).await;

            // Subsequent retries should sleep for RETRY_BASE_DURATION and double from there
            // until we successfully connect.
            next_retry = Instant::now() + next_retry_backoff(&self.config, sleep_duration);

            let try_start_time = Instant::now();

            // Spawn a single connection to this BMC.
            let bmc_connection_handle = match connection::spawn(
                self.connection_details.clone(),
                self.broadcast_to_frontend_tx.clone(),
                self.metrics.clone(),
                self.config.clone(),
            )
            .await
            {
                Ok(handle) => handle,
                Err(error) => {
                    tracing::error!(
                        %error,
                        %machine_id,
                        "error spawning BMC connection, will retry in {}s",
                        next_retry.checked_duration_since(Instant::now()).unwrap_or_default().as_secs()
                    );
                    continue 'retry;
                }
            };

            // Successfully ready, give the BMC channel to the message relay and set the state
            // to Connected. (if ready_rx is not ok, then the tx must have been dropped, and
            // we'll report errors and retry below.)
            bmc_msg_tx_placeholder
                .replace(Some(bmc_connection_handle.to_bmc_msg_tx))
                .await;
            self.connection_state.store(connection::State::Connected);
            self.broadcast_to_frontend_tx
                .send(ToFrontendMessage::ConnectionChanged(
                    ConnectionChangeMessage::Connected {
                        last_disconnect: *last_disconnect_time.read().expect("lock poisoned"),
                    },
                ))
                .ok();

            // Turn the actual BMC connection JoinHandle into a shared future, so we can check
            // the result from multiple select arms.
            let connection_result = async move {
                bmc_connection_handle
                    .join_handle
                    .await
                    .expect("task panicked")
                    .map_err(Arc::new)
            }
            .shared();

            tokio::select! {
                // If we're shutting down, shut down this connection attempt
                _ = &mut self.shutdown_rx => {
                    tracing::info!(%machine_id, "shutting down BMC connection");
                    bmc_connection_handle.shutdown_tx.send(()).ok();
                    if let Err(error) = connection_result.await {
                        tracing::error!(%machine_id, error = %error.as_ref(), "BMC connection failed while shutting down");
                    };
                    break 'retry;
                }

                // The connection should go forever, so if it doesn't, retry.
                res = connection_result.clone() => {
                    let connection_time = try_start_time.elapsed();
                    if connection_time > self.config.successful_connection_minimum_duration {
                        tracing::debug!(%machine_id, "last connection lasted {}s, resetting backoff to 0s", connection_time.as_secs());
                        next_retry = Instant::now();
                    }
                    let error_string = res.err().map(|e| format!("{:?}", e.as_ref())).unwrap_or("<none>".to_string());
                    tracing::warn!(
                        %machine_id,
                        error = error_string,
                        "connection to BMC closed, will retry in {}s",
                        next_retry.checked_duration_since(Instant::now()).unwrap_or_default().as_secs(),
                    );
                }
            }
        }

        // Clean up: Shut down message relay and logger
        bmc_message_relay.shutdown_and_wait().await;
        if let Some(logger_handle) = logger_handle {
            logger_handle.shutdown_and_wait().await;
        }
    }
}

/// Wait for an address to be "up". For SSH consoles, do a a TCP half-open connection request. For
/// IPMI machines, just ping it. For each probe, wait for 2 seconds for a reply, and retry every 5
/// seconds until we get a connection.
async fn wait_until_host_is_up(
    addr: SocketAddr,
    kind: connection::Kind,
    machine_id: MachineId,
    mut shutdown_rx: &mut oneshot::Receiver<()>,
) -> io::Result<()> {
    let mut interval = tokio::time::interval(Duration::from_secs(5));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut do_log = true;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match kind {
                    connection::Kind::Ssh => {
                        if let Ok(Ok(_)) = tokio::time::timeout(Duration::from_secs(2), TcpStream::connect(addr)).await {
                            break Ok(());
                        }
                    }
                    connection::Kind::Ipmi => {
                        let status = tokio::process::Command::new("ping")
                            .arg("-c")
                            .arg("1")
                            .arg("-W")
                            .arg("2")
                            .arg(addr.ip().to_string())
                            .stdin(Stdio::null())
                            .stdout(Stdio::null())
                            .stderr(Stdio::null())
                            .spawn()?
                            .wait()
                            .await?;
                        if status.success() {
                            break Ok(())
                        }
                    }
                }
            }
            _ = &mut shutdown_rx => {
                break Ok(());
            }
        }

        if do_log {
            do_log = false;
            tracing::info!(%machine_id, %addr, "BMC is not listening on {addr}. Will wait until the port is open before attempting to connect.")
        }
    }
}

/// Spawn a task which will take messages from to_bmc_msg_rx and either relay them to a
/// BMC connection, *or* reply to the user saying the BMC is disconnected, depending on
/// whether the BMC connection is healthy.
///
/// - `bmc_msg_tx_placeholder`: A shareable placeholder for a channel to send messages to
///   the BMC, once the connection is ready.
fn relay_input_to_bmc(
    broadcast_to_frontend_tx: broadcast::Sender<ToFrontendMessage>,
    connection_state: Arc<AtomicConnectionState>,
    mut to_bmc_msg_rx: mpsc::Receiver<ToBmcMessage>,
    bmc_msg_tx_placeholder: BmcMessageTxPlaceholder,
    last_disconnect_time: Arc<RwLock<Option<DateTime<Utc>>>>,
) -> MessageRelayHandle {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

    let join_handle = tokio::spawn({
        async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    Some(msg) = to_bmc_msg_rx.recv() => {
                        let bmc_tx_guard =
                            if let connection::State::Connected = connection_state.load() {
                                Some(bmc_msg_tx_placeholder.lock().await)
                            } else {
                                None
                            };

                        // If we're connected, relay the message
                        if let Some(tx) =
                            bmc_tx_guard.as_ref().and_then(|guard| guard.as_ref())
                        {
                            tx.send(msg).await.ok();
                        } else {
                            // Otherwise, when the user types a newline, inform them the BMC
                            // is not connected
                            let inform_disconnected = match msg {
                                ToBmcMessage::ChannelMsg(ChannelMsg::Data { data }) => {
                                    data.contains(&b'\r') || data.contains(&b'\n')
                                }
                                ToBmcMessage::EchoConnectionMessage { reply_tx: _ } => true,
                                ToBmcMessage::Exec { reply_tx, .. } => {
                                    reply_tx.send(ExecReply {
                                        output: b"BMC console not connected\r\n".to_vec(),
                                        exit_status: 1,
                                    }).ok();
                                    false
                                }
                                _ => false,
                            };

                            if inform_disconnected {
                                broadcast_to_frontend_tx
                                    .send(ToFrontendMessage::InformDisconnectedSince(*last_disconnect_time.read().expect("lock poisoned")))
                                    .ok();
                            }
                        }
                    }
                }
            }
        }
    });

    MessageRelayHandle {
        shutdown_tx,
        join_handle,
    }
}

struct MessageRelayHandle {
    shutdown_tx: oneshot::Sender<()>,
    join_handle: JoinHandle<()>,
}

#[derive(Default, Clone)]
struct BmcMessageTxPlaceholder(Arc<tokio::sync::Mutex<Option<mpsc::Sender<ToBmcMessage>>>>);

impl BmcMessageTxPlaceholder {
    #[inline]
    async fn replace(&self, value: Option<mpsc::Sender<ToBmcMessage>>) {
        *self.lock().await = value;
    }

    #[inline]
    async fn lock(&self) -> MutexGuard<'_, Option<mpsc::Sender<ToBmcMessage>>> {
        self.0.lock().await
    }
}

impl ShutdownHandle<()> for MessageRelayHandle {
    fn into_parts(self) -> (oneshot::Sender<()>, JoinHandle<()>) {
        (self.shutdown_tx, self.join_handle)
    }
}

/// Consume all the messages of a broadcast::Receiver, doing nothing with them, until the channel is
/// closed. This is a quick and dirty way to prevent a BMC's to_frontend_tx channel from returning
/// failures due to nobody listening. (Listeners may come and go, as logging is optional.)
fn dev_null<T: Clone + Send + 'static>(mut rx: broadcast::Receiver<T>) {
    tokio::spawn(async move {
        loop {
            if rx.recv().await.is_err() {
                return;
            };
        }
    });
}

/// Calculate the next exponential backoff duration for retrying connections to a console
fn next_retry_backoff(config: &Config, prev: Duration) -> Duration {
    let duration = if prev == Duration::ZERO {
        config.reconnect_interval_base
    } else {
        // Sleep a random interval between prev and prev * 3
        let upper = (prev.as_secs_f64() * 3.0).min(config.reconnect_interval_max.as_secs_f64());
        Duration::from_secs_f64(rand::random_range(prev.as_secs_f64()..upper))
    };
    tracing::debug!(
        "next_retry_backoff, increasing from {}ms to {}ms",
        prev.as_millis(),
        duration.as_millis()
    );
    duration
}

pub struct ClientHandle {
    machine_id: MachineId,
    kind: connection::Kind,
    /// Writer to send messages (including data) to BMC
    to_bmc_msg_tx: mpsc::Sender<ToBmcMessage>,
    // Hold a copy of the tx for broadcasting to frontends, so that we can subscribe to it multiple
    // times.
    broadcast_to_frontend_tx: broadcast::Sender<ToFrontendMessage>,
    shutdown_tx: oneshot::Sender<()>,
    join_handle: JoinHandle<()>,
    pub connection_state: Arc<AtomicConnectionState>, // pub for metrics gathering
}

impl ShutdownHandle<()> for ClientHandle {
    fn into_parts(self) -> (oneshot::Sender<()>, JoinHandle<()>) {
        (self.shutdown_tx, self.join_handle)
    }
}

impl ClientHandle {
    pub fn subscribe(&self, metrics: Arc<ServerMetrics>) -> BmcConnectionSubscription {
        tracing::debug!("new bmc subscription");
        metrics.total_clients.add(1, &[]);
        metrics.bmc_clients.add(
            1,
            &[KeyValue::new("machine_id", self.machine_id.to_string())],
        );

        BmcConnectionSubscription {
            machine_id: self.machine_id,
            to_frontend_msg_weak_tx: self.broadcast_to_frontend_tx.downgrade(),
            to_bmc_msg_tx: self.to_bmc_msg_tx.clone(),
            metrics,
            kind: self.kind,
        }
    }
}

/// An individual "subscription" to a BMC connection, expected to be used by a frontend. Metrics
/// are affected when one is created or dropped.
pub struct BmcConnectionSubscription {
    pub machine_id: MachineId,
    pub to_frontend_msg_weak_tx: broadcast::WeakSender<ToFrontendMessage>,
    pub to_bmc_msg_tx: mpsc::Sender<ToBmcMessage>,
    pub kind: connection::Kind,
    // Not pub, to make sure we go through ClientHandle::subscribe() to build, so we get the
    // right metrics
    metrics: Arc<ServerMetrics>,
}

impl Drop for BmcConnectionSubscription {
    // Decrement metrics when dropping
    fn drop(&mut self) {
        tracing::debug!("dropping bmc subscription");
        self.metrics.total_clients.add(-1, &[]);
        self.metrics.bmc_clients.add(
            -1,
            &[KeyValue::new("machine_id", self.machine_id.to_string())],
        );
    }
}
