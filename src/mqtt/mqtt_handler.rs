use std::time::Duration;

use rumqttc::{
    AsyncClient, ClientError, ConnectReturnCode, ConnectionError, Event, EventLoop, Outgoing,
    Packet, QoS,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::MqttConfig;
use crate::device::router::{RouteOutcome, Router};

const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Broker {addr} is unreachable: {source}")]
    Unreachable {
        addr: String,
        #[source]
        source: ConnectionError,
    },

    #[error("Broker rejected the connection: {0:?}")]
    Rejected(ConnectReturnCode),

    #[error("Failed to subscribe to {topic}: {source}")]
    Subscribe {
        topic: String,
        #[source]
        source: ClientError,
    },
}

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
    Reconnecting,
}

#[derive(Clone, Debug, Default)]
pub struct MQTTStatus {
    pub connection_state: ConnectionState,
    pub last_error: Option<String>,
    pub error_count: usize,
    pub messages_received: usize,
    pub messages_sent: usize,
    pub last_activity: Option<chrono::DateTime<chrono::Local>>,
    /// Set once the first connect and subscribe succeeded; later errors are transient
    pub has_connected: bool,
}

/// Drives the `rumqttc` event loop and feeds inbound publishes to the router.
pub struct MqttHandler {
    status: MQTTStatus,
    client: AsyncClient,
    eventloop: EventLoop,
    config: MqttConfig,
    router: Router,
    /// Subscribe request could not be queued after a reconnect
    needs_subscribe: bool,
}

impl MqttHandler {
    pub fn new(config: MqttConfig) -> Self {
        let (client, eventloop) = AsyncClient::new(config.mqtt_options(), config.request_capacity);
        let router = Router::new(&config.topics);

        MqttHandler {
            status: MQTTStatus::default(),
            client,
            eventloop,
            config,
            router,
            needs_subscribe: false,
        }
    }

    /// Outbound handle for publishers. Cheap to clone, safe to share between tasks.
    pub fn client(&self) -> AsyncClient {
        self.client.clone()
    }

    #[cfg(test)]
    pub fn status(&self) -> &MQTTStatus {
        &self.status
    }

    #[cfg(test)]
    pub fn device_state(&self) -> &crate::device::state::DeviceState {
        self.router.state()
    }

    fn broker_addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Polls until `cancel` fires. Fails only while no connection was ever established.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<MQTTStatus, HandlerError> {
        self.status.connection_state = ConnectionState::Connecting;
        info!("Connecting to broker {}", self.broker_addr());
        println!("Connecting to broker...");

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = self.eventloop.poll() => event,
            };

            let result = match event {
                Ok(event) => self.handle_event(event),
                Err(ConnectionError::ConnectionRefused(code)) => Err(self.on_refused(code)),
                Err(source) => Err(HandlerError::Unreachable {
                    addr: self.broker_addr(),
                    source,
                }),
            };

            let Err(e) = result else {
                continue;
            };
            if !self.status.has_connected {
                self.status.connection_state = ConnectionState::Failed;
                return Err(e);
            }

            // Only startup failures are fatal, rumqttc reconnects on the next poll
            warn!("Connection to broker lost: {}", e);
            if !matches!(e, HandlerError::Subscribe { .. }) {
                self.status.connection_state = ConnectionState::Reconnecting;
            }
            self.status.last_error = Some(e.to_string());
            self.status.error_count += 1;
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(RECONNECT_DELAY) => {}
            }
            if self.needs_subscribe && self.status.connection_state == ConnectionState::Connected {
                if let Err(e) = self.subscribe() {
                    warn!("{}", e);
                }
            }
        }

        self.disconnect().await;
        info!(
            "MQTT handler stopped: {} messages received, {} sent, {} connection errors (last: {:?}), last activity {:?}",
            self.status.messages_received,
            self.status.messages_sent,
            self.status.error_count,
            self.status.last_error,
            self.status.last_activity
        );
        Ok(self.status)
    }

    pub fn handle_event(&mut self, event: Event) -> Result<(), HandlerError> {
        match event {
            Event::Incoming(Packet::ConnAck(ack)) => self.on_connect(ack.code)?,
            Event::Incoming(Packet::Publish(publish)) => {
                self.on_message(&publish.topic, &publish.payload);
            }
            Event::Incoming(Packet::SubAck(ack)) => {
                debug!("Subscription acknowledged: {:?}", ack.return_codes);
            }
            Event::Outgoing(Outgoing::Publish(pkid)) => {
                debug!("Publish {} handed to the broker", pkid);
                self.status.messages_sent += 1;
            }
            _ => {}
        }
        Ok(())
    }

    fn on_refused(&mut self, code: ConnectReturnCode) -> HandlerError {
        self.status.connection_state = ConnectionState::Failed;
        println!("Failed to connect. Code: {:?}", code);
        HandlerError::Rejected(code)
    }

    fn on_connect(&mut self, code: ConnectReturnCode) -> Result<(), HandlerError> {
        if code != ConnectReturnCode::Success {
            return Err(self.on_refused(code));
        }

        self.status.connection_state = ConnectionState::Connected;
        self.status.last_activity = Some(chrono::Local::now());
        println!("Connected to MQTT broker");

        // Clean session: the subscription is renewed on every connect
        self.needs_subscribe = true;
        self.subscribe()?;
        self.status.has_connected = true;
        Ok(())
    }

    fn subscribe(&mut self) -> Result<(), HandlerError> {
        let topic = self.config.topics.subscription();
        self.client
            .try_subscribe(topic.as_str(), QoS::AtLeastOnce)
            .map_err(|source| HandlerError::Subscribe {
                topic: topic.clone(),
                source,
            })?;
        self.needs_subscribe = false;
        println!("Subscribed to: {} (QoS 1)", topic);
        Ok(())
    }

    fn on_message(&mut self, topic: &str, payload: &[u8]) -> RouteOutcome {
        self.status.messages_received += 1;
        self.status.last_activity = Some(chrono::Local::now());

        let outcome = self.router.route(topic, payload);
        match &outcome {
            RouteOutcome::StateUpdate { message, field, .. } => {
                debug!("{:?} updated at {}", field, message.timestamp);
            }
            RouteOutcome::Dropped { topic } => debug!("Nothing routed for {}", topic),
            _ => {}
        }
        for line in outcome.render() {
            println!("{}", line);
        }
        outcome
    }

    async fn disconnect(&mut self) {
        if self.status.connection_state != ConnectionState::Connected {
            return;
        }
        if let Err(e) = self.client.try_disconnect() {
            error!("Failed to request disconnect: {}", e);
            return;
        }

        // The disconnect packet only leaves once the event loop is polled
        let drain = async {
            loop {
                match self.eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        };
        if tokio::time::timeout(DISCONNECT_TIMEOUT, drain).await.is_err() {
            warn!("Broker did not take the disconnect in time");
        }
        self.status.connection_state = ConnectionState::Disconnected;
    }
}
