//! MQTT bus client (rumqttc, blocking API)

use super::{CommandSender, Publisher};
use crate::config::MqttConfig;
use crate::error::{Error, Result};
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Outgoing request capacity between the session and the network thread
const REQUEST_CAPACITY: usize = 10;

/// Pause after a connection error before the client retries
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Status publisher backed by an MQTT client
pub struct MqttPublisher {
    client: Client,
}

impl MqttPublisher {
    /// Ask the network thread to disconnect from the broker
    pub fn disconnect(&mut self) -> Result<()> {
        self.client.disconnect()?;
        Ok(())
    }
}

impl Publisher for MqttPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        // Never block the poll loop on a stalled network thread
        self.client
            .try_publish(topic, QoS::AtLeastOnce, false, payload.to_vec())?;
        Ok(())
    }
}

/// MQTT connection setup
pub struct MqttBus;

impl MqttBus {
    /// Connect to the broker and start the network thread
    ///
    /// The thread subscribes to the command topic on every (re)connect and
    /// pushes each received payload into `commands` as a command name. It
    /// exits once `running` is cleared.
    pub fn start(
        config: &MqttConfig,
        commands: CommandSender,
        running: Arc<AtomicBool>,
    ) -> Result<(MqttPublisher, JoinHandle<()>)> {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        let (client, connection) = Client::new(options, REQUEST_CAPACITY);

        let subscriber = client.clone();
        let command_topic = config.command_topic.clone();
        let handle = thread::Builder::new()
            .name("mqtt-client".to_string())
            .spawn(move || {
                network_loop(connection, subscriber, &command_topic, commands, running);
            })
            .map_err(|e| Error::Bus(format!("Failed to spawn MQTT thread: {}", e)))?;

        log::info!(
            "MQTT client {} connecting to {}:{}",
            config.client_id,
            config.host,
            config.port
        );

        Ok((MqttPublisher { client }, handle))
    }
}

fn network_loop(
    mut connection: Connection,
    client: Client,
    command_topic: &str,
    commands: CommandSender,
    running: Arc<AtomicBool>,
) {
    for notification in connection.iter() {
        if !running.load(Ordering::Relaxed) {
            break;
        }

        match notification {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                log::info!("MQTT connected, subscribing to {}", command_topic);
                if let Err(e) = client.try_subscribe(command_topic, QoS::AtMostOnce) {
                    log::error!("MQTT subscribe to {} failed: {}", command_topic, e);
                }
            }
            Ok(Event::Incoming(Packet::Publish(p))) => match String::from_utf8(p.payload.to_vec())
            {
                Ok(name) => {
                    let name = name.trim().to_string();
                    log::debug!("MQTT command on {}: {:?}", p.topic, name);
                    if !commands.push(name) {
                        log::warn!("Command queue closed, stopping MQTT thread");
                        break;
                    }
                }
                Err(e) => log::warn!("Ignoring non-UTF-8 command on {}: {}", p.topic, e),
            },
            Ok(_) => {}
            Err(e) => {
                log::error!("MQTT connection error: {}", e);
                thread::sleep(RECONNECT_DELAY);
            }
        }
    }

    log::info!("MQTT thread exiting");
}
