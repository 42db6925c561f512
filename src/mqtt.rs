//! # Broker Adapter
//!
//! Publishes every valid decoded value to
//! `<prefix>/sensor/[<subsystem>/][<quantity>/]value` and subscribes to
//! `<prefix>/control/#`: the topic tail with `/` replaced by spaces,
//! concatenated with the payload, forms a command line for the translator.
//! Connection losses reconnect with exponential backoff.

use crate::command::ClientRequest;
use crate::config::MqttConfig;
use crate::constants::{MQTT_RETRY_MAX, MQTT_RETRY_MIN};
use crate::logging;
use crate::payload::names::{format_value, quantity_name, subsystem_name};
use crate::payload::value::{EmsValue, Reading};
use log::{debug, info, warn};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;

const CLIENT_ID: &str = "ems-collector";

/// Connects, publishes values and relays control messages until the value
/// stream closes. Never returns on broker trouble; it backs off and
/// reconnects instead.
pub async fn run_mqtt(
    config: MqttConfig,
    mut values: broadcast::Receiver<EmsValue>,
    requests: mpsc::UnboundedSender<ClientRequest>,
) {
    let mut retry_delay = MQTT_RETRY_MIN;

    loop {
        let mut options = MqttOptions::new(CLIENT_ID, config.host.as_str(), config.port);
        options.set_keep_alive(Duration::from_secs(30));
        let (client, mut eventloop) = AsyncClient::new(options, 10);
        let mut connected = false;

        loop {
            tokio::select! {
                event = eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("connected to broker {}:{}", config.host, config.port);
                        connected = true;
                        retry_delay = MQTT_RETRY_MIN;
                        let filter = format!("{}/control/#", config.prefix);
                        if let Err(e) = client.subscribe(filter, QoS::ExactlyOnce).await {
                            warn!("broker subscribe failed: {e}");
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        forward_command(&config, &publish, &requests);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("broker connection lost: {e}");
                        break;
                    }
                },
                value = values.recv() => match value {
                    Ok(value) => {
                        if connected {
                            publish_value(&client, &config.prefix, &value).await;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("value stream lagged, {skipped} readings dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                },
            }
        }

        debug!(target: logging::IO, "MQTT: reconnecting in {}s", retry_delay.as_secs());
        sleep(retry_delay).await;
        retry_delay = (retry_delay * 2).min(MQTT_RETRY_MAX);
    }
}

/// Turns a control publish into a command line. Output lines of the
/// command only show up on the debug log; the broker side has no response
/// channel.
fn forward_command(
    config: &MqttConfig,
    publish: &rumqttc::Publish,
    requests: &mpsc::UnboundedSender<ClientRequest>,
) {
    let control_prefix = format!("{}/control/", config.prefix);
    let Some(tail) = publish.topic.strip_prefix(control_prefix.as_str()) else {
        return;
    };

    let mut command = tail.replace('/', " ");
    let payload = String::from_utf8_lossy(&publish.payload);
    if !payload.trim().is_empty() {
        command.push(' ');
        command.push_str(payload.trim());
    }
    debug!(target: logging::IO, "MQTT: control message '{command}'");

    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        while let Some(line) = reply_rx.recv().await {
            debug!(target: logging::IO, "MQTT: command result '{line}'");
        }
    });
    let _ = requests.send(ClientRequest {
        line: command,
        reply: reply_tx,
    });
}

async fn publish_value(client: &AsyncClient, prefix: &str, value: &EmsValue) {
    // invalid sensor readings never reach the sensor topics
    if !value.valid && matches!(value.reading, Reading::Numeric(_) | Reading::Integer(_)) {
        return;
    }

    let mut topic = format!("{prefix}/sensor/");
    let subsystem = subsystem_name(value.subsystem);
    if !subsystem.is_empty() {
        topic.push_str(subsystem);
        topic.push('/');
    }
    let quantity = quantity_name(value.quantity);
    if !quantity.is_empty() {
        topic.push_str(quantity);
        topic.push('/');
    }
    topic.push_str("value");

    let formatted = format_value(value);
    debug!(target: logging::IO, "MQTT: publishing '{topic}' = {formatted}");
    if let Err(e) = client.publish(topic, QoS::AtMostOnce, false, formatted).await {
        warn!("broker publish failed: {e}");
    }
}
