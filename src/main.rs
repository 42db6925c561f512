use anyhow::Context;
use clap::Parser;
use ems_rs::command::run_command_server;
use ems_rs::config::{Config, MqttConfig, RcType, TargetSpec};
use ems_rs::constants::TRANSPORT_RETRY_DELAY;
use ems_rs::ems::serial::SerialTransport;
use ems_rs::ems::tcp::TcpTransport;
use ems_rs::ems::Transport;
use ems_rs::mqtt::run_mqtt;
use ems_rs::{init_logger, Collector};
use log::{error, info};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};

#[derive(Parser)]
#[command(name = "ems-collector")]
#[command(about = "Collector and command gateway for Buderus/Bosch EMS heating buses")]
#[command(version)]
struct Cli {
    /// Bus attachment: serial:<dev>, tx-serial:<dev> or tcp:<host>:<port>
    #[arg(short, long)]
    target: String,

    /// Room controller generation (rc30 or rc35)
    #[arg(long, default_value = "rc35")]
    rc_type: String,

    /// TCP port of the command socket; 0 disables it
    #[arg(short = 'p', long, default_value = "7950")]
    command_port: u16,

    /// MQTT broker as <host>:<port>
    #[arg(short, long)]
    mqtt_broker: Option<String>,

    /// Leading segment of the broker topics
    #[arg(long, default_value = "/ems")]
    mqtt_prefix: String,

    /// Minimum seconds between numeric republications (consumer hint)
    #[arg(long, default_value = "0")]
    rate_limit: u32,

    /// Debug sinks to enable: io, message, data
    #[arg(short, long, value_delimiter = ',')]
    debug: Vec<String>,
}

async fn open_transport(target: &TargetSpec) -> anyhow::Result<Box<dyn Transport>> {
    match target {
        TargetSpec::Serial { device, writable } => Ok(Box::new(
            SerialTransport::open(device, *writable)
                .with_context(|| format!("cannot open {device}"))?,
        )),
        TargetSpec::Tcp { host, port } => Ok(Box::new(
            TcpTransport::connect(host, *port)
                .await
                .with_context(|| format!("cannot connect to {host}:{port}"))?,
        )),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(&cli.debug);

    let config = Config {
        target: cli.target.parse().context("invalid --target")?,
        rc_type: cli.rc_type.parse::<RcType>().context("invalid --rc-type")?,
        command_port: cli.command_port,
        mqtt: cli
            .mqtt_broker
            .as_deref()
            .map(|broker| MqttConfig::parse(broker, &cli.mqtt_prefix))
            .transpose()
            .context("invalid --mqtt-broker")?,
        rate_limit: cli.rate_limit,
    };

    let (values_tx, _) = broadcast::channel(64);
    let (commands_tx, mut commands_rx) = mpsc::unbounded_channel();

    if config.command_port != 0 {
        let listener = TcpListener::bind(("0.0.0.0", config.command_port))
            .await
            .with_context(|| format!("cannot bind command port {}", config.command_port))?;
        info!("command socket listening on port {}", config.command_port);
        tokio::spawn(run_command_server(listener, commands_tx.clone()));
    }

    if let Some(mqtt) = config.mqtt.clone() {
        tokio::spawn(run_mqtt(mqtt, values_tx.subscribe(), commands_tx.clone()));
    }

    loop {
        let transport = match open_transport(&config.target).await {
            Ok(transport) => transport,
            Err(e) => {
                error!("{e:#}");
                tokio::select! {
                    _ = tokio::time::sleep(TRANSPORT_RETRY_DELAY) => continue,
                    _ = tokio::signal::ctrl_c() => return Ok(()),
                }
            }
        };

        info!("collecting from {}", cli.target);
        let collector = Collector::new(transport, &config, values_tx.clone());

        tokio::select! {
            result = collector.run(&mut commands_rx) => {
                if let Err(e) = result {
                    error!("transport failed: {e}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                return Ok(());
            }
        }

        // wait some time before reopening the transport
        tokio::select! {
            _ = tokio::time::sleep(TRANSPORT_RETRY_DELAY) => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}
