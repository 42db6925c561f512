//! # Collector Configuration
//!
//! The command line options, parsed once and threaded through constructors
//! as an immutable value.

use crate::error::EmsError;
use std::str::FromStr;

/// Which room controller generation decodes the HK opmode messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RcType {
    Rc30,
    #[default]
    Rc35,
}

impl FromStr for RcType {
    type Err = EmsError;

    fn from_str(s: &str) -> Result<RcType, EmsError> {
        match s {
            "rc30" => Ok(RcType::Rc30),
            "rc35" => Ok(RcType::Rc35),
            other => Err(EmsError::Other(format!("unknown rc type '{other}'"))),
        }
    }
}

/// Where the bus is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// `serial:<device>` (receive only) or `tx-serial:<device>`.
    Serial { device: String, writable: bool },
    /// `tcp:<host>:<port>`.
    Tcp { host: String, port: u16 },
}

impl FromStr for TargetSpec {
    type Err = EmsError;

    fn from_str(s: &str) -> Result<TargetSpec, EmsError> {
        if let Some(device) = s.strip_prefix("tx-serial:") {
            return Ok(TargetSpec::Serial {
                device: device.to_string(),
                writable: true,
            });
        }
        if let Some(device) = s.strip_prefix("serial:") {
            return Ok(TargetSpec::Serial {
                device: device.to_string(),
                writable: false,
            });
        }
        if let Some(rest) = s.strip_prefix("tcp:") {
            if let Some((host, port)) = rest.rsplit_once(':') {
                let port = port
                    .parse()
                    .map_err(|_| EmsError::InvalidTarget(s.to_string()))?;
                return Ok(TargetSpec::Tcp {
                    host: host.to_string(),
                    port,
                });
            }
        }
        Err(EmsError::InvalidTarget(s.to_string()))
    }
}

/// Broker attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    /// Leading topic segment, `<prefix>/sensor/...` and `<prefix>/control/#`.
    pub prefix: String,
}

impl MqttConfig {
    /// Parses `host:port` with the topic prefix attached.
    pub fn parse(target: &str, prefix: &str) -> Result<MqttConfig, EmsError> {
        let (host, port) = target
            .rsplit_once(':')
            .ok_or_else(|| EmsError::InvalidTarget(target.to_string()))?;
        Ok(MqttConfig {
            host: host.to_string(),
            port: port
                .parse()
                .map_err(|_| EmsError::InvalidTarget(target.to_string()))?,
            prefix: prefix.trim_end_matches('/').to_string(),
        })
    }
}

/// Everything the collector needs to run.
#[derive(Debug, Clone)]
pub struct Config {
    pub target: TargetSpec,
    pub rc_type: RcType,
    /// Port of the line-based command socket; 0 disables it.
    pub command_port: u16,
    pub mqtt: Option<MqttConfig>,
    /// Republication throttle exposed to consumers; not enforced here.
    pub rate_limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_targets() {
        assert_eq!(
            "serial:/dev/ttyUSB0".parse::<TargetSpec>().unwrap(),
            TargetSpec::Serial {
                device: "/dev/ttyUSB0".into(),
                writable: false
            }
        );
        assert_eq!(
            "tx-serial:/dev/ttyAMA0".parse::<TargetSpec>().unwrap(),
            TargetSpec::Serial {
                device: "/dev/ttyAMA0".into(),
                writable: true
            }
        );
        assert_eq!(
            "tcp:gateway:5000".parse::<TargetSpec>().unwrap(),
            TargetSpec::Tcp {
                host: "gateway".into(),
                port: 5000
            }
        );
        assert!("pipe:/tmp/x".parse::<TargetSpec>().is_err());
        assert!("tcp:gateway".parse::<TargetSpec>().is_err());
    }

    #[test]
    fn parses_mqtt_target() {
        let mqtt = MqttConfig::parse("broker:1883", "/ems/").unwrap();
        assert_eq!(mqtt.host, "broker");
        assert_eq!(mqtt.port, 1883);
        assert_eq!(mqtt.prefix, "/ems");
    }
}
