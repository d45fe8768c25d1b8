//! Device definitions and connection-string parsing.

/// A configured AirSend device.
///
/// Built once by the resolver and immutable for the process lifetime.
/// Connection fields may be absent when configuration is incomplete; such
/// devices stay in the table and later operations on them fail with a
/// missing-configuration condition instead of aborting startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Device {
    /// Unique device name, the key into the device table.
    pub name: String,
    /// Device host address (IP or hostname).
    pub host: Option<String>,
    /// Device access credential.
    pub credential: Option<String>,
    /// RPC port override; the default port is applied at call time.
    pub port: Option<u16>,
    /// Raw connection string as configured, after secret resolution.
    pub connection: Option<String>,
    /// Radio channel descriptor, when the device is addressable by channel.
    pub channel: Option<ChannelConfig>,
    /// Vendor type code (4099 identifies a roller-shutter device).
    pub device_type: Option<i64>,
}

/// Radio channel descriptor of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelConfig {
    pub id: Option<i64>,
    pub source: Option<i64>,
    /// Whether the device should be armed for event reception.
    pub listen: bool,
}

/// Credential, host, and optional port extracted from a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParts {
    pub credential: String,
    pub host: String,
    pub port: Option<u16>,
}

/// Parse a `scheme://credential@host[:port]` connection string.
///
/// Returns `None` when the value does not match the pattern; callers retain
/// the raw value in that case. Credential and host must both be non-empty so
/// a device record is never partially populated.
pub fn parse_connection(raw: &str) -> Option<ConnectionParts> {
    let (scheme, rest) = raw.split_once("://")?;
    if scheme.is_empty() {
        return None;
    }
    let (credential, authority) = rest.split_once('@')?;
    if credential.is_empty() {
        return None;
    }
    let (host, port) = match authority.split_once(':') {
        Some((host, tail)) => {
            let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
            (host, digits.parse().ok())
        }
        None => (authority, None),
    };
    if host.is_empty() {
        return None;
    }
    Some(ConnectionParts {
        credential: credential.to_string(),
        host: host.to_string(),
        port,
    })
}

/// The ordered device table.
///
/// Iteration order is configuration order; channel matching is
/// first-match-wins over that order, so the table never reorders devices.
#[derive(Debug, Clone, Default)]
pub struct DeviceTable {
    devices: Vec<Device>,
}

impl DeviceTable {
    pub fn from_devices(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    /// First device whose channel descriptor matches the given id and
    /// source. Devices sharing a pair are shadowed by the earlier one.
    pub fn find_by_channel(&self, channel: i64, source: i64) -> Option<&Device> {
        self.devices.iter().find(|d| {
            d.channel
                .as_ref()
                .is_some_and(|c| c.id == Some(channel) && c.source == Some(source))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connection_basic() {
        let parts = parse_connection("sp://hunter2@192.168.1.20").unwrap();
        assert_eq!(parts.credential, "hunter2");
        assert_eq!(parts.host, "192.168.1.20");
        assert_eq!(parts.port, None);
    }

    #[test]
    fn test_parse_connection_with_port() {
        let parts = parse_connection("sp://hunter2@192.168.1.20:4000").unwrap();
        assert_eq!(parts.port, Some(4000));
    }

    #[test]
    fn test_parse_connection_bad_port_ignored() {
        let parts = parse_connection("sp://hunter2@host:abc").unwrap();
        assert_eq!(parts.host, "host");
        assert_eq!(parts.port, None);
    }

    #[test]
    fn test_parse_connection_rejects_missing_pieces() {
        assert!(parse_connection("not a url").is_none());
        assert!(parse_connection("sp://no-separator").is_none());
        assert!(parse_connection("sp://@host").is_none());
        assert!(parse_connection("sp://cred@").is_none());
        assert!(parse_connection("://cred@host").is_none());
    }

    #[test]
    fn test_find_by_channel_first_match_wins() {
        let make = |name: &str| Device {
            name: name.to_string(),
            channel: Some(ChannelConfig {
                id: Some(77),
                source: Some(9),
                listen: true,
            }),
            ..Device::default()
        };
        let table = DeviceTable::from_devices(vec![make("first"), make("second")]);
        assert_eq!(table.find_by_channel(77, 9).unwrap().name, "first");
    }

    #[test]
    fn test_find_by_channel_requires_both_fields() {
        let device = Device {
            name: "half".to_string(),
            channel: Some(ChannelConfig {
                id: Some(77),
                source: None,
                listen: false,
            }),
            ..Device::default()
        };
        let table = DeviceTable::from_devices(vec![device]);
        assert!(table.find_by_channel(77, 9).is_none());
    }

    #[test]
    fn test_get_by_name() {
        let device = Device {
            name: "gate".to_string(),
            ..Device::default()
        };
        let table = DeviceTable::from_devices(vec![device]);
        assert!(table.get("gate").is_some());
        assert!(table.get("missing").is_none());
    }
}
