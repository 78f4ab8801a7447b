use serialport::{SerialPortInfo, SerialPortType};

use crate::error::{Result, TransportError};

/// Bus a serial port is attached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Usb,
    Pci,
    Bluetooth,
    Unknown,
}

impl PortKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PortKind::Usb => "usb",
            PortKind::Pci => "pci",
            PortKind::Bluetooth => "bluetooth",
            PortKind::Unknown => "unknown",
        }
    }
}

/// A serial port reported by the operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: PortKind,
    /// USB manufacturer/product string, or `vid:pid` when the device has none.
    pub description: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (kind, description) = match info.port_type {
            SerialPortType::UsbPort(usb) => {
                let label = match (usb.manufacturer, usb.product) {
                    (Some(m), Some(p)) => format!("{m} {p}"),
                    (Some(m), None) => m,
                    (None, Some(p)) => p,
                    (None, None) => format!("{:04x}:{:04x}", usb.vid, usb.pid),
                };
                (PortKind::Usb, Some(label))
            }
            SerialPortType::PciPort => (PortKind::Pci, None),
            SerialPortType::BluetoothPort => (PortKind::Bluetooth, None),
            SerialPortType::Unknown => (PortKind::Unknown, None),
        };
        Self {
            name: info.port_name,
            kind,
            description,
        }
    }
}

/// List the serial ports currently present on this system.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    Ok(ports.into_iter().map(PortInfo::from).collect())
}

/// Find `name` in a port listing.
pub fn find_port<'a>(ports: &'a [PortInfo], name: &str) -> Option<&'a PortInfo> {
    ports.iter().find(|port| port.name == name)
}

/// Fail with [`TransportError::PortNotFound`] unless `name` is a present port.
pub fn ensure_port_exists(name: &str) -> Result<PortInfo> {
    let ports = available_ports()?;
    find_port(&ports, name)
        .cloned()
        .ok_or_else(|| TransportError::PortNotFound(name.to_string()))
}
