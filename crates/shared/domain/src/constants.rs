//! Paths of the built-in fact sections.

pub const HARDWARE: &str = "hardware";
pub const HARDWARE_PROCESSOR: &str = "hardware.processor";
pub const HARDWARE_MEMORY: &str = "hardware.memory";
pub const HARDWARE_DISKS: &str = "hardware.disks";
pub const HARDWARE_NETWORK: &str = "hardware.network";
pub const HARDWARE_POWER: &str = "hardware.power";
pub const HARDWARE_SENSORS: &str = "hardware.sensors";
pub const HARDWARE_GRAPHICS: &str = "hardware.graphics";
pub const HARDWARE_DISPLAYS: &str = "hardware.displays";
pub const HARDWARE_USB: &str = "hardware.usb";
pub const HARDWARE_SOUND: &str = "hardware.sound";

pub const OS: &str = "os";
pub const OS_FILESYSTEM: &str = "os.filesystem";
pub const OS_NETWORK: &str = "os.network";
pub const OS_PROCESSES: &str = "os.processes";
pub const OS_SERVICES: &str = "os.services";
pub const OS_SESSIONS: &str = "os.sessions";

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';
