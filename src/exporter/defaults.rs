pub const EXPORTER_BINARY_PATH: &str = "/opt/node-exporter/bin/node_exporter";
pub const EXPORTER_USER: &str = "nobody";
pub const EXPORTER_GROUP: &str = "nobody";
pub const READINESS_MARKER: &str = "Listening";

pub const NODE_EXPORTER_LOG_FORMAT: &str = "NODE_EXPORTER_LOG_FORMAT";
pub const NODE_EXPORTER_LOG_LEVEL: &str = "NODE_EXPORTER_LOG_LEVEL";
pub const NODE_EXPORTER_PATH_ROOTFS: &str = "NODE_EXPORTER_PATH_ROOTFS";
pub const NODE_EXPORTER_PATH_PROCFS: &str = "NODE_EXPORTER_PATH_PROCFS";
pub const NODE_EXPORTER_PATH_SYSFS: &str = "NODE_EXPORTER_PATH_SYSFS";

pub const DEFAULT_LOG_FORMAT: &str = "json";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_PATH_ROOTFS: &str = "/host";
pub const DEFAULT_PATH_PROCFS: &str = "/proc";
pub const DEFAULT_PATH_SYSFS: &str = "/sys";

// Not configurable: the container's own mounts must never be reported, whatever the path overrides.
pub const LISTEN_ADDRESS: &str = ":9100";
pub const IGNORED_MOUNT_POINTS: &str = "^/(dev|proc|run|sys|host|var/lib/docker/.+)($|/)";
