use super::defaults::*;
use crate::config::EnvironmentMap;

/// Exporter tunables resolved from the merged environment.
///
/// Every field always holds a non-empty value: unset or empty overrides fall back to the
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub log_format: String,
    pub log_level: String,
    pub listen_address: String,
    pub path_rootfs: String,
    pub path_procfs: String,
    pub path_sysfs: String,
    pub ignored_mount_points: String,
}

impl Default for ResolvedSettings {
    fn default() -> Self {
        Self::resolve(&EnvironmentMap::new())
    }
}

impl ResolvedSettings {
    pub fn resolve(env: &EnvironmentMap) -> Self {
        let or_default =
            |name: &str, default: &str| env.get_non_empty(name).unwrap_or(default).to_string();

        Self {
            log_format: or_default(NODE_EXPORTER_LOG_FORMAT, DEFAULT_LOG_FORMAT),
            log_level: or_default(NODE_EXPORTER_LOG_LEVEL, DEFAULT_LOG_LEVEL),
            listen_address: LISTEN_ADDRESS.to_string(),
            path_rootfs: or_default(NODE_EXPORTER_PATH_ROOTFS, DEFAULT_PATH_ROOTFS),
            path_procfs: or_default(NODE_EXPORTER_PATH_PROCFS, DEFAULT_PATH_PROCFS),
            path_sysfs: or_default(NODE_EXPORTER_PATH_SYSFS, DEFAULT_PATH_SYSFS),
            ignored_mount_points: IGNORED_MOUNT_POINTS.to_string(),
        }
    }

    /// Configurable settings as environment variables, in the env file naming.
    pub fn to_environment(&self) -> EnvironmentMap {
        [
            (NODE_EXPORTER_LOG_FORMAT, &self.log_format),
            (NODE_EXPORTER_LOG_LEVEL, &self.log_level),
            (NODE_EXPORTER_PATH_ROOTFS, &self.path_rootfs),
            (NODE_EXPORTER_PATH_PROCFS, &self.path_procfs),
            (NODE_EXPORTER_PATH_SYSFS, &self.path_sysfs),
        ]
        .into_iter()
        .map(|(name, value)| (name, value.as_str()))
        .collect()
    }
}
