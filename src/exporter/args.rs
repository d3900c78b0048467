use std::fmt;

use super::settings::ResolvedSettings;

/// Ordered arguments handed to the exporter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentList(Vec<String>);

impl ArgumentList {
    /// Synthesizes the exporter flags in a fixed order, followed by `extra` verbatim.
    pub fn synthesize<I, S>(settings: &ResolvedSettings, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let flags = [
            ("log.format", &settings.log_format),
            ("log.level", &settings.log_level),
            ("web.listen-address", &settings.listen_address),
            ("path.rootfs", &settings.path_rootfs),
            ("path.procfs", &settings.path_procfs),
            ("path.sysfs", &settings.path_sysfs),
            (
                "collector.filesystem.ignored-mount-points",
                &settings.ignored_mount_points,
            ),
        ];

        let args = flags
            .into_iter()
            .map(|(flag, value)| format!("--{flag}={value}"))
            .chain(extra.into_iter().map(Into::into))
            .collect();
        Self(args)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for ArgumentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

impl FromIterator<String> for ArgumentList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ArgumentList {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvironmentMap;
    use crate::exporter::defaults::*;

    fn synthesize(env: &[(&str, &str)]) -> Vec<String> {
        let env: EnvironmentMap = env.iter().copied().collect();
        ArgumentList::synthesize(&ResolvedSettings::resolve(&env), Vec::<String>::new())
            .into_iter()
            .collect()
    }

    const DEFAULT_ARGS: [&str; 7] = [
        "--log.format=json",
        "--log.level=info",
        "--web.listen-address=:9100",
        "--path.rootfs=/host",
        "--path.procfs=/proc",
        "--path.sysfs=/sys",
        "--collector.filesystem.ignored-mount-points=^/(dev|proc|run|sys|host|var/lib/docker/.+)($|/)",
    ];

    #[test]
    fn default_arguments() {
        assert_eq!(synthesize(&[]), DEFAULT_ARGS);
    }

    #[test]
    fn path_overrides_only_change_paths() {
        let args = synthesize(&[
            (NODE_EXPORTER_PATH_ROOTFS, "/mnt/root"),
            (NODE_EXPORTER_PATH_SYSFS, "/mnt/sys"),
            (NODE_EXPORTER_PATH_PROCFS, "/mnt/proc"),
        ]);

        let mut expected = DEFAULT_ARGS.map(str::to_string);
        expected[3] = "--path.rootfs=/mnt/root".to_string();
        expected[4] = "--path.procfs=/mnt/proc".to_string();
        expected[5] = "--path.sysfs=/mnt/sys".to_string();
        assert_eq!(args, expected);
    }

    #[test]
    fn log_overrides_only_change_log_flags() {
        let args = synthesize(&[
            (NODE_EXPORTER_LOG_FORMAT, "logfmt"),
            (NODE_EXPORTER_LOG_LEVEL, "debug"),
        ]);

        let mut expected = DEFAULT_ARGS.map(str::to_string);
        expected[0] = "--log.format=logfmt".to_string();
        expected[1] = "--log.level=debug".to_string();
        assert_eq!(args, expected);
    }

    #[test]
    fn unknown_variables_are_ignored() {
        assert_eq!(
            synthesize(&[("NODE_EXPORTER_COLLECTOR", "cpu"), ("PATH", "/usr/bin")]),
            DEFAULT_ARGS
        );
    }

    #[test]
    fn extra_arguments_follow_synthesized_flags() {
        let args = ArgumentList::synthesize(
            &ResolvedSettings::default(),
            ["--collector.systemd", "--no-collector.wifi"],
        );

        assert_eq!(args.len(), 9);
        assert_eq!(&args.as_slice()[..7], DEFAULT_ARGS);
        assert_eq!(
            &args.as_slice()[7..],
            ["--collector.systemd", "--no-collector.wifi"]
        );
    }

    #[test]
    fn display_joins_with_spaces() {
        let args = ArgumentList::synthesize(&ResolvedSettings::default(), Vec::<String>::new());

        assert_eq!(args.to_string(), DEFAULT_ARGS.join(" "));
    }
}
