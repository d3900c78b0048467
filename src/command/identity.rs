use std::fmt;

use nix::unistd::{Gid, Group, Uid, User};

use super::error::CommandError;

/// User and group a process runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user: String,
    group: String,
    uid: Uid,
    gid: Gid,
}

impl Identity {
    /// Looks both names up in the system user and group databases.
    pub fn resolve(user: &str, group: &str) -> Result<Self, CommandError> {
        let found_user = User::from_name(user)
            .map_err(|e| CommandError::IdentityLookup {
                name: user.to_string(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| CommandError::UnknownUser(user.to_string()))?;

        let found_group = Group::from_name(group)
            .map_err(|e| CommandError::IdentityLookup {
                name: group.to_string(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| CommandError::UnknownGroup(group.to_string()))?;

        Ok(Self {
            user: user.to_string(),
            group: group.to_string(),
            uid: found_user.uid,
            gid: found_group.gid,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub fn gid(&self) -> Gid {
        self.gid
    }

    /// Root user or root group.
    pub fn is_privileged(&self) -> bool {
        self.uid.is_root() || self.gid.as_raw() == 0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({}:{})", self.user, self.group, self.uid, self.gid)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use assert_matches::assert_matches;

    use super::*;

    /// Identity of the user running the tests, so spawning does not need privileges.
    pub(crate) fn current_identity() -> Identity {
        let user = User::from_uid(Uid::current()).unwrap().unwrap();
        let group = Group::from_gid(Gid::current()).unwrap().unwrap();
        Identity::resolve(&user.name, &group.name).unwrap()
    }

    #[test]
    fn resolve_current_identity() {
        let identity = current_identity();

        assert_eq!(identity.uid(), Uid::current());
        assert_eq!(identity.gid(), Gid::current());
    }

    #[test]
    fn root_is_privileged() {
        let root = Identity::resolve("root", "root").unwrap();

        assert!(root.is_privileged());
        assert_eq!(root.to_string(), "root:root (0:0)");
    }

    #[test]
    fn unknown_user() {
        let group = Group::from_gid(Gid::current()).unwrap().unwrap();

        let err = Identity::resolve("no-such-user-for-exporter", &group.name).unwrap_err();

        assert!(err.is_privilege_error());
        assert_matches!(err, CommandError::UnknownUser(name) => {
            assert_eq!(name, "no-such-user-for-exporter");
        });
    }

    #[test]
    fn unknown_group() {
        let user = User::from_uid(Uid::current()).unwrap().unwrap();

        let err = Identity::resolve(&user.name, "no-such-group-for-exporter").unwrap_err();

        assert!(err.is_privilege_error());
        assert_matches!(err, CommandError::UnknownGroup(name) => {
            assert_eq!(name, "no-such-group-for-exporter");
        });
    }
}
