#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use nix::unistd::{Gid, Group, Uid, User};

pub const BIN: &str = "node-exporter-bootstrap";

/// Bootstrap command with an empty environment, so nothing from the test host leaks in.
pub fn bootstrap() -> Command {
    let mut cmd = Command::cargo_bin(BIN).unwrap();
    cmd.env_clear();
    cmd
}

/// Shell script standing in for node_exporter.
pub fn fake_exporter(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("node_exporter");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// `--user` and `--group` of the user running the tests, so no privileges are needed.
pub fn current_identity_args() -> [String; 4] {
    let user = User::from_uid(Uid::current()).unwrap().unwrap();
    let group = Group::from_gid(Gid::current()).unwrap().unwrap();
    [
        "--user".to_string(),
        user.name,
        "--group".to_string(),
        group.name,
    ]
}
