use std::fs::{self, OpenOptions, Permissions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use lazy_static::lazy_static;
use nix::unistd::{Gid, Group, Uid, User, chown};
use regex::Regex;

use crate::errors::Error;

lazy_static! {
    static ref VOLUME_DIR: Regex = Regex::new(r"^pv\d+$").unwrap();
}

/// User and group an exported directory is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub uid: Uid,
    pub gid: Gid,
}

impl Owner {
    /// Resolve a user and the group of the same name.
    pub fn lookup(name: &str) -> Result<Owner, Error> {
        let user = User::from_name(name)?.ok_or_else(|| Error::UnknownOwner(name.into()))?;
        let group = Group::from_name(name)?.ok_or_else(|| Error::UnknownOwner(name.into()))?;
        Ok(Owner {
            uid: user.uid,
            gid: group.gid,
        })
    }
}

fn open_up(path: &Path, owner: Option<&Owner>) -> Result<(), Error> {
    if let Some(owner) = owner {
        chown(path, Some(owner.uid), Some(owner.gid))?;
    }
    fs::set_permissions(path, Permissions::from_mode(0o777))?;
    Ok(())
}

/// Create the export root (and parents) as a world-writable directory.
pub fn create_root_dir(path: &Path, owner: Option<&Owner>) -> Result<(), Error> {
    fs::create_dir_all(path)?;
    open_up(path, owner)
}

/// Create a single volume directory. Fails if it already exists.
pub fn create_volume_dir(path: &Path, owner: Option<&Owner>) -> Result<(), Error> {
    fs::create_dir(path)?;
    open_up(path, owner)
}

/// Number of `pv<N>` directories directly below `root`.
pub fn count_volumes(root: &Path) -> Result<u32, Error> {
    let mut count = 0;
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() && VOLUME_DIR.is_match(&entry.file_name().to_string_lossy())
        {
            count += 1;
        }
    }
    Ok(count)
}

pub fn export_line(path: &Path) -> String {
    format!("{} *(rw,root_squash)", path.display())
}

/// Append an export entry for `path`, creating the exports file if needed.
pub fn update_exports(exports: &Path, path: &Path) -> Result<(), Error> {
    let mut file = OpenOptions::new().create(true).append(true).open(exports)?;
    writeln!(file, "{}", export_line(path))?;
    Ok(())
}
