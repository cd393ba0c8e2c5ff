// Copyright (c) 2022 Huawei Technologies Co.,Ltd. All rights reserved.
//
// sysMaster is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

//! mount state of the cgroup v2 file system
use crate::cgroup::CG_BASE_DIR;
use crate::error::*;
use crate::subsystem;
use crate::CG_ROOT;
use nix::mount::MsFlags;
use std::fs::File;
use std::io::{BufRead, BufReader};

const CGROUP2_FSTYPE: &str = "cgroup2";
const PROC_FILESYSTEMS: &str = "/proc/filesystems";
const PROC_MOUNTINFO: &str = "/proc/self/mountinfo";

#[derive(Debug, PartialEq, Eq)]
struct MountInfo {
    mount_point: String,
    fstype: String,
}

/* One line of /proc/PID/mountinfo:
 *   36 35 98:0 /mnt1 /mnt2 rw,noatime master:1 - ext3 /dev/root rw
 * The mount point sits at a fixed position before the "-" separator, the
 * filesystem type directly after it. The number of optional fields in
 * between varies per mount. */
fn parse_mount_line(line: &str) -> Option<MountInfo> {
    let (head, tail) = line.split_once(" - ")?;
    let mount_point = head.split_whitespace().nth(4)?;
    let fstype = tail.split_whitespace().next()?;

    Some(MountInfo {
        mount_point: mount_point.to_string(),
        fstype: fstype.to_string(),
    })
}

/// read the mount table of the calling process, fresh on every call
fn mount_table() -> Result<Vec<MountInfo>> {
    let file = File::open(PROC_MOUNTINFO).context(IoSnafu)?;

    let mut table = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.context(IoSnafu)?;
        match parse_mount_line(&line) {
            Some(info) => table.push(info),
            None => return Err(Error::DataFormat { data: line }),
        }
    }

    Ok(table)
}

/// whether the running kernel supports cgroup v2, regardless of whether the
/// file system is mounted
pub fn cg_enabled() -> Result<bool> {
    let file = File::open(PROC_FILESYSTEMS).context(IoSnafu)?;

    for line in BufReader::new(file).lines() {
        let line = line.context(IoSnafu)?;
        /* "nodev<TAB>cgroup2", the type is the last field */
        if line.split_whitespace().last() == Some(CGROUP2_FSTYPE) {
            return Ok(true);
        }
    }

    Ok(false)
}

/// whether cgroup v2 is mounted at /sys/fs/cgroup; a cgroup2 mount at any
/// other path is reported as `MountedElsewhere`
pub fn cg_mounted() -> Result<bool> {
    let table = mount_table()?;

    if table
        .iter()
        .any(|m| m.fstype == CGROUP2_FSTYPE && m.mount_point == CG_BASE_DIR)
    {
        return Ok(true);
    }

    if let Some(m) = table.iter().find(|m| m.fstype == CGROUP2_FSTYPE) {
        return Err(Error::MountedElsewhere {
            path: m.mount_point.clone(),
        });
    }

    Ok(false)
}

/// mount the cgroup v2 file system at /sys/fs/cgroup, fails if any file
/// system is already mounted there
pub fn cg_mount() -> Result<()> {
    if mount_table()?.iter().any(|m| m.mount_point == CG_BASE_DIR) {
        return Err(Error::AlreadyMounted {
            path: CG_BASE_DIR.to_string(),
        });
    }

    log::debug!("mount {} to {}", CGROUP2_FSTYPE, CG_BASE_DIR);
    nix::mount::mount(
        Some(CGROUP2_FSTYPE),
        CG_BASE_DIR,
        Some(CGROUP2_FSTYPE),
        MsFlags::MS_NOSUID | MsFlags::MS_NOEXEC | MsFlags::MS_NODEV,
        None::<&str>,
    )
    .context(NixSnafu)
}

/// unmount the cgroup v2 file system from /sys/fs/cgroup, fails if it is
/// not mounted there. The caller has to destroy all child cgroups first,
/// the kernel refuses to unmount a populated hierarchy.
pub fn cg_unmount() -> Result<()> {
    if !cg_mounted()? {
        return Err(Error::NotMounted {
            path: CG_BASE_DIR.to_string(),
        });
    }

    log::debug!("unmount {}", CG_BASE_DIR);
    nix::mount::umount(CG_BASE_DIR).context(NixSnafu)
}

/// entrypoint into cgroup v2: check kernel support, mount the file system
/// if it is not mounted yet, then enable the requested subsystems on the
/// root cgroup.
///
/// Enabling is a full replace, subsystems already delegated on the root but
/// not requested here are deactivated. Fails fast on the first sub-step,
/// completed mount/enable steps are not rolled back.
pub fn cg_prepare(subsystems: &[&str]) -> Result<()> {
    if !cg_enabled()? {
        return Err(Error::NotSupported);
    }

    if !cg_mounted()? {
        cg_mount()?;
    }

    subsystem::enable(CG_ROOT, subsystems)
}
