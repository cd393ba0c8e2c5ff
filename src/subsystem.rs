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

//! query and toggle the resource subsystems of a cgroup
//!
//! The set of subsystems is host and kernel dependent, names are opaque
//! strings rather than an enum.
use crate::cgroup::cg_control_file;
use crate::error::*;
use std::collections::HashSet;
use std::fs;

const CGROUP_CONTROLLERS: &str = "cgroup.controllers";
const CGROUP_SUBTREE_CONTROL: &str = "cgroup.subtree_control";

fn read_subsystems(cgroup: &str, control: &str) -> Result<HashSet<String>> {
    let path = cg_control_file(cgroup, control)?;
    let content = fs::read_to_string(path).context(IoSnafu)?;

    Ok(content.split_whitespace().map(String::from).collect())
}

/// the subsystems the cgroup is permitted to activate, read from
/// cgroup.controllers. Asking the root cgroup yields the set available on
/// the host.
pub fn available(cgroup: &str) -> Result<HashSet<String>> {
    read_subsystems(cgroup, CGROUP_CONTROLLERS)
}

/// whether every requested subsystem can be activated by the cgroup
pub fn all_available(cgroup: &str, subsystems: &[&str]) -> Result<bool> {
    let available = available(cgroup)?;

    Ok(subsystems.iter().all(|s| available.contains(*s)))
}

/// the subsystems currently active on the cgroup, read from
/// cgroup.subtree_control
pub fn enabled(cgroup: &str) -> Result<HashSet<String>> {
    read_subsystems(cgroup, CGROUP_SUBTREE_CONTROL)
}

/// whether every requested subsystem is currently active on the cgroup
pub fn all_enabled(cgroup: &str, subsystems: &[&str]) -> Result<bool> {
    let enabled = enabled(cgroup)?;

    Ok(subsystems.iter().all(|s| enabled.contains(*s)))
}

/// activate exactly the requested subsystems on the cgroup, deactivating
/// every subsystem not listed. Callers that want to keep the current set
/// have to read it and pass the union themselves.
///
/// The kernel takes "+name"/"-name" tokens on cgroup.subtree_control, a
/// bare name list is rejected. The whole transition goes out as one write
/// so enable and disable take effect together.
pub fn enable(cgroup: &str, subsystems: &[&str]) -> Result<()> {
    let available = available(cgroup)?;
    for subsystem in subsystems {
        if !available.contains(*subsystem) {
            return Err(Error::SubsystemUnavailable {
                subsystem: subsystem.to_string(),
            });
        }
    }

    let active = enabled(cgroup)?;
    let mut tokens: Vec<String> = subsystems.iter().map(|s| format!("+{}", s)).collect();
    for subsystem in &active {
        if !subsystems.contains(&subsystem.as_str()) {
            tokens.push(format!("-{}", subsystem));
        }
    }
    if tokens.is_empty() {
        return Ok(());
    }

    let path = cg_control_file(cgroup, CGROUP_SUBTREE_CONTROL)?;
    log::debug!("write {:?} to {:?}", tokens, path);
    fs::write(path, format!("{}\n", tokens.join(" "))).context(IoSnafu)
}
