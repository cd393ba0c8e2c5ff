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

//! accounting and limit files of the memory subsystem
//!
//! The kernel does not expose the memory interface on the root cgroup,
//! every accessor here rejects it up front.
use crate::cgroup::cg_control_file;
use crate::error::*;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

const MEMORY_CURRENT: &str = "memory.current";
const MEMORY_MIN: &str = "memory.min";
const MEMORY_MAX: &str = "memory.max";

/* the literal the kernel uses for "no limit" in memory.max */
const MAX_TOKEN: &str = "max";

/// a memory limit, either a byte count or unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    bytes: Option<u64>,
}

impl Limit {
    /// the unlimited limit, serialized as the literal "max"
    pub fn max() -> Limit {
        Limit { bytes: None }
    }

    /// a concrete limit of `bytes` bytes
    pub fn bytes(bytes: u64) -> Limit {
        Limit { bytes: Some(bytes) }
    }

    /// the byte count, `None` when unlimited
    pub fn value(&self) -> Option<u64> {
        self.bytes
    }
}

impl FromStr for Limit {
    type Err = Error;

    /// accepts exactly the two forms the kernel emits: the literal "max"
    /// or a non-negative byte count
    fn from_str(s: &str) -> Result<Limit> {
        if s == MAX_TOKEN {
            return Ok(Limit::max());
        }
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::DataFormat {
                data: s.to_string(),
            });
        }

        let bytes = s.parse::<u64>().context(ParseIntSnafu)?;
        Ok(Limit::bytes(bytes))
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes {
            Some(bytes) => write!(f, "{}", bytes),
            None => write!(f, "{}", MAX_TOKEN),
        }
    }
}

fn memory_file(cgroup: &str, control: &str) -> Result<PathBuf> {
    if cgroup.is_empty() {
        return Err(Error::NotFound {
            what: control.to_string(),
        });
    }

    cg_control_file(cgroup, control)
}

fn read_bytes(cgroup: &str, control: &str) -> Result<u64> {
    let path = memory_file(cgroup, control)?;
    let content = fs::read_to_string(path).context(IoSnafu)?;

    content.trim().parse::<u64>().context(ParseIntSnafu)
}

/// the memory currently used by the cgroup and its descendants, in bytes
pub fn usage(cgroup: &str) -> Result<u64> {
    read_bytes(cgroup, MEMORY_CURRENT)
}

/// the floor below which the memory of the cgroup is not reclaimed
pub fn minimum(cgroup: &str) -> Result<u64> {
    read_bytes(cgroup, MEMORY_MIN)
}

/// set the floor below which the memory of the cgroup is not reclaimed
/// under pressure. The parent's effective value caps it, the kernel
/// enforces that, not this call.
pub fn set_minimum(cgroup: &str, bytes: u64) -> Result<()> {
    let path = memory_file(cgroup, MEMORY_MIN)?;
    log::debug!("write {} to {:?}", bytes, path);

    fs::write(path, format!("{}\n", bytes)).context(IoSnafu)
}

/// the hard ceiling on the memory of the cgroup and its descendants
pub fn maximum(cgroup: &str) -> Result<Limit> {
    let path = memory_file(cgroup, MEMORY_MAX)?;
    let content = fs::read_to_string(path).context(IoSnafu)?;

    content.trim().parse::<Limit>()
}

/// set the hard ceiling on the memory of the cgroup and its descendants,
/// exceeding it invokes the OOM killer against processes in the cgroup
pub fn set_maximum(cgroup: &str, limit: Limit) -> Result<()> {
    let path = memory_file(cgroup, MEMORY_MAX)?;
    log::debug!("write {} to {:?}", limit, path);

    fs::write(path, format!("{}\n", limit)).context(IoSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroup::{cg_create, cg_destroy, CG_BASE_DIR};
    use crate::mount::cg_mounted;
    use crate::subsystem;
    use crate::CG_ROOT;

    #[test]
    fn test_limit_parse() {
        assert_eq!("max".parse::<Limit>().unwrap(), Limit::max());
        assert_eq!("0".parse::<Limit>().unwrap(), Limit::bytes(0));
        assert_eq!(
            "1073741824".parse::<Limit>().unwrap(),
            Limit::bytes(1073741824)
        );

        assert!("".parse::<Limit>().is_err());
        assert!("-1".parse::<Limit>().is_err());
        assert!("+12".parse::<Limit>().is_err());
        assert!("12abc".parse::<Limit>().is_err());
        assert!("garbage".parse::<Limit>().is_err());
        assert!("max ".parse::<Limit>().is_err());
        /* one past u64::MAX */
        assert!("18446744073709551616".parse::<Limit>().is_err());
    }

    #[test]
    fn test_limit_round_trip() {
        for limit in [
            Limit::max(),
            Limit::bytes(0),
            Limit::bytes(4096),
            Limit::bytes(u64::MAX),
        ] {
            assert_eq!(limit.to_string().parse::<Limit>().unwrap(), limit);
        }

        assert_eq!(Limit::max().to_string(), "max");
        assert_eq!(Limit::bytes(512).to_string(), "512");
        assert_eq!(Limit::max().value(), None);
        assert_eq!(Limit::bytes(512).value(), Some(512));
    }

    #[test]
    fn test_root_cgroup_rejected() {
        assert!(matches!(usage(CG_ROOT), Err(Error::NotFound { .. })));
        assert!(matches!(minimum(CG_ROOT), Err(Error::NotFound { .. })));
        assert!(matches!(maximum(CG_ROOT), Err(Error::NotFound { .. })));
        assert!(matches!(
            set_minimum(CG_ROOT, 4096),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            set_maximum(CG_ROOT, Limit::max()),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_memory_accessors() {
        if !nix::unistd::getuid().is_root() {
            println!("Unprivileged users cannot set memory limits, skipping.");
            return;
        }
        if !matches!(cg_mounted(), Ok(true)) {
            println!("cgroup2 is not mounted at {}, skipping.", CG_BASE_DIR);
            return;
        }
        let host = subsystem::available(CG_ROOT).unwrap();
        if !host.contains("memory") {
            println!("The memory subsystem is unavailable, skipping.");
            return;
        }

        /* the memory interface only appears on children once the root
         * delegates the subsystem */
        let mut request: Vec<String> =
            subsystem::enabled(CG_ROOT).unwrap().into_iter().collect();
        if !request.iter().any(|s| s == "memory") {
            request.push("memory".to_string());
            let request: Vec<&str> = request.iter().map(String::as_str).collect();
            subsystem::enable(CG_ROOT, &request).unwrap();
        }

        let cg = "cgroups2-test-memory";
        let _ = cg_destroy(cg);
        cg_create(cg, false).unwrap();

        assert!(usage(cg).is_ok());

        /* multiples of every page size the kernel rounds to */
        set_minimum(cg, 67108864).unwrap();
        assert_eq!(minimum(cg).unwrap(), 67108864);

        set_maximum(cg, Limit::bytes(134217728)).unwrap();
        assert_eq!(maximum(cg).unwrap(), Limit::bytes(134217728));

        set_maximum(cg, Limit::max()).unwrap();
        assert_eq!(maximum(cg).unwrap(), Limit::max());

        cg_destroy(cg).unwrap();
    }
}
