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

//! create and destroy nodes of the cgroup hierarchy
use crate::error::*;
use nix::libc;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// the base dir of the cgroup
pub const CG_BASE_DIR: &str = "/sys/fs/cgroup";

/// the absolute path of a cgroup below the mount point. The cgroup is a
/// relative slash-separated identifier, anything that could step outside
/// the hierarchy is rejected.
pub fn cg_abs_path(cgroup: &str) -> Result<PathBuf> {
    let path = Path::new(cgroup);
    if path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(Error::InvalidCgroup {
            cgroup: cgroup.to_string(),
        });
    }

    Ok(Path::new(CG_BASE_DIR).join(path))
}

/// the absolute path of a control file inside a cgroup, fails with
/// `NotFound` if the cgroup itself does not exist
pub(crate) fn cg_control_file(cgroup: &str, control: &str) -> Result<PathBuf> {
    let abs = cg_abs_path(cgroup)?;
    if !abs.is_dir() {
        return Err(Error::NotFound {
            what: cgroup.to_string(),
        });
    }

    Ok(abs.join(control))
}

/// whether the cgroup exists, asked of the kernel on every call
pub fn cg_exists(cgroup: &str) -> bool {
    match cg_abs_path(cgroup) {
        Ok(abs) => abs.is_dir(),
        Err(_) => false,
    }
}

/// create a cgroup off of the base hierarchy. A missing ancestor is an
/// error unless `recursive` is set, then every missing ancestor is created
/// root to leaf. An existing cgroup is an error either way, also when a
/// concurrent creator wins the race for the final segment.
pub fn cg_create(cgroup: &str, recursive: bool) -> Result<()> {
    let abs = cg_abs_path(cgroup)?;
    if cgroup.is_empty() || abs.is_dir() {
        return Err(Error::AlreadyExists {
            cgroup: cgroup.to_string(),
        });
    }
    log::debug!("cgroup create path {:?}", abs);

    if !recursive {
        return match fs::create_dir(&abs) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(Error::AlreadyExists {
                cgroup: cgroup.to_string(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::MissingAncestor {
                ancestor: Path::new(cgroup)
                    .parent()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_default(),
            }),
            Err(e) => Err(Error::Io { source: e }),
        };
    }

    /* mkdir segment by segment; an ancestor that already exists is fine,
     * only the final segment reports a conflict */
    let mut path = PathBuf::from(CG_BASE_DIR);
    let mut components = Path::new(cgroup).components().peekable();
    while let Some(component) = components.next() {
        path.push(component);
        match fs::create_dir(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if components.peek().is_none() {
                    return Err(Error::AlreadyExists {
                        cgroup: cgroup.to_string(),
                    });
                }
            }
            Err(e) => return Err(Error::Io { source: e }),
        }
    }

    Ok(())
}

/// destroy a cgroup and every descendant, deepest first. The kernel refuses
/// to remove a cgroup with live children or attached processes, such a
/// refusal surfaces as `Busy` right away and already removed descendants
/// stay removed, the operation is not atomic across a subtree.
pub fn cg_destroy(cgroup: &str) -> Result<()> {
    if cgroup.is_empty() {
        /* the root cgroup is the mount point, it cannot be removed */
        return Err(Error::InvalidCgroup {
            cgroup: cgroup.to_string(),
        });
    }

    let abs = cg_abs_path(cgroup)?;
    if !abs.is_dir() {
        return Err(Error::NotFound {
            what: cgroup.to_string(),
        });
    }
    log::debug!("cgroup destroy path {:?}", abs);

    /* cgroupfs is a pseudo file system, control files cannot be unlinked,
     * they vanish together with their directory. rmdir in contents-first
     * order so every child is gone before its parent. */
    for entry in WalkDir::new(&abs)
        .contents_first(true)
        .into_iter()
        .filter_entry(|e| e.file_type().is_dir())
    {
        let entry = match entry {
            Ok(v) => v,
            Err(e) => return Err(Error::Io { source: e.into() }),
        };

        if let Err(e) = fs::remove_dir(entry.path()) {
            /* EBUSY: attached processes; ENOTEMPTY: a child showed up
             * behind the walk */
            if matches!(e.raw_os_error(), Some(libc::EBUSY | libc::ENOTEMPTY)) {
                return Err(Error::Busy {
                    path: entry.path().to_string_lossy().to_string(),
                });
            }
            return Err(Error::Io { source: e });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::cg_mounted;

    #[test]
    fn test_cg_abs_path() {
        assert_eq!(cg_abs_path("").unwrap(), Path::new(CG_BASE_DIR));
        assert_eq!(
            cg_abs_path("foo/bar").unwrap(),
            Path::new("/sys/fs/cgroup/foo/bar")
        );

        assert!(matches!(
            cg_abs_path("/foo"),
            Err(Error::InvalidCgroup { .. })
        ));
        assert!(matches!(
            cg_abs_path("foo/../bar"),
            Err(Error::InvalidCgroup { .. })
        ));
        assert!(matches!(
            cg_abs_path("./foo"),
            Err(Error::InvalidCgroup { .. })
        ));
    }

    #[test]
    fn test_cg_destroy_root_rejected() {
        assert!(matches!(cg_destroy(""), Err(Error::InvalidCgroup { .. })));
    }

    #[test]
    fn test_cg_create_destroy() {
        if !nix::unistd::getuid().is_root() {
            println!("Unprivileged users cannot create cgroups, skipping.");
            return;
        }
        if !matches!(cg_mounted(), Ok(true)) {
            println!("cgroup2 is not mounted at {}, skipping.", CG_BASE_DIR);
            return;
        }

        let cg = "cgroups2-test-hierarchy";
        /* clean up from previous runs */
        let _ = cg_destroy(cg);

        cg_create(cg, false).unwrap();
        assert!(cg_exists(cg));
        assert!(matches!(
            cg_create(cg, false),
            Err(Error::AlreadyExists { .. })
        ));

        let nested = "cgroups2-test-hierarchy/a/b";
        assert!(matches!(
            cg_create(nested, false),
            Err(Error::MissingAncestor { .. })
        ));
        assert!(!cg_exists("cgroups2-test-hierarchy/a"));

        cg_create(nested, true).unwrap();
        assert!(cg_exists("cgroups2-test-hierarchy/a"));
        assert!(cg_exists(nested));
        assert!(matches!(
            cg_create(nested, true),
            Err(Error::AlreadyExists { .. })
        ));

        cg_destroy(cg).unwrap();
        assert!(!cg_exists(cg));
        assert!(matches!(cg_destroy(cg), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_cg_create_race() {
        if !nix::unistd::getuid().is_root() {
            println!("Unprivileged users cannot create cgroups, skipping.");
            return;
        }
        if !matches!(cg_mounted(), Ok(true)) {
            println!("cgroup2 is not mounted at {}, skipping.", CG_BASE_DIR);
            return;
        }

        let cg = "cgroups2-test-race";
        let _ = cg_destroy(cg);

        let threads: Vec<_> = (0..2)
            .map(|_| std::thread::spawn(move || cg_create(cg, false)))
            .collect();
        let results: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();

        /* exactly one creator wins, the loser observes the conflict */
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for result in results {
            if let Err(e) = result {
                assert!(matches!(e, Error::AlreadyExists { .. }));
            }
        }

        cg_destroy(cg).unwrap();
    }
}
