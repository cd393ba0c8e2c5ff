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

//! the library of operation on the cgroup v2 unified hierarchy
//!
//! The kernel is the sole source of truth for the hierarchy: mount state,
//! node existence and controller activation are re-derived from the
//! filesystem on every call, nothing is cached in process.

mod cgroup;
pub mod error;
pub mod memory;
mod mount;
pub mod subsystem;

pub use crate::cgroup::cg_abs_path;
pub use crate::cgroup::cg_create;
pub use crate::cgroup::cg_destroy;
pub use crate::cgroup::cg_exists;
pub use crate::cgroup::CG_BASE_DIR;
pub use crate::mount::cg_enabled;
pub use crate::mount::cg_mount;
pub use crate::mount::cg_mounted;
pub use crate::mount::cg_prepare;
pub use crate::mount::cg_unmount;

/// the root cgroup; it shares its path with the mount point, so its
/// relative path is the empty string
pub const CG_ROOT: &str = "";
