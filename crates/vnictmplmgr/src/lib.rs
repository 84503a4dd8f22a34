//! vnictmplmgr - vNIC template VLAN reconciler for Cisco UCS Manager
//!
//! Brings a `vnicLanConnTempl` and its `vnicEtherIf` VLAN interfaces in line
//! with a declaration, through any `LoginHandle`.

mod builders;
mod classes;
mod task_file;
mod types;
mod vnic_templ_mgr;

pub use builders::*;
pub use classes::*;
pub use task_file::{ConnectionParams, TaskFile};
pub use types::*;
pub use vnic_templ_mgr::VnicTemplateMgr;
