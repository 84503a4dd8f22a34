//! Connection interface consumed by reconcilers.
//!
//! Reconcilers never talk HTTP themselves. They read and stage changes
//! through a [`LoginHandle`]; [`crate::session::UcsSession`] implements it
//! against a live UCS Manager and the `ucsm-test` crate provides an
//! in-memory implementation.

use async_trait::async_trait;

use crate::error::UcsmResult;
use crate::mo::ManagedObject;

/// An authenticated handle onto a UCS Manager object tree.
///
/// Mutations are staged by [`remove_mo`](LoginHandle::remove_mo) and
/// [`add_mo`](LoginHandle::add_mo) and only reach the appliance on
/// [`commit`](LoginHandle::commit).
#[async_trait]
pub trait LoginHandle: Send {
    /// Looks up a single object by dn. Returns `None` when it does not exist.
    async fn query_dn(&mut self, dn: &str) -> UcsmResult<Option<ManagedObject>>;

    /// Lists the direct children of `dn` with the given class.
    async fn query_children(&mut self, dn: &str, class_id: &str)
        -> UcsmResult<Vec<ManagedObject>>;

    /// Stages deletion of an object.
    async fn remove_mo(&mut self, mo: &ManagedObject) -> UcsmResult<()>;

    /// Stages an object (and the children it carries) for creation.
    ///
    /// With `modify_present` an existing object is updated in place instead
    /// of failing.
    async fn add_mo(&mut self, mo: ManagedObject, modify_present: bool) -> UcsmResult<()>;

    /// Submits every staged change in one request.
    async fn commit(&mut self) -> UcsmResult<()>;
}
