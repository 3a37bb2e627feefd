//! Organization-scoped user management.
//!
//! Every operation starts from the authenticated identity, re-reads the
//! caller from storage, and only ever touches users in the caller's own
//! organization.

mod manager;

pub use manager::MemberManager;
