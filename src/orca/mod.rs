//! Request orchestration across the L1 and L2 tiers.
//!
//! An [`Orca`] receives one call per inbound request, drives the tiers in a
//! fixed order for that command, classifies what they answer and forwards the
//! final outcome to a [`crate::responder::Responder`].

mod dispatch;
mod l1l2;
mod orca;
#[cfg(test)]
mod test_support;

pub use dispatch::handle_request;
pub use l1l2::L1L2Orca;
pub use orca::Orca;
