//! Shared types for the billing synchronizer.
//!
//! This crate provides:
//! - Subscription status enum mirroring the gateway vocabulary
//! - The `Subject` sum type (individual user or team)
//! - Team roles
//! - The projected `Subscription` record and entitlement response types

mod errors;
mod responses;
mod subject;
mod subscription;
mod team;

pub use errors::ErrorCode;
pub use responses::{SeatSummary, SubscriptionResolution};
pub use subject::{Subject, SubjectKind};
pub use subscription::{Subscription, SubscriptionStatus};
pub use team::TeamRole;
