//! Famto Engine
//!
//! The Famto engine drives marketplace orders from placement to delivery. It is the core of the Famto order service,
//! and knows nothing about HTTP, push providers or payment provider wire formats.
//!
//! The library is divided into these main sections:
//! 1. The engine public API ([`mod@engine_api`]). [`OrderFlowApi`] moves orders through their lifecycle (confirm,
//!    reject with refund, ready, complete) and [`DispatchApi`] creates delivery tasks, offers them to agents and
//!    settles the race when several agents accept the same task.
//! 2. Storage contracts ([`mod@traits`]) and the SQLite backend that implements them ([`SqliteDatabase`]). The data
//!    types used in the database are defined in [`mod@db_types`] and are public.
//! 3. Pure policy modules: agent pool selection ([`mod@pool`]), distance filtering ([`mod@geo`]), the commission split
//!    ([`mod@commission`]) and refund resolution ([`mod@refund`]).
//! 4. Notifications ([`mod@notifications`]). Business flows publish events after they commit. The fan-out delivers
//!    them over push and realtime channels on the event channels defined in [`mod@events`].
pub mod commission;
pub mod db_types;
pub mod engine_api;
pub mod events;
pub mod geo;
pub mod notifications;
pub mod pool;
pub mod refund;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "test_utils")]
pub mod test_utils;

pub use engine_api::{
    dispatch_api::DispatchApi,
    dispatch_objects::{DispatchReport, ExpiryReport},
    order_flow_api::OrderFlowApi,
    order_objects::{ConfirmResult, ConfirmWarning},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
