//! The public face of the engine.
//!
//! [`OrderFlowApi`] drives an order through its lifecycle and [`DispatchApi`] gets delivery tasks into the hands of
//! agents. Both are generic over the storage backend and publish notifications through a
//! [`Notifier`](crate::notifications::Notifier) once their changes have been committed.
pub mod dispatch_api;
pub mod dispatch_objects;
pub mod order_flow_api;
pub mod order_objects;
