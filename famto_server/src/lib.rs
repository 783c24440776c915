//! # Famto server
//! This crate hosts the deployable Famto order service. It is responsible for:
//! * Exposing the order lifecycle and task dispatch operations of the engine over HTTP.
//! * Streaming notifications to connected users as server-sent events.
//! * Refunding online payments through Razorpay and sending push notifications.
//! * Periodically sweeping lapsed task offers.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/orders/{id}/confirm`, `/orders/{id}/reject`, `/orders/{id}/ready`, `/orders/{id}/complete`: order transitions.
//! * `/tasks/{id}/accept`, `/tasks/{id}/decline`: agent responses to task offers.
//! * `/realtime/{userId}`: the user's notification stream.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod integrations;
pub mod realtime;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
