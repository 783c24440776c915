//! HTTP adapters for the outside services the engine depends on.
mod push;
mod razorpay;

pub use push::HttpPushSender;
pub use razorpay::RazorpayGateway;
