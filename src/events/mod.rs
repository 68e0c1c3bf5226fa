// Event system: envelopes, payload contracts and the in-process bus.

pub mod payloads;
pub mod publisher;

pub use payloads::{DispatchEvent, EventEnvelope, SOURCE_SERVICE};
pub use publisher::EventPublisher;
