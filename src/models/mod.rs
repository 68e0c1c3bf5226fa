// Data layer: persisted entities for the delivery lifecycle.
//
// Entities carry no transition logic. Parcel status moves only through the
// parcel state machine; session counters are written only by the session
// lifecycle manager.

pub mod assignment;
pub mod parcel;
pub mod session;

pub use assignment::DeliveryAssignment;
pub use parcel::{NewParcel, Parcel};
pub use session::{DeliverySession, ShipperProfile};
