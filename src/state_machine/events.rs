use serde::{Deserialize, Serialize};

/// Events that can trigger parcel state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelEvent {
    /// Shipper scanned the parcel QR code at pickup
    ScanQr,
    /// Parcel handed over at the delivery address
    DeliverySuccessful,
    /// Receiver asked for a later delivery; parcel returns to the warehouse
    Postpone,
    /// Shipper deferred the stop within the running session
    Delay,
    /// Delivery attempt failed at the address
    CanNotDeliver,
    /// Delivery aborted by a traffic accident
    Accident,
    /// Confirmation reminder sent to the receiver (state refresh)
    ConfirmReminder,
    /// Receiver confirmation window elapsed without complaint
    ConfirmTimeout,
    /// Receiver explicitly confirmed receipt
    CustomerReceived,
    /// Receiver rejected the delivered parcel
    CustomerReject,
    /// Owning session closed while the parcel was deferred
    EndSession,
    /// Failed delivery escalated to a dispute
    OpenDispute,
    /// Failed parcel routed back for another attempt
    ReturnToWarehouse,
    /// Receiver withdrew the dispute
    CustomerRetract,
    /// Dispute resolved as a misunderstanding
    Misunderstanding,
    /// Dispute resolved against the platform
    FaultConfirmed,
}

impl ParcelEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ScanQr => "scan_qr",
            Self::DeliverySuccessful => "delivery_successful",
            Self::Postpone => "postpone",
            Self::Delay => "delay",
            Self::CanNotDeliver => "can_not_deliver",
            Self::Accident => "accident",
            Self::ConfirmReminder => "confirm_reminder",
            Self::ConfirmTimeout => "confirm_timeout",
            Self::CustomerReceived => "customer_received",
            Self::CustomerReject => "customer_reject",
            Self::EndSession => "end_session",
            Self::OpenDispute => "open_dispute",
            Self::ReturnToWarehouse => "return_to_warehouse",
            Self::CustomerRetract => "customer_retract",
            Self::Misunderstanding => "misunderstanding",
            Self::FaultConfirmed => "fault_confirmed",
        }
    }

    /// Check if this event settles the parcel into a terminal state
    pub fn is_settling(&self) -> bool {
        matches!(
            self,
            Self::ConfirmTimeout
                | Self::CustomerReceived
                | Self::CustomerRetract
                | Self::Misunderstanding
                | Self::FaultConfirmed
        )
    }
}

/// Events that can trigger assignment state transitions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AssignmentEvent {
    /// Shipper acknowledged the assignment
    Accept,
    /// Assignment started inside a session
    Start,
    /// All parcels delivered
    Complete,
    /// Delivery failed with a reason
    Fail(String),
    /// Shipper declined the assignment
    Refuse,
    /// Receiver pushed the delivery to a later time
    Postpone,
}

impl AssignmentEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Fail(_) => "fail",
            Self::Refuse => "refuse",
            Self::Postpone => "postpone",
        }
    }

    /// Extract the failure reason if this is a failure event
    pub fn fail_reason(&self) -> Option<&str> {
        match self {
            Self::Fail(reason) => Some(reason),
            _ => None,
        }
    }

    /// Check if this event represents a terminal transition
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Complete | Self::Fail(_) | Self::Refuse | Self::Postpone
        )
    }

    /// Create a failure event with the given reason
    pub fn fail_with_reason(reason: impl Into<String>) -> Self {
        Self::Fail(reason.into())
    }
}

/// Events that can trigger session state transitions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    /// First task started
    Start,
    /// Session closed (operator, shipper, or auto-close sweep)
    Complete,
    /// Session closed with a recorded failure reason
    Fail(String),
}

impl SessionEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Fail(_) => "fail",
        }
    }

    /// Extract the failure reason if this is a failure event
    pub fn fail_reason(&self) -> Option<&str> {
        match self {
            Self::Fail(reason) => Some(reason),
            _ => None,
        }
    }

    /// Check if this event represents a terminal transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Fail(_))
    }
}
