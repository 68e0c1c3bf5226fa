use serde::{Deserialize, Serialize};
use std::fmt;

/// Parcel lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ParcelStatus {
    /// Parcel is at the warehouse awaiting a route
    InWarehouse,
    /// Parcel is on a shipper's active route
    OnRoute,
    /// Parcel was handed over, awaiting receiver confirmation
    Delivered,
    /// Delivery deferred within the current session
    Delayed,
    /// Delivery attempt failed
    Failed,
    /// Receiver contested the delivery outcome
    Dispute,
    /// Delivery settled successfully
    Succeeded,
    /// Parcel written off after a confirmed fault
    Lost,
}

impl ParcelStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Lost)
    }

    /// Check if the parcel is eligible for assignment from the warehouse
    pub fn is_assignable(&self) -> bool {
        matches!(self, Self::InWarehouse)
    }
}

impl fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InWarehouse => write!(f, "in_warehouse"),
            Self::OnRoute => write!(f, "on_route"),
            Self::Delivered => write!(f, "delivered"),
            Self::Delayed => write!(f, "delayed"),
            Self::Failed => write!(f, "failed"),
            Self::Dispute => write!(f, "dispute"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Lost => write!(f, "lost"),
        }
    }
}

impl std::str::FromStr for ParcelStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_warehouse" => Ok(Self::InWarehouse),
            "on_route" => Ok(Self::OnRoute),
            "delivered" => Ok(Self::Delivered),
            "delayed" => Ok(Self::Delayed),
            "failed" => Ok(Self::Failed),
            "dispute" => Ok(Self::Dispute),
            "succeeded" => Ok(Self::Succeeded),
            "lost" => Ok(Self::Lost),
            _ => Err(format!("Invalid parcel status: {s}")),
        }
    }
}

impl Default for ParcelStatus {
    fn default() -> Self {
        Self::InWarehouse
    }
}

/// Delivery assignment states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Created, not yet acknowledged by the shipper
    Pending,
    /// Shipper scanned and acknowledged the assignment
    Accepted,
    /// Assignment is being worked inside a session
    InProgress,
    /// All parcels delivered
    Completed,
    /// Assignment terminated without delivery
    Failed,
}

impl AssignmentStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if the assignment can still be bound to a new session
    pub fn is_bindable(&self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid assignment status: {s}")),
        }
    }
}

impl Default for AssignmentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Delivery session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session created, no task started yet
    Created,
    /// Shipper started working the session
    InProgress,
    /// Session closed normally
    Completed,
    /// Session closed with an operator-recorded failure
    Failed,
}

impl SessionStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if the session is actively being worked
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid session status: {s}")),
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::Created
    }
}
