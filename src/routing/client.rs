//! # Route Matrix Client
//!
//! HTTP adapter for the external routing service. A request carries the
//! combined coordinate list plus vehicle and mode; the response is a square
//! duration matrix (seconds) and distance matrix (meters) aligned by input
//! index, with the waypoints echoed back.
//!
//! A non-"Ok" response code is logged but only fatal when matrix data is
//! absent. Transport errors and timeouts surface as [`RoutingError`]; the
//! auto-assignment engine maps those to its unavailable-solver failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use super::errors::{RoutingError, RoutingResult};

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Vehicle profile the matrix is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleProfile {
    Motorbike,
    Car,
}

impl Default for VehicleProfile {
    fn default() -> Self {
        Self::Motorbike
    }
}

impl fmt::Display for VehicleProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Motorbike => write!(f, "motorbike"),
            Self::Car => write!(f, "car"),
        }
    }
}

/// Optimization mode requested from the routing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverMode {
    /// Minimize travel duration
    Fastest,
    /// Minimize travel distance
    Shortest,
}

impl Default for SolverMode {
    fn default() -> Self {
        Self::Fastest
    }
}

/// Pairwise travel matrices aligned with the request coordinate order.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteMatrix {
    /// Travel times in seconds; `durations[i][j]` is origin i to target j
    pub durations: Vec<Vec<f64>>,
    /// Travel distances in meters, same alignment
    pub distances: Vec<Vec<f64>>,
    /// Waypoints echoed by the service
    pub waypoints: Vec<Coordinate>,
}

impl RouteMatrix {
    /// Whether both matrices are square with the given dimension.
    pub fn is_square(&self, dim: usize) -> bool {
        self.durations.len() == dim
            && self.distances.len() == dim
            && self.durations.iter().all(|row| row.len() == dim)
            && self.distances.iter().all(|row| row.len() == dim)
    }
}

/// Contract for fetching a travel matrix over a coordinate set.
#[async_trait]
pub trait RouteMatrixClient: Send + Sync {
    async fn matrix(
        &self,
        coordinates: &[Coordinate],
        vehicle: VehicleProfile,
        mode: SolverMode,
    ) -> RoutingResult<RouteMatrix>;
}

#[derive(Debug, Serialize)]
struct MatrixRequest<'a> {
    coordinates: &'a [Coordinate],
    vehicle: VehicleProfile,
    mode: SolverMode,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    code: String,
    durations: Option<Vec<Vec<f64>>>,
    distances: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    waypoints: Vec<Coordinate>,
}

/// reqwest-backed implementation of the matrix contract.
#[derive(Debug, Clone)]
pub struct HttpRouteMatrixClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpRouteMatrixClient {
    /// Build a client against the given service base URL with a bounded
    /// per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> RoutingResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            timeout,
        })
    }

    fn matrix_url(&self) -> String {
        format!("{}/v1/matrix", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl RouteMatrixClient for HttpRouteMatrixClient {
    async fn matrix(
        &self,
        coordinates: &[Coordinate],
        vehicle: VehicleProfile,
        mode: SolverMode,
    ) -> RoutingResult<RouteMatrix> {
        let request = MatrixRequest {
            coordinates,
            vehicle,
            mode,
        };

        debug!(
            waypoints = coordinates.len(),
            vehicle = %vehicle,
            "requesting route matrix"
        );

        let response = self
            .http
            .post(self.matrix_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RoutingError::Timeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    RoutingError::Unreachable(e)
                }
            })?;

        let body: MatrixResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                RoutingError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                }
            } else {
                RoutingError::MalformedResponse {
                    reason: format!("invalid matrix payload: {e}"),
                }
            }
        })?;

        if body.code != "Ok" {
            // Degraded answers still count as long as the matrices are present
            warn!(code = %body.code, "route matrix service returned non-Ok code");
        }

        match (body.durations, body.distances) {
            (Some(durations), Some(distances)) => Ok(RouteMatrix {
                durations,
                distances,
                waypoints: body.waypoints,
            }),
            _ => Err(RoutingError::MalformedResponse {
                reason: format!("matrix data absent (code: {})", body.code),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_square_check() {
        let matrix = RouteMatrix {
            durations: vec![vec![0.0, 10.0], vec![12.0, 0.0]],
            distances: vec![vec![0.0, 80.0], vec![95.0, 0.0]],
            waypoints: vec![Coordinate::new(10.76, 106.66), Coordinate::new(10.78, 106.70)],
        };
        assert!(matrix.is_square(2));
        assert!(!matrix.is_square(3));
    }

    #[test]
    fn test_ragged_matrix_is_not_square() {
        let matrix = RouteMatrix {
            durations: vec![vec![0.0, 10.0], vec![12.0]],
            distances: vec![vec![0.0, 80.0], vec![95.0, 0.0]],
            waypoints: vec![],
        };
        assert!(!matrix.is_square(2));
    }

    #[test]
    fn test_matrix_response_tolerates_missing_waypoints() {
        let body: MatrixResponse = serde_json::from_str(
            r#"{"code":"Ok","durations":[[0.0]],"distances":[[0.0]]}"#,
        )
        .unwrap();
        assert_eq!(body.code, "Ok");
        assert!(body.waypoints.is_empty());
    }
}
