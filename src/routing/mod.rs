// Thin adapter to the external route matrix service.
//
// The solver's internal algorithm is not modeled here; this module only owns
// the wire contract and the failure semantics of the call.

pub mod client;
pub mod errors;

pub use client::{
    Coordinate, HttpRouteMatrixClient, RouteMatrix, RouteMatrixClient, SolverMode, VehicleProfile,
};
pub use errors::{RoutingError, RoutingResult};
