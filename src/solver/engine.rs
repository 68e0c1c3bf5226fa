//! # Auto-Assignment Engine
//!
//! Partitions unassigned orders across available shippers under capacity,
//! shift-time, zone and priority constraints, using the external route
//! matrix service for travel times.
//!
//! ## Policy
//!
//! - Orders sharing a delivery address form one indivisible group: the
//!   whole group lands on one shipper and its stops are contiguous in the
//!   route.
//! - Groups are placed in priority order (tier 0 first), so an urgent order
//!   always wins a contested capacity slot and is sequenced ahead of lower
//!   tiers on the same route.
//! - A shipper is feasible for a group when the parcel count fits its
//!   capacity and the group can be fully served before the shift budget
//!   (`shift_start + max_session_minutes`) runs out.
//! - Among feasible shippers the engine picks the smallest added travel
//!   time, tie-broken toward the lighter workload.
//!
//! Orders with no feasible placement are reported back as unassigned, never
//! an error; the caller decides whether to retry, escalate, or wait for the
//! next sweep.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{SolverError, SolverResult};
use super::types::{Order, Shipper, ShipperRoute, SolveStats, Solution, TaskStop};
use crate::routing::{Coordinate, RouteMatrix, RouteMatrixClient, SolverMode, VehicleProfile};

/// One co-addressed group of orders, the indivisible placement unit.
struct StopGroup<'a> {
    delivery_address_id: Uuid,
    zone_id: &'a str,
    /// Most urgent tier among the members
    priority: i32,
    /// Matrix node of the group's address
    node: usize,
    members: Vec<&'a Order>,
    total_service_secs: i64,
}

/// Mutable route under construction for one shipper.
struct RouteCursor {
    node: usize,
    time: DateTime<Utc>,
    parcel_count: i32,
    stops: Vec<TaskStop>,
}

/// VRP engine over a pluggable route matrix client.
pub struct AutoAssignmentEngine {
    client: Arc<dyn RouteMatrixClient>,
}

impl AutoAssignmentEngine {
    pub fn new(client: Arc<dyn RouteMatrixClient>) -> Self {
        Self { client }
    }

    /// Solve a placement for the given shippers and orders.
    ///
    /// Fails fast with [`SolverError::Unavailable`] when the matrix service
    /// is unreachable or answers without matrix data, and with
    /// [`SolverError::MatrixShape`] when the matrix does not cover the
    /// requested coordinates.
    pub async fn solve(
        &self,
        shippers: &[Shipper],
        orders: &[Order],
        vehicle: VehicleProfile,
        mode: SolverMode,
    ) -> SolverResult<Solution> {
        if orders.is_empty() {
            return Ok(Solution {
                routes: Vec::new(),
                unassigned: Vec::new(),
                stats: SolveStats {
                    assigned_orders: 0,
                    unassigned_orders: 0,
                    workload_variance: 0.0,
                },
            });
        }
        if shippers.is_empty() {
            debug!(orders = orders.len(), "no shippers available, all orders unassigned");
            return Ok(Solution {
                routes: Vec::new(),
                unassigned: orders.iter().map(|o| o.parcel_id).collect(),
                stats: SolveStats {
                    assigned_orders: 0,
                    unassigned_orders: orders.len(),
                    workload_variance: 0.0,
                },
            });
        }

        // Shipper start points first, then order locations, matching the
        // matrix node numbering used below.
        let coordinates: Vec<Coordinate> = shippers
            .iter()
            .map(|s| s.start)
            .chain(orders.iter().map(|o| o.location))
            .collect();

        let matrix = self.client.matrix(&coordinates, vehicle, mode).await?;
        if !matrix.is_square(coordinates.len()) {
            return Err(SolverError::MatrixShape {
                expected: coordinates.len(),
                actual: matrix.durations.len(),
            });
        }

        let groups = build_stop_groups(orders, shippers.len());
        let (routes, unassigned) = place_groups(shippers, &groups, &matrix);

        let assigned: usize = routes.iter().map(ShipperRoute::parcel_count).sum();
        let stats = SolveStats {
            assigned_orders: assigned,
            unassigned_orders: unassigned.len(),
            workload_variance: workload_variance(shippers, &routes),
        };

        info!(
            shippers = shippers.len(),
            assigned = stats.assigned_orders,
            unassigned = stats.unassigned_orders,
            variance = stats.workload_variance,
            "auto-assignment solve finished"
        );

        Ok(Solution {
            routes,
            unassigned,
            stats,
        })
    }
}

/// Group orders by delivery address, preserving input order within a group.
///
/// The group node is the matrix index of the first member; co-addressed
/// orders share a location by construction.
fn build_stop_groups(orders: &[Order], shipper_count: usize) -> Vec<StopGroup<'_>> {
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut groups: Vec<StopGroup<'_>> = Vec::new();

    for (i, order) in orders.iter().enumerate() {
        match index.get(&order.delivery_address_id) {
            Some(&g) => {
                let group = &mut groups[g];
                group.members.push(order);
                group.total_service_secs += order.service_time_secs;
                group.priority = group.priority.min(order.priority);
            }
            None => {
                index.insert(order.delivery_address_id, groups.len());
                groups.push(StopGroup {
                    delivery_address_id: order.delivery_address_id,
                    zone_id: &order.zone_id,
                    priority: order.priority,
                    node: shipper_count + i,
                    members: vec![order],
                    total_service_secs: order.service_time_secs,
                });
            }
        }
    }

    // Urgent tiers first; insertion order breaks ties so the sweep stays
    // deterministic.
    groups.sort_by_key(|g| g.priority);
    groups
}

/// Greedy best-insertion placement of groups onto shipper routes.
fn place_groups(
    shippers: &[Shipper],
    groups: &[StopGroup<'_>],
    matrix: &RouteMatrix,
) -> (Vec<ShipperRoute>, Vec<Uuid>) {
    let mut cursors: Vec<RouteCursor> = shippers
        .iter()
        .enumerate()
        .map(|(i, s)| RouteCursor {
            node: i,
            time: s.shift_start,
            parcel_count: 0,
            stops: Vec::new(),
        })
        .collect();

    let mut unassigned: Vec<Uuid> = Vec::new();

    for group in groups {
        let mut best: Option<(usize, i64)> = None;

        for (i, shipper) in shippers.iter().enumerate() {
            if !shipper.serves_zone(group.zone_id) {
                continue;
            }
            let cursor = &cursors[i];
            if cursor.parcel_count + group.members.len() as i32 > shipper.capacity {
                continue;
            }

            let travel_secs = matrix.durations[cursor.node][group.node].round() as i64;
            let arrival = cursor.time + Duration::seconds(travel_secs);
            let finished = arrival + Duration::seconds(group.total_service_secs);
            if finished > shipper.shift_end() {
                continue;
            }

            let better = match best {
                None => true,
                Some((best_i, best_travel)) => {
                    travel_secs < best_travel
                        || (travel_secs == best_travel
                            && cursors[i].parcel_count < cursors[best_i].parcel_count)
                }
            };
            if better {
                best = Some((i, travel_secs));
            }
        }

        match best {
            Some((i, travel_secs)) => {
                append_group(&mut cursors[i], group, travel_secs);
            }
            None => {
                warn!(
                    delivery_address_id = %group.delivery_address_id,
                    orders = group.members.len(),
                    priority = group.priority,
                    "no feasible shipper for stop group"
                );
                unassigned.extend(group.members.iter().map(|o| o.parcel_id));
            }
        }
    }

    let routes = shippers
        .iter()
        .zip(cursors)
        .filter(|(_, c)| !c.stops.is_empty())
        .map(|(s, c)| ShipperRoute {
            shipper_id: s.shipper_id,
            stops: c.stops,
        })
        .collect();

    (routes, unassigned)
}

/// Append a whole group to a route: the first member carries the travel leg,
/// co-addressed followers arrive back-to-back with zero travel.
fn append_group(cursor: &mut RouteCursor, group: &StopGroup<'_>, travel_secs: i64) {
    let mut arrival = cursor.time + Duration::seconds(travel_secs);
    let mut leg = travel_secs;

    for member in &group.members {
        cursor.stops.push(TaskStop {
            parcel_id: member.parcel_id,
            delivery_address_id: group.delivery_address_id,
            sequence: cursor.stops.len() as i32 + 1,
            estimated_arrival: arrival,
            travel_secs: leg,
        });
        arrival += Duration::seconds(member.service_time_secs);
        leg = 0;
    }

    cursor.node = group.node;
    cursor.time = arrival;
    cursor.parcel_count += group.members.len() as i32;
}

/// Population variance of per-shipper parcel counts, idle shippers included.
fn workload_variance(shippers: &[Shipper], routes: &[ShipperRoute]) -> f64 {
    if shippers.is_empty() {
        return 0.0;
    }
    let by_shipper: HashMap<Uuid, usize> = routes
        .iter()
        .map(|r| (r.shipper_id, r.parcel_count()))
        .collect();
    let counts: Vec<f64> = shippers
        .iter()
        .map(|s| by_shipper.get(&s.shipper_id).copied().unwrap_or(0) as f64)
        .collect();
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64
}
