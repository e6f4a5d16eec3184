use std::sync::Arc;

use fixedbitset::FixedBitSet;
use fxhash::FxHashSet;
use parking_lot::RwLock;
use tracing::trace;

use crate::{
    insertion::insertion_data::InsertionData,
    problem::{
        job::JobIdx,
        vehicle::{VehicleIdx, VehicleTypeKey},
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    recreate::listeners::InsertionListener,
    solution::route::VehicleRoute,
};

/// Hands out vehicles to routes. Locking only ever happens on the thread applying
/// insertions; evaluation threads only read.
pub trait FleetManager: Send + Sync {
    /// One available vehicle per vehicle type key.
    fn available_vehicles(&self) -> Vec<VehicleIdx>;

    /// Like [`FleetManager::available_vehicles`], without vehicles of `type_key`.
    fn available_vehicles_except(&self, type_key: VehicleTypeKey) -> Vec<VehicleIdx> {
        self.available_vehicles()
            .into_iter()
            .filter(|&vehicle_id| self.type_key(vehicle_id) != type_key)
            .collect()
    }

    fn available_vehicle_of_type(&self, type_key: VehicleTypeKey) -> Option<VehicleIdx>;

    fn type_key(&self, vehicle_id: VehicleIdx) -> VehicleTypeKey;

    fn lock(&self, vehicle_id: VehicleIdx);

    fn unlock(&self, vehicle_id: VehicleIdx);

    fn is_locked(&self, vehicle_id: VehicleIdx) -> bool;

    fn unlock_all(&self);
}

pub fn create_fleet_manager(problem: &Arc<VehicleRoutingProblem>) -> Arc<dyn FleetManager> {
    if problem.is_infinite_fleet() {
        Arc::new(InfiniteFleetManager::new(Arc::clone(problem)))
    } else {
        Arc::new(FiniteFleetManager::new(Arc::clone(problem)))
    }
}

/// Every vehicle serves at most one route at a time.
pub struct FiniteFleetManager {
    problem: Arc<VehicleRoutingProblem>,
    locked: RwLock<FixedBitSet>,
}

impl FiniteFleetManager {
    pub fn new(problem: Arc<VehicleRoutingProblem>) -> Self {
        let locked = FixedBitSet::with_capacity(problem.vehicles().len());
        FiniteFleetManager {
            problem,
            locked: RwLock::new(locked),
        }
    }
}

impl FleetManager for FiniteFleetManager {
    fn available_vehicles(&self) -> Vec<VehicleIdx> {
        let locked = self.locked.read();
        let mut seen_types = FxHashSet::default();
        let mut available = Vec::new();

        for (index, vehicle) in self.problem.vehicles().iter().enumerate() {
            if !locked.contains(index) && seen_types.insert(vehicle.type_key()) {
                available.push(VehicleIdx::new(index));
            }
        }

        available
    }

    fn available_vehicle_of_type(&self, type_key: VehicleTypeKey) -> Option<VehicleIdx> {
        let locked = self.locked.read();
        self.problem
            .vehicles()
            .iter()
            .enumerate()
            .find(|(index, vehicle)| !locked.contains(*index) && vehicle.type_key() == type_key)
            .map(|(index, _)| VehicleIdx::new(index))
    }

    fn type_key(&self, vehicle_id: VehicleIdx) -> VehicleTypeKey {
        self.problem.vehicle(vehicle_id).type_key()
    }

    fn lock(&self, vehicle_id: VehicleIdx) {
        trace!(vehicle = %vehicle_id, "lock");
        self.locked.write().insert(vehicle_id.get());
    }

    fn unlock(&self, vehicle_id: VehicleIdx) {
        trace!(vehicle = %vehicle_id, "unlock");
        self.locked.write().set(vehicle_id.get(), false);
    }

    fn is_locked(&self, vehicle_id: VehicleIdx) -> bool {
        self.locked.read().contains(vehicle_id.get())
    }

    fn unlock_all(&self) {
        self.locked.write().clear();
    }
}

/// Vehicles are templates: any number of routes may use the same vehicle, so nothing is
/// ever locked.
pub struct InfiniteFleetManager {
    problem: Arc<VehicleRoutingProblem>,
    representatives: Vec<VehicleIdx>,
}

impl InfiniteFleetManager {
    pub fn new(problem: Arc<VehicleRoutingProblem>) -> Self {
        let mut seen_types = FxHashSet::default();
        let representatives = problem
            .vehicles()
            .iter()
            .enumerate()
            .filter(|(_, vehicle)| seen_types.insert(vehicle.type_key()))
            .map(|(index, _)| VehicleIdx::new(index))
            .collect();

        InfiniteFleetManager {
            problem,
            representatives,
        }
    }
}

impl FleetManager for InfiniteFleetManager {
    fn available_vehicles(&self) -> Vec<VehicleIdx> {
        self.representatives.clone()
    }

    fn available_vehicle_of_type(&self, type_key: VehicleTypeKey) -> Option<VehicleIdx> {
        self.representatives
            .iter()
            .copied()
            .find(|&vehicle_id| self.type_key(vehicle_id) == type_key)
    }

    fn type_key(&self, vehicle_id: VehicleIdx) -> VehicleTypeKey {
        self.problem.vehicle(vehicle_id).type_key()
    }

    fn lock(&self, _vehicle_id: VehicleIdx) {}

    fn unlock(&self, _vehicle_id: VehicleIdx) {}

    fn is_locked(&self, _vehicle_id: VehicleIdx) -> bool {
        false
    }

    fn unlock_all(&self) {}
}

/// Keeps the fleet lock table in line with the vehicles bound to routes.
pub struct FleetLockingListener {
    fleet_manager: Arc<dyn FleetManager>,
}

impl FleetLockingListener {
    pub fn new(fleet_manager: Arc<dyn FleetManager>) -> Self {
        FleetLockingListener { fleet_manager }
    }
}

impl InsertionListener for FleetLockingListener {
    fn insertion_starts(&self, routes: &mut [VehicleRoute], _unassigned_jobs: &[JobIdx]) {
        self.fleet_manager.unlock_all();
        for vehicle_id in routes.iter().filter_map(VehicleRoute::vehicle_id) {
            self.fleet_manager.lock(vehicle_id);
        }
    }

    fn vehicle_switched(
        &self,
        _route: &VehicleRoute,
        old_vehicle: Option<VehicleIdx>,
        new_vehicle: Option<VehicleIdx>,
    ) {
        if let Some(old_vehicle) = old_vehicle {
            self.fleet_manager.unlock(old_vehicle);
        }
        if let Some(new_vehicle) = new_vehicle {
            self.fleet_manager.lock(new_vehicle);
        }
    }

    fn job_inserted(&self, _job_id: JobIdx, route: &mut VehicleRoute, _data: &InsertionData) {
        if let Some(vehicle_id) = route.vehicle_id() {
            self.fleet_manager.lock(vehicle_id);
        }
    }
}
