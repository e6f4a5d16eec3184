use std::sync::Arc;

use crate::{
    insertion::insertion_data::InsertionData,
    problem::{job::JobIdx, vehicle::VehicleIdx},
    solution::route::VehicleRoute,
};

/// Observer of a construction pass. Callbacks run synchronously on the calling thread, in
/// this order: `insertion_starts`, then per job `before_job_insertion`, `vehicle_switched`
/// (only when the vehicle changes), `job_inserted`, and finally `insertion_ends`.
pub trait InsertionListener: Send + Sync {
    fn insertion_starts(&self, _routes: &mut [VehicleRoute], _unassigned_jobs: &[JobIdx]) {}

    fn before_job_insertion(&self, _job_id: JobIdx, _data: &InsertionData, _route: &VehicleRoute) {}

    /// Fired before the route is rebound to `new_vehicle`.
    fn vehicle_switched(
        &self,
        _route: &VehicleRoute,
        _old_vehicle: Option<VehicleIdx>,
        _new_vehicle: Option<VehicleIdx>,
    ) {
    }

    fn job_inserted(&self, _job_id: JobIdx, _route: &mut VehicleRoute, _data: &InsertionData) {}

    fn insertion_ends(&self, _routes: &mut [VehicleRoute], _bad_jobs: &[JobIdx]) {}
}

#[derive(Default, Clone)]
pub struct InsertionListeners {
    listeners: Vec<Arc<dyn InsertionListener>>,
}

impl InsertionListeners {
    pub fn add(&mut self, listener: Arc<dyn InsertionListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn insertion_starts(&self, routes: &mut [VehicleRoute], unassigned_jobs: &[JobIdx]) {
        for listener in &self.listeners {
            listener.insertion_starts(routes, unassigned_jobs);
        }
    }

    pub fn before_job_insertion(&self, job_id: JobIdx, data: &InsertionData, route: &VehicleRoute) {
        for listener in &self.listeners {
            listener.before_job_insertion(job_id, data, route);
        }
    }

    pub fn vehicle_switched(
        &self,
        route: &VehicleRoute,
        old_vehicle: Option<VehicleIdx>,
        new_vehicle: Option<VehicleIdx>,
    ) {
        for listener in &self.listeners {
            listener.vehicle_switched(route, old_vehicle, new_vehicle);
        }
    }

    pub fn job_inserted(&self, job_id: JobIdx, route: &mut VehicleRoute, data: &InsertionData) {
        for listener in &self.listeners {
            listener.job_inserted(job_id, route, data);
        }
    }

    pub fn insertion_ends(&self, routes: &mut [VehicleRoute], bad_jobs: &[JobIdx]) {
        for listener in &self.listeners {
            listener.insertion_ends(routes, bad_jobs);
        }
    }
}
