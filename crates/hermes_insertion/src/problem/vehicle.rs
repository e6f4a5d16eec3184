use fxhash::FxHashSet;
use serde::Serialize;

use crate::{define_index_newtype, problem::job::Job};

use super::{
    amount::Capacity, job::JobIdx, location::LocationIdx, skill::Skill,
    travel_cost_matrix::Time, vehicle_break::VehicleBreak,
};

define_index_newtype!(VehicleIdx, Vehicle);
define_index_newtype!(VehicleTypeIdx, VehicleType);

/// Vehicles sharing a key are interchangeable: same type, depots, shift and skills.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VehicleTypeKey(usize);

impl VehicleTypeKey {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn get(&self) -> usize {
        self.0
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct VehicleType {
    external_id: String,
    capacity: Capacity,
    fixed_cost: f64,
    cost_per_distance: f64,
    cost_per_time: f64,
    cost_per_waiting: f64,
    cost_per_service: f64,
    penalty_factor: Option<f64>,
}

impl VehicleType {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn capacity(&self) -> &Capacity {
        &self.capacity
    }

    pub fn fixed_cost(&self) -> f64 {
        self.fixed_cost
    }

    pub fn cost_per_distance(&self) -> f64 {
        self.cost_per_distance
    }

    pub fn cost_per_time(&self) -> f64 {
        self.cost_per_time
    }

    pub fn cost_per_waiting(&self) -> f64 {
        self.cost_per_waiting
    }

    pub fn cost_per_service(&self) -> f64 {
        self.cost_per_service
    }

    pub fn is_penalty(&self) -> bool {
        self.penalty_factor.is_some()
    }

    pub fn penalty_factor(&self) -> Option<f64> {
        self.penalty_factor
    }

    /// Shadow copy of this type used to keep the search space open when the real fleet is short.
    pub(crate) fn to_penalty_type(&self, penalty_factor: f64) -> VehicleType {
        VehicleType {
            external_id: format!("penalty_{}", self.external_id),
            capacity: self.capacity.clone(),
            fixed_cost: self.fixed_cost * penalty_factor,
            cost_per_distance: self.cost_per_distance * penalty_factor,
            cost_per_time: self.cost_per_time * penalty_factor,
            cost_per_waiting: self.cost_per_waiting * penalty_factor,
            cost_per_service: self.cost_per_service * penalty_factor,
            penalty_factor: Some(penalty_factor),
        }
    }
}

#[derive(Default)]
pub struct VehicleTypeBuilder {
    external_id: Option<String>,
    capacity: Option<Capacity>,
    fixed_cost: Option<f64>,
    cost_per_distance: Option<f64>,
    cost_per_time: Option<f64>,
    cost_per_waiting: Option<f64>,
    cost_per_service: Option<f64>,
}

impl VehicleTypeBuilder {
    pub fn set_external_id(&mut self, external_id: String) -> &mut VehicleTypeBuilder {
        self.external_id = Some(external_id);
        self
    }

    pub fn set_capacity(&mut self, capacity: Capacity) -> &mut VehicleTypeBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn set_fixed_cost(&mut self, fixed_cost: f64) -> &mut VehicleTypeBuilder {
        self.fixed_cost = Some(fixed_cost);
        self
    }

    pub fn set_cost_per_distance(&mut self, cost: f64) -> &mut VehicleTypeBuilder {
        self.cost_per_distance = Some(cost);
        self
    }

    pub fn set_cost_per_time(&mut self, cost: f64) -> &mut VehicleTypeBuilder {
        self.cost_per_time = Some(cost);
        self
    }

    pub fn set_cost_per_waiting(&mut self, cost: f64) -> &mut VehicleTypeBuilder {
        self.cost_per_waiting = Some(cost);
        self
    }

    pub fn set_cost_per_service(&mut self, cost: f64) -> &mut VehicleTypeBuilder {
        self.cost_per_service = Some(cost);
        self
    }

    pub fn build(self) -> VehicleType {
        VehicleType {
            external_id: self.external_id.unwrap_or_else(|| String::from("default")),
            capacity: self.capacity.unwrap_or_default(),
            fixed_cost: self.fixed_cost.unwrap_or(0.0),
            cost_per_distance: self.cost_per_distance.unwrap_or(1.0),
            cost_per_time: self.cost_per_time.unwrap_or(0.0),
            cost_per_waiting: self.cost_per_waiting.unwrap_or(0.0),
            cost_per_service: self.cost_per_service.unwrap_or(0.0),
            penalty_factor: None,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Vehicle {
    external_id: String,
    vehicle_type: VehicleTypeIdx,
    start_location_id: LocationIdx,
    end_location_id: LocationIdx,
    earliest_departure: Time,
    latest_arrival: Time,
    return_to_depot: bool,
    skills: FxHashSet<Skill>,
    #[serde(skip)]
    vehicle_break: Option<VehicleBreak>,
    break_job: Option<JobIdx>,
    type_key: VehicleTypeKey,
    end_group: usize,
}

impl Vehicle {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn vehicle_type(&self) -> VehicleTypeIdx {
        self.vehicle_type
    }

    pub fn start_location_id(&self) -> LocationIdx {
        self.start_location_id
    }

    pub fn end_location_id(&self) -> LocationIdx {
        self.end_location_id
    }

    pub fn earliest_departure(&self) -> Time {
        self.earliest_departure
    }

    pub fn latest_arrival(&self) -> Time {
        self.latest_arrival
    }

    pub fn return_to_depot(&self) -> bool {
        self.return_to_depot
    }

    pub fn skills(&self) -> &FxHashSet<Skill> {
        &self.skills
    }

    /// Job index of the break bound to this vehicle, if any.
    pub fn break_job(&self) -> Option<JobIdx> {
        self.break_job
    }

    pub fn type_key(&self) -> VehicleTypeKey {
        self.type_key
    }

    /// Index of the group of vehicles sharing end location, latest arrival and return flag.
    pub fn end_group(&self) -> usize {
        self.end_group
    }

    pub fn is_compatible_with(&self, job: &Job) -> bool {
        job.skills().iter().all(|skill| self.skills.contains(skill))
    }

    pub(crate) fn take_break(&mut self) -> Option<VehicleBreak> {
        self.vehicle_break.take()
    }

    pub(crate) fn set_break_job(&mut self, job: JobIdx) {
        self.break_job = Some(job);
    }

    pub(crate) fn set_type_key(&mut self, type_key: VehicleTypeKey) {
        self.type_key = type_key;
    }

    pub(crate) fn set_end_group(&mut self, end_group: usize) {
        self.end_group = end_group;
    }

    pub(crate) fn to_penalty_vehicle(&self, vehicle_type: VehicleTypeIdx) -> Vehicle {
        Vehicle {
            external_id: format!("penalty_{}", self.external_id),
            vehicle_type,
            start_location_id: self.start_location_id,
            end_location_id: self.end_location_id,
            earliest_departure: self.earliest_departure,
            latest_arrival: self.latest_arrival,
            return_to_depot: self.return_to_depot,
            skills: self.skills.clone(),
            vehicle_break: None,
            break_job: None,
            type_key: VehicleTypeKey::default(),
            end_group: 0,
        }
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    external_id: Option<String>,
    vehicle_type: Option<VehicleTypeIdx>,
    start_location_id: Option<LocationIdx>,
    end_location_id: Option<LocationIdx>,
    earliest_departure: Option<Time>,
    latest_arrival: Option<Time>,
    return_to_depot: Option<bool>,
    skills: FxHashSet<Skill>,
    vehicle_break: Option<VehicleBreak>,
}

impl VehicleBuilder {
    pub fn set_vehicle_id(&mut self, external_id: String) -> &mut VehicleBuilder {
        self.external_id = Some(external_id);
        self
    }

    pub fn set_vehicle_type(&mut self, vehicle_type: usize) -> &mut VehicleBuilder {
        self.vehicle_type = Some(VehicleTypeIdx::new(vehicle_type));
        self
    }

    pub fn set_start_location_id(&mut self, location_id: usize) -> &mut VehicleBuilder {
        self.start_location_id = Some(LocationIdx::new(location_id));
        self
    }

    pub fn set_end_location_id(&mut self, location_id: usize) -> &mut VehicleBuilder {
        self.end_location_id = Some(LocationIdx::new(location_id));
        self
    }

    pub fn set_earliest_departure(&mut self, time: Time) -> &mut VehicleBuilder {
        self.earliest_departure = Some(time);
        self
    }

    pub fn set_latest_arrival(&mut self, time: Time) -> &mut VehicleBuilder {
        self.latest_arrival = Some(time);
        self
    }

    pub fn set_return_to_depot(&mut self, return_to_depot: bool) -> &mut VehicleBuilder {
        self.return_to_depot = Some(return_to_depot);
        self
    }

    pub fn add_skill(&mut self, skill: Skill) -> &mut VehicleBuilder {
        self.skills.insert(skill);
        self
    }

    pub fn set_break(&mut self, vehicle_break: VehicleBreak) -> &mut VehicleBuilder {
        self.vehicle_break = Some(vehicle_break);
        self
    }

    pub fn build(self) -> Vehicle {
        let start_location_id = self.start_location_id.expect("Expected start location id");
        Vehicle {
            external_id: self.external_id.expect("Expected vehicle id"),
            vehicle_type: self.vehicle_type.unwrap_or_default(),
            start_location_id,
            end_location_id: self.end_location_id.unwrap_or(start_location_id),
            earliest_departure: self.earliest_departure.unwrap_or(0.0),
            latest_arrival: self.latest_arrival.unwrap_or(f64::MAX),
            return_to_depot: self.return_to_depot.unwrap_or(true),
            skills: self.skills,
            vehicle_break: self.vehicle_break,
            break_job: None,
            type_key: VehicleTypeKey::default(),
            end_group: 0,
        }
    }
}
