use serde::{Deserialize, Serialize};

use super::{
    amount::Amount, location::LocationIdx, skill::Skill, time_window::TimeWindow,
    travel_cost_matrix::Time,
};

/// Sign convention of a single-stop job. A `Pickup` or plain `Service` adds its demand to
/// the vehicle load, a `Delivery` is loaded at the depot and unloaded at the stop.
#[derive(Deserialize, Serialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ServiceType {
    #[default]
    Service,
    Pickup,
    Delivery,
}

#[derive(Serialize, Debug, Clone)]
pub struct Service {
    external_id: String,
    location_id: LocationIdx,
    time_window: TimeWindow,
    demand: Amount,
    duration: Time,
    skills: Vec<Skill>,
    service_type: ServiceType,
}

impl Service {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn demand(&self) -> &Amount {
        &self.demand
    }

    pub fn duration(&self) -> Time {
        self.duration
    }

    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }
}

#[derive(Default)]
pub struct ServiceBuilder {
    external_id: Option<String>,
    location_id: Option<LocationIdx>,
    time_window: Option<TimeWindow>,
    demand: Option<Amount>,
    duration: Option<Time>,
    skills: Vec<Skill>,
    service_type: Option<ServiceType>,
}

impl ServiceBuilder {
    pub fn set_external_id(&mut self, external_id: String) -> &mut ServiceBuilder {
        self.external_id = Some(external_id);
        self
    }

    pub fn set_service_type(&mut self, service_type: ServiceType) -> &mut ServiceBuilder {
        self.service_type = Some(service_type);
        self
    }

    pub fn set_location_id(&mut self, location_id: usize) -> &mut ServiceBuilder {
        self.location_id = Some(LocationIdx::new(location_id));
        self
    }

    pub fn set_time_window(&mut self, time_window: TimeWindow) -> &mut ServiceBuilder {
        self.time_window = Some(time_window);
        self
    }

    pub fn set_demand(&mut self, demand: Amount) -> &mut ServiceBuilder {
        self.demand = Some(demand);
        self
    }

    pub fn set_duration(&mut self, duration: Time) -> &mut ServiceBuilder {
        self.duration = Some(duration);
        self
    }

    pub fn add_skill(&mut self, skill: Skill) -> &mut ServiceBuilder {
        self.skills.push(skill);
        self
    }

    pub fn build(self) -> Service {
        Service {
            external_id: self.external_id.expect("Expected service id"),
            location_id: self.location_id.expect("Expected location id"),
            demand: self.demand.unwrap_or_default(),
            duration: self.duration.unwrap_or(0.0),
            time_window: self.time_window.unwrap_or_default(),
            skills: self.skills,
            service_type: self.service_type.unwrap_or_default(),
        }
    }
}
