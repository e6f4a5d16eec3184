use serde::Serialize;

use super::{
    amount::Amount, location::LocationIdx, skill::Skill, time_window::TimeWindow,
    travel_cost_matrix::Time,
};

#[derive(Serialize, Debug, Clone)]
pub struct ShipmentStop {
    location_id: LocationIdx,
    time_window: TimeWindow,
    duration: Time,
}

impl ShipmentStop {
    pub fn new(location_id: usize, time_window: TimeWindow, duration: Time) -> Self {
        ShipmentStop {
            location_id: LocationIdx::new(location_id),
            time_window,
            duration,
        }
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    pub fn duration(&self) -> Time {
        self.duration
    }
}

/// Paired pickup and delivery. The demand is loaded at the pickup and unloaded at the delivery.
#[derive(Serialize, Debug, Clone)]
pub struct Shipment {
    external_id: String,
    pickup: ShipmentStop,
    delivery: ShipmentStop,
    demand: Amount,
    skills: Vec<Skill>,
}

impl Shipment {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn pickup(&self) -> &ShipmentStop {
        &self.pickup
    }

    pub fn delivery(&self) -> &ShipmentStop {
        &self.delivery
    }

    pub fn demand(&self) -> &Amount {
        &self.demand
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }
}

#[derive(Default)]
pub struct ShipmentBuilder {
    external_id: Option<String>,
    pickup: Option<ShipmentStop>,
    delivery: Option<ShipmentStop>,
    demand: Option<Amount>,
    skills: Vec<Skill>,
}

impl ShipmentBuilder {
    pub fn set_external_id(&mut self, external_id: String) -> &mut ShipmentBuilder {
        self.external_id = Some(external_id);
        self
    }

    pub fn set_pickup(&mut self, pickup: ShipmentStop) -> &mut ShipmentBuilder {
        self.pickup = Some(pickup);
        self
    }

    pub fn set_delivery(&mut self, delivery: ShipmentStop) -> &mut ShipmentBuilder {
        self.delivery = Some(delivery);
        self
    }

    pub fn set_demand(&mut self, demand: Amount) -> &mut ShipmentBuilder {
        self.demand = Some(demand);
        self
    }

    pub fn add_skill(&mut self, skill: Skill) -> &mut ShipmentBuilder {
        self.skills.push(skill);
        self
    }

    pub fn build(self) -> Shipment {
        Shipment {
            external_id: self.external_id.expect("Expected shipment id"),
            pickup: self.pickup.expect("Expected pickup"),
            delivery: self.delivery.expect("Expected delivery"),
            demand: self.demand.unwrap_or_default(),
            skills: self.skills,
        }
    }
}
