use serde::Serialize;

use crate::define_index_newtype;

use super::{
    amount::{Amount, EMPTY_AMOUNT},
    service::{Service, ServiceType},
    shipment::Shipment,
    skill::Skill,
    vehicle_break::VehicleBreak,
};

define_index_newtype!(JobIdx, Job);

#[derive(Serialize, Debug, Clone)]
pub enum Job {
    Service(Service),
    Pickup(Service),
    Delivery(Service),
    Shipment(Shipment),
    Break(VehicleBreak),
}

/// Discriminant of [`Job`], used to key per-kind lookup tables.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Service,
    Pickup,
    Delivery,
    Shipment,
    Break,
}

impl JobKind {
    pub const COUNT: usize = 5;

    pub const ALL: [JobKind; JobKind::COUNT] = [
        JobKind::Service,
        JobKind::Pickup,
        JobKind::Delivery,
        JobKind::Shipment,
        JobKind::Break,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            JobKind::Service => 0,
            JobKind::Pickup => 1,
            JobKind::Delivery => 2,
            JobKind::Shipment => 3,
            JobKind::Break => 4,
        }
    }
}

impl From<Service> for Job {
    fn from(service: Service) -> Self {
        match service.service_type() {
            ServiceType::Service => Job::Service(service),
            ServiceType::Pickup => Job::Pickup(service),
            ServiceType::Delivery => Job::Delivery(service),
        }
    }
}

impl From<Shipment> for Job {
    fn from(shipment: Shipment) -> Self {
        Job::Shipment(shipment)
    }
}

impl Job {
    pub fn external_id(&self) -> &str {
        match self {
            Job::Service(service) | Job::Pickup(service) | Job::Delivery(service) => {
                service.external_id()
            }
            Job::Shipment(shipment) => shipment.external_id(),
            Job::Break(vehicle_break) => vehicle_break.external_id(),
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            Job::Service(_) => JobKind::Service,
            Job::Pickup(_) => JobKind::Pickup,
            Job::Delivery(_) => JobKind::Delivery,
            Job::Shipment(_) => JobKind::Shipment,
            Job::Break(_) => JobKind::Break,
        }
    }

    pub fn demand(&self) -> &Amount {
        match self {
            Job::Service(service) | Job::Pickup(service) | Job::Delivery(service) => {
                service.demand()
            }
            Job::Shipment(shipment) => shipment.demand(),
            Job::Break(_) => &EMPTY_AMOUNT,
        }
    }

    pub fn skills(&self) -> &[Skill] {
        match self {
            Job::Service(service) | Job::Pickup(service) | Job::Delivery(service) => {
                service.skills()
            }
            Job::Shipment(shipment) => shipment.skills(),
            Job::Break(_) => &[],
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Job::Break(_))
    }

    pub fn as_service(&self) -> Option<&Service> {
        match self {
            Job::Service(service) | Job::Pickup(service) | Job::Delivery(service) => Some(service),
            _ => None,
        }
    }

    pub fn as_shipment(&self) -> Option<&Shipment> {
        match self {
            Job::Shipment(shipment) => Some(shipment),
            _ => None,
        }
    }

    pub fn as_break(&self) -> Option<&VehicleBreak> {
        match self {
            Job::Break(vehicle_break) => Some(vehicle_break),
            _ => None,
        }
    }
}
