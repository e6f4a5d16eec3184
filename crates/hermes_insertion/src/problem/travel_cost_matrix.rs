use std::sync::Arc;

use super::location::{Location, LocationIdx};

pub type Distance = f64;
pub type Time = f64;
pub type Cost = f64;

/// Flat travel matrices. The entry for a pair of locations lives at
/// `from * num_locations + to`.
pub struct TravelMatrices {
    distances: Arc<Vec<Distance>>,
    times: Arc<Vec<Time>>,
    num_locations: usize,
}

impl TravelMatrices {
    pub fn new(distances: Vec<Vec<Distance>>, times: Vec<Vec<Time>>) -> Self {
        let num_locations = distances.len();

        TravelMatrices {
            distances: Arc::new(distances.into_iter().flatten().collect()),
            times: Arc::new(times.into_iter().flatten().collect()),
            num_locations,
        }
    }

    pub fn from_euclidean(locations: &[Location], round: bool) -> Self {
        let num_locations = locations.len();
        let mut distances: Vec<Distance> = vec![0.0; num_locations * num_locations];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                distances[i * num_locations + j] = if round {
                    from.euclidean_distance(to).round()
                } else {
                    from.euclidean_distance(to)
                }
            }
        }

        let distances = Arc::new(distances);
        let times = Arc::clone(&distances);

        TravelMatrices {
            distances,
            times,
            num_locations,
        }
    }

    pub fn from_haversine(locations: &[Location], speed_meters_per_second: f64) -> Self {
        let num_locations = locations.len();
        let mut distances: Vec<Distance> = vec![0.0; num_locations * num_locations];
        let mut times: Vec<Time> = vec![0.0; num_locations * num_locations];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                let distance = from.haversine_distance(to);
                distances[i * num_locations + j] = distance;
                times[i * num_locations + j] = distance / speed_meters_per_second;
            }
        }

        TravelMatrices {
            distances: Arc::new(distances),
            times: Arc::new(times),
            num_locations,
        }
    }

    #[inline(always)]
    fn index(&self, from: LocationIdx, to: LocationIdx) -> usize {
        from.get() * self.num_locations + to.get()
    }

    #[inline(always)]
    pub fn travel_distance(&self, from: LocationIdx, to: LocationIdx) -> Distance {
        if from == to {
            return 0.0;
        }

        self.distances[self.index(from, to)]
    }

    #[inline(always)]
    pub fn travel_time(&self, from: LocationIdx, to: LocationIdx) -> Time {
        if from == to {
            return 0.0;
        }

        self.times[self.index(from, to)]
    }

    pub fn max_distance(&self) -> Distance {
        self.distances.iter().copied().fold(0.0, f64::max)
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }
}
