/// Remaining capacity of every resource in every time slot `[t, t + 1)`.
#[derive(Debug, Clone)]
pub struct ResourceProfile {
    horizon: usize,
    remaining_resource_capacity: Vec<Vec<i64>>,
}

impl ResourceProfile {
    pub fn new(capacities: &[u32], horizon: usize) -> Self {
        let remaining_resource_capacity = capacities
            .iter()
            .map(|&capacity| vec![capacity as i64; horizon])
            .collect();

        Self {
            horizon,
            remaining_resource_capacity,
        }
    }

    /// It finds out the earliest start not before `earliest_precedence_start_time`
    /// that keeps every resource within capacity and ends by the horizon.
    pub fn get_earliest_start_time(
        &self,
        activity_resource_requirements: &[u32],
        earliest_precedence_start_time: usize,
        activity_duration: usize,
    ) -> Option<usize> {
        let mut load_time: usize = 0;
        let mut t: usize = earliest_precedence_start_time;

        while load_time < activity_duration {
            if t >= self.horizon {
                return None;
            }

            let capacity_available = self
                .remaining_resource_capacity
                .iter()
                .zip(activity_resource_requirements)
                .all(|(remaining, &requirement)| remaining[t] >= requirement as i64);

            if capacity_available {
                load_time += 1;
            } else {
                load_time = 0;
            }

            t += 1;
        }

        let start = t - load_time;
        (start <= self.horizon).then_some(start)
    }

    /// It updates state of resources with respect to the added activity.
    pub fn add_activity(
        &mut self,
        activity_start: usize,
        activity_stop: usize,
        activity_requirements: &[u32],
    ) {
        for (remaining, &requirement) in self
            .remaining_resource_capacity
            .iter_mut()
            .zip(activity_requirements)
        {
            let stop = activity_stop.min(self.horizon);
            for slot in remaining.iter_mut().take(stop).skip(activity_start) {
                *slot -= requirement as i64;
            }
        }
    }

    /// First `(resource, slot, remaining)` whose capacity is exceeded
    pub fn first_overload(&self) -> Option<(usize, usize, i64)> {
        self.remaining_resource_capacity
            .iter()
            .enumerate()
            .find_map(|(resource, remaining)| {
                remaining
                    .iter()
                    .position(|&capacity| capacity < 0)
                    .map(|slot| (resource, slot, remaining[slot]))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::ResourceProfile;

    #[test]
    fn activity_is_delayed_until_capacity_frees() {
        let mut profile = ResourceProfile::new(&[2], 6);
        profile.add_activity(0, 2, &[1]);

        assert_eq!(profile.get_earliest_start_time(&[1], 0, 2), Some(0));
        assert_eq!(profile.get_earliest_start_time(&[2], 0, 2), Some(2));
        assert_eq!(profile.get_earliest_start_time(&[2], 1, 3), Some(2));
    }

    #[test]
    fn start_must_fit_in_the_horizon() {
        let profile = ResourceProfile::new(&[1], 4);

        assert_eq!(profile.get_earliest_start_time(&[1], 2, 3), None);
        assert_eq!(profile.get_earliest_start_time(&[1], 4, 0), Some(4));
        assert_eq!(profile.get_earliest_start_time(&[1], 5, 0), None);
    }

    #[test]
    fn overload_is_reported() {
        let mut profile = ResourceProfile::new(&[3, 1], 5);
        profile.add_activity(1, 3, &[2, 1]);
        assert_eq!(profile.first_overload(), None);

        profile.add_activity(2, 4, &[0, 1]);
        assert_eq!(profile.first_overload(), Some((1, 2, -1)));
    }
}
