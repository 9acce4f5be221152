//! Spatially and temporally random sensing tasks

use mcs_core::{BoundingBox, McsError, Result, SimulationParameters, Task, UserMovementEvent};
use rand::Rng;
use tracing::{debug, info};

use crate::config::{GeneratorConfig, SimulationWindow};

/// Extent tasks are placed in: the movement bounding box, or the
/// configured default box when there are no movements. No padding.
pub fn task_area(movements: &[UserMovementEvent], config: &GeneratorConfig) -> BoundingBox {
    BoundingBox::enclosing(movements.iter().map(UserMovementEvent::position))
        .unwrap_or_else(|| config.default_box())
}

/// Uniform task generator
pub struct TaskGenerator<'a> {
    params: &'a SimulationParameters,
    window: SimulationWindow,
    area: BoundingBox,
}

impl<'a> TaskGenerator<'a> {
    pub fn new(
        params: &'a SimulationParameters,
        config: &GeneratorConfig,
        window: SimulationWindow,
        movements: &[UserMovementEvent],
    ) -> Self {
        TaskGenerator {
            params,
            window,
            area: task_area(movements, config),
        }
    }

    pub fn area(&self) -> BoundingBox {
        self.area
    }

    /// Generate `number_of_tasks` tasks with ids `1..=number_of_tasks`
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Task>> {
        let area = self.area;
        let corners = [area.min_latitude, area.max_latitude, area.min_longitude, area.max_longitude];
        if corners.iter().any(|c| !c.is_finite())
            || area.min_latitude > area.max_latitude
            || area.min_longitude > area.max_longitude
        {
            return Err(McsError::generation(format!("invalid task area {:?}", area)));
        }
        if !(self.window.start < self.window.end) {
            return Err(McsError::generation(format!(
                "empty simulation window [{}, {})",
                self.window.start, self.window.end
            )));
        }

        let tasks: Vec<Task> = (1..=self.params.number_of_tasks)
            .map(|task_id| {
                let task = Task {
                    task_id,
                    latitude: rng.gen_range(area.min_latitude..=area.max_latitude),
                    longitude: rng.gen_range(area.min_longitude..=area.max_longitude),
                    timestamp: rng.gen_range(self.window.start..self.window.end),
                    duration: self.params.task_duration,
                    distance: self.params.execution_range,
                    timeslots: self.params.timeslot_duration,
                };
                debug!(
                    "Task {} at ({:.5}, {:.5}) t={:.0}",
                    task.task_id, task.latitude, task.longitude, task.timestamp
                );
                task
            })
            .collect();

        info!("Generated {} tasks", tasks.len());

        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcs_core::GeoPoint;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn event(user_id: u32, latitude: f64, longitude: f64) -> UserMovementEvent {
        UserMovementEvent {
            user_id,
            latitude,
            longitude,
            timestamp: 0.0,
            day: 0,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }

    fn params(tasks: u32) -> SimulationParameters {
        SimulationParameters {
            number_of_tasks: tasks,
            execution_range: 250.0,
            task_duration: 30,
            timeslot_duration: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_sequential_unique_ids() {
        let params = params(25);
        let window = SimulationWindow::ending_at(1_000_000.0, 1).unwrap();
        let generator = TaskGenerator::new(&params, &GeneratorConfig::default(), window, &[]);

        let tasks = generator.generate(&mut StdRng::seed_from_u64(1)).unwrap();

        assert_eq!(tasks.len(), 25);
        let ids: Vec<u32> = tasks.iter().map(|t| t.task_id).collect();
        assert_eq!(ids, (1..=25).collect::<Vec<_>>());
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 25);
    }

    #[test]
    fn test_tasks_inside_movement_box_and_window() {
        let params = params(200);
        let window = SimulationWindow::ending_at(1_000_000.0, 2).unwrap();
        let movements = vec![event(1, 40.60, 22.90), event(2, 40.70, 22.95), event(2, 40.65, 23.00)];
        let generator = TaskGenerator::new(&params, &GeneratorConfig::default(), window, &movements);

        let area = generator.area();
        assert_eq!(area.min_latitude, 40.60);
        assert_eq!(area.max_latitude, 40.70);
        assert_eq!(area.min_longitude, 22.90);
        assert_eq!(area.max_longitude, 23.00);

        for task in generator.generate(&mut StdRng::seed_from_u64(2)).unwrap() {
            assert!(area.contains(task.position()));
            assert!(window.contains(task.timestamp));
            assert_eq!(task.duration, 30);
            assert_eq!(task.distance, 250.0);
            assert_eq!(task.timeslots, 10);
        }
    }

    #[test]
    fn test_default_box_without_movements() {
        let params = params(50);
        let config = GeneratorConfig::default();
        let window = SimulationWindow::ending_at(1_000_000.0, 1).unwrap();
        let generator = TaskGenerator::new(&params, &config, window, &[]);

        assert_eq!(generator.area(), config.default_box());
        for task in generator.generate(&mut StdRng::seed_from_u64(3)).unwrap() {
            assert!(config.default_box().contains(task.position()));
        }
    }

    #[test]
    fn test_single_point_area() {
        let params = params(5);
        let window = SimulationWindow::ending_at(1_000_000.0, 1).unwrap();
        let movements = vec![event(1, 10.0, 20.0)];
        let generator = TaskGenerator::new(&params, &GeneratorConfig::default(), window, &movements);

        for task in generator.generate(&mut StdRng::seed_from_u64(4)).unwrap() {
            assert_eq!(task.position(), GeoPoint::new(10.0, 20.0));
        }
    }

    #[test]
    fn test_non_finite_area_is_a_generation_failure() {
        let params = params(5);
        let window = SimulationWindow::ending_at(1_000_000.0, 1).unwrap();
        let movements = vec![event(1, f64::NAN, 20.0), event(2, f64::NAN, 21.0)];
        let generator = TaskGenerator::new(&params, &GeneratorConfig::default(), window, &movements);

        let result = generator.generate(&mut StdRng::seed_from_u64(5));
        assert!(matches!(result, Err(McsError::Generation(_))));
    }
}
