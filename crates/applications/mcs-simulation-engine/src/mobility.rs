//! Synthetic user mobility using a speed-parameterized random walk
//!
//! Each user:
//! - starts uniformly inside a disk around the reference center
//! - repeatedly draws a speed (by locomotion type), a whole-minute segment
//!   duration and a heading, then moves in a straight line
//! - emits one event per stop until the simulated window is exhausted

use chrono::{Local, TimeZone, Timelike};
use mcs_core::{GeoPoint, LocomotionType, McsError, Result, SimulationParameters, UserMovementEvent};
use rand::Rng;
use rand_distr::{Distribution, Uniform, UnitDisc};
use tracing::{debug, info};

use crate::config::{GeneratorConfig, SimulationWindow};
use crate::geo::METERS_PER_DEGREE;

/// Segment duration bounds in whole minutes, `[MIN, MAX)`
pub const MIN_SEGMENT_MINUTES: u32 = 5;
pub const MAX_SEGMENT_MINUTES: u32 = 15;

/// Random-walk mobility generator
pub struct MobilityGenerator {
    number_of_users: u32,
    locomotion: LocomotionType,
    config: GeneratorConfig,
    window: SimulationWindow,
}

impl MobilityGenerator {
    pub fn new(params: &SimulationParameters, config: GeneratorConfig, window: SimulationWindow) -> Self {
        MobilityGenerator {
            number_of_users: params.number_of_users,
            locomotion: params.locomotion_type,
            config,
            window,
        }
    }

    /// Generate trajectories for every user, ordered by user id then time.
    ///
    /// Either every trajectory is produced or an error is returned.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<UserMovementEvent>> {
        if self.number_of_users == 0 {
            return Err(McsError::generation("no users to simulate"));
        }
        if !(self.window.duration() > 0.0) {
            return Err(McsError::generation(format!(
                "empty simulation window [{}, {})",
                self.window.start, self.window.end
            )));
        }

        let mut events = Vec::new();
        for user_id in 1..=self.number_of_users {
            let trajectory = self.trajectory(user_id, rng)?;
            debug!("User {} produced {} movement events", user_id, trajectory.len());
            events.extend(trajectory);
        }

        info!(
            "Generated {} movement events for {} users ({})",
            events.len(),
            self.number_of_users,
            self.locomotion
        );

        Ok(events)
    }

    /// Random walk of one user across the whole window
    pub fn trajectory<R: Rng + ?Sized>(&self, user_id: u32, rng: &mut R) -> Result<Vec<UserMovementEvent>> {
        let (min_speed, max_speed) = self.locomotion.speed_range();
        let speed = Uniform::new_inclusive(min_speed, max_speed);
        let segment_minutes = Uniform::new(MIN_SEGMENT_MINUTES, MAX_SEGMENT_MINUTES);
        let heading = Uniform::new(0.0, std::f64::consts::TAU);

        let mut position = self.seed_position(rng);
        let mut time = self.window.start;
        let mut trajectory = Vec::new();

        loop {
            trajectory.push(self.event_at(user_id, position, time)?);

            let segment_seconds = segment_minutes.sample(rng) as f64 * 60.0;
            let displacement = speed.sample(rng) * segment_seconds;
            position = step(position, displacement, heading.sample(rng));
            if !position.is_finite() {
                return Err(McsError::generation(format!(
                    "user {} left the coordinate space at t={}",
                    user_id, time
                )));
            }

            time += segment_seconds;
            if time >= self.window.end {
                break;
            }
        }

        Ok(trajectory)
    }

    /// Uniform point inside the seeding disk
    fn seed_position<R: Rng + ?Sized>(&self, rng: &mut R) -> GeoPoint {
        let [x, y]: [f64; 2] = UnitDisc.sample(rng);
        GeoPoint::new(
            self.config.center.latitude + y * self.config.seed_radius_deg,
            self.config.center.longitude + x * self.config.seed_radius_deg,
        )
    }

    fn event_at(&self, user_id: u32, position: GeoPoint, timestamp: f64) -> Result<UserMovementEvent> {
        let (hour, minute, second) = calendar_fields(&Local, timestamp).ok_or_else(|| {
            McsError::generation(format!("timestamp {} has no local time representation", timestamp))
        })?;

        Ok(UserMovementEvent {
            user_id,
            latitude: position.latitude,
            longitude: position.longitude,
            timestamp,
            day: ((timestamp - self.window.start) / 86_400.0).floor() as u32,
            hour,
            minute,
            second,
        })
    }
}

/// Move `meters` along `heading` (radians, counter-clockwise from east)
pub fn step(from: GeoPoint, meters: f64, heading: f64) -> GeoPoint {
    let dx = meters * heading.cos();
    let dy = meters * heading.sin();

    let d_lat = dy / METERS_PER_DEGREE;
    let d_lon = dx / (METERS_PER_DEGREE * from.latitude.to_radians().cos());

    GeoPoint::new(from.latitude + d_lat, from.longitude + d_lon)
}

/// Hour, minute and second of an epoch timestamp in `tz`
pub fn calendar_fields<Tz: TimeZone>(tz: &Tz, timestamp: f64) -> Option<(u32, u32, u32)> {
    if !timestamp.is_finite() {
        return None;
    }
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1e9) as u32;
    let datetime = tz.timestamp_opt(secs as i64, nanos.min(999_999_999)).earliest()?;
    Some((datetime.hour(), datetime.minute(), datetime.second()))
}
