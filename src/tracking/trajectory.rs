//! Per-paw median hand tracks and their frame-to-frame speed.

use crate::tracking::geometry::Point;
use crate::tracking::table::{LandmarkColumn, LandmarkTable};
use statrs::statistics::{Data, Median};
use std::collections::BTreeMap;

/// Body parts whose name starts with this belong to the left paw.
pub const LEFT_PAW_PREFIX: &str = "left";
/// Body parts whose name starts with this belong to the right paw.
pub const RIGHT_PAW_PREFIX: &str = "right";

/// Session key of a table; `None` for single-session tables.
pub type SessionKey = Option<String>;

/// Median x/y of one paw over time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Track {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn point(&self, i: usize) -> Point {
        Point::new(self.x[i], self.y[i])
    }
}

/// Both paws' median tracks for one trial.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PawTracks {
    pub left_hand_median: Track,
    pub right_hand_median: Track,
}

/// Median hand trajectories for every trial of one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReachTrajectories {
    pub time: Vec<f64>,
    pub sessions: BTreeMap<SessionKey, BTreeMap<usize, PawTracks>>,
}

impl ReachTrajectories {
    /// Tracks of `trial` in a single-session table.
    pub fn trial(&self, trial: usize) -> Option<&PawTracks> {
        self.sessions.get(&None::<String>)?.get(&trial)
    }

    /// Tracks of `trial` in `session` of a multi-session table.
    pub fn session_trial(&self, session: &str, trial: usize) -> Option<&PawTracks> {
        self.sessions
            .get(&Some(session.to_string()))?
            .get(&trial)
    }
}

/// Frame-to-frame speed of both paws for one trial.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PawSpeeds {
    pub left_hand_median: Vec<f64>,
    pub right_hand_median: Vec<f64>,
}

/// Hand speeds for every trial of one table; each value is the pixel
/// distance covered since the previous sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReachVelocities {
    pub time: Vec<f64>,
    pub sessions: BTreeMap<SessionKey, BTreeMap<usize, PawSpeeds>>,
}

/// Median position of each paw, per trial and session.
///
/// Every landmark whose name starts with `left` or `right` contributes to
/// that paw. Medians ignore NaN; a sample where every landmark is NaN stays
/// NaN. Single-session tables are keyed under `None`.
pub fn get_reach_trajectories(tables: &[LandmarkTable]) -> Vec<ReachTrajectories> {
    tables.iter().map(table_trajectories).collect()
}

fn table_trajectories(table: &LandmarkTable) -> ReachTrajectories {
    let mut groups: BTreeMap<(SessionKey, usize), Vec<&LandmarkColumn>> = BTreeMap::new();
    for column in &table.columns {
        groups
            .entry((column.session.clone(), column.trial))
            .or_default()
            .push(column);
    }

    let mut sessions: BTreeMap<SessionKey, BTreeMap<usize, PawTracks>> = BTreeMap::new();
    for ((session, trial), columns) in groups {
        let tracks = PawTracks {
            left_hand_median: paw_median(&columns, LEFT_PAW_PREFIX, table.len()),
            right_hand_median: paw_median(&columns, RIGHT_PAW_PREFIX, table.len()),
        };
        sessions.entry(session).or_default().insert(trial, tracks);
    }

    ReachTrajectories {
        time: table.time.clone(),
        sessions,
    }
}

fn paw_median(columns: &[&LandmarkColumn], prefix: &str, len: usize) -> Track {
    let coord = |name: &str| -> Vec<&[f64]> {
        columns
            .iter()
            .filter(|c| c.bodypart.starts_with(prefix) && c.coord == name)
            .map(|c| c.values.as_slice())
            .collect()
    };
    Track {
        x: sample_median(&coord("x"), len),
        y: sample_median(&coord("y"), len),
    }
}

fn sample_median(series: &[&[f64]], len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let values: Vec<f64> = series
                .iter()
                .map(|s| s[i])
                .filter(|v| !v.is_nan())
                .collect();
            if values.is_empty() {
                f64::NAN
            } else {
                Data::new(values).median()
            }
        })
        .collect()
}

/// Speed of each paw: `sqrt(dx² + dy²)` between consecutive samples, with a
/// leading zero so lengths match the trajectories.
pub fn get_reach_velocities(trajectories: &[ReachTrajectories]) -> Vec<ReachVelocities> {
    trajectories
        .iter()
        .map(|traj| ReachVelocities {
            time: traj.time.clone(),
            sessions: traj
                .sessions
                .iter()
                .map(|(session, trials)| {
                    let speeds = trials
                        .iter()
                        .map(|(&trial, paws)| {
                            (
                                trial,
                                PawSpeeds {
                                    left_hand_median: speed(&paws.left_hand_median),
                                    right_hand_median: speed(&paws.right_hand_median),
                                },
                            )
                        })
                        .collect();
                    (session.clone(), speeds)
                })
                .collect(),
        })
        .collect()
}

fn speed(track: &Track) -> Vec<f64> {
    if track.is_empty() {
        return Vec::new();
    }
    let mut delta = Vec::with_capacity(track.len());
    delta.push(0.0);
    for i in 1..track.len() {
        let dx = track.x[i] - track.x[i - 1];
        let dy = track.y[i] - track.y[i - 1];
        delta.push((dx * dx + dy * dy).sqrt());
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(
        session: Option<&str>,
        trial: usize,
        part: &str,
        coord: &str,
        values: &[f64],
    ) -> LandmarkColumn {
        LandmarkColumn {
            scorer: None,
            session: session.map(str::to_string),
            trial,
            bodypart: part.to_string(),
            coord: coord.to_string(),
            values: values.to_vec(),
        }
    }

    fn two_landmark_table(session: Option<&str>) -> LandmarkTable {
        let mut table = LandmarkTable::new(vec![-0.002, -0.001, 0.0]);
        for (trial, offset) in [(0, 0.0), (1, 100.0)] {
            for (part, base) in [
                ("left_hand", 10.0),
                ("left_d1", 20.0),
                ("right_hand", 50.0),
                ("right_d1", 70.0),
            ] {
                let x: Vec<f64> = (0..3).map(|i| base + offset + i as f64).collect();
                let y: Vec<f64> = (0..3).map(|i| base + offset - i as f64).collect();
                table.push(column(session, trial, part, "x", &x)).unwrap();
                table.push(column(session, trial, part, "y", &y)).unwrap();
                table
                    .push(column(session, trial, part, "likelihood", &[1.0; 3]))
                    .unwrap();
            }
        }
        table
    }

    #[test]
    fn test_median_of_two_is_mean() {
        let trajectories = get_reach_trajectories(&[two_landmark_table(None)]);
        let traj = &trajectories[0];

        let trial0 = traj.trial(0).unwrap();
        assert_eq!(trial0.left_hand_median.x, vec![15.0, 16.0, 17.0]);
        assert_eq!(trial0.left_hand_median.y, vec![15.0, 14.0, 13.0]);
        assert_eq!(trial0.right_hand_median.x, vec![60.0, 61.0, 62.0]);

        // Trials stay separate
        let trial1 = traj.trial(1).unwrap();
        assert_eq!(trial1.left_hand_median.x, vec![115.0, 116.0, 117.0]);
        assert!(traj.trial(2).is_none());
    }

    #[test]
    fn test_multi_session_keys() {
        let mut table = two_landmark_table(Some("s1"));
        table.columns.extend(two_landmark_table(Some("s2")).columns);

        let traj = &get_reach_trajectories(&[table])[0];
        assert_eq!(traj.sessions.len(), 2);
        assert!(traj.trial(0).is_none());
        assert_eq!(
            traj.session_trial("s2", 1).unwrap().right_hand_median.x,
            vec![160.0, 161.0, 162.0]
        );
    }

    #[test]
    fn test_median_ignores_nan() {
        let mut table = LandmarkTable::new(vec![0.0, 1.0]);
        table.push(column(None, 0, "left_hand", "x", &[f64::NAN, f64::NAN])).unwrap();
        table.push(column(None, 0, "left_d1", "x", &[4.0, f64::NAN])).unwrap();
        table.push(column(None, 0, "left_d2", "x", &[8.0, f64::NAN])).unwrap();

        let traj = &get_reach_trajectories(&[table])[0];
        let x = &traj.trial(0).unwrap().left_hand_median.x;
        assert_eq!(x[0], 6.0);
        assert!(x[1].is_nan());
    }

    #[test]
    fn test_velocities() {
        let mut traj = ReachTrajectories {
            time: vec![0.0, 0.001, 0.002],
            sessions: BTreeMap::new(),
        };
        let paws = PawTracks {
            left_hand_median: Track {
                x: vec![0.0, 3.0, 3.0],
                y: vec![0.0, 4.0, 4.0],
            },
            right_hand_median: Track {
                x: vec![1.0, 1.0, 1.0],
                y: vec![1.0, 1.0, 2.0],
            },
        };
        traj.sessions.entry(None).or_default().insert(0, paws);

        let velocities = get_reach_velocities(&[traj]);
        let speeds = &velocities[0].sessions[&None::<String>][&0];
        assert_eq!(speeds.left_hand_median, vec![0.0, 5.0, 0.0]);
        assert_eq!(speeds.right_hand_median, vec![0.0, 0.0, 1.0]);
    }
}
