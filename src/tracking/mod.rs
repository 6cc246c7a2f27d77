//! Motion tracking: landmark tables, hand trajectories and reach onsets.
//!
//! This module contains:
//! - DeepLabCut-style landmark tables and the scorer check
//! - Per-paw median trajectories and speeds
//! - Segment intersection and the reach onset detector

pub mod geometry;
pub mod reach_onset;
pub mod table;
pub mod trajectory;

// Re-export commonly used types
pub use geometry::{ccw, segments_intersect, Point};
pub use reach_onset::{
    detect_reach_onsets, select_hand, Hand, OnsetReport, TrackingQuery, TrackingSource,
    ViewTrajectories,
};
pub use table::{check_scorers, LandmarkColumn, LandmarkTable};
pub use trajectory::{
    get_reach_trajectories, get_reach_velocities, PawSpeeds, PawTracks, ReachTrajectories,
    ReachVelocities, Track,
};
