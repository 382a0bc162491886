pub mod controller;
pub mod monitor;
pub mod state;

pub use controller::DetectionController;
pub use state::{distance_cm, CollisionState, CollisionTracker, Transition};
