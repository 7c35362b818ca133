//! One scenario attempt: transcript reveal, decision resolution, and
//! the controller that orchestrates them.

pub mod controller;
pub mod resolve;
pub mod reveal;

pub use controller::{AttemptPhase, SessionController};
pub use resolve::resolve;
pub use reveal::{DwellTimer, RevealMachine, RevealState};
