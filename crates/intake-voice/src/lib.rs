//! Real-time room access for the intake platform.
//!
//! The voice transport is LiveKit: each phone call or browser session gets
//! its own room, the patient and the intake agent join with publish/subscribe
//! grants, and room creation happens under a separate administrative grant.
//! Speech recognition and synthesis live inside the agent process and are
//! out of scope here; this crate only issues signed access grants and
//! administers rooms.

pub mod config;
pub mod error;
pub mod service;

pub use config::LiveKitConfig;
pub use error::VoiceError;
pub use service::RoomService;
