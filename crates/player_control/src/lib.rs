//! Delivery side of the control loop: the player's text control port and
//! the player process itself.

pub mod channel;
pub mod process;
pub mod readiness;

pub use channel::{CommandSink, ControlChannelClient, ControlEndpoint, DeliveryError};
pub use process::{stop_player, PlayerProcess, StopOutcome, VlcProcess};
pub use readiness::wait_until_ready;
