pub mod coordinator;
pub mod directory;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod matchmaking;
pub mod registry;
pub mod types;

pub use coordinator::BattleCoordinator;
pub use errors::CoordinatorError;
pub use events::{BattleWinner, ClientEvent, ServerEvent};
pub use registry::ConnectionHandle;
pub use types::{BattleInfo, ConnectionId, Overview, ParticipantInfo, ServerConfig};
