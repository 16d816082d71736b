pub mod domain;
pub mod gateway;
pub mod geo;
pub mod identity;
pub mod interactions;
pub mod ports;
pub mod proximity;

pub use domain::{GeoPoint, Interaction, InteractionKind, LikeDuplicatePolicy, NearbyUser, User};
pub use gateway::InteractionGateway;
pub use identity::IdentityResolver;
pub use interactions::InteractionStore;
pub use ports::{DatabaseService, IdentityService, NotificationService, PortError, PortResult};
pub use proximity::ProximityFinder;
