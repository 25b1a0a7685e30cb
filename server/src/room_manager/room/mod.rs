mod event;
mod player;
#[allow(clippy::module_inception)]
mod room;

pub use self::event::{DeliveryError, RoomEvent, RoomObserver, SubscriberId};
pub use self::player::{Player, PlayerId};
pub use self::room::{Room, RoomError, RoomStatus};
