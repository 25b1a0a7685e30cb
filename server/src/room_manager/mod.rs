pub use self::room::{
    DeliveryError, Player, PlayerId, Room, RoomError, RoomEvent, RoomObserver, RoomStatus,
    SubscriberId,
};

pub use self::room_manager::{RoomRegistry, SharedRoom};

mod room;
#[allow(clippy::module_inception)]
mod room_manager;
