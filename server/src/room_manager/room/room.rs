use std::{collections::BTreeMap, fmt};

use thiserror::Error;

use super::{
    event::{RoomEvent, RoomObserver, SubscriberId},
    player::{Player, PlayerId},
};

/// [RoomStatus] tells whether votes are still being collected or have been revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Progress,
    Result,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("{0} is not in the room")]
    UnknownPlayer(Player),
}

/// [Room] holds the players of a voting round, their hidden votes and the observers of the room.
///
/// Every operation either applies its whole mutation and then notifies the observers,
/// or fails without touching the room.
pub struct Room {
    id: String,
    status: RoomStatus,
    /// Keyed by player, which orders the entries by join order
    votes: BTreeMap<Player, Option<i64>>,
    last_player_id: PlayerId,
    subscribers: Vec<(SubscriberId, Box<dyn RoomObserver>)>,
    last_subscriber_id: SubscriberId,
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("votes", &self.votes)
            .field("last_player_id", &self.last_player_id)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Room {
    pub fn new(id: &str) -> Self {
        Room {
            id: String::from(id),
            status: RoomStatus::Progress,
            votes: BTreeMap::new(),
            last_player_id: 0,
            subscribers: Vec::new(),
            last_subscriber_id: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    /// Current players in join order
    pub fn players(&self) -> Vec<Player> {
        self.votes.keys().copied().collect()
    }

    /// Current votes in join order, `None` for players who have not voted yet
    pub fn votes(&self) -> Vec<(Player, Option<i64>)> {
        self.votes
            .iter()
            .map(|(player, vote)| (*player, *vote))
            .collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Register an observer, it is notified about every operation from now on
    pub fn subscribe(&mut self, observer: impl RoomObserver + 'static) -> SubscriberId {
        self.last_subscriber_id += 1;
        self.subscribers
            .push((self.last_subscriber_id, Box::new(observer)));

        self.last_subscriber_id
    }

    /// Remove an observer, returns false if it was not registered (anymore)
    pub fn unsubscribe(&mut self, subscriber_id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(id, _)| *id != subscriber_id);

        before != self.subscribers.len()
    }

    /// Drop every observer, returns how many were registered
    pub fn unsubscribe_all(&mut self) -> usize {
        self.subscribers.drain(..).count()
    }

    /// Add a player to the room.
    ///
    /// The room always goes back to [RoomStatus::Progress] so the newcomer gets to vote,
    /// the status change is reported even if the room already was in progress.
    pub fn new_player(&mut self) -> Player {
        self.last_player_id += 1;
        let player = Player::new(self.last_player_id);

        self.votes.insert(player, None);
        self.status = RoomStatus::Progress;
        log::debug!("{} joined room '{}'", player, self.id);

        self.publish(&[
            RoomEvent::PlayerJoined(player),
            RoomEvent::StatusChanged(RoomStatus::Progress),
        ]);

        player
    }

    /// Remove a player and its vote, reveals the votes if everyone left has voted.
    ///
    /// Removing the last player reveals the (empty) result as well.
    pub fn remove_player(&mut self, player: Player) -> Result<(), RoomError> {
        self.votes
            .remove(&player)
            .ok_or(RoomError::UnknownPlayer(player))?;
        log::debug!("{} left room '{}'", player, self.id);

        let mut events = vec![RoomEvent::PlayerLeft(player)];
        events.extend(self.reveal_if_complete());
        self.publish(&events);

        Ok(())
    }

    /// Record the vote of a player, reveals the votes if it was the last one missing
    pub fn vote(&mut self, player: Player, value: i64) -> Result<(), RoomError> {
        let vote = self
            .votes
            .get_mut(&player)
            .ok_or(RoomError::UnknownPlayer(player))?;
        *vote = Some(value);

        let mut events = vec![RoomEvent::VotePlaced { player, value }];
        events.extend(self.reveal_if_complete());
        self.publish(&events);

        Ok(())
    }

    /// Clear every vote and start a new round, the status change is always reported
    pub fn reset(&mut self) {
        self.votes.values_mut().for_each(|vote| *vote = None);
        self.status = RoomStatus::Progress;
        log::debug!("room '{}' reset", self.id);

        self.publish(&[RoomEvent::StatusChanged(RoomStatus::Progress)]);
    }

    /// Vacuously true for an empty room
    fn all_voted(&self) -> bool {
        self.votes.values().all(Option::is_some)
    }

    fn reveal_if_complete(&mut self) -> Option<RoomEvent> {
        if self.status == RoomStatus::Result || !self.all_voted() {
            return None;
        }

        self.status = RoomStatus::Result;
        log::debug!("room '{}' revealed its votes", self.id);

        Some(RoomEvent::StatusChanged(RoomStatus::Result))
    }

    /// Notify every observer in subscription order, dropping the ones which could not take the events
    fn publish(&mut self, events: &[RoomEvent]) {
        let room: &Room = self;
        let failed = room
            .subscribers
            .iter()
            .filter_map(|(id, observer)| match observer.notify(room, events) {
                Ok(()) => None,
                Err(err) => {
                    log::warn!(
                        "dropping subscriber {} of room '{}': {}",
                        id,
                        room.id,
                        err
                    );
                    Some(*id)
                }
            })
            .collect::<Vec<_>>();

        if !failed.is_empty() {
            self.subscribers.retain(|(id, _)| !failed.contains(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::super::DeliveryError;
    use super::*;

    type Notifications = Arc<Mutex<Vec<Vec<RoomEvent>>>>;

    /// Records every batch of events it is notified with
    struct RecordingObserver {
        notifications: Notifications,
    }

    impl RoomObserver for RecordingObserver {
        fn notify(&self, _room: &Room, events: &[RoomEvent]) -> Result<(), DeliveryError> {
            self.notifications.lock().unwrap().push(events.to_vec());
            Ok(())
        }
    }

    struct FailingObserver;

    impl RoomObserver for FailingObserver {
        fn notify(&self, _room: &Room, _events: &[RoomEvent]) -> Result<(), DeliveryError> {
            Err(DeliveryError::Disconnected)
        }
    }

    fn observed_room() -> (Room, Notifications) {
        let notifications = Notifications::default();
        let mut room = Room::new("room");
        room.subscribe(RecordingObserver {
            notifications: Arc::clone(&notifications),
        });

        (room, notifications)
    }

    fn take(notifications: &Notifications) -> Vec<Vec<RoomEvent>> {
        notifications.lock().unwrap().drain(..).collect()
    }

    // the room reveals its votes exactly when every current player has voted
    fn assert_status_invariant(room: &Room) {
        let all_voted = room.votes().iter().all(|(_, vote)| vote.is_some());
        assert_eq!(room.status() == RoomStatus::Result, all_voted);
    }

    #[test]
    fn test_new_room_is_in_progress() {
        let room = Room::new("room");

        assert_eq!(room.id(), "room");
        assert_eq!(room.status(), RoomStatus::Progress);
        assert!(room.players().is_empty());
    }

    #[test]
    fn test_player_ids_are_never_reused() {
        let (mut room, _) = observed_room();

        let first = room.new_player();
        let second = room.new_player();
        room.remove_player(second).unwrap();
        let third = room.new_player();

        assert_eq!(
            vec![first.id(), second.id(), third.id()],
            vec![1, 2, 3]
        );
        assert_eq!(room.players(), vec![first, third]);
    }

    #[test]
    fn test_new_player_emits_joined_then_progress() {
        let (mut room, notifications) = observed_room();

        let player = room.new_player();

        assert_eq!(
            take(&notifications),
            vec![vec![
                RoomEvent::PlayerJoined(player),
                RoomEvent::StatusChanged(RoomStatus::Progress)
            ]]
        );
        assert_eq!(room.votes(), vec![(player, None)]);
        assert_status_invariant(&room);
    }

    #[test]
    fn test_new_player_forces_progress_after_result() {
        let (mut room, notifications) = observed_room();
        let first = room.new_player();
        room.vote(first, 8).unwrap();
        assert_eq!(room.status(), RoomStatus::Result);
        take(&notifications);

        let second = room.new_player();

        assert_eq!(room.status(), RoomStatus::Progress);
        assert_eq!(room.votes(), vec![(first, Some(8)), (second, None)]);
        assert_eq!(
            take(&notifications),
            vec![vec![
                RoomEvent::PlayerJoined(second),
                RoomEvent::StatusChanged(RoomStatus::Progress)
            ]]
        );
        assert_status_invariant(&room);
    }

    #[test]
    fn test_last_vote_reveals_result() {
        let (mut room, notifications) = observed_room();
        let first = room.new_player();
        let second = room.new_player();
        take(&notifications);

        room.vote(first, 3).unwrap();
        assert_eq!(room.status(), RoomStatus::Progress);
        assert_status_invariant(&room);

        room.vote(second, 5).unwrap();
        assert_eq!(room.status(), RoomStatus::Result);
        assert_status_invariant(&room);

        assert_eq!(
            take(&notifications),
            vec![
                vec![RoomEvent::VotePlaced {
                    player: first,
                    value: 3
                }],
                vec![
                    RoomEvent::VotePlaced {
                        player: second,
                        value: 5
                    },
                    RoomEvent::StatusChanged(RoomStatus::Result)
                ],
            ]
        );
    }

    #[test]
    fn test_changing_a_vote_after_result_does_not_report_a_transition() {
        let (mut room, notifications) = observed_room();
        let player = room.new_player();
        room.vote(player, 1).unwrap();
        take(&notifications);

        room.vote(player, 2).unwrap();

        assert_eq!(room.votes(), vec![(player, Some(2))]);
        assert_eq!(
            take(&notifications),
            vec![vec![RoomEvent::VotePlaced { player, value: 2 }]]
        );
        assert_status_invariant(&room);
    }

    #[test]
    fn test_vote_of_unknown_player_is_rejected_without_side_effects() {
        let (mut room, notifications) = observed_room();
        let player = room.new_player();
        room.remove_player(player).unwrap();
        take(&notifications);

        assert_eq!(
            room.vote(player, 5),
            Err(RoomError::UnknownPlayer(player))
        );
        assert_eq!(
            room.vote(Player::new(42), 5),
            Err(RoomError::UnknownPlayer(Player::new(42)))
        );
        assert!(room.votes().is_empty());
        assert!(take(&notifications).is_empty());
    }

    #[test]
    fn test_remove_unknown_player_is_rejected_without_side_effects() {
        let (mut room, notifications) = observed_room();
        let player = room.new_player();
        take(&notifications);

        assert_eq!(
            room.remove_player(Player::new(7)),
            Err(RoomError::UnknownPlayer(Player::new(7)))
        );
        assert_eq!(room.players(), vec![player]);
        assert!(take(&notifications).is_empty());
    }

    #[test]
    fn test_leaving_non_voter_reveals_result() {
        let (mut room, notifications) = observed_room();
        let voter = room.new_player();
        let idle = room.new_player();
        room.vote(voter, 13).unwrap();
        take(&notifications);

        room.remove_player(idle).unwrap();

        assert_eq!(room.status(), RoomStatus::Result);
        assert_eq!(
            take(&notifications),
            vec![vec![
                RoomEvent::PlayerLeft(idle),
                RoomEvent::StatusChanged(RoomStatus::Result)
            ]]
        );
        assert_status_invariant(&room);
    }

    #[test]
    fn test_leaving_voter_keeps_progress() {
        let (mut room, notifications) = observed_room();
        let voter = room.new_player();
        let idle = room.new_player();
        room.vote(voter, 13).unwrap();
        take(&notifications);

        room.remove_player(voter).unwrap();

        assert_eq!(room.status(), RoomStatus::Progress);
        assert_eq!(room.votes(), vec![(idle, None)]);
        assert_eq!(take(&notifications), vec![vec![RoomEvent::PlayerLeft(voter)]]);
        assert_status_invariant(&room);
    }

    #[test]
    fn test_removing_last_player_reveals_empty_result() {
        let (mut room, notifications) = observed_room();
        let player = room.new_player();
        take(&notifications);

        room.remove_player(player).unwrap();

        assert_eq!(room.status(), RoomStatus::Result);
        assert!(room.votes().is_empty());
        assert_eq!(
            take(&notifications),
            vec![vec![
                RoomEvent::PlayerLeft(player),
                RoomEvent::StatusChanged(RoomStatus::Result)
            ]]
        );
        assert_status_invariant(&room);
    }

    #[test]
    fn test_reset_clears_votes_and_always_reports_progress() {
        let (mut room, notifications) = observed_room();
        let first = room.new_player();
        let second = room.new_player();
        room.vote(first, 1).unwrap();
        room.vote(second, 2).unwrap();
        take(&notifications);

        room.reset();

        assert_eq!(room.status(), RoomStatus::Progress);
        assert_eq!(room.votes(), vec![(first, None), (second, None)]);
        assert_eq!(
            take(&notifications),
            vec![vec![RoomEvent::StatusChanged(RoomStatus::Progress)]]
        );

        // already in progress, the transition is reported nonetheless
        room.reset();

        assert_eq!(
            take(&notifications),
            vec![vec![RoomEvent::StatusChanged(RoomStatus::Progress)]]
        );
    }

    #[test]
    fn test_reset_of_empty_room_is_in_progress() {
        let (mut room, notifications) = observed_room();
        let player = room.new_player();
        room.remove_player(player).unwrap();
        assert_eq!(room.status(), RoomStatus::Result);
        take(&notifications);

        room.reset();

        assert_eq!(room.status(), RoomStatus::Progress);
        assert_eq!(
            take(&notifications),
            vec![vec![RoomEvent::StatusChanged(RoomStatus::Progress)]]
        );
    }

    #[test]
    fn test_unsubscribe_is_a_noop_for_unknown_subscribers() {
        let (mut room, notifications) = observed_room();
        let extra = room.subscribe(RecordingObserver {
            notifications: Arc::clone(&notifications),
        });

        assert!(room.unsubscribe(extra));
        assert!(!room.unsubscribe(extra));
        assert!(!room.unsubscribe(1234));
        assert_eq!(room.subscriber_count(), 1);

        room.reset();

        assert_eq!(take(&notifications).len(), 1);
    }

    #[test]
    fn test_failing_observer_is_dropped_without_affecting_others() {
        let (mut room, notifications) = observed_room();
        room.subscribe(FailingObserver);
        assert_eq!(room.subscriber_count(), 2);

        let player = room.new_player();

        // the mutation stands and the healthy observer still got the events
        assert_eq!(room.players(), vec![player]);
        assert_eq!(room.subscriber_count(), 1);
        assert_eq!(take(&notifications).len(), 1);

        room.vote(player, 1).unwrap();

        assert_eq!(take(&notifications).len(), 1);
    }

    #[test]
    fn test_unsubscribe_all() {
        let (mut room, notifications) = observed_room();
        room.subscribe(FailingObserver);

        assert_eq!(room.unsubscribe_all(), 2);

        room.new_player();

        assert!(take(&notifications).is_empty());
    }
}
