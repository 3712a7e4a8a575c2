use std::collections::BTreeMap;
use std::sync::Arc;

use tickroom_core::error::{Result, RoomError};
use tickroom_core::protocol::{Node, PlayerSummary, Point};

use crate::room::player::Player;
use crate::session::Session;

/// Player table plus the id counter. Always accessed under the room lock.
#[derive(Default)]
pub struct Registry {
    players: BTreeMap<u64, Player>,
    player_count: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Ids handed out so far. Pruning does not lower it.
    pub fn player_count(&self) -> u64 {
        self.player_count
    }

    pub fn player(&self, player_id: u64) -> Option<&Player> {
        self.players.get(&player_id)
    }

    fn player_mut(&mut self, player_id: u64) -> Result<&mut Player> {
        self.players
            .get_mut(&player_id)
            .ok_or(RoomError::PlayerDoesntExist(player_id))
    }

    pub fn can_join(&self, username: &str, candidate: u64) -> bool {
        !username.is_empty()
            && !self.players.contains_key(&candidate)
            && !self
                .players
                .values()
                .any(|p| p.is_alive() && p.username() == username)
    }

    /// Admit `username` under the next id. The counter only moves on success,
    /// so refused attempts never burn an id.
    pub fn join(&mut self, username: &str, session: Arc<Session>) -> Result<u64> {
        let candidate = self.player_count + 1;
        if !self.can_join(username, candidate) {
            return Err(RoomError::PlayerCantJoin);
        }

        self.players
            .insert(candidate, Player::new(candidate, username, session));
        self.player_count = candidate;
        Ok(candidate)
    }

    pub fn register_node(&mut self, player_id: u64, node: Node) -> Result<u64> {
        self.player_mut(player_id)?.register_node(node)
    }

    pub fn update_node(
        &mut self,
        player_id: u64,
        node_id: u64,
        position: Point,
        rotation: Point,
    ) -> Result<()> {
        self.player_mut(player_id)?
            .update_node(node_id, position, rotation)
    }

    pub fn roster(&self) -> Vec<PlayerSummary> {
        self.players.values().map(Player::summary).collect()
    }

    /// Remove every player whose session is dead and hand them back.
    pub fn prune_dead(&mut self) -> Vec<Player> {
        let dead: Vec<u64> = self
            .players
            .values()
            .filter(|p| !p.is_alive())
            .map(Player::id)
            .collect();
        dead.into_iter()
            .filter_map(|id| self.players.remove(&id))
            .collect()
    }

    pub fn live_sessions(&self) -> Vec<(u64, Arc<Session>)> {
        self.players
            .values()
            .filter(|p| p.is_alive())
            .map(|p| (p.id(), Arc::clone(p.session())))
            .collect()
    }
}
