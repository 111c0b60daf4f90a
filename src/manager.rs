//! Table Manager (C11): process-wide registry of tables by id, owning the
//! one event channel every table fans its events into (§4.11).

use std::sync::{Arc, RwLock};

use crate::config::TableConfig;
use crate::error::{EngineError, NotFoundError};
use crate::event::{Event, EventSink};
use crate::ids::{PlayerId, TableId};
use crate::player::Action;
use crate::table::Table;

pub struct TableManager {
    tables: RwLock<std::collections::HashMap<TableId, Arc<Table>>>,
    events: EventSink,
}

impl TableManager {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(std::collections::HashMap::new()),
            events: EventSink::new(),
        }
    }

    pub fn create_table(&self, table_id: impl Into<TableId>, config: TableConfig) -> Result<(), EngineError> {
        config.validate()?;
        let table_id = table_id.into();
        let max_players = config.max_players;
        let table = Table::new(table_id.as_str(), config, max_players, self.events.sender());
        let mut tables = self.tables.write().expect("table registry poisoned");
        tables.insert(table_id, Arc::new(table));
        Ok(())
    }

    pub fn destroy_table(&self, table_id: &TableId) -> Result<(), EngineError> {
        let mut tables = self.tables.write().expect("table registry poisoned");
        tables
            .remove(table_id)
            .map(|_| ())
            .ok_or_else(|| NotFoundError::Table(table_id.to_string()).into())
    }

    pub fn list_tables(&self) -> Vec<TableId> {
        self.tables.read().expect("table registry poisoned").keys().cloned().collect()
    }

    pub fn get_table(&self, table_id: &TableId) -> Result<Arc<Table>, EngineError> {
        self.tables
            .read()
            .expect("table registry poisoned")
            .get(table_id)
            .cloned()
            .ok_or_else(|| NotFoundError::Table(table_id.to_string()).into())
    }

    pub fn add_player(&self, table_id: &TableId, player_id: &PlayerId, name: &str, seat: usize, buy_in: u64) -> Result<(), EngineError> {
        self.get_table(table_id)?.add_player(player_id.as_str(), name, seat, buy_in)
    }

    pub fn remove_player(&self, table_id: &TableId, player_id: &PlayerId) -> Result<(), EngineError> {
        self.get_table(table_id)?.remove_player(player_id.as_str())
    }

    pub fn sit_out(&self, table_id: &TableId, player_id: &PlayerId) -> Result<(), EngineError> {
        self.get_table(table_id)?.sit_out(player_id.as_str())
    }

    pub fn sit_in(&self, table_id: &TableId, player_id: &PlayerId) -> Result<(), EngineError> {
        self.get_table(table_id)?.sit_in(player_id.as_str())
    }

    pub fn add_chips(&self, table_id: &TableId, player_id: &PlayerId, amount: u64) -> Result<(), EngineError> {
        self.get_table(table_id)?.add_chips(player_id.as_str(), amount)
    }

    pub fn start_hand(&self, table_id: &TableId) -> Result<(), EngineError> {
        self.get_table(table_id)?.start_hand()
    }

    pub fn process_action(&self, table_id: &TableId, player_id: &PlayerId, action: Action) -> Result<(), EngineError> {
        self.get_table(table_id)?.process_action(player_id.as_str(), action)
    }

    pub fn pause(&self, table_id: &TableId) -> Result<(), EngineError> {
        self.get_table(table_id)?.pause()
    }

    pub fn resume(&self, table_id: &TableId) -> Result<(), EngineError> {
        self.get_table(table_id)?.resume()
    }

    pub fn update_blinds(&self, table_id: &TableId, small_blind: u64, big_blind: u64) -> Result<(), EngineError> {
        self.get_table(table_id)?.update_blinds(small_blind, big_blind)
    }

    /// Drains every event published since the last call, across all tables.
    pub fn drain_events(&self) -> Vec<Event> {
        self.events.drain()
    }

    pub fn dropped_event_count(&self) -> usize {
        self.events.dropped_count()
    }
}

impl Default for TableManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameType;

    fn config() -> TableConfig {
        TableConfig {
            game_type: GameType::Cash,
            small_blind: 5,
            big_blind: 10,
            max_players: 6,
            min_buy_in: 50,
            max_buy_in: 500,
            starting_chips: 100,
            action_timeout_secs: 0,
        }
    }

    #[test]
    fn create_then_list_then_destroy() {
        let mgr = TableManager::new();
        let t1 = TableId::new("t1");
        mgr.create_table(t1.clone(), config()).unwrap();
        assert_eq!(mgr.list_tables(), vec![t1.clone()]);
        mgr.destroy_table(&t1).unwrap();
        assert!(mgr.list_tables().is_empty());
    }

    #[test]
    fn create_table_rejects_invalid_config() {
        let mgr = TableManager::new();
        let mut bad = config();
        bad.small_blind = bad.big_blind;
        assert!(mgr.create_table(TableId::new("t1"), bad).is_err());
    }

    #[test]
    fn operations_on_unknown_table_are_not_found() {
        let mgr = TableManager::new();
        assert!(matches!(
            mgr.add_player(&TableId::new("ghost"), &PlayerId::new("p1"), "P1", 0, 100),
            Err(EngineError::NotFound(NotFoundError::Table(_)))
        ));
    }

    #[test]
    fn events_fan_out_across_tables_into_one_channel() {
        let mgr = TableManager::new();
        let t1 = TableId::new("t1");
        mgr.create_table(t1.clone(), config()).unwrap();
        mgr.add_player(&t1, &PlayerId::new("p1"), "P1", 0, 100).unwrap();
        mgr.add_player(&t1, &PlayerId::new("p2"), "P2", 1, 100).unwrap();
        mgr.start_hand(&t1).unwrap();
        let events = mgr.drain_events();
        assert!(events.iter().any(|e| e.table_id == "t1"));
    }
}
