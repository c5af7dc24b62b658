//! Entity abstraction
//!
//! The weather entity and all sensors implement the Entity trait, which is
//! what the home-automation host polls and renders.

use async_trait::async_trait;

use crate::Result;

/// Base trait that all entities implement
#[async_trait]
pub trait Entity: Send + Sync {
    /// Platform type of this entity (e.g. "weather", "sensor")
    fn platform(&self) -> &'static str;

    fn name(&self) -> Option<String>;

    fn available(&self) -> bool;

    /// Serialize current state and attributes to JSON for the host
    fn state_json(&self) -> serde_json::Value;

    /// Called by the host on every polling cycle
    async fn update(&mut self) -> Result<()>;
}
