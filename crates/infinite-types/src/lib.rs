//! Shared type definitions for the Infinite Resume journey.
//!
//! This crate is the single source of truth for the journey data model.
//! Types defined here flow downstream to `TypeScript` via `ts-rs` so the
//! browser front-end reads and writes exactly the shapes the engine does.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe string key wrappers for data points and achievements
//! - [`enums`] -- Layers, rarity tiers, and per-layer content enums
//! - [`structs`] -- The journey state and its append-only collections

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Algorithm, Concept, ContactMethod, Demo, Layer, LayerError, Rarity};
pub use ids::{AchievementId, DataPointId};
pub use structs::{Achievement, DataPoint, Interaction, JourneyState, now_millis};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. The files are written to the `bindings/`
        // directory relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::DataPointId::export_all();
        let _ = crate::ids::AchievementId::export_all();

        // Enums
        let _ = crate::enums::Rarity::export_all();
        let _ = crate::enums::Concept::export_all();
        let _ = crate::enums::Demo::export_all();
        let _ = crate::enums::Algorithm::export_all();
        let _ = crate::enums::ContactMethod::export_all();

        // Structs
        let _ = crate::structs::DataPoint::export_all();
        let _ = crate::structs::Achievement::export_all();
        let _ = crate::structs::Interaction::export_all();
        let _ = crate::structs::JourneyState::export_all();
    }
}
