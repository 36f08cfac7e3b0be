mod terrain_bridge;

pub use terrain_bridge::{BridgeEvent, NullBridge, RecordingBridge, TerrainBridge};
