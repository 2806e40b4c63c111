//! Building description, derived quantities, and snapshot support.

pub mod component;
pub mod input;
pub mod snapshot;
pub mod state;

pub use component::{ComponentCode, ComponentSet};
pub use input::DwellingInput;
pub use snapshot::{Snapshot, Trial, snapshot};
pub use state::{
    AirLeakage, Attic, CoolingSystem, DeclaredSavings, Derived, DoorGroup, Ducts, DwellingState,
    Envelope, Foundation, FoundationKind, HeatingSystem, ItemizedCategory, ItemizedCost, Lighting,
    Refrigerator, Site, WallSegment, WaterHeater, WindowGroup,
};
