//! Database layer (Firestore).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const LOCATIONS: &str = "locations";
    pub const ACTIVITIES: &str = "activities";
    pub const RESERVATIONS: &str = "reservations";
    /// Guide service areas (keyed by guide user document ID)
    pub const GUIDE_LOCATION: &str = "guide_location";
}
