pub mod domain;
pub mod ports;
pub mod reading_list;

pub use domain::{normalize_thumbnail, CatalogBook, ReadingEntry, ReadingStatus, StatusFilter, User, UserCredentials};
pub use ports::{ CatalogService, EntryStream, PortError, PortResult, ReadingListStore,
    SessionService, SyncService};
pub use reading_list::ReadingListCoordinator;
