pub mod stop_repo;

pub use stop_repo::SqliteStopRepository;
