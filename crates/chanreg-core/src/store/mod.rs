// # Persistence Store Implementations
//
// Implementations of the PersistenceStore trait for different persistence
// strategies.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;
