// Core graph engine - stores, relations and ranking
// Each store is an independently-guarded shared resource; mutations are
// single critical sections so check-then-insert never races.

pub mod catalog;
pub mod entity_store;
pub mod friendship;
pub mod id_allocator;
pub mod like_relation;
pub mod ranking;

pub use catalog::ReferenceCatalog;
pub use entity_store::{FilmStore, InMemoryFilmStore, InMemoryUserStore, UserStore};
pub use friendship::{FriendshipEdge, FriendshipStore, InMemoryFriendshipStore};
pub use id_allocator::{IdAllocator, SequentialIdAllocator};
pub use like_relation::{InMemoryLikeStore, LikeStore};
