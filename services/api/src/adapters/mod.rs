pub mod db;
pub mod identity;
pub mod memory;
pub mod payments;

pub use db::{ensure_indexes, MongoLessonStore, MongoReportStore, MongoUserStore};
pub use identity::FirebaseTokenVerifier;
pub use memory::{MemoryStore, StaticTokenVerifier, StubPaymentGateway};
pub use payments::StripeGateway;
