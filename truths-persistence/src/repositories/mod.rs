pub mod guess_repository;
pub mod statement_repository;
pub mod user_repository;

pub use guess_repository::GuessRepository;
pub use statement_repository::StatementRepository;
pub use user_repository::{LeaderboardEntry, UserRepository};
