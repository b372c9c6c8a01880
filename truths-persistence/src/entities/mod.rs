pub mod prelude;

pub mod guesses;
pub mod statements;
pub mod users;
