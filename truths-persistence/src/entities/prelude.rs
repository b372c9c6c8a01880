pub use super::guesses::Entity as Guesses;
pub use super::statements::Entity as Statements;
pub use super::users::Entity as Users;
