pub mod signup;
pub mod ticket;

pub use signup::SignupWelcome;
pub use ticket::TicketTriage;
