pub mod clock;
pub mod tally;
pub mod voting;
