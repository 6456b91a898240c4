pub mod investment;
pub mod loan;
pub mod payoff;
pub mod savings;
pub mod tvm;
