pub mod renew;

pub use renew::run_renew_command;
