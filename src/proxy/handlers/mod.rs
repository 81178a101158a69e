// Route handlers

pub mod cron;
pub mod forward;
pub mod status;
