// Messaging - notices and commands crossing the audio thread boundary

pub mod channels;
pub mod command;
pub mod notification;
