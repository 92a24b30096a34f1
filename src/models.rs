pub mod clone_interaction;
pub mod emote;
pub mod redemption;
pub mod reward;
pub mod segment;
