pub mod bam_prep;
pub mod known_sites;
pub mod realign;
pub mod recalibrate;
pub mod variants;
pub mod workflow;
