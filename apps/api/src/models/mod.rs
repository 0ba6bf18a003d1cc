pub mod candidate;
pub mod shortlist;
