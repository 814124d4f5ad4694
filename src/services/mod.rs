pub mod janitor;

pub use janitor::Janitor;
