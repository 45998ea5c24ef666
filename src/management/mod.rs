mod usage;

pub use usage::AccountUsageManager;
pub use usage::MemoryUsageStore;
pub use usage::UsageStore;
