mod stats;

pub use stats::LifetimeStatsQuery;
