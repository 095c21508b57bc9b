#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub database: Database,
    pub snapshot: SnapshotConfig,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub dsn: String,
}

#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Seconds between snapshot sweeps. Replays within the same day are
    /// deduplicated by the store.
    pub interval_seconds: u64,
}
