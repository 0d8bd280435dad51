/// Counters kept by [`Events`](crate::Events) for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Registrations currently live
    pub total_registrations: usize,
    /// Successful `register_event` calls since creation
    pub events_registered: u64,
    /// Successful `clear_event` calls since creation
    pub events_cleared: u64,
    /// Registrations refused as duplicates or for invalid names
    pub rejected_registrations: u64,
    /// Clears that did not resolve to a live registration
    pub rejected_clears: u64,
    /// Callback invocations through `invoke` and `invoke_all`
    pub events_dispatched: u64,
}
