//! Cache key builder for query responses

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Cache key for a telemetry query.
    ///
    /// `start` and `end` are the effective minute-precision bounds, so an
    /// omitted parameter and its explicit default share an entry. Devices are
    /// an unordered set and are sorted and de-duplicated first; metric order is
    /// kept because it fixes the response column order. Underscores inside
    /// names become `-` so the `_` separator stays unambiguous.
    pub fn query(metrics: &[String], devices: &[String], start: &str, end: &str) -> String {
        let mut devices: Vec<&str> = devices.iter().map(String::as_str).collect();
        devices.sort_unstable();
        devices.dedup();

        let metrics = metrics
            .iter()
            .map(|m| escape(m))
            .collect::<Vec<_>>()
            .join("_");
        let devices = devices
            .into_iter()
            .map(escape)
            .collect::<Vec<_>>()
            .join("_");

        format!("{metrics}_{devices}_{start}_{end}")
    }
}

fn escape(component: &str) -> String {
    component.replace('_', "-")
}
