//! Device type to cache endpoint routing.

use crate::error::RouteError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Default endpoints for the four known device types.
pub const DEFAULT_ENDPOINTS: [(&str, &str); 4] = [
    ("idfa", "127.0.0.1:33013"),
    ("gaid", "127.0.0.1:33014"),
    ("adid", "127.0.0.1:33015"),
    ("dvid", "127.0.0.1:33016"),
];

/// Immutable mapping from device type to `host:port`.
///
/// Built once at startup and shared read-only between workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointMap {
    routes: BTreeMap<String, String>,
}

impl EndpointMap {
    pub fn new<I, K, V>(routes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            routes: routes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up the endpoint for `dev_type`. Matching is case-sensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use appsload::router::EndpointMap;
    ///
    /// let map = EndpointMap::new([("gaid", "10.0.0.2:11211")]);
    /// assert_eq!(map.route("gaid"), Ok("10.0.0.2:11211"));
    /// assert!(map.route("GAID").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// [`RouteError::UnknownDeviceType`] when no endpoint is configured.
    pub fn route(&self, dev_type: &str) -> Result<&str, RouteError> {
        self.routes
            .get(dev_type)
            .map(String::as_str)
            .ok_or_else(|| RouteError::UnknownDeviceType(dev_type.to_string()))
    }

    /// Routes in device-type order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for EndpointMap {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_known_types() {
        let map = EndpointMap::default();
        assert_eq!(map.route("gaid"), Ok("127.0.0.1:33014"));
        let types: Vec<&str> = map.iter().map(|(dev_type, _)| dev_type).collect();
        assert_eq!(types, ["adid", "dvid", "gaid", "idfa"]);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let map = EndpointMap::new([("idfa", "10.0.0.1:11211")]);
        assert_eq!(
            map.route("IDFA"),
            Err(RouteError::UnknownDeviceType("IDFA".to_string()))
        );
    }
}
