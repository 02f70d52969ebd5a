use crate::{
    error::FetchError,
    model::{MainReadings, WeatherSnapshot, from_str_tolerant},
    transport::UpstreamRequest,
};

use super::{Upstream, UpstreamSettings, endpoint, normalize_param};

pub const DEFAULT_CITY: &str = "Athens";

/// Current-conditions lookup against the OpenWeatherMap API.
#[derive(Debug, Clone)]
pub struct OpenWeather {
    settings: UpstreamSettings,
}

impl OpenWeather {
    pub fn new(settings: UpstreamSettings) -> Self {
        Self { settings }
    }
}

impl Upstream for OpenWeather {
    type Output = WeatherSnapshot;

    fn settings(&self) -> &UpstreamSettings {
        &self.settings
    }

    // City names keep their case; the upstream matches them as given.
    fn normalize(&self, param: &str) -> String {
        normalize_param(param, DEFAULT_CITY, false)
    }

    fn request(&self, city: &str) -> Result<UpstreamRequest, FetchError> {
        let url = endpoint(
            &self.settings.base_url,
            &["weather"],
            &[
                ("q", city),
                ("appid", self.settings.api_key.as_str()),
                ("units", "metric"),
            ],
        )?;

        Ok(UpstreamRequest::get(url))
    }

    fn parse(&self, body: &str) -> Result<WeatherSnapshot, FetchError> {
        let parsed: WeatherSnapshot = from_str_tolerant(body)?;

        if parsed.name.trim().is_empty() {
            return Err(FetchError::EmptyResult("weather location"));
        }

        Ok(parsed)
    }

    fn fallback(&self) -> WeatherSnapshot {
        WeatherSnapshot {
            name: "Weather data unavailable".to_string(),
            main: MainReadings::default(),
        }
    }
}
