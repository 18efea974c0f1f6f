use schemars::{JsonSchema, schema_for};
use seekloop_core::tool::{Tool, ToolResult};
use seekloop_model::ToolError;
use serde::Deserialize;
use serde_json::{Value, json};

const FORECASTS: &[(&str, &str)] = &[
    ("berlin", "Sunny"),
    ("hangzhou", "Light rain"),
    ("london", "Overcast"),
    ("paris", "Partly cloudy"),
    ("tokyo", "Clear"),
];

const DEFAULT_FORECAST: &str = "Cloudy";

/// Input of [`WeatherTool`].
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WeatherParameters {
    #[schemars(description = "The city name, e.g. Berlin.")]
    city: String,
}

/// A demo tool that returns a canned weather forecast for a city.
pub struct WeatherTool {
    parameter_schema: Value,
}

impl WeatherTool {
    /// Creates a new weather tool.
    #[inline]
    pub fn new() -> Self {
        WeatherTool {
            parameter_schema: schema_for!(WeatherParameters).to_value(),
        }
    }
}

impl Default for WeatherTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for WeatherTool {
    type Input = WeatherParameters;

    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Gets the weather forecast of a city."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn call(&self, input: WeatherParameters) -> ToolResult {
        let city = input.city.trim();
        if city.is_empty() {
            return Err(ToolError::invalid_input().with_reason("city is empty"));
        }
        let forecast = forecast_of(city);
        debug!("forecast of {city}: {forecast}");
        Ok(json!({ "city": city, "forecast": forecast }).to_string())
    }
}

fn forecast_of(city: &str) -> &'static str {
    FORECASTS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(city))
        .map(|(_, forecast)| *forecast)
        .unwrap_or(DEFAULT_FORECAST)
}

#[cfg(test)]
mod tests {
    use seekloop_core::tool::define;
    use seekloop_model::{ToolCallContext, ToolErrorKind};
    use serde_json::Map;

    use super::*;

    fn context(arguments: Value) -> ToolCallContext {
        let Value::Object(arguments) = arguments else {
            return ToolCallContext::new("call_0", Map::new());
        };
        ToolCallContext::new("call_0", arguments)
    }

    #[test]
    fn test_parameter_schema() {
        let tool = WeatherTool::new();
        let schema = tool.parameter_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["city"]["type"], "string");
        assert_eq!(schema["required"], json!(["city"]));
    }

    #[test]
    fn test_call() {
        let definition = define(WeatherTool::new());
        assert_eq!(definition.name, "get_weather");

        let result = definition
            .callback()
            .call(&context(json!({ "city": "Berlin" })))
            .unwrap();
        assert_eq!(result, r#"{"city":"Berlin","forecast":"Sunny"}"#);

        let result = definition
            .callback()
            .call(&context(json!({ "city": "Reykjavik" })))
            .unwrap();
        assert_eq!(result, r#"{"city":"Reykjavik","forecast":"Cloudy"}"#);
    }

    #[test]
    fn test_invalid_input() {
        let definition = define(WeatherTool::new());
        for arguments in [json!({}), json!({ "city": " " })] {
            let err = definition
                .callback()
                .call(&context(arguments))
                .unwrap_err();
            assert_eq!(err.kind(), ToolErrorKind::InvalidInput);
        }
    }
}
