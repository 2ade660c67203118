//! The fixed Jyotish tool catalog.
//!
//! Tool names, descriptions and parameter shapes are a public contract with
//! existing clients; change them only additively.

use crate::tools::registry::{RegistryError, ToolDescriptor, ToolRegistry};
use crate::tools::schema::{FieldKind, ParamSchema};

pub const CHART_WORKER: &str = "chart_calculator";
pub const DASHA_WORKER: &str = "dasha_calculator";
pub const TRANSIT_WORKER: &str = "transit_calculator";
pub const VARGA_WORKER: &str = "varga_calculator";
pub const YOGA_WORKER: &str = "yoga_identifier";
pub const COMPATIBILITY_WORKER: &str = "compatibility_calculator";

/// Divisional charts understood by the varga worker.
pub const VARGAS: &[&str] = &["D1", "D2", "D3", "D7", "D9", "D10", "D12", "D30"];

fn chart_id_schema() -> ParamSchema {
    ParamSchema::new().required("chart_id", FieldKind::Uuid, "UUID of the chart")
}

fn dated_chart_schema() -> ParamSchema {
    chart_id_schema().optional(
        "date",
        FieldKind::DateTime,
        "Optional date in ISO 8601 format (defaults to now)",
    )
}

/// Build the registry holding every Jyotish tool, in the order they are
/// advertised.
pub fn jyotish_catalog() -> Result<ToolRegistry, RegistryError> {
    ToolRegistry::new()
        .register(ToolDescriptor::new(
            "chart_create",
            "Calculate a complete Vedic birth chart from birth data. Returns a chart_id for future reference. \
             Includes D1 (birth chart), D9 (navamsa), planetary positions, houses, nakshatras, and Vimshottari Dasha periods.",
            ParamSchema::new()
                .optional("name", FieldKind::Text, "Name of the person (optional)")
                .required(
                    "datetime",
                    FieldKind::DateTime,
                    "Birth date and time in ISO 8601 format (YYYY-MM-DDTHH:MM:SS)",
                )
                .required(
                    "timezone",
                    FieldKind::Text,
                    "Timezone string (e.g., 'America/New_York', 'Asia/Kolkata')",
                )
                .required(
                    "latitude",
                    FieldKind::range(-90.0, 90.0),
                    "Latitude in decimal degrees (positive for North)",
                )
                .required(
                    "longitude",
                    FieldKind::range(-180.0, 180.0),
                    "Longitude in decimal degrees (positive for East)",
                ),
            CHART_WORKER,
            "create",
        ))?
        .register(ToolDescriptor::new(
            "chart_read",
            "Retrieve complete chart data for a previously calculated chart. Includes all planetary positions, \
             houses, nakshatras, divisional charts, and dasha periods.",
            ParamSchema::new().required(
                "chart_id",
                FieldKind::Uuid,
                "UUID of the chart to retrieve",
            ),
            CHART_WORKER,
            "read",
        ))?
        .register(ToolDescriptor::new(
            "chart_list",
            "List all stored charts with basic information (name, date, location). Useful for selecting which \
             chart to analyze.",
            ParamSchema::new(),
            CHART_WORKER,
            "list",
        ))?
        .register(ToolDescriptor::new(
            "dasha_current",
            "Get the current running Vimshottari Dasha periods (Maha Dasha, Antar Dasha, Pratyantar Dasha) for \
             a chart. Can specify a date or defaults to current time. Includes ruling planets, start/end dates, \
             and remaining balance.",
            dated_chart_schema(),
            DASHA_WORKER,
            "current",
        ))?
        .register(ToolDescriptor::new(
            "transit_now",
            "Get current planetary transit positions relative to the birth chart. Shows which houses planets are \
             transiting and aspects they make to natal planets. Can specify a date or defaults to current time.",
            dated_chart_schema(),
            TRANSIT_WORKER,
            "current",
        ))?
        .register(ToolDescriptor::new(
            "divisional_read",
            "Retrieve a specific divisional chart (varga). D9 (Navamsa) is most important for relationships and \
             dharma. Other divisions analyze specific life domains: D2 (wealth), D3 (siblings), D7 (children), \
             D10 (career), D12 (parents), D30 (misfortunes).",
            chart_id_schema().required(
                "varga",
                FieldKind::Enum(VARGAS),
                "Divisional chart type (D1=birth, D9=navamsa, etc.)",
            ),
            VARGA_WORKER,
            "read",
        ))?
        .register(ToolDescriptor::new(
            "yogas_identify",
            "Identify classical yogas (planetary combinations) in a chart. Includes Raj Yogas (power/status), \
             Dhana Yogas (wealth), Pancha Mahapurusha Yogas (great personality), and other significant \
             combinations from classical texts.",
            chart_id_schema(),
            YOGA_WORKER,
            "identify",
        ))?
        .register(ToolDescriptor::new(
            "compatibility_analyze",
            "Analyze compatibility between two charts for relationships. Uses traditional Kuta system, \
             cross-aspects between charts, and comparative analysis of key factors (Moon, Venus, 7th house).",
            ParamSchema::new()
                .required("chart_id_1", FieldKind::Uuid, "UUID of first chart")
                .required("chart_id_2", FieldKind::Uuid, "UUID of second chart"),
            COMPATIBILITY_WORKER,
            "analyze",
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_catalog_names_and_order() {
        let registry = jyotish_catalog().unwrap();
        assert_eq!(
            registry.list_names(),
            vec![
                "chart_create",
                "chart_read",
                "chart_list",
                "dasha_current",
                "transit_now",
                "divisional_read",
                "yogas_identify",
                "compatibility_analyze",
            ]
        );
    }

    #[test]
    fn test_catalog_routing() {
        let registry = jyotish_catalog().unwrap();
        let routes: Vec<(&str, &str, &str)> = registry
            .list_all()
            .iter()
            .map(|t| (t.name().as_str(), t.worker().as_str(), t.action().as_str()))
            .collect();

        assert_eq!(
            routes,
            vec![
                ("chart_create", "chart_calculator", "create"),
                ("chart_read", "chart_calculator", "read"),
                ("chart_list", "chart_calculator", "list"),
                ("dasha_current", "dasha_calculator", "current"),
                ("transit_now", "transit_calculator", "current"),
                ("divisional_read", "varga_calculator", "read"),
                ("yogas_identify", "yoga_identifier", "identify"),
                ("compatibility_analyze", "compatibility_calculator", "analyze"),
            ]
        );
    }

    #[test]
    fn test_chart_create_schema_wire_shape() {
        let registry = jyotish_catalog().unwrap();
        let schema = Value::Object(
            registry
                .lookup("chart_create")
                .unwrap()
                .schema()
                .to_json_schema(),
        );

        assert_eq!(schema["required"], json!(["datetime", "timezone", "latitude", "longitude"]));
        assert_eq!(schema["properties"]["latitude"]["type"], json!("number"));
        assert_eq!(schema["properties"]["name"]["type"], json!("string"));
        let keys: Vec<&String> = schema["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["name", "datetime", "timezone", "latitude", "longitude"]);
    }

    #[test]
    fn test_divisional_read_advertises_vargas() {
        let registry = jyotish_catalog().unwrap();
        let schema = registry.lookup("divisional_read").unwrap().schema().to_json_schema();
        assert_eq!(
            schema["properties"]["varga"]["enum"],
            json!(["D1", "D2", "D3", "D7", "D9", "D10", "D12", "D30"])
        );
    }

    #[test]
    fn test_chart_list_takes_no_arguments() {
        let registry = jyotish_catalog().unwrap();
        let tool = registry.lookup("chart_list").unwrap();
        let args = tool.validate(&serde_json::Map::new()).unwrap();
        let call = tool.build_call(args);
        assert_eq!(Value::Object(call.payload), json!({"action": "list"}));
    }
}
