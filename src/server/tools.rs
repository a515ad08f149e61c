//! MCP Server tools for daily meter readings

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rmcp::{
    RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
    },
    schemars::{self, schema_for},
    service::RequestContext,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::MeterRegistry;
use crate::ephemeris::{
    compute_birth_chart, compute_transit_chart, house_system_name, HOUSE_PLACIDUS,
};
use crate::meters::{
    compute_all_meters, compute_meter, compute_trends, detect_aspects, reading_trend,
};
use crate::models::{AspectPhase, AspectType, Planet, ZodiacSign};
use crate::storage::{ChartProfile, Storage};

/// Input for storing a natal chart
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct StoreNatalChartInput {
    #[schemars(description = "Name of the person")]
    pub name: String,
    #[schemars(description = "Birth date in YYYY-MM-DD format")]
    pub birth_date: String,
    #[schemars(description = "Birth time in HH:MM:SS format; omit when unknown")]
    pub birth_time: Option<String>,
    #[schemars(description = "Birth location name")]
    pub birth_location: Option<String>,
    #[schemars(description = "Latitude of birth location")]
    pub latitude: Option<f64>,
    #[schemars(description = "Longitude of birth location")]
    pub longitude: Option<f64>,
    #[schemars(description = "Timezone identifier (e.g., 'America/Panama')")]
    pub timezone: Option<String>,
    #[schemars(description = "Personal meter sensitivity in [0.5, 2.0]; default 1.0")]
    pub sensitivity: Option<f64>,
}

/// Input for the full meter panel
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct AllMetersInput {
    #[schemars(description = "Date to read the meters for in YYYY-MM-DD format")]
    pub date: String,
    #[schemars(description = "Name of the natal chart to use (default: the stored chart)")]
    pub chart_name: Option<String>,
    #[schemars(description = "Whether to include day-over-day trends (default: true)")]
    pub include_trends: Option<bool>,
}

/// Input for a single meter reading
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct SingleMeterInput {
    #[schemars(description = "Meter name (e.g., 'love', 'mental_clarity')")]
    pub meter: String,
    #[schemars(description = "Date to read the meter for in YYYY-MM-DD format")]
    pub date: String,
    #[schemars(description = "Name of the natal chart to use (default: the stored chart)")]
    pub chart_name: Option<String>,
}

/// Input for daily transits
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct DailyTransitsInput {
    #[schemars(description = "Date to get transits for in YYYY-MM-DD format")]
    pub date: String,
    #[schemars(description = "Name of the natal chart to use (default: the stored chart)")]
    pub chart_name: Option<String>,
}

/// Input for getting a natal chart
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct GetNatalChartInput {
    #[schemars(description = "Name of the natal chart to retrieve")]
    pub name: String,
}

/// Input for deleting a natal chart
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct DeleteNatalChartInput {
    #[schemars(description = "Name of the natal chart to delete")]
    pub name: String,
    #[schemars(
        description = "Birth date of the chart to delete (for confirmation) in YYYY-MM-DD format"
    )]
    pub birth_date: String,
}

/// One active aspect in the transit listing
#[derive(Debug, Clone, Serialize)]
struct TransitAspectInfo {
    transit: Planet,
    transit_sign: ZodiacSign,
    transit_degree: f64,
    retrograde: bool,
    stationary: bool,
    natal: Planet,
    natal_house: u8,
    aspect: AspectType,
    orb_degrees: f64,
    phase: AspectPhase,
}

#[derive(Debug, Clone, Serialize)]
struct DailyTransitsResponse {
    date: String,
    chart: String,
    aspect_count: usize,
    aspects: Vec<TransitAspectInfo>,
}

fn schema_to_value<T: schemars::JsonSchema>() -> Arc<serde_json::Map<String, Value>> {
    let schema = schema_for!(T);
    let value = serde_json::to_value(schema).unwrap();
    if let Value::Object(map) = value {
        Arc::new(map)
    } else {
        Arc::new(serde_json::Map::new())
    }
}

fn empty_schema() -> Arc<serde_json::Map<String, Value>> {
    let mut map = serde_json::Map::new();
    map.insert("type".into(), Value::String("object".into()));
    map.insert("properties".into(), Value::Object(serde_json::Map::new()));
    Arc::new(map)
}

fn error_payload(message: impl std::fmt::Display) -> String {
    json!({
        "success": false,
        "error": message.to_string()
    })
    .to_string()
}

/// MCP Server for daily astrological meter readings
#[derive(Clone)]
pub struct AstrometersServer {
    storage: Arc<Storage>,
    registry: Arc<MeterRegistry>,
}

impl AstrometersServer {
    /// Bind opened storage and a validated registry to the tool surface
    pub fn new(storage: Storage, registry: MeterRegistry) -> Self {
        Self {
            storage: Arc::new(storage),
            registry: Arc::new(registry),
        }
    }

    fn resolve_profile(&self, chart_name: Option<&str>) -> Result<ChartProfile, String> {
        match chart_name {
            Some(name) => self
                .storage
                .get_chart(name)
                .ok_or_else(|| format!("Natal chart '{}' not found", name)),
            None => self
                .storage
                .get_default_chart()
                .ok_or_else(|| "No natal chart stored; use store_natal_chart first".to_string()),
        }
    }

    fn store_natal_chart(&self, input: StoreNatalChartInput) -> String {
        let date = match NaiveDate::parse_from_str(&input.birth_date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(e) => {
                return error_payload(format!("Invalid date format: {}. Expected YYYY-MM-DD", e))
            }
        };

        let time = match &input.birth_time {
            Some(raw) => match NaiveTime::parse_from_str(raw, "%H:%M:%S") {
                Ok(t) => Some(t),
                Err(e) => {
                    return error_payload(format!(
                        "Invalid time format: {}. Expected HH:MM:SS",
                        e
                    ))
                }
            },
            None => None,
        };

        let chart = match compute_birth_chart(
            date,
            time,
            input.latitude,
            input.longitude,
            input.timezone.as_deref(),
        ) {
            Ok(c) => c,
            Err(e) => return error_payload(format!("Failed to compute chart: {}", e)),
        };

        let exact = chart.exact;
        let profile = ChartProfile {
            name: input.name.clone(),
            birth_date: input.birth_date.clone(),
            birth_time: input.birth_time.clone(),
            birth_location: input.birth_location.clone(),
            latitude: input.latitude,
            longitude: input.longitude,
            timezone: input.timezone.clone(),
            sensitivity: input.sensitivity,
            chart,
        };

        if let Err(e) = self.storage.save_chart(profile.clone()) {
            return error_payload(format!("Failed to save chart: {}", e));
        }

        let response = json!({
            "success": true,
            "message": if exact {
                "Natal chart stored with full birth time"
            } else {
                "Natal chart stored with solar houses (birth time unknown)"
            },
            "name": profile.name,
            "exact": exact,
            "house_system": if exact { house_system_name(HOUSE_PLACIDUS) } else { "Solar" },
            "chart_ruler": profile.chart.chart_ruler,
            "ascendant": profile.chart.angles.ascendant,
            "planets": profile.chart.bodies.iter().map(|b| json!({
                "planet": b.planet,
                "sign": b.sign,
                "degree": (b.sign_degree * 10.0).round() / 10.0,
                "house": b.house,
                "retrograde": b.is_retrograde(),
            })).collect::<Vec<_>>(),
        });

        serde_json::to_string_pretty(&response).unwrap()
    }

    fn get_all_meters(&self, input: AllMetersInput) -> String {
        let date = match NaiveDate::parse_from_str(&input.date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(e) => {
                return error_payload(format!("Invalid date format: {}. Expected YYYY-MM-DD", e))
            }
        };

        let profile = match self.resolve_profile(input.chart_name.as_deref()) {
            Ok(p) => p,
            Err(e) => return error_payload(e),
        };
        let sensitivity = profile.sensitivity.unwrap_or(1.0);

        let transit = match compute_transit_chart(date) {
            Ok(t) => t,
            Err(e) => return error_payload(format!("Failed to compute transits: {}", e)),
        };

        let mut reading = match compute_all_meters(
            &profile.chart,
            &transit,
            date,
            &self.registry,
            sensitivity,
        ) {
            Ok(r) => r,
            Err(e) => return error_payload(e),
        };

        if input.include_trends.unwrap_or(true) {
            if let Some(previous_day) = date.pred_opt() {
                let yesterday = compute_transit_chart(previous_day)
                    .map_err(crate::meters::MetersError::from)
                    .and_then(|t| {
                        compute_all_meters(
                            &profile.chart,
                            &t,
                            previous_day,
                            &self.registry,
                            sensitivity,
                        )
                    });
                match yesterday {
                    Ok(previous) => reading = compute_trends(&reading, &previous),
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to compute yesterday's reading")
                    }
                }
            }
        }

        serde_json::to_string_pretty(&reading).unwrap()
    }

    fn get_meter(&self, input: SingleMeterInput) -> String {
        let date = match NaiveDate::parse_from_str(&input.date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(e) => {
                return error_payload(format!("Invalid date format: {}. Expected YYYY-MM-DD", e))
            }
        };

        let profile = match self.resolve_profile(input.chart_name.as_deref()) {
            Ok(p) => p,
            Err(e) => return error_payload(e),
        };
        let sensitivity = profile.sensitivity.unwrap_or(1.0);

        let transit = match compute_transit_chart(date) {
            Ok(t) => t,
            Err(e) => return error_payload(format!("Failed to compute transits: {}", e)),
        };

        let mut reading = match compute_meter(
            &input.meter,
            &profile.chart,
            &transit,
            date,
            &self.registry,
            sensitivity,
        ) {
            Ok(r) => r,
            Err(e) => return error_payload(e),
        };

        if let Some(previous_day) = date.pred_opt() {
            let yesterday = compute_transit_chart(previous_day)
                .map_err(crate::meters::MetersError::from)
                .and_then(|t| {
                    compute_meter(
                        &input.meter,
                        &profile.chart,
                        &t,
                        previous_day,
                        &self.registry,
                        sensitivity,
                    )
                });
            match yesterday {
                Ok(previous) => {
                    reading.trend = Some(reading_trend(&reading.scores, &previous.scores))
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to compute yesterday's reading")
                }
            }
        }

        serde_json::to_string_pretty(&reading).unwrap()
    }

    fn get_daily_transits(&self, input: DailyTransitsInput) -> String {
        let date = match NaiveDate::parse_from_str(&input.date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(e) => {
                return error_payload(format!("Invalid date format: {}. Expected YYYY-MM-DD", e))
            }
        };

        let profile = match self.resolve_profile(input.chart_name.as_deref()) {
            Ok(p) => p,
            Err(e) => return error_payload(e),
        };

        let transit = match compute_transit_chart(date) {
            Ok(t) => t,
            Err(e) => return error_payload(format!("Failed to compute transits: {}", e)),
        };

        let aspects: Vec<TransitAspectInfo> = detect_aspects(&profile.chart, &transit)
            .into_iter()
            .map(|a| TransitAspectInfo {
                transit: a.transit.planet,
                transit_sign: a.transit.sign,
                transit_degree: (a.transit.sign_degree * 10.0).round() / 10.0,
                retrograde: a.transit.is_retrograde(),
                stationary: a.transit.is_stationary,
                natal: a.natal.planet,
                natal_house: a.natal.house,
                aspect: a.aspect,
                orb_degrees: (a.deviation * 100.0).round() / 100.0,
                phase: a.phase,
            })
            .collect();

        let response = DailyTransitsResponse {
            date: input.date,
            chart: profile.name,
            aspect_count: aspects.len(),
            aspects,
        };

        serde_json::to_string_pretty(&response).unwrap()
    }

    fn list_meters(&self) -> String {
        let meters: Vec<Value> = self
            .registry
            .meters
            .iter()
            .map(|(name, config)| {
                json!({
                    "name": name,
                    "group": config.group,
                    "natal_planets": config.natal_planets,
                    "natal_houses": config.natal_houses,
                })
            })
            .collect();

        let groups: Vec<Value> = self
            .registry
            .meters
            .groups()
            .map(|(name, config)| {
                json!({
                    "name": name,
                    "display_name": config.display_name,
                    "members": self.registry.meters.members_of(name),
                })
            })
            .collect();

        let response = json!({
            "meters": meters,
            "groups": groups,
            "calibration_version": self.registry.calibration.version,
        });

        serde_json::to_string_pretty(&response).unwrap()
    }

    fn list_natal_charts(&self) -> String {
        let charts = self.storage.list_charts();

        let response = json!({
            "charts": charts,
            "count": charts.len()
        });

        serde_json::to_string_pretty(&response).unwrap()
    }

    fn get_natal_chart(&self, input: GetNatalChartInput) -> String {
        let profile = match self.storage.get_chart(&input.name) {
            Some(p) => p,
            None => return error_payload(format!("Natal chart '{}' not found", input.name)),
        };

        let response = json!({
            "name": profile.name,
            "birth_date": profile.birth_date,
            "birth_time": profile.birth_time,
            "birth_location": profile.birth_location,
            "exact": profile.chart.exact,
            "chart_ruler": profile.chart.chart_ruler,
            "sensitivity": profile.sensitivity,
            "planets": profile.chart.bodies.iter().map(|b| json!({
                "planet": b.planet,
                "sign": b.sign,
                "degree": (b.sign_degree * 10.0).round() / 10.0,
                "house": b.house,
                "retrograde": b.is_retrograde(),
            })).collect::<Vec<_>>(),
        });

        serde_json::to_string_pretty(&response).unwrap()
    }

    fn delete_natal_chart(&self, input: DeleteNatalChartInput) -> String {
        let profile = match self.storage.get_chart(&input.name) {
            Some(p) => p,
            None => return error_payload(format!("Natal chart '{}' not found", input.name)),
        };

        if profile.birth_date != input.birth_date {
            return error_payload(format!(
                "Chart '{}' exists but with birth date '{}'. You provided '{}'. Please use the correct birth date to delete.",
                input.name, profile.birth_date, input.birth_date
            ));
        }

        match self.storage.delete_chart(&input.name) {
            Ok(true) => json!({
                "success": true,
                "message": format!("Natal chart '{}' (born {}) has been deleted", profile.name, profile.birth_date)
            })
            .to_string(),
            Ok(false) => error_payload(format!("Natal chart '{}' not found", input.name)),
            Err(e) => error_payload(format!("Failed to delete chart: {}", e)),
        }
    }

    fn get_tools(&self) -> Vec<Tool> {
        vec![
            Tool::new(
                "store_natal_chart",
                "Store a natal chart with birth data for meter calculations. Omit the birth time to fall back to a solar chart. The chart is saved permanently.",
                schema_to_value::<StoreNatalChartInput>(),
            ),
            Tool::new(
                "get_all_meters",
                "Compute the full daily meter panel: 17 meters with normalized intensity and harmony, 5 thematic groups, the overall aggregates, key aspects, and day-over-day trends.",
                schema_to_value::<AllMetersInput>(),
            ),
            Tool::new(
                "get_meter",
                "Compute a single named meter's reading for a date, with its trend against the previous day.",
                schema_to_value::<SingleMeterInput>(),
            ),
            Tool::new(
                "get_daily_transits",
                "List every natal-transit aspect active on a date: aspect type, orb, applying/exact/separating phase, and station flags.",
                schema_to_value::<DailyTransitsInput>(),
            ),
            Tool::new(
                "list_meters",
                "List the configured meters, their filters, and their groups.",
                empty_schema(),
            ),
            Tool::new(
                "list_natal_charts",
                "List all stored natal charts by name.",
                empty_schema(),
            ),
            Tool::new(
                "get_natal_chart",
                "Get a stored natal chart by name.",
                schema_to_value::<GetNatalChartInput>(),
            ),
            Tool::new(
                "delete_natal_chart",
                "Delete a stored natal chart. Requires both name and birth date for confirmation.",
                schema_to_value::<DeleteNatalChartInput>(),
            ),
        ]
    }
}

impl ServerHandler for AstrometersServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Astrometers - MCP server computing quantitative daily astrology meters. \
                 Store your natal chart first with store_natal_chart, then use get_all_meters \
                 for the full calibrated panel or get_meter for a single reading."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::ErrorData> {
        Ok(ListToolsResult {
            tools: self.get_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let args: Value = Value::Object(request.arguments.clone().unwrap_or_default());

        let result = match request.name.as_ref() {
            "store_natal_chart" => {
                let input: StoreNatalChartInput = serde_json::from_value(args)
                    .map_err(|e| rmcp::ErrorData::invalid_params(e.to_string(), None))?;
                self.store_natal_chart(input)
            }
            "get_all_meters" => {
                let input: AllMetersInput = serde_json::from_value(args)
                    .map_err(|e| rmcp::ErrorData::invalid_params(e.to_string(), None))?;
                self.get_all_meters(input)
            }
            "get_meter" => {
                let input: SingleMeterInput = serde_json::from_value(args)
                    .map_err(|e| rmcp::ErrorData::invalid_params(e.to_string(), None))?;
                self.get_meter(input)
            }
            "get_daily_transits" => {
                let input: DailyTransitsInput = serde_json::from_value(args)
                    .map_err(|e| rmcp::ErrorData::invalid_params(e.to_string(), None))?;
                self.get_daily_transits(input)
            }
            "list_meters" => self.list_meters(),
            "list_natal_charts" => self.list_natal_charts(),
            "get_natal_chart" => {
                let input: GetNatalChartInput = serde_json::from_value(args)
                    .map_err(|e| rmcp::ErrorData::invalid_params(e.to_string(), None))?;
                self.get_natal_chart(input)
            }
            "delete_natal_chart" => {
                let input: DeleteNatalChartInput = serde_json::from_value(args)
                    .map_err(|e| rmcp::ErrorData::invalid_params(e.to_string(), None))?;
                self.delete_natal_chart(input)
            }
            _ => {
                return Err(rmcp::ErrorData::invalid_params(
                    format!("Unknown tool: {}", request.name),
                    None,
                ))
            }
        };

        Ok(CallToolResult::success(vec![Content::text(result)]))
    }
}
