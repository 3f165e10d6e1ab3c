//! Prompt construction and validation of generated plans
//!
//! The model is treated as a constrained renderer: every fact it needs
//! (metadata strings, time window, candidates) is computed beforehand and
//! passed in the prompt, and the answer is rejected unless it matches the
//! plan schema and echoes the metadata verbatim.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::TextGenerator;
use crate::budget::format_hours_minutes;
use crate::models::{LayoverMetadata, LayoverPlan, PlanningContext};
use crate::{PlannerError, Result};

/// Schema violations reported back in a generation error
const MAX_REPORTED_VIOLATIONS: usize = 5;

/// Compiled plan schema plus the semantic checks layered on top of it
pub struct PlanValidator {
    validator: jsonschema::Validator,
}

impl PlanValidator {
    pub fn new(schema: &Value) -> Result<Self> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| PlannerError::general(format!("plan schema does not compile: {e}")))?;
        Ok(Self { validator })
    }

    /// Parse raw model text into a plan, without any cleanup.
    ///
    /// Order: JSON syntax, schema, typed deserialization, semantic checks,
    /// then metadata equality against `expected`.
    pub fn parse(
        &self,
        raw: &str,
        expected: &LayoverMetadata,
        require_stops: bool,
    ) -> Result<LayoverPlan> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| PlannerError::generation(format!("output is not valid JSON: {e}")))?;

        let violations: Vec<String> = self
            .validator
            .iter_errors(&value)
            .take(MAX_REPORTED_VIOLATIONS)
            .map(|e| format!("{}: {}", e.instance_path, e))
            .collect();
        if !violations.is_empty() {
            return Err(PlannerError::generation(format!(
                "output does not match the plan schema: {}",
                violations.join("; ")
            )));
        }

        let plan: LayoverPlan = serde_json::from_value(value)
            .map_err(|e| PlannerError::generation(format!("output is not a plan: {e}")))?;
        plan.check(require_stops)?;

        if plan.metadata != *expected {
            return Err(PlannerError::generation(format!(
                "metadata {:?} differs from the required {:?}",
                plan.metadata, expected
            )));
        }
        Ok(plan)
    }

    /// Parse, and on failure retry once on the fence-stripped text
    pub fn parse_with_cleanup(
        &self,
        raw: &str,
        expected: &LayoverMetadata,
        require_stops: bool,
    ) -> Result<LayoverPlan> {
        match self.parse(raw, expected, require_stops) {
            Ok(plan) => Ok(plan),
            Err(first) => {
                let cleaned = strip_code_fences(raw);
                if cleaned == raw {
                    return Err(first);
                }
                warn!("Generated plan rejected ({}), retrying after cleanup", first);
                self.parse(cleaned, expected, require_stops)
            }
        }
    }
}

/// Trim whitespace and remove one pair of surrounding code fences
#[must_use]
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner
        .strip_prefix("json")
        .or_else(|| inner.strip_prefix("JSON"))
        .unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Render the generation prompt for a feasible context
pub fn build_prompt(ctx: &PlanningContext, schema: &Value) -> Result<String> {
    let candidates = serde_json::to_string_pretty(&ctx.candidates)
        .map_err(|e| PlannerError::general(format!("Failed to serialize candidates: {e}")))?;
    let schema = serde_json::to_string_pretty(schema)
        .map_err(|e| PlannerError::general(format!("Failed to serialize plan schema: {e}")))?;
    let meta = &ctx.metadata;

    Ok(format!(
        r#"You are a JSON generator for a layover planner.

STRICT OUTPUT:
- Return JSON only, no code fences.
- Must conform exactly to the TARGET JSON SCHEMA.
- Fill ALL required fields.

HARD CONSTRAINTS (use these exact strings in metadata):
- metadata.airport = "{airport}"
- metadata.layover_duration = "{layover_duration}"
- metadata.safety_buffer = "{safety_buffer}"
- metadata.must_return_by = "{must_return_by}"
- metadata.current_time = "{current_time}"

TIME RULES:
- Total layover = {layover_minutes} minutes.
- Usable window (excluding buffers) = {usable_minutes} minutes.
- Earliest exit = {earliest_exit} (local).
- Latest return = {latest_return} (local).
- Max ONE-WAY travel time to any stop = {one_way} minutes.
- Assume exit buffer = {leave} min, return buffer = {ret} min.

SELECTION RULES:
- Use ONLY places from CANDIDATES; do not invent any name, address or place.
- Prefer off-airport options when time allows.
- 4-8 recommended_stops (fewer allowed if time is tight, at least 1).
- Each stop: realistic "duration_range" (e.g. "45-90 min"), "transport" one of ["walk","metro","bus","taxi","rideshare"].
- Keep the total of visit durations plus travel within the usable window of {usable_hm}.

CANDIDATES:
{candidates}

TARGET JSON SCHEMA:
{schema}
"#,
        airport = meta.airport,
        layover_duration = meta.layover_duration,
        safety_buffer = meta.safety_buffer,
        must_return_by = meta.must_return_by,
        current_time = meta.current_time,
        layover_minutes = ctx.layover_minutes,
        usable_minutes = ctx.usable_minutes,
        earliest_exit = ctx.earliest_exit_local,
        latest_return = ctx.latest_return_local,
        one_way = ctx.max_one_way_minutes,
        leave = ctx.leave_buffer_min,
        ret = ctx.return_buffer_min,
        usable_hm = format_hours_minutes(ctx.usable_minutes),
    ))
}

/// Turns a planning context into a validated plan
pub struct PlanGateway {
    generator: Arc<dyn TextGenerator>,
    validator: PlanValidator,
    schema: Value,
}

impl PlanGateway {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Result<Self> {
        let schema = LayoverPlan::json_schema();
        Ok(Self {
            generator,
            validator: PlanValidator::new(&schema)?,
            schema,
        })
    }

    /// Produce the plan for `ctx`.
    ///
    /// Without a feasible excursion, or without any reachable candidate, the
    /// generator is not called and a stay-in-airport plan is returned.
    #[instrument(skip_all, fields(airport = %ctx.airport_code, candidates = ctx.candidates.len()))]
    pub async fn synthesize(&self, ctx: &PlanningContext) -> Result<LayoverPlan> {
        if !ctx.excursion_feasible() {
            info!("No usable excursion window, skipping generation");
            let reason = format!(
                "Your {} layover is too short to leave the airport once exit and return buffers are reserved.",
                ctx.metadata.layover_duration
            );
            return Ok(LayoverPlan::stay_in_airport(ctx.metadata.clone(), &reason));
        }

        if ctx.candidates.is_empty() {
            info!("No reachable candidates, skipping generation");
            let reason = format!(
                "No attractions within {} minutes of the airport could be confirmed, so staying at the airport is recommended.",
                ctx.max_one_way_minutes
            );
            return Ok(LayoverPlan::stay_in_airport(ctx.metadata.clone(), &reason));
        }

        let prompt = build_prompt(ctx, &self.schema)?;
        debug!("Prompt is {} characters", prompt.len());
        let raw = self.generator.generate(&prompt, &self.schema).await?;
        let plan = self.validator.parse_with_cleanup(&raw, &ctx.metadata, true)?;
        info!("Accepted plan with {} stops", plan.recommended_stops.len());
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, Place};
    use crate::test_support::FakeGenerator;
    use rstest::rstest;
    use serde_json::json;

    fn metadata() -> LayoverMetadata {
        LayoverMetadata {
            airport: "RUH".to_string(),
            layover_duration: "6h 0m".to_string(),
            safety_buffer: "exit 45m, return 90m".to_string(),
            must_return_by: "17:30".to_string(),
            current_time: "13:00".to_string(),
        }
    }

    fn context(one_way: u32, candidates: Vec<Place>) -> PlanningContext {
        PlanningContext {
            airport: "King Khalid International Airport".to_string(),
            airport_code: "RUH".to_string(),
            airport_location: Coordinates::new(24.9578, 46.6989),
            arrival_time: "2025-09-01T10:00:00+00:00".to_string(),
            departure_time: "2025-09-01T16:00:00+00:00".to_string(),
            nationality: "Germany".to_string(),
            city_hint: Some("Riyadh".to_string()),
            layover_minutes: 360,
            usable_minutes: 225,
            leave_buffer_min: 45,
            return_buffer_min: 90,
            earliest_exit_local: "13:45".to_string(),
            latest_return_local: "17:30".to_string(),
            max_one_way_minutes: one_way,
            radius_m: 23_333,
            metadata: metadata(),
            candidates,
        }
    }

    fn candidates() -> Vec<Place> {
        vec![
            Place::new("p1", "Riyadh Boulevard")
                .with_quality(4.6, 80_000)
                .with_travel(28, Some(31.2)),
        ]
    }

    fn plan_json() -> Value {
        json!({
            "metadata": {
                "airport": "RUH",
                "layover_duration": "6h 0m",
                "safety_buffer": "exit 45m, return 90m",
                "must_return_by": "17:30",
                "current_time": "13:00"
            },
            "recommended_stops": [{
                "id": 1,
                "title": "Riyadh Boulevard",
                "description": "Entertainment district with restaurants and shows.",
                "tags": ["entertainment", "food"],
                "opening_hours": "16:00-23:59",
                "duration_range": "60-90 min",
                "cost": "Free entry",
                "transport": "taxi",
                "options": [],
                "notes": null
            }],
            "baggage_storage": [],
            "local_insights": [{"title": "Dress code", "content": ["Modest clothing is expected."]}]
        })
    }

    fn validator() -> PlanValidator {
        PlanValidator::new(&LayoverPlan::json_schema()).unwrap()
    }

    #[rstest]
    #[case("{\"a\":1}", "{\"a\":1}")]
    #[case("  {\"a\":1}\n", "{\"a\":1}")]
    #[case("```json\n{\"a\":1}\n```", "{\"a\":1}")]
    #[case("```\n{\"a\":1}\n```", "{\"a\":1}")]
    #[case("```JSON {\"a\":1}```", "{\"a\":1}")]
    fn test_strip_code_fences(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(strip_code_fences(raw), expected);
    }

    #[test]
    fn test_parse_accepts_valid_plan() {
        let plan = validator()
            .parse(&plan_json().to_string(), &metadata(), true)
            .unwrap();
        assert_eq!(plan.recommended_stops.len(), 1);
        assert_eq!(plan.metadata, metadata());
    }

    #[test]
    fn test_validated_plan_revalidates_after_serialization() {
        let validator = validator();
        let plan = validator
            .parse(&plan_json().to_string(), &metadata(), true)
            .unwrap();
        let again = validator
            .parse(&serde_json::to_string(&plan).unwrap(), &metadata(), true)
            .unwrap();
        assert_eq!(plan, again);
    }

    #[test]
    fn test_parse_rejects_schema_violation() {
        let mut value = plan_json();
        value["recommended_stops"][0]["transport"] = json!("hoverboard");
        let err = validator()
            .parse(&value.to_string(), &metadata(), true)
            .unwrap_err();
        assert!(matches!(err, PlannerError::Generation { .. }));
    }

    #[test]
    fn test_parse_rejects_metadata_drift() {
        let mut value = plan_json();
        value["metadata"]["must_return_by"] = json!("18:00");
        let err = validator()
            .parse(&value.to_string(), &metadata(), true)
            .unwrap_err();
        assert!(err.to_string().contains("metadata"));
    }

    #[test]
    fn test_cleanup_pass_accepts_fenced_output() {
        let fenced = format!("```json\n{}\n```", plan_json());
        let validator = validator();
        assert!(validator.parse(&fenced, &metadata(), true).is_err());
        assert!(validator.parse_with_cleanup(&fenced, &metadata(), true).is_ok());
    }

    #[test]
    fn test_cleanup_pass_still_rejects_prose() {
        let err = validator()
            .parse_with_cleanup("Here is your plan!", &metadata(), true)
            .unwrap_err();
        assert!(matches!(err, PlannerError::Generation { .. }));
    }

    #[test]
    fn test_prompt_carries_constraints_and_candidates() {
        let ctx = context(35, candidates());
        let prompt = build_prompt(&ctx, &LayoverPlan::json_schema()).unwrap();
        assert!(prompt.contains("metadata.layover_duration = \"6h 0m\""));
        assert!(prompt.contains("metadata.safety_buffer = \"exit 45m, return 90m\""));
        assert!(prompt.contains("Max ONE-WAY travel time to any stop = 35 minutes."));
        assert!(prompt.contains("Earliest exit = 13:45 (local)."));
        assert!(prompt.contains("Riyadh Boulevard"));
        assert!(prompt.contains("TARGET JSON SCHEMA"));
        assert!(prompt.contains("recommended_stops"));
    }

    #[tokio::test]
    async fn test_infeasible_window_skips_generator() {
        let generator = Arc::new(FakeGenerator::replying("unused"));
        let gateway = PlanGateway::new(generator.clone()).unwrap();

        let plan = gateway.synthesize(&context(0, Vec::new())).await.unwrap();

        assert_eq!(generator.calls(), 0);
        assert!(plan.recommended_stops.is_empty());
        assert_eq!(plan.metadata, metadata());
        assert!(plan.local_insights[0].content[0].contains("too short"));
    }

    #[tokio::test]
    async fn test_empty_candidate_set_skips_generator() {
        let generator = Arc::new(FakeGenerator::replying("unused"));
        let gateway = PlanGateway::new(generator.clone()).unwrap();

        let plan = gateway.synthesize(&context(35, Vec::new())).await.unwrap();

        assert_eq!(generator.calls(), 0);
        assert!(plan.recommended_stops.is_empty());
    }

    #[tokio::test]
    async fn test_synthesize_calls_generator_once() {
        let generator = Arc::new(FakeGenerator::replying(plan_json().to_string()));
        let gateway = PlanGateway::new(generator.clone()).unwrap();

        let plan = gateway.synthesize(&context(35, candidates())).await.unwrap();

        assert_eq!(generator.calls(), 1);
        assert_eq!(plan.recommended_stops[0].title, "Riyadh Boulevard");
        assert!(generator.last_prompt().unwrap().contains("HARD CONSTRAINTS"));
    }

    #[tokio::test]
    async fn test_empty_stops_rejected_when_feasible() {
        let mut value = plan_json();
        value["recommended_stops"] = json!([]);
        let generator = Arc::new(FakeGenerator::replying(value.to_string()));
        let gateway = PlanGateway::new(generator).unwrap();

        let err = gateway
            .synthesize(&context(35, candidates()))
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::Generation { .. }));
    }
}
