//! Layover planning orchestration
//!
//! One call runs the whole pipeline for a request: airport lookup, geocoding,
//! time budget, discovery, travel-time annotation, ranking, and plan
//! synthesis, all under a single deadline.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::airports;
use crate::budget::{BudgetCalculator, TimeBudget, format_hours_minutes, local_time_label};
use crate::config::{LayoverConfig, PlannerConfig};
use crate::generation::{GeminiClient, PlanGateway, TextGenerator};
use crate::maps::travel_time::prefilter_unreachable;
use crate::maps::{
    DiscoveryOptions, GoogleMapsClient, MapsProvider, PlaceDiscovery, TravelTimeAnnotator,
};
use crate::models::{Coordinates, LayoverMetadata, LayoverPlan, Place, PlanRequest, PlanningContext};
use crate::ranking::select_candidates;
use crate::{PlannerError, Result};

/// Plan plus, on request, the context it was generated from
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: LayoverPlan,
    pub debug_ctx: Option<PlanningContext>,
}

/// Layover planning service
pub struct LayoverPlanner {
    maps: Arc<dyn MapsProvider>,
    gateway: PlanGateway,
    budget: BudgetCalculator,
    settings: PlannerConfig,
    page_delay: Duration,
}

impl LayoverPlanner {
    pub fn new(
        maps: Arc<dyn MapsProvider>,
        generator: Arc<dyn TextGenerator>,
        settings: PlannerConfig,
        page_delay: Duration,
    ) -> Result<Self> {
        let budget = BudgetCalculator {
            leave_buffer_minutes: settings.leave_buffer_minutes,
            return_buffer_minutes: settings.return_buffer_minutes,
            average_speed_kmh: settings.average_speed_kmh,
        };
        Ok(Self {
            maps,
            gateway: PlanGateway::new(generator)?,
            budget,
            settings,
            page_delay,
        })
    }

    /// Wire the production maps and generation clients from configuration
    pub fn from_config(config: &LayoverConfig) -> Result<Self> {
        let maps = Arc::new(GoogleMapsClient::new(&config.maps)?);
        let generator = Arc::new(GeminiClient::new(&config.generation)?);
        Self::new(
            maps,
            generator,
            config.planner.clone(),
            config.maps.page_delay(),
        )
    }

    /// Plan a layover, bounded by the configured deadline.
    ///
    /// Dropping the returned future cancels any queries still in flight.
    pub async fn plan(&self, request: &PlanRequest, include_debug: bool) -> Result<PlanOutcome> {
        let deadline = self.settings.deadline();
        tokio::time::timeout(deadline, self.run(request, include_debug))
            .await
            .map_err(|_| {
                warn!("Planning for {} hit the deadline", request.airport_code());
                PlannerError::general(format!(
                    "planning did not finish within {}s",
                    deadline.as_secs()
                ))
            })?
    }

    /// Plan a layover and return only the plan
    pub async fn generate_plan(&self, request: &PlanRequest) -> Result<LayoverPlan> {
        Ok(self.plan(request, false).await?.plan)
    }

    async fn run(&self, request: &PlanRequest, include_debug: bool) -> Result<PlanOutcome> {
        let ctx = self.build_context(request).await?;
        let plan = self.gateway.synthesize(&ctx).await?;
        Ok(PlanOutcome {
            plan,
            debug_ctx: include_debug.then_some(ctx),
        })
    }

    /// Compute every fact the plan depends on
    #[instrument(skip(self, request), fields(airport = request.airport_code()))]
    pub async fn build_context(&self, request: &PlanRequest) -> Result<PlanningContext> {
        let code = request.airport_code();
        let Some(airport) = airports::lookup(code) else {
            warn!(
                "Unsupported airport {code}, supported: {}",
                airports::codes().collect::<Vec<_>>().join(", ")
            );
            return Err(PlannerError::invalid_value(format!("Airport {code} not found")));
        };

        let geocoded = self.maps.geocode(airport.name).await?.ok_or_else(|| {
            PlannerError::invalid_value(format!("Could not geocode airport {code}"))
        })?;
        let origin = geocoded.location;
        let city_hint = geocoded.city_hint();

        let layover_minutes = request.layover_minutes();
        let budget = self.budget.calculate(layover_minutes);
        info!(
            "Layover {} min, usable {} min, one-way {} min, radius {} m",
            budget.layover_minutes, budget.usable_minutes, budget.one_way_minutes, budget.radius_m
        );

        let candidates = if budget.is_feasible() {
            self.find_candidates(origin, &budget, city_hint.clone()).await?
        } else {
            info!("No feasible excursion, skipping discovery");
            Vec::new()
        };

        let timezone = airport.timezone;
        let earliest_exit = self.budget.earliest_exit(request.arrival_time());
        let latest_return = self.budget.latest_return(request.departure_time());
        let latest_return_local = local_time_label(latest_return, timezone);

        let metadata = LayoverMetadata {
            airport: code.to_string(),
            layover_duration: format_hours_minutes(layover_minutes),
            safety_buffer: self.budget.safety_buffer_label(),
            must_return_by: latest_return_local.clone(),
            current_time: local_time_label(request.arrival_time(), timezone),
        };

        Ok(PlanningContext {
            airport: geocoded.formatted_address,
            airport_code: code.to_string(),
            airport_location: origin,
            arrival_time: request.arrival_time().to_rfc3339(),
            departure_time: request.departure_time().to_rfc3339(),
            nationality: request.nationality().to_string(),
            city_hint,
            layover_minutes,
            usable_minutes: budget.usable_minutes,
            leave_buffer_min: self.budget.leave_buffer_minutes,
            return_buffer_min: self.budget.return_buffer_minutes,
            earliest_exit_local: local_time_label(earliest_exit, timezone),
            latest_return_local,
            max_one_way_minutes: budget.one_way_minutes,
            radius_m: budget.radius_m,
            metadata,
            candidates,
        })
    }

    async fn find_candidates(
        &self,
        origin: Coordinates,
        budget: &TimeBudget,
        city_hint: Option<String>,
    ) -> Result<Vec<Place>> {
        let options = DiscoveryOptions::new(budget.radius_m, self.settings.max_discovery_results)
            .with_city_hint(city_hint)
            .with_quality_floor(self.settings.min_rating, self.settings.min_reviews);

        let report = PlaceDiscovery::new(self.maps.as_ref(), self.page_delay)
            .discover(origin, &options)
            .await?;
        let reachable = prefilter_unreachable(origin, report.places, budget.one_way_minutes);
        let annotated = TravelTimeAnnotator::new(self.maps.as_ref())
            .annotate(origin, reachable)
            .await;

        Ok(select_candidates(
            annotated,
            budget.one_way_minutes,
            self.settings.max_candidates,
        ))
    }
}
