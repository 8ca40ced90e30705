//! Product subsystem — feature development, maturity, quality, and milestone.
//!
//! Development capacity comes from onboarded engineers, boosted slightly by
//! overall team productivity. Each tick the highest-priority unfinished
//! feature takes 70% of that capacity and, when the team produces more than
//! one point per day, the runner-up takes 30%. Complexity scales speed:
//! complexity 5 is neutral, 10 is half speed, 2 is 2.5x.
//!
//! Everything downstream of feature progress (overall progress, maturity,
//! milestone) is recomputed from the feature list every tick, never
//! accumulated.
//!
//! Product-market fit and quality step by fixed per-tick amounts regardless
//! of how many days the tick covers.

use crate::{
    error::{SimError, SimResult},
    event::SimEvent,
    rng::{RandomSource, SubsystemSlot},
    subsystem::{SimSubsystem, Step, TickContext},
    team_subsystem::{Role, TeamState},
    types::{Days, EntityId},
};
use serde::{Deserialize, Serialize};

pub const PROGRESS_PER_ENGINEER_DAY: f64 = 0.5;
pub const PRIMARY_SHARE: f64 = 0.7;
pub const SECONDARY_SHARE: f64 = 0.3;
pub const NEUTRAL_COMPLEXITY: f64 = 5.0;
pub const PMF_STEP: f64 = 0.001;
pub const QUALITY_STEP: f64 = 0.0005;
/// Maturity above which product-market fit starts improving.
pub const PMF_MATURITY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Idea,
    Mvp,
    Validated,
    Growing,
    Mature,
}

impl Milestone {
    /// Stage for a given share of completed features.
    pub fn from_completion_ratio(ratio: f64) -> Self {
        if ratio < 0.2 {
            Self::Idea
        } else if ratio < 0.4 {
            Self::Mvp
        } else if ratio < 0.6 {
            Self::Validated
        } else if ratio < 0.8 {
            Self::Growing
        } else {
            Self::Mature
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// 0–100, never decreases.
    pub progress: f64,
    /// Lower is more urgent. Always >= 1.
    pub priority: u32,
    /// 1–10.
    pub base_complexity: f64,
}

impl Feature {
    pub fn is_complete(&self) -> bool {
        self.progress >= 100.0
    }

    fn complexity_factor(&self) -> f64 {
        NEUTRAL_COMPLEXITY / self.base_complexity.clamp(1.0, 10.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductState {
    pub overall_progress: f64,
    pub current_milestone: Milestone,
    pub features: Vec<Feature>,
    pub maturity: f64,
    pub quality: f64,
    pub product_market_fit: f64,
    pub product_template_id: Option<String>,
    /// Progress points owed to setbacks; paid from future capacity.
    pub development_debt: f64,
}

impl Default for ProductState {
    fn default() -> Self {
        Self {
            overall_progress: 0.0,
            current_milestone: Milestone::Idea,
            features: Vec::new(),
            maturity: 0.0,
            quality: 0.0,
            product_market_fit: 0.0,
            product_template_id: None,
            development_debt: 0.0,
        }
    }
}

impl ProductState {
    /// A fresh product bound to a template's backlog.
    pub fn from_template(template_id: &str, features: Vec<Feature>) -> Self {
        let mut product = Self {
            product_template_id: Some(template_id.to_string()),
            features,
            ..Self::default()
        };
        product.refresh_derived();
        product
    }

    pub fn completed_count(&self) -> usize {
        self.features.iter().filter(|f| f.is_complete()).count()
    }

    /// Recompute overall progress, maturity, and milestone from the features.
    pub fn refresh_derived(&mut self) {
        self.overall_progress = overall_progress(&self.features);
        self.maturity = (self.overall_progress / 100.0).min(1.0);
        self.current_milestone = milestone_for(&self.features);
    }

    /// Indices of unfinished features, most urgent first. Ties keep backlog order.
    fn active_by_priority(&self) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..self.features.len())
            .filter(|&i| !self.features[i].is_complete())
            .collect();
        idx.sort_by_key(|&i| self.features[i].priority);
        idx
    }
}

/// Complexity-weighted mean progress; 0 with no features.
pub fn overall_progress(features: &[Feature]) -> f64 {
    let total_complexity: f64 = features.iter().map(|f| f.base_complexity).sum();
    if total_complexity <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = features.iter().map(|f| f.progress * f.base_complexity).sum();
    weighted / total_complexity
}

pub fn milestone_for(features: &[Feature]) -> Milestone {
    if features.is_empty() {
        return Milestone::Idea;
    }
    let completed = features.iter().filter(|f| f.is_complete()).count();
    Milestone::from_completion_ratio(completed as f64 / features.len() as f64)
}

/// Per-day development rate before complexity.
pub fn daily_progress(team: &TeamState) -> f64 {
    let engineers = team.onboarded_count(Role::Engineer) as f64;
    engineers * PROGRESS_PER_ENGINEER_DAY * (1.0 + team.total_productivity * 0.1)
}

pub fn prioritize(prior: &ProductState, feature_id: &str, priority: i64) -> SimResult<ProductState> {
    let mut next = prior.clone();
    let feature = next
        .features
        .iter_mut()
        .find(|f| f.id == feature_id)
        .ok_or_else(|| SimError::not_found("feature", feature_id))?;
    feature.priority = priority.clamp(1, u32::MAX as i64) as u32;
    Ok(next)
}

/// Apply a product event effect. Positive values land on the most urgent
/// unfinished feature; negative values become development debt so that
/// progress never goes backwards.
pub fn apply_progress_effect(prior: &ProductState, value: f64) -> ProductState {
    let mut next = prior.clone();
    if !value.is_finite() || value == 0.0 {
        return next;
    }
    if value < 0.0 {
        next.development_debt += -value;
    } else if let Some(&i) = next.active_by_priority().first() {
        let f = &mut next.features[i];
        f.progress = (f.progress + value).min(100.0);
    }
    next.refresh_derived();
    next
}

/// Journal entries for features finished and milestones crossed between
/// two versions of the same backlog.
pub fn completion_events(prior: &ProductState, next: &ProductState, day: Days) -> Vec<SimEvent> {
    let mut events = Vec::new();
    for (before, after) in prior.features.iter().zip(&next.features) {
        if !before.is_complete() && after.is_complete() {
            log::info!("day={day:.1} product: feature '{}' complete", after.name);
            events.push(SimEvent::FeatureCompleted {
                day,
                feature_id: after.id.clone(),
            });
        }
    }
    if next.current_milestone != prior.current_milestone {
        log::info!(
            "day={day:.1} product: milestone {:?} -> {:?}",
            prior.current_milestone, next.current_milestone
        );
        events.push(SimEvent::MilestoneReached {
            day,
            from: prior.current_milestone,
            to: next.current_milestone,
        });
    }
    events
}

/// Shift product-market fit, clamped to [0, 1].
pub fn apply_market_effect(prior: &ProductState, value: f64) -> ProductState {
    let mut next = prior.clone();
    if value.is_finite() {
        next.product_market_fit = (next.product_market_fit + value).clamp(0.0, 1.0);
    }
    next
}

pub struct ProductSubsystem;

impl SimSubsystem for ProductSubsystem {
    type State = ProductState;

    fn name(&self) -> &'static str { "product" }

    fn slot(&self) -> SubsystemSlot { SubsystemSlot::Product }

    fn update(
        &self,
        prior: &ProductState,
        ctx: &TickContext<'_>,
        _rng: &mut dyn RandomSource,
    ) -> SimResult<Step<ProductState>> {
        let team = &ctx.state.team;
        let mut next = prior.clone();

        let rate = daily_progress(team);
        let mut capacity = rate * ctx.delta.max(0.0);

        let repaid = next.development_debt.min(capacity);
        next.development_debt -= repaid;
        capacity -= repaid;

        let active = next.active_by_priority();
        if capacity > 0.0 {
            if let Some(&primary) = active.first() {
                let f = &mut next.features[primary];
                f.progress = (f.progress + capacity * PRIMARY_SHARE * f.complexity_factor()).min(100.0);
            }
            if rate > 1.0 {
                if let Some(&secondary) = active.get(1) {
                    let f = &mut next.features[secondary];
                    f.progress =
                        (f.progress + capacity * SECONDARY_SHARE * f.complexity_factor()).min(100.0);
                }
            }
        }

        next.refresh_derived();
        let events = completion_events(prior, &next, ctx.now);

        if next.maturity > PMF_MATURITY_THRESHOLD {
            next.product_market_fit = (next.product_market_fit + PMF_STEP).min(1.0);
        }
        if team.onboarded_count(Role::Designer) > 0 {
            next.quality = (next.quality + QUALITY_STEP).min(1.0);
        }

        Ok(Step::new(next, events))
    }
}

/// Days an idle feature of `complexity` would need to finish with `rate`
/// per-day capacity fully applied to it. `None` when nothing is being built.
pub fn days_to_complete(feature: &Feature, rate: f64) -> Option<Days> {
    let per_day = rate * PRIMARY_SHARE * feature.complexity_factor();
    if per_day <= 0.0 {
        return None;
    }
    Some((100.0 - feature.progress).max(0.0) / per_day)
}
