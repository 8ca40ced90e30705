//! Narrative subsystem — random story events the player must respond to.
//!
//! Per tick:
//!   1. If at least ten days have passed since the last event, roll for a
//!      new one (30%). Fewer than three may be pending at once.
//!   2. Pending events past their expiry are dropped unresolved.
//!
//! The subsystem only produces and retires events. What a chosen option
//! does to the company is decided by the engine's effect table.

use crate::{
    error::{SimError, SimResult},
    event::SimEvent,
    finance_subsystem::runway_below,
    rng::{RandomSource, SubsystemSlot},
    subsystem::{SimSubsystem, Step, TickContext},
    types::{Days, EntityId},
};
use serde::{Deserialize, Serialize};

pub const EVENT_COOLDOWN_DAYS: Days = 10.0;
pub const EVENT_CHANCE: f64 = 0.3;
pub const MAX_PENDING_EVENTS: usize = 3;
/// Runway (months) below which financial events turn into rescue offers.
pub const EMERGENCY_RUNWAY_MONTHS: f64 = 3.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Market,
    Team,
    Product,
    Financial,
    Investor,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    Money,
    Expense,
    Team,
    Product,
    Revenue,
    Market,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventEffect {
    #[serde(rename = "type")]
    pub effect_type: EffectType,
    pub value: f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventOption {
    pub id: String,
    pub label: String,
    pub description: String,
    pub effects: Vec<EventEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequences: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub title: String,
    pub description: String,
    pub options: Vec<EventOption>,
    pub triggered_at: Days,
    pub expires_at: Option<Days>,
    /// Set once the player has responded.
    #[serde(default)]
    pub chosen_option: Option<String>,
}

impl GameEvent {
    pub fn is_expired(&self, now: Days) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }

    pub fn option(&self, option_id: &str) -> Option<&EventOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventState {
    pub pending_events: Vec<GameEvent>,
    pub event_history: Vec<GameEvent>,
    pub last_event_time: Days,
    /// Counter behind event ids.
    #[serde(default)]
    pub issued: u64,
}

/// Take the player's answer to a pending event. Returns the updated state
/// and the effects of the chosen option, which the caller applies.
pub fn resolve(
    prior: &EventState,
    event_id: &str,
    option_id: &str,
    now: Days,
) -> SimResult<(EventState, Vec<EventEffect>)> {
    let idx = prior
        .pending_events
        .iter()
        .position(|e| e.id == event_id)
        .ok_or_else(|| SimError::not_found("event", event_id))?;
    let event = &prior.pending_events[idx];
    if event.is_expired(now) {
        return Err(SimError::invalid(format!("event {event_id} has expired")));
    }
    let effects = event
        .option(option_id)
        .ok_or_else(|| SimError::not_found("event option", option_id))?
        .effects
        .clone();

    let mut next = prior.clone();
    let mut answered = next.pending_events.remove(idx);
    answered.chosen_option = Some(option_id.to_string());
    next.event_history.push(answered);
    Ok((next, effects))
}

fn effect(effect_type: EffectType, value: f64, description: &str) -> EventEffect {
    EventEffect {
        effect_type,
        value,
        description: description.into(),
    }
}

fn option(id: &str, label: &str, description: &str, effects: Vec<EventEffect>) -> EventOption {
    EventOption {
        id: id.into(),
        label: label.into(),
        description: description.into(),
        effects,
        consequences: None,
    }
}

/// Event content without id or timing.
struct Draft {
    slug: &'static str,
    event_type: EventType,
    title: &'static str,
    description: &'static str,
    options: Vec<EventOption>,
    lifetime: Days,
}

fn hiring_event(rng: &mut dyn RandomSource) -> Draft {
    if rng.next_below(2) == 0 {
        Draft {
            slug: "talent-market-crash",
            event_type: EventType::Team,
            title: "Tech Talent Market Crash",
            description: "Due to market conditions, hiring costs have dropped significantly. Great time to hire!",
            options: vec![
                option("hire-now", "Hire Aggressively", "Take advantage of low costs", vec![
                    effect(EffectType::Expense, -0.2, "Hiring costs reduced 20% for 2 months"),
                ]),
                option("wait", "Wait", "Keep current strategy", vec![]),
            ],
            lifetime: 7.0,
        }
    } else {
        Draft {
            slug: "competing-offer",
            event_type: EventType::Team,
            title: "Key Employee Competing Offer",
            description: "One of your key employees received a competing offer. They want a raise or they'll leave.",
            options: vec![
                option("give-raise", "Give Raise", "Increase salary by $2k/month to retain them", vec![
                    effect(EffectType::Expense, 2_000.0, "Monthly expenses increased by $2k"),
                ]),
                option("let-go", "Let Them Go", "Accept the productivity loss", vec![
                    effect(EffectType::Product, -5.0, "Product development slowed"),
                ]),
            ],
            lifetime: 3.0,
        }
    }
}

fn product_event() -> Draft {
    Draft {
        slug: "technical-breakthrough",
        event_type: EventType::Product,
        title: "Technical Breakthrough",
        description: "Your team made a significant technical breakthrough!",
        options: vec![option("boost", "Apply Breakthrough", "Accelerate product development", vec![
            effect(EffectType::Product, 5.0, "Product progress increased by 5%"),
        ])],
        lifetime: 1.0,
    }
}

fn financial_event(runway: Option<f64>) -> Draft {
    if runway_below(runway, EMERGENCY_RUNWAY_MONTHS) {
        Draft {
            slug: "emergency-funding",
            event_type: EventType::Financial,
            title: "Emergency Funding Opportunity",
            description: "An angel investor offers emergency funding at unfavorable terms due to your low runway.",
            options: vec![
                option("take-emergency", "Take Emergency Funding", "Get $100k at 15% equity (poor terms)", vec![
                    effect(EffectType::Money, 100_000.0, "Received $100k"),
                ]),
                option("decline", "Decline", "Try to survive without it", vec![]),
            ],
            lifetime: 2.0,
        }
    } else {
        Draft {
            slug: "unexpected-expense",
            event_type: EventType::Financial,
            title: "Unexpected Expense",
            description: "An unexpected legal fee of $5,000 is due.",
            options: vec![option("pay", "Pay It", "Pay the fee", vec![
                effect(EffectType::Money, -5_000.0, "Paid $5,000"),
            ])],
            lifetime: 1.0,
        }
    }
}

fn market_event() -> Draft {
    Draft {
        slug: "market-opportunity",
        event_type: EventType::Market,
        title: "Market Opportunity",
        description: "A large enterprise customer is interested, but needs a custom feature built.",
        options: vec![
            option("build-feature", "Build Custom Feature", "Spend 1 month dev time, get $50k contract", vec![
                effect(EffectType::Product, -10.0, "Other features delayed"),
                effect(EffectType::Money, 50_000.0, "Received $50k contract"),
            ]),
            option("decline", "Decline", "Focus on core product", vec![]),
        ],
        lifetime: 5.0,
    }
}

pub struct NarrativeSubsystem;

impl NarrativeSubsystem {
    /// Pick a category uniformly and build its event.
    fn draft(&self, rng: &mut dyn RandomSource, runway: Option<f64>) -> Draft {
        match rng.next_below(4) {
            0 => hiring_event(rng),
            1 => product_event(),
            2 => financial_event(runway),
            _ => market_event(),
        }
    }
}

impl SimSubsystem for NarrativeSubsystem {
    type State = EventState;

    fn name(&self) -> &'static str { "narrative" }

    fn slot(&self) -> SubsystemSlot { SubsystemSlot::Narrative }

    fn update(
        &self,
        prior: &EventState,
        ctx: &TickContext<'_>,
        rng: &mut dyn RandomSource,
    ) -> SimResult<Step<EventState>> {
        let mut next = prior.clone();
        let mut events = Vec::new();

        if ctx.now - next.last_event_time >= EVENT_COOLDOWN_DAYS
            && rng.chance(EVENT_CHANCE)
            && next.pending_events.len() < MAX_PENDING_EVENTS
        {
            let draft = self.draft(rng, ctx.state.finance.runway);
            next.issued += 1;
            let event = GameEvent {
                id: format!("evt-{:04}-{}", next.issued, draft.slug),
                event_type: draft.event_type,
                title: draft.title.into(),
                description: draft.description.into(),
                options: draft.options,
                triggered_at: ctx.now,
                expires_at: Some(ctx.now + draft.lifetime),
                chosen_option: None,
            };
            log::info!("day={:.1} narrative: '{}' triggered", ctx.now, event.title);
            events.push(SimEvent::NarrativeEventTriggered {
                day: ctx.now,
                event_id: event.id.clone(),
                category: event.event_type,
                title: event.title.clone(),
            });
            next.pending_events.push(event);
            next.last_event_time = ctx.now;
        }

        let (expired, live): (Vec<_>, Vec<_>) = next
            .pending_events
            .into_iter()
            .partition(|e| e.is_expired(ctx.now));
        for event in expired {
            log::debug!("day={:.1} narrative: '{}' expired unanswered", ctx.now, event.title);
            events.push(SimEvent::NarrativeEventExpired {
                day: ctx.now,
                event_id: event.id,
            });
        }
        next.pending_events = live;

        Ok(Step::new(next, events))
    }
}
