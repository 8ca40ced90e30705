//! Team subsystem — roster, onboarding, productivity, and the hiring pool.
//!
//! Per tick:
//!   1. Employees whose onboarding delay has elapsed become productive.
//!   2. The candidate pool is topped up to the configured size.
//!   3. Aggregate productivity and payroll are recomputed from scratch.
//!
//! Non-onboarded employees draw full salary but contribute nothing.

use crate::{
    error::{SimError, SimResult},
    event::SimEvent,
    name_generator::NameGenerator,
    rng::{RandomSource, SubsystemSlot},
    subsystem::{SimSubsystem, Step, TickContext},
    types::{Days, EntityId},
};
use serde::{Deserialize, Serialize};
use uuid::Builder;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Engineer,
    Designer,
    Sales,
    Marketing,
    Operations,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Engineer,
        Role::Designer,
        Role::Sales,
        Role::Marketing,
        Role::Operations,
    ];

    /// Weight of this role's productivity in the team aggregate.
    pub fn productivity_multiplier(&self) -> f64 {
        match self {
            Self::Engineer   => 1.0,
            Self::Designer   => 0.7,
            Self::Sales      => 0.5,
            Self::Marketing  => 0.4,
            Self::Operations => 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Junior,
    Mid,
    Senior,
}

impl ExperienceLevel {
    /// Monthly salary range in USD.
    pub fn salary_range(&self) -> (f64, f64) {
        match self {
            Self::Junior => (4_000.0, 6_000.0),
            Self::Mid    => (6_000.0, 9_000.0),
            Self::Senior => (9_000.0, 14_000.0),
        }
    }

    pub fn productivity_range(&self) -> (f64, f64) {
        match self {
            Self::Junior => (0.4, 0.6),
            Self::Mid    => (0.6, 0.8),
            Self::Senior => (0.8, 1.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EntityId,
    pub name: String,
    pub role: Role,
    /// Monthly salary.
    pub salary: f64,
    /// 0–1 rating.
    pub productivity: f64,
    pub hire_date: Days,
    pub onboarding_complete: bool,
}

impl Employee {
    pub fn contribution(&self) -> f64 {
        if self.onboarding_complete {
            self.productivity * self.role.productivity_multiplier()
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: EntityId,
    pub name: String,
    pub role: Role,
    pub expected_salary: f64,
    pub productivity: f64,
    pub experience_level: ExperienceLevel,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamState {
    pub employees: Vec<Employee>,
    pub candidate_pool: Vec<Candidate>,
    pub total_monthly_salary: f64,
    pub total_productivity: f64,
}

impl TeamState {
    /// A team with the given roster and derived totals filled in.
    pub fn from_employees(employees: Vec<Employee>) -> Self {
        let mut team = Self {
            employees,
            ..Self::default()
        };
        team.recompute_totals();
        team
    }

    pub fn recompute_totals(&mut self) {
        self.total_monthly_salary = total_monthly_salary(&self.employees);
        self.total_productivity = team_productivity(&self.employees);
    }

    pub fn onboarded_count(&self, role: Role) -> usize {
        self.employees
            .iter()
            .filter(|e| e.role == role && e.onboarding_complete)
            .count()
    }

    pub fn headcount(&self) -> usize {
        self.employees.len()
    }
}

/// Aggregate productivity of onboarded employees, weighted by role.
pub fn team_productivity(employees: &[Employee]) -> f64 {
    employees.iter().map(Employee::contribution).sum()
}

/// Payroll for everyone on the roster, onboarded or not.
pub fn total_monthly_salary(employees: &[Employee]) -> f64 {
    employees.iter().map(|e| e.salary).sum()
}

/// Hire a candidate out of the pool. `salary_fraction` is the active
/// hiring modifier (e.g. -0.2 for a 20% discount).
pub fn hire(
    prior: &TeamState,
    candidate_id: &str,
    now: Days,
    salary_fraction: f64,
) -> SimResult<(TeamState, Employee)> {
    let idx = prior
        .candidate_pool
        .iter()
        .position(|c| c.id == candidate_id)
        .ok_or_else(|| SimError::not_found("candidate", candidate_id))?;

    let mut next = prior.clone();
    let candidate = next.candidate_pool.remove(idx);
    let suffix = candidate.id.strip_prefix("cand-").unwrap_or(&candidate.id);
    let employee = Employee {
        id: format!("emp-{suffix}"),
        name: candidate.name,
        role: candidate.role,
        salary: (candidate.expected_salary * (1.0 + salary_fraction)).round().max(0.0),
        productivity: candidate.productivity.clamp(0.0, 1.0),
        hire_date: now,
        onboarding_complete: false,
    };
    next.employees.push(employee.clone());
    next.recompute_totals();
    Ok((next, employee))
}

pub fn fire(prior: &TeamState, employee_id: &str) -> SimResult<TeamState> {
    if !prior.employees.iter().any(|e| e.id == employee_id) {
        return Err(SimError::not_found("employee", employee_id));
    }
    let mut next = prior.clone();
    next.employees.retain(|e| e.id != employee_id);
    next.recompute_totals();
    Ok(next)
}

pub fn complete_onboarding(prior: &TeamState, employee_id: &str) -> SimResult<TeamState> {
    let mut next = prior.clone();
    let employee = next
        .employees
        .iter_mut()
        .find(|e| e.id == employee_id)
        .ok_or_else(|| SimError::not_found("employee", employee_id))?;
    employee.onboarding_complete = true;
    next.recompute_totals();
    Ok(next)
}

/// Shift every employee's productivity by `delta`, clamped to [0, 1].
pub fn adjust_productivity(prior: &TeamState, delta: f64) -> TeamState {
    let mut next = prior.clone();
    for e in &mut next.employees {
        e.productivity = (e.productivity + delta).clamp(0.0, 1.0);
    }
    next.recompute_totals();
    next
}

pub struct TeamSubsystem {
    onboarding_days: Days,
    pool_size: usize,
}

impl TeamSubsystem {
    pub fn new(onboarding_days: Days, pool_size: usize) -> Self {
        Self { onboarding_days, pool_size }
    }

    fn generate_candidate(&self, rng: &mut dyn RandomSource) -> Candidate {
        let role = Role::ALL[rng.next_below(Role::ALL.len())];
        // 40% junior, 40% mid, 20% senior
        let roll = rng.next_f64();
        let level = if roll < 0.4 {
            ExperienceLevel::Junior
        } else if roll < 0.8 {
            ExperienceLevel::Mid
        } else {
            ExperienceLevel::Senior
        };
        let (salary_lo, salary_hi) = level.salary_range();
        let (prod_lo, prod_hi) = level.productivity_range();
        let salary = (rng.range(salary_lo, salary_hi) / 100.0).round() * 100.0;
        let productivity = (rng.range(prod_lo, prod_hi) * 100.0).round() / 100.0;

        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&rng.next_u64().to_le_bytes());
        bytes[8..].copy_from_slice(&rng.next_u64().to_le_bytes());
        let id = Builder::from_random_bytes(bytes).into_uuid();

        Candidate {
            id: format!("cand-{}", id.simple()),
            name: NameGenerator::generate_full_name(rng),
            role,
            expected_salary: salary,
            productivity,
            experience_level: level,
        }
    }
}

impl SimSubsystem for TeamSubsystem {
    type State = TeamState;

    fn name(&self) -> &'static str { "team" }

    fn slot(&self) -> SubsystemSlot { SubsystemSlot::Team }

    fn update(
        &self,
        prior: &TeamState,
        ctx: &TickContext<'_>,
        rng: &mut dyn RandomSource,
    ) -> SimResult<Step<TeamState>> {
        let mut next = prior.clone();
        let mut events = Vec::new();

        for e in next.employees.iter_mut().filter(|e| !e.onboarding_complete) {
            if ctx.now - e.hire_date >= self.onboarding_days {
                e.onboarding_complete = true;
                log::debug!("day={:.1} team: {} ({:?}) onboarded", ctx.now, e.name, e.role);
                events.push(SimEvent::EmployeeOnboarded {
                    day: ctx.now,
                    employee_id: e.id.clone(),
                });
            }
        }

        let missing = self.pool_size.saturating_sub(next.candidate_pool.len());
        for _ in 0..missing {
            let candidate = self.generate_candidate(rng);
            next.candidate_pool.push(candidate);
        }
        if missing > 0 {
            events.push(SimEvent::CandidatesAdded { day: ctx.now, count: missing });
        }

        next.recompute_totals();
        Ok(Step::new(next, events))
    }
}
