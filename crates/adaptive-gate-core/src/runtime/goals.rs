// crates/adaptive-gate-core/src/runtime/goals.rs
// ============================================================================
// Module: Goal Manager
// Description: Registry of weighted objectives.
// Purpose: Store goals and report the active set at decision time.
// Dependencies: crate::core, crate::runtime::registry
// ============================================================================

//! ## Overview
//! The goal manager stores goals without reconciling them; conflicting goals
//! may coexist. Goals are never deleted, only moved out of `active` through an
//! explicit transition. Registration order is preserved for reporting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::core::Goal;
use crate::core::GoalId;
use crate::core::GoalStatus;
use crate::runtime::registry::IdSequence;
use crate::runtime::registry::RegistryError;
use crate::runtime::registry::validate_label;

// ============================================================================
// SECTION: Goal Manager
// ============================================================================

/// Thread-safe goal registry.
#[derive(Debug)]
pub struct GoalManager {
    /// Goals in registration order.
    goals: RwLock<Vec<Goal>>,
    /// Identifier sequence.
    ids: IdSequence,
}

impl Default for GoalManager {
    fn default() -> Self {
        Self::new()
    }
}

impl GoalManager {
    /// Creates an empty goal manager.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            goals: RwLock::new(Vec::new()),
            ids: IdSequence::new("goal"),
        }
    }

    /// Registers a new active goal.
    ///
    /// Criterion weights are clamped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Invalid`] for a blank description, a blank
    /// criterion name, or a non-finite weight.
    pub fn create_goal(
        &self,
        description: &str,
        criteria: BTreeMap<String, f64>,
    ) -> Result<GoalId, RegistryError> {
        let description = validate_label("goal description", description)?;
        let mut normalized = BTreeMap::new();
        for (name, weight) in criteria {
            let name = validate_label("goal criterion name", &name)?;
            if !weight.is_finite() {
                return Err(RegistryError::Invalid(format!(
                    "goal criterion {name} weight must be finite"
                )));
            }
            normalized.insert(name, weight.clamp(0.0, 1.0));
        }
        let mut goals = self.goals.write().map_err(|_| RegistryError::Poisoned("goal"))?;
        let id = loop {
            let candidate = GoalId::new(self.ids.issue());
            if !goals.iter().any(|goal| goal.id == candidate) {
                break candidate;
            }
        };
        goals.push(Goal {
            id: id.clone(),
            description,
            criteria: normalized,
            status: GoalStatus::Active,
        });
        Ok(id)
    }

    /// Returns active goals in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the registry lock is poisoned.
    pub fn list_active_goals(&self) -> Result<Vec<Goal>, RegistryError> {
        let goals = self.goals.read().map_err(|_| RegistryError::Poisoned("goal"))?;
        Ok(goals.iter().filter(|goal| goal.is_active()).cloned().collect())
    }

    /// Returns every goal regardless of status.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the registry lock is poisoned.
    pub fn list_goals(&self) -> Result<Vec<Goal>, RegistryError> {
        let goals = self.goals.read().map_err(|_| RegistryError::Poisoned("goal"))?;
        Ok(goals.clone())
    }

    /// Returns a goal by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the registry lock is poisoned.
    pub fn get(&self, id: &GoalId) -> Result<Option<Goal>, RegistryError> {
        let goals = self.goals.read().map_err(|_| RegistryError::Poisoned("goal"))?;
        Ok(goals.iter().find(|goal| &goal.id == id).cloned())
    }

    /// Marks an active goal as completed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown goals and
    /// [`RegistryError::InvalidTransition`] when the goal is not active.
    pub fn complete_goal(&self, id: &GoalId) -> Result<(), RegistryError> {
        self.transition(id, GoalStatus::Completed)
    }

    /// Marks an active goal as retired.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for unknown goals and
    /// [`RegistryError::InvalidTransition`] when the goal is not active.
    pub fn retire_goal(&self, id: &GoalId) -> Result<(), RegistryError> {
        self.transition(id, GoalStatus::Retired)
    }

    /// Applies an `Active -> target` transition.
    fn transition(&self, id: &GoalId, target: GoalStatus) -> Result<(), RegistryError> {
        let mut goals = self.goals.write().map_err(|_| RegistryError::Poisoned("goal"))?;
        let goal = goals
            .iter_mut()
            .find(|goal| &goal.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        if goal.status != GoalStatus::Active {
            return Err(RegistryError::InvalidTransition {
                id: id.to_string(),
                from: goal.status.as_str(),
                to: target.as_str(),
            });
        }
        goal.status = target;
        Ok(())
    }
}
