//! The execution stack and the registry of named step handlers.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::step::{BattleStep, StepContext};
use super::BattleError;

/// LIFO stack of pending steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStack {
    steps: Vec<BattleStep>,
}

impl ExecutionStack {
    pub fn new() -> Self {
        ExecutionStack::default()
    }

    pub fn push(&mut self, step: BattleStep) {
        self.steps.push(step);
    }

    /// Pushes steps so they execute in the order given.
    pub fn push_all(&mut self, steps: impl IntoIterator<Item = BattleStep>) {
        let mut steps: Vec<BattleStep> = steps.into_iter().collect();
        steps.reverse();
        self.steps.extend(steps);
    }

    pub fn pop(&mut self) -> Option<BattleStep> {
        self.steps.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// The next step to run.
    pub fn peek(&self) -> Option<&BattleStep> {
        self.steps.last()
    }

    /// Pending steps in execution order.
    pub fn pending(&self) -> impl Iterator<Item = &BattleStep> {
        self.steps.iter().rev()
    }

    /// Runs steps until the stack is empty.
    pub fn execute(&mut self, ctx: &mut StepContext<'_, '_>) -> Result<(), BattleError> {
        while let Some(step) = self.steps.pop() {
            debug!(battle = %ctx.battle.id, %step, "executing step");
            step.execute(self, ctx)?;
        }
        Ok(())
    }
}

pub type StepHandler =
    Box<dyn Fn(&mut ExecutionStack, &mut StepContext<'_, '_>) -> Result<(), BattleError> + Send + Sync>;

/// Handlers for `BattleStep::Custom`, keyed by name.
#[derive(Default)]
pub struct StepRegistry {
    handlers: HashMap<String, StepHandler>,
}

impl StepRegistry {
    pub fn new() -> Self {
        StepRegistry::default()
    }

    pub fn register<F>(&mut self, name: &str, handler: F) -> Result<(), BattleError>
    where
        F: Fn(&mut ExecutionStack, &mut StepContext<'_, '_>) -> Result<(), BattleError>
            + Send
            + Sync
            + 'static,
    {
        if self.handlers.contains_key(name) {
            return Err(BattleError::DuplicateStep(name.to_string()));
        }
        self.handlers.insert(name.to_string(), Box::new(handler));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn run(
        &self,
        name: &str,
        stack: &mut ExecutionStack,
        ctx: &mut StepContext<'_, '_>,
    ) -> Result<(), BattleError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| BattleError::UnknownStep(name.to_string()))?;
        handler(stack, ctx)
    }
}

impl fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("StepRegistry").field("handlers", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::Side;

    #[test]
    fn push_all_preserves_execution_order() {
        let mut stack = ExecutionStack::new();
        stack.push_all([BattleStep::ClearCasualties, BattleStep::NextRound]);
        stack.push_all([BattleStep::Submerge(Side::Offense)]);
        let order: Vec<&BattleStep> = stack.pending().collect();
        assert_eq!(
            order,
            vec![
                &BattleStep::Submerge(Side::Offense),
                &BattleStep::ClearCasualties,
                &BattleStep::NextRound
            ]
        );
        assert_eq!(stack.peek(), Some(&BattleStep::Submerge(Side::Offense)));
    }

    #[test]
    fn stack_survives_serialization() {
        let mut stack = ExecutionStack::new();
        stack.push_all([
            BattleStep::Fire {
                phase: "General".to_string(),
                side: Side::Defense,
            },
            BattleStep::Custom("air raid".to_string()),
        ]);
        let json = serde_json::to_string(&stack).unwrap();
        let restored: ExecutionStack = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, stack);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = StepRegistry::new();
        registry.register("air raid", |_, _| Ok(())).unwrap();
        assert!(registry.contains("air raid"));
        assert_eq!(
            registry.register("air raid", |_, _| Ok(())),
            Err(BattleError::DuplicateStep("air raid".to_string()))
        );
    }
}
