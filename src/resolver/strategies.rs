// Resolution Orchestrator
//
// Runs an ordered list of strategies for one variable and stops at the first
// non-empty answer. A strategy that errors or panics counts as empty.

use anyhow::{anyhow, Context, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::debug;

use super::base::{LiteralValueSet, Position, ResolutionContext, SourceUnit};
use super::oracle::OracleAdapter;
use super::typescript::helpers::is_identifier_name;
use super::typescript::imports_exports::{find_import_of, with_imported_declaration};
use super::typescript::{extract_literal_values, find_declaration_in, resolve_property_access, Namespace};

/// One variable of a template site, as the strategies see it
#[derive(Debug, Clone, Copy)]
pub struct VariableRequest<'u> {
    pub unit: &'u SourceUnit,
    /// Normalized expression text (`a.b`, never `a?.b!`)
    pub expression: &'u str,
    pub position: Position,
}

impl<'u> VariableRequest<'u> {
    pub fn new(unit: &'u SourceUnit, expression: &'u str, position: Position) -> Self {
        Self {
            unit,
            expression,
            position,
        }
    }

    pub fn is_dotted(&self) -> bool {
        self.expression.contains('.')
    }

    pub fn is_identifier(&self) -> bool {
        is_identifier_name(self.expression)
    }
}

pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn applies_to(&self, request: &VariableRequest<'_>) -> bool;

    fn attempt(
        &self,
        request: &VariableRequest<'_>,
        ctx: &mut ResolutionContext,
    ) -> Result<LiteralValueSet>;
}

/// `m.exchangeType`, `Side.Buy`, `settings.transport.mode`
pub struct PropertyAccessStrategy;

impl ResolutionStrategy for PropertyAccessStrategy {
    fn name(&self) -> &'static str {
        "property-access"
    }

    fn applies_to(&self, request: &VariableRequest<'_>) -> bool {
        request.is_dotted()
    }

    fn attempt(
        &self,
        request: &VariableRequest<'_>,
        ctx: &mut ResolutionContext,
    ) -> Result<LiteralValueSet> {
        Ok(resolve_property_access(request.unit, request.expression, ctx))
    }
}

pub struct OracleStrategy {
    adapter: OracleAdapter,
}

impl OracleStrategy {
    pub fn new(adapter: OracleAdapter) -> Self {
        Self { adapter }
    }
}

impl ResolutionStrategy for OracleStrategy {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn applies_to(&self, _request: &VariableRequest<'_>) -> bool {
        true
    }

    fn attempt(
        &self,
        request: &VariableRequest<'_>,
        ctx: &mut ResolutionContext,
    ) -> Result<LiteralValueSet> {
        let values = self
            .adapter
            .resolve(request.unit, request.position, ctx)
            .with_context(|| format!("oracle lookup for '{}'", request.expression))?;
        Ok(values)
    }
}

/// A declaration of the same name anywhere in the file
pub struct LocalDeclarationStrategy;

impl ResolutionStrategy for LocalDeclarationStrategy {
    fn name(&self) -> &'static str {
        "local-declaration"
    }

    fn applies_to(&self, request: &VariableRequest<'_>) -> bool {
        request.is_identifier()
    }

    fn attempt(
        &self,
        request: &VariableRequest<'_>,
        ctx: &mut ResolutionContext,
    ) -> Result<LiteralValueSet> {
        Ok(
            match find_declaration_in(request.unit, request.expression, Namespace::Value) {
                Some(declaration) => extract_literal_values(request.unit, declaration, ctx),
                None => LiteralValueSet::new(),
            },
        )
    }
}

/// The exported declaration behind an `import` of the name
pub struct ImportedDeclarationStrategy;

impl ResolutionStrategy for ImportedDeclarationStrategy {
    fn name(&self) -> &'static str {
        "imported-declaration"
    }

    fn applies_to(&self, request: &VariableRequest<'_>) -> bool {
        request.is_identifier()
    }

    fn attempt(
        &self,
        request: &VariableRequest<'_>,
        ctx: &mut ResolutionContext,
    ) -> Result<LiteralValueSet> {
        let Some(import) = find_import_of(request.unit, request.expression) else {
            return Ok(LiteralValueSet::new());
        };
        with_imported_declaration(
            request.unit,
            request.expression,
            Namespace::Value,
            ctx,
            |unit, declaration, c| extract_literal_values(unit, declaration, c),
        )
        .ok_or_else(|| {
            anyhow!(
                "'{}' imported from '{}' could not be located",
                request.expression,
                import.source
            )
        })
    }
}

/// Ordered fallback chain for a single variable
pub struct StrategyOrchestrator {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl StrategyOrchestrator {
    /// Property access, the oracle (when configured), local, then imported declarations
    pub fn new(oracle: Option<OracleAdapter>) -> Self {
        let mut strategies: Vec<Box<dyn ResolutionStrategy>> = vec![Box::new(PropertyAccessStrategy)];
        if let Some(adapter) = oracle {
            strategies.push(Box::new(OracleStrategy::new(adapter)));
        }
        strategies.push(Box::new(LocalDeclarationStrategy));
        strategies.push(Box::new(ImportedDeclarationStrategy));
        Self { strategies }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ResolutionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|strategy| strategy.name()).collect()
    }

    /// First non-empty answer; every attempt gets its own visit state
    pub fn resolve(&self, request: &VariableRequest<'_>, base: &ResolutionContext) -> LiteralValueSet {
        for strategy in &self.strategies {
            if !strategy.applies_to(request) {
                continue;
            }

            let mut ctx = base.fresh();
            let outcome = catch_unwind(AssertUnwindSafe(|| strategy.attempt(request, &mut ctx)));
            match outcome {
                Ok(Ok(values)) if !values.is_empty() => {
                    debug!(
                        "'{}' resolved by {} ({} values)",
                        request.expression,
                        strategy.name(),
                        values.len()
                    );
                    return values;
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => debug!("{} failed for '{}': {:#}", strategy.name(), request.expression, e),
                Err(_) => debug!("{} panicked for '{}'", strategy.name(), request.expression),
            }
        }
        debug!("'{}' unresolved", request.expression);
        LiteralValueSet::new()
    }
}
