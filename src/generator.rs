use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::special::{
    ProviderRegistry, SpecialSequenceProvider, TableProvider, default_provider_registry,
};
use crate::syntax::{Definition, RuleId, SingleDefinition, Syntax, SyntacticFactor, SyntacticTerm};
use crate::utils::{GrammarError, Result};

/// Configuration options for string generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// The rule expanded by [`FuzzyGenerator::generate`]
    pub start_rule: String,
    /// Highest number of iterations explored for a `{ ... }` repetition
    pub max_repetitions: usize,
    /// Maximum nesting of rule expansions (to turn infinite recursion into an error)
    pub max_depth: usize,
    /// Largest string set any expansion step may produce; `None` means unbounded
    pub max_output: Option<usize>,
    /// Literal sets for special sequences, consulted before any registered provider
    pub special_sequences: BTreeMap<String, Vec<String>>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            start_rule: "syntax".to_string(),
            max_repetitions: 2,
            max_depth: 64,
            max_output: None,
            special_sequences: BTreeMap::new(),
        }
    }
}

impl GeneratorConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Enumerates the strings accepted by a [`Syntax`].
///
/// Alternation is a union, concatenation a Cartesian product, exceptions
/// remove exact matches and `{ ... }` is explored up to
/// [`GeneratorConfig::max_repetitions`] iterations. The result is a multiset:
/// a string reachable through two branches appears twice.
#[derive(Debug, Clone)]
pub struct FuzzyGenerator {
    config: GeneratorConfig,
    providers: ProviderRegistry,
}

impl Default for FuzzyGenerator {
    fn default() -> Self {
        FuzzyGenerator::new()
    }
}

impl FuzzyGenerator {
    /// Create a generator with the default configuration and built-in providers
    pub fn new() -> Self {
        FuzzyGenerator {
            config: GeneratorConfig::default(),
            providers: default_provider_registry(),
        }
    }

    /// Create a generator with custom configuration
    pub fn with_config(config: GeneratorConfig) -> Self {
        FuzzyGenerator {
            config,
            providers: default_provider_registry(),
        }
    }

    /// Append a special sequence provider after the ones already registered
    pub fn with_provider<P: SpecialSequenceProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.register(provider);
        self
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn providers_mut(&mut self) -> &mut ProviderRegistry {
        &mut self.providers
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GeneratorConfig) {
        self.config = config;
    }

    /// Generate every string of the configured start rule
    pub fn generate(&self, syntax: &Syntax) -> Result<Vec<String>> {
        self.generate_rule(syntax, &self.config.start_rule)
    }

    /// Generate every string of the rule called `name`
    pub fn generate_rule(&self, syntax: &Syntax, name: &str) -> Result<Vec<String>> {
        let id = syntax
            .rule_index(name)
            .ok_or_else(|| GrammarError::UndefinedRule {
                name: name.to_string(),
                position: Default::default(),
            })?;

        debug!(rule = name, rules = syntax.len(), "generating");
        let mut expansion = Expansion::new(syntax, &self.config, &self.providers);
        let strings = expansion.rule(id)?;
        debug!(rule = name, strings = strings.len(), "generated");

        Ok(strings)
    }

    /// Pick `count` generated strings at random (with replacement)
    pub fn sample(&self, syntax: &Syntax, count: usize) -> Result<Vec<String>> {
        let strings = self.generate(syntax)?;
        if strings.is_empty() {
            return Ok(Vec::new());
        }

        let mut rng = rand::thread_rng();
        Ok((0..count)
            .map(|_| strings[rng.gen_range(0..strings.len())].clone())
            .collect())
    }
}

/// State of one `generate` call. Memoized rule results live only as long as this.
struct Expansion<'a> {
    syntax: &'a Syntax,
    config: &'a GeneratorConfig,
    providers: &'a ProviderRegistry,
    table: TableProvider,
    memo: Vec<Option<Vec<String>>>,
    depth: usize,
}

impl<'a> Expansion<'a> {
    fn new(
        syntax: &'a Syntax,
        config: &'a GeneratorConfig,
        providers: &'a ProviderRegistry,
    ) -> Self {
        Expansion {
            syntax,
            config,
            providers,
            table: TableProvider::from(&config.special_sequences),
            memo: vec![None; syntax.len()],
            depth: 0,
        }
    }

    fn rule(&mut self, id: RuleId) -> Result<Vec<String>> {
        let syntax = self.syntax;
        let rule = &syntax.rules()[id];

        if let Some(strings) = &self.memo[id] {
            trace!(rule = %rule.name, "memoized");
            return Ok(strings.clone());
        }

        if self.depth >= self.config.max_depth {
            return Err(GrammarError::RecursionLimit {
                rule: rule.name.clone(),
                depth: self.config.max_depth,
            });
        }

        self.depth += 1;
        let result = self.definition_list(&rule.branches);
        self.depth -= 1;
        let strings = result?;

        debug!(rule = %rule.name, strings = strings.len(), "expanded rule");
        self.memo[id] = Some(strings.clone());
        Ok(strings)
    }

    /// Union of all branches, duplicates kept
    fn definition_list(&mut self, branches: &'a [SingleDefinition]) -> Result<Vec<String>> {
        let mut strings = Vec::new();
        for branch in branches {
            strings.extend(self.single_definition(branch)?);
            self.check_limit(strings.len())?;
        }
        Ok(strings)
    }

    fn single_definition(&mut self, definition: &'a SingleDefinition) -> Result<Vec<String>> {
        let mut strings = vec![String::new()];
        for term in &definition.terms {
            let next = self.syntactic_term(term)?;
            strings = self.concat(&strings, &next)?;
        }
        Ok(strings)
    }

    fn syntactic_term(&mut self, term: &'a SyntacticTerm) -> Result<Vec<String>> {
        let mut strings = self.syntactic_factor(&term.factor)?;

        if let Some(exception) = &term.exception {
            let excluded = self.syntactic_factor(exception)?;
            let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();
            strings.retain(|s| !excluded.contains(s.as_str()));
        }

        Ok(strings)
    }

    fn syntactic_factor(&mut self, factor: &'a SyntacticFactor) -> Result<Vec<String>> {
        let strings = self.primary(&factor.primary)?;

        match factor.repeat_count {
            None | Some(1) => Ok(strings),
            Some(count) => self.power(&strings, count as usize),
        }
    }

    fn primary(&mut self, definition: &'a Definition) -> Result<Vec<String>> {
        match definition {
            Definition::MetaIdentifier { name, position } => {
                let id = self.syntax.rule_index(name).ok_or_else(|| {
                    GrammarError::UndefinedRule {
                        name: name.clone(),
                        position: *position,
                    }
                })?;
                self.rule(id)
            }
            Definition::TerminalString(text) => Ok(vec![text.clone()]),
            Definition::SpecialSequence { text, position } => {
                let strings = if self.table.is_valid(text) {
                    self.table.generate(text)
                } else {
                    let provider = self.providers.resolve(text).ok_or_else(|| {
                        GrammarError::UnresolvedSpecialSequence {
                            text: text.clone(),
                            position: *position,
                        }
                    })?;
                    trace!(provider = provider.name(), text = %text, "special sequence");
                    provider.generate(text)
                };
                self.check_limit(strings.len())?;
                Ok(strings)
            }
            // Contributes no strings at all, not even the empty one
            Definition::EmptySequence => Ok(Vec::new()),
            Definition::GroupedSequence(branches) => self.definition_list(branches),
            Definition::OptionalSequence(branches) => {
                let mut strings = vec![String::new()];
                strings.extend(self.definition_list(branches)?);
                self.check_limit(strings.len())?;
                Ok(strings)
            }
            Definition::RepeatedSequence(branches) => {
                let body = self.definition_list(branches)?;

                let mut iteration = vec![String::new()];
                let mut strings = iteration.clone();
                for _ in 0..self.config.max_repetitions {
                    iteration = self.concat(&iteration, &body)?;
                    strings.extend(iteration.iter().cloned());
                    self.check_limit(strings.len())?;
                }
                Ok(strings)
            }
        }
    }

    /// Concatenation of `count` independent copies of `strings`, by repeated squaring
    fn power(&self, strings: &[String], count: usize) -> Result<Vec<String>> {
        if count == 0 {
            return Ok(vec![String::new()]);
        }
        if strings.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = vec![String::new()];
        let mut base = strings.to_vec();
        let mut remaining = count;
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = self.concat(&result, &base)?;
            }
            remaining >>= 1;
            if remaining > 0 {
                base = self.concat(&base, &base)?;
            }
        }
        Ok(result)
    }

    /// Every `left` string followed by every `right` string
    fn concat(&self, left: &[String], right: &[String]) -> Result<Vec<String>> {
        self.check_limit(left.len().saturating_mul(right.len()))?;

        let mut result = Vec::with_capacity(left.len() * right.len());
        for l in left {
            for r in right {
                let mut s = String::with_capacity(l.len() + r.len());
                s.push_str(l);
                s.push_str(r);
                result.push(s);
            }
        }
        Ok(result)
    }

    fn check_limit(&self, len: usize) -> Result<()> {
        match self.config.max_output {
            Some(limit) if len > limit => Err(GrammarError::OutputLimit { limit }),
            _ => Ok(()),
        }
    }
}

/// Builder for constructing FuzzyGenerator instances
pub struct FuzzyGeneratorBuilder {
    generator: FuzzyGenerator,
}

impl Default for FuzzyGeneratorBuilder {
    fn default() -> Self {
        FuzzyGeneratorBuilder::new()
    }
}

impl FuzzyGeneratorBuilder {
    /// Create a new builder with default config and the built-in providers
    pub fn new() -> Self {
        FuzzyGeneratorBuilder {
            generator: FuzzyGenerator::new(),
        }
    }

    /// Set the configuration
    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.generator.config = config;
        self
    }

    /// Replace the provider registry
    pub fn providers(mut self, providers: ProviderRegistry) -> Self {
        self.generator.providers = providers;
        self
    }

    /// Append a special sequence provider
    pub fn provider<P: SpecialSequenceProvider + 'static>(mut self, provider: P) -> Self {
        self.generator.providers.register(provider);
        self
    }

    pub fn start_rule(mut self, name: &str) -> Self {
        self.generator.config.start_rule = name.to_string();
        self
    }

    pub fn max_repetitions(mut self, max_repetitions: usize) -> Self {
        self.generator.config.max_repetitions = max_repetitions;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.generator.config.max_depth = max_depth;
        self
    }

    pub fn max_output(mut self, limit: usize) -> Self {
        self.generator.config.max_output = Some(limit);
        self
    }

    /// Build the generator
    pub fn build(self) -> FuzzyGenerator {
        self.generator
    }
}
