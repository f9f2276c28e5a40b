//! The engine facade: configuration, extension registries, the template
//! cache and the render entry points.

mod cache;

use crate::compiler::Compiler;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::helpers::{builtin, Helper};
use crate::interpolation::{DotKeySplitter, KeySplitter, MissingValueHandler, NoValueHandler};
use crate::lambda::Lambda;
use crate::listener::{
    CompilationEvent, EngineListener, Listeners, ParsingEvent, RenderingEvent,
};
use crate::locator::TemplateLocator;
use crate::parser::Parser;
use crate::render::Renderer;
use crate::resolver::{IndexResolver, LambdaResolver, MapResolver, ResolverChain, ValueResolver};
use crate::template::CompiledTemplate;
use cache::TemplateCache;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The template engine.
///
/// Immutable after construction: compiled node graphs and the extension
/// registries are read by arbitrarily many concurrent renders without
/// locking; the template cache is the only shared mutable state.
pub struct Engine {
    config: EngineConfig,
    locators: Vec<Arc<dyn TemplateLocator>>,
    resolvers: ResolverChain,
    helpers: HashMap<String, Arc<dyn Helper>>,
    listeners: Listeners,
    missing: Arc<dyn MissingValueHandler>,
    splitter: Arc<dyn KeySplitter>,
    cache: TemplateCache,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("locators", &self.locators.len())
            .field("helpers", &self.helpers.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve an identifier through the locator chain and compile it,
    /// going through the cache. Concurrent first requests for the same
    /// identifier share a single compilation.
    pub fn get_template(&self, name: &str) -> Result<Arc<CompiledTemplate>> {
        self.cache.get_or_compile(name, || {
            let source = self
                .locate(name)?
                .ok_or_else(|| Error::TemplateNotFound(name.to_string()))?;
            self.compile(name, &source)
        })
    }

    /// Compile a one-off template from source. Fires the parsing and
    /// compilation listeners but does not touch the cache.
    pub fn compile(&self, name: &str, source: &str) -> Result<Arc<CompiledTemplate>> {
        self.listeners.parsing_started(&ParsingEvent::new(name))?;

        let mut parser = Parser::new(
            source,
            self.config.delimiters.clone(),
            self.config.trim_standalone,
        );
        let tags = parser.parse()?;
        let final_delimiters = parser.delimiters().clone();

        let nodes = Compiler::new(self.splitter.as_ref(), self.config.escape_html).compile(tags)?;
        let template = Arc::new(CompiledTemplate::new(name, nodes, final_delimiters));

        self.listeners
            .compilation_finished(&CompilationEvent::new(Arc::clone(&template)))?;
        log::debug!("template compiled: {name}");
        Ok(template)
    }

    /// Render a located template against a data root.
    pub fn render(&self, name: &str, data: &Value) -> Result<String> {
        let mut out = String::new();
        self.render_to(name, data, &mut out)?;
        Ok(out)
    }

    /// Render a located template, streaming into the given sink.
    pub fn render_to(&self, name: &str, data: &Value, out: &mut dyn fmt::Write) -> Result<()> {
        let template = self.get_template(name)?;
        self.render_compiled(&template, data, out)
    }

    /// Render an already-compiled template (e.g. a one-off from
    /// [`Engine::compile`]).
    pub fn render_template(&self, template: &CompiledTemplate, data: &Value) -> Result<String> {
        let mut out = String::new();
        self.render_compiled(template, data, &mut out)?;
        Ok(out)
    }

    pub fn render_template_to(
        &self,
        template: &CompiledTemplate,
        data: &Value,
        out: &mut dyn fmt::Write,
    ) -> Result<()> {
        self.render_compiled(template, data, out)
    }

    /// Compile every identifier the locators can list. Returns the number
    /// of listings processed.
    pub fn precompile_all(&self) -> Result<usize> {
        let mut count = 0;
        for locator in &self.locators {
            for id in locator.all_identifiers() {
                self.get_template(&id)?;
                count += 1;
            }
        }
        log::info!("precompiled {count} template(s)");
        Ok(count)
    }

    /// Drop one cached compilation.
    pub fn invalidate(&self, name: &str) -> bool {
        self.cache.invalidate(name)
    }

    /// Drop all cached compilations.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn locate(&self, name: &str) -> Result<Option<String>> {
        for locator in &self.locators {
            if let Some(source) = locator.locate(name)? {
                return Ok(Some(source));
            }
        }
        Ok(None)
    }

    fn render_compiled(
        &self,
        template: &CompiledTemplate,
        data: &Value,
        out: &mut dyn fmt::Write,
    ) -> Result<()> {
        let mut event = RenderingEvent::new(template.name());
        let (entered, start_err) = self.listeners.rendering_started(&mut event);

        let result = match start_err {
            Some(err) => Err(err),
            None => {
                let mut renderer = Renderer::new(self, template.name(), data.clone());
                renderer.render_nodes(template.nodes(), out)
            }
        };

        // The finished chain unwinds the entered listeners in reverse
        // order, then every release callback runs LIFO, on the success
        // and the failure path alike.
        let finish_err = self.listeners.rendering_finished(entered, &mut event);
        event.run_release_callbacks();

        result.and(match finish_err {
            Some(err) => Err(err),
            None => Ok(()),
        })
    }

    pub(crate) fn resolvers(&self) -> &ResolverChain {
        &self.resolvers
    }

    pub(crate) fn helper(&self, name: &str) -> Option<Arc<dyn Helper>> {
        self.helpers.get(name).map(Arc::clone)
    }

    pub(crate) fn missing_handler(&self) -> &dyn MissingValueHandler {
        self.missing.as_ref()
    }

    pub(crate) fn splitter(&self) -> &dyn KeySplitter {
        self.splitter.as_ref()
    }
}

/// Builder for [`Engine`]. Configuration is validated eagerly in
/// [`EngineBuilder::build`]; registries are sorted once and frozen.
pub struct EngineBuilder {
    config: EngineConfig,
    locators: Vec<Arc<dyn TemplateLocator>>,
    resolvers: Vec<Arc<dyn ValueResolver>>,
    helpers: HashMap<String, Arc<dyn Helper>>,
    lambdas: HashMap<String, Arc<dyn Lambda>>,
    listeners: Vec<Arc<dyn EngineListener>>,
    missing: Option<Arc<dyn MissingValueHandler>>,
    splitter: Option<Arc<dyn KeySplitter>>,
    builtin_helpers: bool,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            locators: Vec::new(),
            resolvers: Vec::new(),
            helpers: HashMap::new(),
            lambdas: HashMap::new(),
            listeners: Vec::new(),
            missing: None,
            splitter: None,
            builtin_helpers: true,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Default delimiter pair, before any `{{=..=}}` tag takes effect.
    pub fn delimiters(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.config.delimiters = crate::config::Delimiters::new(start, end);
        self
    }

    pub fn escape_html(mut self, escape: bool) -> Self {
        self.config.escape_html = escape;
        self
    }

    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.config.recursion_limit = limit;
        self
    }

    pub fn trim_standalone(mut self, trim: bool) -> Self {
        self.config.trim_standalone = trim;
        self
    }

    pub fn precompile_all(mut self, precompile: bool) -> Self {
        self.config.precompile_all = precompile;
        self
    }

    pub fn add_locator(mut self, locator: impl TemplateLocator + 'static) -> Self {
        self.locators.push(Arc::new(locator));
        self
    }

    pub fn add_resolver(mut self, resolver: impl ValueResolver + 'static) -> Self {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    pub fn register_helper(mut self, name: impl Into<String>, helper: impl Helper + 'static) -> Self {
        self.helpers.insert(name.into(), Arc::new(helper));
        self
    }

    pub fn register_lambda(mut self, name: impl Into<String>, lambda: impl Lambda + 'static) -> Self {
        self.lambdas.insert(name.into(), Arc::new(lambda));
        self
    }

    pub fn add_listener(mut self, listener: impl EngineListener + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn missing_value_handler(
        mut self,
        handler: impl MissingValueHandler + 'static,
    ) -> Self {
        self.missing = Some(Arc::new(handler));
        self
    }

    pub fn key_splitter(mut self, splitter: impl KeySplitter + 'static) -> Self {
        self.splitter = Some(Arc::new(splitter));
        self
    }

    /// Skip registration of the default helper set.
    pub fn without_builtin_helpers(mut self) -> Self {
        self.builtin_helpers = false;
        self
    }

    pub fn build(self) -> Result<Engine> {
        self.config.validate()?;

        let mut locators = self.locators;
        locators.sort_by_key(|locator| std::cmp::Reverse(locator.priority()));

        let mut resolvers = self.resolvers;
        resolvers.push(Arc::new(MapResolver));
        resolvers.push(Arc::new(IndexResolver));
        if !self.lambdas.is_empty() {
            resolvers.push(Arc::new(LambdaResolver::new(self.lambdas)));
        }

        let mut helpers = self.helpers;
        if self.builtin_helpers {
            let mut defaults = HashMap::new();
            builtin::register_defaults(&mut defaults);
            for (name, helper) in defaults {
                helpers.entry(name).or_insert(helper);
            }
        }

        let engine = Engine {
            config: self.config,
            locators,
            resolvers: ResolverChain::new(resolvers),
            helpers,
            listeners: Listeners::new(self.listeners),
            missing: self.missing.unwrap_or_else(|| Arc::new(NoValueHandler)),
            splitter: self.splitter.unwrap_or_else(|| Arc::new(DotKeySplitter)),
            cache: TemplateCache::new(),
        };

        if engine.config.precompile_all {
            engine.precompile_all()?;
        }
        Ok(engine)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
