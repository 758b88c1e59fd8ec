//! Variable resolvers.
//!
//! This module contains the variable expansion used for the install directory.

use std::borrow::Cow;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::rc::Rc;

/// The error type for operations interacting with variables.
#[cfg_attr(test, derive(PartialEq))]
#[derive(Debug, thiserror::Error)]
pub(crate) enum VarError {
    /// The specified variable is not present.
    #[error("variable '{0}' not found")]
    NotPresent(String),
}

/// Trait for variable resolvers.
pub(crate) trait VarResolver: fmt::Debug {
    /// Resolves the variable with the given name.
    fn resolve_var(&self, var_name: &str) -> Result<String, VarError>;
}

/// [`VarResolver`] implementation for environment variables from the operating system.
#[derive(Debug)]
pub(crate) struct OsEnvVarResolver;

impl VarResolver for OsEnvVarResolver {
    #[tracing::instrument(level = "trace", ret)]
    fn resolve_var(&self, v: &str) -> Result<String, VarError> {
        env::var(v).map_err(|_| VarError::NotPresent(v.to_owned()))
    }
}

/// [`VarResolver`] that only answers for variables with the given prefix, delegating the remainder of the name.
#[derive(Debug)]
pub(crate) struct PrefixedVarResolver {
    resolver: Rc<dyn VarResolver>,
    prefix: String,
}

impl PrefixedVarResolver {
    /// Constructs a new `PrefixedVarResolver` for the given variable resolver.
    pub(crate) fn new(prefix: impl Into<String>, resolver: Rc<dyn VarResolver>) -> Self {
        Self {
            prefix: prefix.into(),
            resolver,
        }
    }
}

impl VarResolver for PrefixedVarResolver {
    #[tracing::instrument(level = "trace", ret)]
    fn resolve_var(&self, v: &str) -> Result<String, VarError> {
        match v.strip_prefix(&self.prefix) {
            Some(v) => self.resolver.resolve_var(v),
            None => Err(VarError::NotPresent(v.to_owned())),
        }
    }
}

/// [`VarResolver`] implementation for a fixed set of variables.
#[derive(Debug, Default)]
pub(crate) struct SimpleVarResolver {
    vars: HashMap<String, String>,
}

impl SimpleVarResolver {
    /// Registers the value for the given variable name.
    pub(crate) fn insert(&mut self, name: impl Into<String>, val: impl Into<String>) -> &mut Self {
        self.vars.insert(name.into(), val.into());

        self
    }
}

impl VarResolver for SimpleVarResolver {
    #[tracing::instrument(level = "trace", ret)]
    fn resolve_var(&self, v: &str) -> Result<String, VarError> {
        self.vars.get(v).cloned().ok_or_else(|| VarError::NotPresent(v.to_owned()))
    }
}

/// Expands variables in strings, asking the resolvers in order.
#[derive(Debug)]
pub(crate) struct VarExpander {
    resolvers: Vec<Rc<dyn VarResolver>>,
}

impl VarExpander {
    /// Constructs a new `VarExpander` with the given variable resolvers.
    pub(crate) fn new<I>(resolvers: I) -> Self
    where
        I: IntoIterator<Item = Rc<dyn VarResolver>>,
    {
        Self {
            resolvers: resolvers.into_iter().collect(),
        }
    }

    /// Expands all known variables in the given string.
    #[tracing::instrument(level = "trace", ret)]
    pub(crate) fn expand<'a, S>(&self, s: &'a S) -> Result<Cow<'a, str>, VarError>
    where
        S: ?Sized + AsRef<str> + fmt::Debug,
    {
        let s = s.as_ref();
        let expanded = shellexpand::env_with_context(s, |v| self.resolve(v)).map_err(|err| err.cause)?;
        match expanded {
            Cow::Borrowed(_) => Ok(Cow::Borrowed(s)),
            Cow::Owned(expanded) => Ok(Cow::Owned(expanded)),
        }
    }

    // Provides the context for `expand`.
    #[doc(hidden)]
    fn resolve(&self, v: &str) -> Result<Option<String>, VarError> {
        for resolver in &self.resolvers {
            if let Ok(value) = resolver.resolve_var(v) {
                return Ok(Some(value));
            }
        }

        Err(VarError::NotPresent(v.to_owned()))
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use test_log::test;

    fn var_expander() -> VarExpander {
        let mut platform = SimpleVarResolver::default();
        platform.insert("CI_OS", "linux").insert("CI_ARCH", "x86_64");
        let env_var_resolver = PrefixedVarResolver::new("env.", Rc::new(OsEnvVarResolver));
        let var_resolvers: [Rc<dyn VarResolver>; 2] = [Rc::new(platform), Rc::new(env_var_resolver)];
        VarExpander::new(var_resolvers)
    }

    #[test]
    fn simple_var_resolver_unknown_var() {
        let mut resolver = SimpleVarResolver::default();
        resolver.insert("CI_OS", "linux");
        assert_eq!(resolver.resolve_var("CI_ARCH"), Err(VarError::NotPresent("CI_ARCH".to_string())));
    }

    #[test]
    fn prefixed_var_resolver_requires_prefix() {
        let mut inner = SimpleVarResolver::default();
        inner.insert("PATH", "x");
        let resolver = PrefixedVarResolver::new("env.", Rc::new(inner));
        assert_eq!(resolver.resolve_var("env.PATH"), Ok("x".to_string()));
        assert_eq!(resolver.resolve_var("PATH"), Err(VarError::NotPresent("PATH".to_string())));
    }

    #[test]
    fn expand_without_vars_borrows() {
        let expanded = var_expander().expand("plain/dir").unwrap();
        assert!(matches!(expanded, Cow::Borrowed("plain/dir")));
    }

    #[test]
    fn expand_known_vars() {
        let expanded = var_expander().expand("cdk/${CI_OS}-${CI_ARCH}").unwrap();
        assert_eq!(expanded, "cdk/linux-x86_64");
    }

    #[test]
    fn expand_unknown_var() {
        let expanded = var_expander().expand("${CI_NOPE}/x");
        assert_eq!(expanded, Err(VarError::NotPresent("CI_NOPE".to_string())));
    }

    #[test]
    fn expand_env_var() {
        // PATH is set for every test process
        let path = env::var("PATH").unwrap();
        let expanded = var_expander().expand("${env.PATH}").unwrap();
        assert_eq!(expanded, path);
    }
}
