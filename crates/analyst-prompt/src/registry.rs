//! Named template lookup shared between threads

use crate::{PromptError, PromptTemplate, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

type Templates = BTreeMap<String, Arc<dyn PromptTemplate>>;

/// Templates keyed by name
///
/// Registration goes through `&self`, so one registry can sit behind an
/// `Arc` and serve every pipeline run. A panic while the lock is held does
/// not lose the templates; later callers see the map as it was.
///
/// ```
/// use analyst_prompt::{JinjaTemplate, PromptRegistry};
/// use serde_json::json;
///
/// let registry = PromptRegistry::new();
/// registry.register(JinjaTemplate::new("greeting", "Hello, {{ name }}!").unwrap());
///
/// let text = registry.render("greeting", &json!({ "name": "NVDA" })).unwrap();
/// assert_eq!(text, "Hello, NVDA!");
/// ```
#[derive(Default)]
pub struct PromptRegistry {
    templates: RwLock<Templates>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Templates> {
        self.templates.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add `template` under its own name, returning the one it replaced
    pub fn register<T: PromptTemplate + 'static>(&self, template: T) -> Option<Arc<dyn PromptTemplate>> {
        let name = template.name().to_string();
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::new(template))
    }

    pub fn register_all<T, I>(&self, templates: I)
    where
        T: PromptTemplate + 'static,
        I: IntoIterator<Item = T>,
    {
        for template in templates {
            self.register(template);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PromptTemplate>> {
        self.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Render the template registered as `name`
    ///
    /// The lock is released before rendering starts.
    pub fn render(&self, name: &str, vars: &serde_json::Value) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| PromptError::TemplateNotRegistered(name.to_string()))?;
        template.render(vars)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JinjaTemplate;
    use serde_json::json;

    fn template(name: &str, source: &str) -> JinjaTemplate {
        JinjaTemplate::new(name, source).unwrap()
    }

    #[test]
    fn test_lookup() {
        let registry = PromptRegistry::new();
        assert!(registry.is_empty());

        assert!(registry.register(template("analyst.summary", "Hi")).is_none());

        assert!(registry.contains("analyst.summary"));
        assert_eq!(registry.get("analyst.summary").unwrap().raw_template(), "Hi");
        assert!(registry.get("analyst.reasoning").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_render_missing_template() {
        let registry = PromptRegistry::new();
        let err = registry.render("analyst.summary", &json!({})).unwrap_err();
        assert!(matches!(err, PromptError::TemplateNotRegistered(name) if name == "analyst.summary"));
    }

    #[test]
    fn test_reregistering_replaces() {
        let registry = PromptRegistry::new();
        registry.register(template("t", "first"));

        let replaced = registry.register(template("t", "second {{ n }}")).unwrap();
        assert_eq!(replaced.raw_template(), "first");
        assert_eq!(registry.render("t", &json!({ "n": 2 })).unwrap(), "second 2");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_names_sorted() {
        let registry = PromptRegistry::new();
        registry.register_all(["summary", "compact", "reasoning"].map(|n| template(n, n)));

        assert_eq!(registry.names(), vec!["compact", "reasoning", "summary"]);
        assert!(format!("{registry:?}").contains("reasoning"));
    }

    #[test]
    fn test_survives_poisoned_lock() {
        let registry = Arc::new(PromptRegistry::new());
        registry.register(template("t", "ok"));

        let poisoner = Arc::clone(&registry);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.templates.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert_eq!(registry.render("t", &json!({})).unwrap(), "ok");
    }

    #[test]
    fn test_shared_across_threads() {
        let registry = Arc::new(PromptRegistry::new());
        registry.register(template("t", "{{ n }}"));

        let handles: Vec<_> = (0..4)
            .map(|n| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.render("t", &json!({ "n": n })).unwrap())
            })
            .collect();

        let mut outputs: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        outputs.sort();
        assert_eq!(outputs, vec!["0", "1", "2", "3"]);
    }
}
