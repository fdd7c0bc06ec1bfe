use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::AutomationFunction;
use super::plan::CreatePlanFunction;

pub type BoxedFunction = Arc<dyn AutomationFunction>;

/// Name-keyed collection of automation functions.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: RwLock<HashMap<String, BoxedFunction>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in functions.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(CreatePlanFunction));
        registry
    }

    /// Register a function, replacing any previous one with the same name.
    pub fn register(&self, function: BoxedFunction) {
        let name = function.name().to_string();
        self.functions.write().insert(name, function);
    }

    pub fn get(&self, name: &str) -> Option<BoxedFunction> {
        self.functions.read().get(name).cloned()
    }

    /// All functions sorted by name.
    pub fn list(&self) -> Vec<BoxedFunction> {
        let mut functions: Vec<_> = self.functions.read().values().cloned().collect();
        functions.sort_by(|a, b| a.name().cmp(b.name()));
        functions
    }

    pub fn len(&self) -> usize {
        self.functions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_include_create_plan() {
        let registry = FunctionRegistry::with_builtins();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("create_plan").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_register_replaces_by_name() {
        let registry = FunctionRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(CreatePlanFunction));
        registry.register(Arc::new(CreatePlanFunction));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list()[0].name(), "create_plan");
    }
}
