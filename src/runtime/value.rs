use std::rc::Rc;

use crate::ast::Statement;
use crate::runtime::object::Closure;

/// A named body of code with formal parameters, attached to a class.
///
/// `self` is not listed among the formals; method invocation binds it
/// implicitly.
#[derive(Debug, PartialEq)]
pub struct Method {
    pub name: String,
    pub formal_params: Vec<String>,
    pub body: Statement,
}

/// Class descriptor: an ordered method list plus an optional parent.
#[derive(Debug, PartialEq)]
pub struct Class {
    name: String,
    methods: Vec<Method>,
    parent: Option<Rc<Class>>,
}

impl Class {
    pub fn new(name: String, methods: Vec<Method>, parent: Option<Rc<Class>>) -> Self {
        Self {
            name,
            methods,
            parent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Linear search through own methods first, then the parent chain.
    pub fn get_method(&self, name: &str) -> Option<&Method> {
        if let Some(method) = self.methods.iter().find(|method| method.name == name) {
            return Some(method);
        }
        self.parent
            .as_ref()
            .and_then(|parent| parent.get_method(name))
    }
}

/// A class instance: its class plus per-instance fields.
#[derive(Debug)]
pub struct ClassInstance {
    class: Rc<Class>,
    fields: Closure,
}

impl ClassInstance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: Closure::new(),
        }
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    pub fn fields(&self) -> &Closure {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Closure {
        &mut self.fields
    }

    /// True iff the class chain has `method` with exactly `arity` formals.
    pub fn has_method(&self, method: &str, arity: usize) -> bool {
        self.class
            .get_method(method)
            .is_some_and(|found| found.formal_params.len() == arity)
    }
}

/// A runtime datum.
#[derive(Debug)]
pub enum Value {
    Number(i32),
    String(String),
    Bool(bool),
    Class(Rc<Class>),
    Instance(ClassInstance),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Class(_) => "class",
            Value::Instance(_) => "class instance",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(name: &str, formal_params: Vec<String>) -> Method {
        Method {
            name: name.to_string(),
            formal_params,
            body: Statement::Compound {
                statements: Vec::new(),
            },
        }
    }

    #[test]
    fn method_resolution_prefers_own_methods_over_the_parent() {
        let parent = Rc::new(Class::new(
            "Base".to_string(),
            vec![stub("f", vec!["x".to_string()]), stub("g", Vec::new())],
            None,
        ));
        let child = Rc::new(Class::new(
            "Derived".to_string(),
            vec![stub("f", Vec::new())],
            Some(Rc::clone(&parent)),
        ));

        // The override with zero formals wins over the parent's one-formal f.
        assert_eq!(child.get_method("f").map(|m| m.formal_params.len()), Some(0));
        assert_eq!(child.get_method("g").map(|m| m.name.as_str()), Some("g"));
        assert!(child.get_method("h").is_none());
    }

    #[test]
    fn method_resolution_walks_the_whole_parent_chain() {
        let grandparent = Rc::new(Class::new(
            "Root".to_string(),
            vec![stub("shared", Vec::new())],
            None,
        ));
        let parent = Rc::new(Class::new(
            "Mid".to_string(),
            Vec::new(),
            Some(grandparent),
        ));
        let leaf = Rc::new(Class::new("Leaf".to_string(), Vec::new(), Some(parent)));

        assert_eq!(
            leaf.get_method("shared").map(|m| m.name.as_str()),
            Some("shared")
        );
    }

    #[test]
    fn has_method_checks_the_arity() {
        let class = Rc::new(Class::new(
            "A".to_string(),
            vec![stub("f", vec!["x".to_string()])],
            None,
        ));
        let instance = ClassInstance::new(class);

        assert!(instance.has_method("f", 1));
        assert!(!instance.has_method("f", 0));
        assert!(!instance.has_method("missing", 0));
    }
}
