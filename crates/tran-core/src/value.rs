//! Runtime values and the object heap.

use std::collections::BTreeMap;
use std::fmt;

use crate::ast::ClassDecl;
use crate::error::{Error, Result};

/// Handle to an object on the [`Heap`]. Copying it never copies the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    Character(char),
    /// An object produced by `new`
    Object(ObjectId),
    /// An object-typed variable; `None` until an object is assigned to it
    Reference(Option<ObjectId>),
}

/// The kind of a runtime value, used for structural method matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    String,
    Boolean,
    Character,
    Object,
}

impl ValueKind {
    /// Kind of the default value for a declared type name.
    pub fn of_type(type_name: &str) -> Self {
        Value::default_for(type_name).kind()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Boolean => "boolean",
            ValueKind::Character => "character",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// Default value for a declared type name. Any name other than the four
    /// primitive types is an object type and starts out unbound.
    pub fn default_for(type_name: &str) -> Self {
        match type_name {
            "string" => Value::String(String::new()),
            "number" => Value::Number(0.0),
            "boolean" => Value::Boolean(false),
            "character" => Value::Character(' '),
            _ => Value::Reference(None),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Character(_) => ValueKind::Character,
            Value::Object(_) | Value::Reference(_) => ValueKind::Object,
        }
    }

    /// The referenced object, if any.
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            Value::Reference(link) => *link,
            _ => None,
        }
    }

    /// Replace the value held in the slot for variable `name`. The new value
    /// must have the slot's kind; an object stored into a reference slot
    /// binds the reference.
    pub fn assign(&mut self, value: Value, name: &str) -> Result<()> {
        match (&mut *self, value) {
            (Value::Reference(link), Value::Object(id)) => *link = Some(id),
            (Value::Reference(link), Value::Reference(other)) => *link = other,
            (slot, value) if slot.kind() == value.kind() => *slot = value,
            (slot, value) => {
                return Err(Error::runtime(format!(
                    "cannot assign {} to {} variable '{}'",
                    value.kind(),
                    slot.kind(),
                    name
                )))
            }
        }
        Ok(())
    }

    /// Equality between two values of the same kind. Objects compare by identity.
    pub fn same_as(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Some(a == b),
            (Value::String(a), Value::String(b)) => Some(a == b),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a == b),
            (Value::Character(a), Value::Character(b)) => Some(a == b),
            (a, b) if a.kind() == ValueKind::Object && b.kind() == ValueKind::Object => {
                Some(a.object_id() == b.object_id())
            }
            _ => None,
        }
    }

    /// Text written to the host for this value.
    pub fn display(&self, heap: &Heap) -> String {
        match self {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::Character(c) => c.to_string(),
            Value::Object(_) | Value::Reference(_) => match self.object_id() {
                Some(id) => match heap.get(id) {
                    Some(object) => format!("<{} object>", object.class_name),
                    None => "<invalid object>".to_string(),
                },
                None => "null".to_string(),
            },
        }
    }
}

/// An instance of a user class.
#[derive(Debug, Clone)]
pub struct Object {
    pub class_name: String,
    /// Member values, ordered by member name
    pub members: BTreeMap<String, Value>,
}

/// Storage for every object created during a run.
///
/// Objects are never freed individually; the arena only grows and is
/// dropped together with the interpreter that owns it.
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Object>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an instance of `class` with every member default-initialized.
    pub fn allocate(&mut self, class: &ClassDecl) -> ObjectId {
        let members = class
            .members
            .iter()
            .map(|m| {
                let decl = &m.declaration;
                (decl.name.name.clone(), Value::default_for(&decl.type_name.name))
            })
            .collect();
        self.objects.push(Object {
            class_name: class.name.name.clone(),
            members,
        });
        ObjectId(self.objects.len() - 1)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id.0)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(id.0)
    }
}
